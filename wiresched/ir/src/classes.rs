//! Names and properties of the built-in resource classes.
use linked_hash_map::LinkedHashMap;

pub const TRANSITION: &str = "tr";
pub const SET: &str = "set";
pub const SELECT: &str = "select";
pub const ADD: &str = "add";
pub const SUB: &str = "sub";
pub const MUL: &str = "mul";
pub const GT: &str = "gt";
pub const GTE: &str = "gte";
pub const EQ: &str = "eq";
pub const BIT_AND: &str = "bit-and";
pub const BIT_OR: &str = "bit-or";
pub const BIT_XOR: &str = "bit-xor";
pub const BIT_INV: &str = "bit-inv";
pub const SHIFT: &str = "shift";
pub const BIT_SEL: &str = "bit-sel";
pub const BIT_CONCAT: &str = "bit-concat";
pub const ARRAY: &str = "array";

#[derive(Debug, Clone, Copy)]
pub struct ClassInfo {
    pub exclusive: bool,
    pub transition: bool,
    /// Default combinational delay of one operation.
    pub delay: u32,
}

const fn info(exclusive: bool, delay: u32) -> ClassInfo {
    ClassInfo {
        exclusive,
        transition: false,
        delay,
    }
}

lazy_static::lazy_static! {
    /// Built-in classes, in installation order.
    pub static ref DEFAULT_CLASSES: LinkedHashMap<&'static str, ClassInfo> = {
        let mut m = LinkedHashMap::new();
        m.insert(TRANSITION, ClassInfo { exclusive: false, transition: true, delay: 0 });
        m.insert(SET, info(false, 0));
        m.insert(SELECT, info(false, 1));
        m.insert(ADD, info(true, 2));
        m.insert(SUB, info(true, 2));
        m.insert(MUL, info(true, 5));
        m.insert(GT, info(true, 1));
        m.insert(GTE, info(true, 1));
        m.insert(EQ, info(true, 1));
        m.insert(BIT_AND, info(false, 1));
        m.insert(BIT_OR, info(false, 1));
        m.insert(BIT_XOR, info(false, 1));
        m.insert(BIT_INV, info(false, 1));
        m.insert(SHIFT, info(false, 1));
        m.insert(BIT_SEL, info(false, 0));
        m.insert(BIT_CONCAT, info(false, 0));
        m.insert(ARRAY, info(true, 3));
        m
    };
}

/// Binary operators that are worth sharing between instructions.
pub fn is_exclusive_bin_op(name: &str) -> bool {
    matches!(name, ADD | SUB | MUL | GT | GTE | EQ)
}

/// Cheap bitwise operators that are never shared.
pub fn is_light_op(name: &str) -> bool {
    matches!(name, BIT_AND | BIT_OR | BIT_XOR | BIT_INV)
}

/// Default delay of a built-in class.
pub fn default_delay(name: &str) -> Option<u32> {
    DEFAULT_CLASSES.get(name).map(|c| c.delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusivity_matches_table() {
        for (name, info) in DEFAULT_CLASSES.iter() {
            if is_exclusive_bin_op(name) {
                assert!(info.exclusive, "{name} should be exclusive");
            }
            if is_light_op(name) {
                assert!(!info.exclusive, "{name} should be shareable");
            }
        }
        assert!(DEFAULT_CLASSES[TRANSITION].transition);
        assert_eq!(default_delay(MUL), Some(5));
        assert_eq!(default_delay("fancy-op"), None);
    }
}
