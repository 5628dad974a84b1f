use linked_hash_map::LinkedHashMap;
use wiresched_utils::{GetName, Id, impl_index};

/// Index of a [ResourceClass] in its [Table](crate::Table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassIdx(u32);
impl_index!(ClassIdx);

/// Index of a [Resource] in its [Table](crate::Table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdx(u32);
impl_index!(ResourceIdx);

/// A category of hardware operator (adder, multiplier, memory port, ...).
#[derive(Debug, Clone)]
pub struct ResourceClass {
    pub name: Id,
    /// Only one operation may execute per instance of this class per cycle.
    pub exclusive: bool,
    /// Instructions of this class transfer control out of the block.
    pub transition: bool,
}

impl GetName for ResourceClass {
    fn name(&self) -> Id {
        self.name
    }
}

/// A named instance of a resource class that instructions are bound to.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: Id,
    pub class: ClassIdx,
    pub params: ResourceParams,
}

impl GetName for Resource {
    fn name(&self) -> Id {
        self.name
    }
}

/// Free-form per-resource configuration. Every key maps to a list of string
/// values; typed accessors parse the first value and fall back to a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceParams {
    params: LinkedHashMap<String, Vec<String>>,
}

impl ResourceParams {
    /// Fixed combinational delay of the resource, overriding the class delay.
    pub const DELAY: &'static str = "delay";

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.params.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set the values of `key`. An existing key keeps its position.
    pub fn set_values(&mut self, key: &str, values: Vec<String>) {
        match self.params.get_mut(key) {
            Some(v) => *v = values,
            None => {
                self.params.insert(key.to_string(), values);
            }
        }
    }

    pub fn string(&self, key: &str, dflt: &str) -> String {
        self.values(key)
            .first()
            .cloned()
            .unwrap_or_else(|| dflt.to_string())
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.set_values(key, vec![value.to_string()]);
    }

    pub fn int(&self, key: &str, dflt: i64) -> i64 {
        self.values(key)
            .first()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(dflt)
    }

    /// Like [ResourceParams::int] but distinguishes a missing or unparsable
    /// value from a present one.
    pub fn lookup_int(&self, key: &str) -> Option<i64> {
        self.values(key).first().and_then(|v| v.trim().parse().ok())
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.set_string(key, &value.to_string());
    }

    pub fn bool(&self, key: &str, dflt: bool) -> bool {
        match self.values(key).first().map(String::as_str) {
            Some("true") => true,
            Some("false") => false,
            _ => dflt,
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set_string(key, if value { "true" } else { "false" });
    }

    /// Merge `other` into this set. Keys present in `other` overwrite the
    /// existing values.
    pub fn merge(&mut self, other: &ResourceParams) {
        for (key, values) in other.params.iter() {
            self.set_values(key, values.clone());
        }
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for ResourceParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ResourceParams::default();
        for (k, v) in iter {
            params.set_string(&k.to_string(), &v.to_string());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let mut p = ResourceParams::default();
        p.set_int(ResourceParams::DELAY, 4);
        p.set_bool("pipelined", true);
        p.set_string("width", "abc");
        assert_eq!(p.int(ResourceParams::DELAY, 0), 4);
        assert_eq!(p.lookup_int("width"), None);
        assert_eq!(p.int("width", 32), 32);
        assert!(p.bool("pipelined", false));
        assert!(!p.bool("missing", false));
    }

    #[test]
    fn merge_overwrites() {
        let mut base: ResourceParams =
            [("delay", "2"), ("mode", "fast")].into_iter().collect();
        let over: ResourceParams = [("delay", "7")].into_iter().collect();
        base.merge(&over);
        assert_eq!(base.int("delay", 0), 7);
        assert_eq!(base.string("mode", ""), "fast");
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["delay", "mode"]);
    }
}
