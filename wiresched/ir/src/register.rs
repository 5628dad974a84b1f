use serde::Deserialize;
use wiresched_utils::{GetName, Id, impl_index};

/// Index of a [Register] in its [Table](crate::Table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegIdx(u32);
impl_index!(RegIdx);

/// How a register holds its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegKind {
    /// Combinational value that only lives within the state it is written in.
    Wire,
    /// Sequential value latched at the end of the state it is written in.
    Reg,
    /// Constant value.
    Const,
}

#[derive(Debug, Clone)]
pub struct Register {
    pub name: Id,
    pub kind: RegKind,
    /// The value is provided by something outside the block (a previous
    /// block, an input port, reset logic).
    pub initialized: bool,
}

impl Register {
    pub fn is_state_local(&self) -> bool {
        self.kind == RegKind::Wire
    }

    /// Reads of this register never need a writer inside the block.
    pub fn is_initialized(&self) -> bool {
        self.initialized || self.kind == RegKind::Const
    }
}

impl GetName for Register {
    fn name(&self) -> Id {
        self.name
    }
}
