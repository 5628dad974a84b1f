//! The intermediate representation consumed by the scheduler.
//!
//! A [Table] owns the resource classes, resources and registers of one
//! finite-state machine together with its basic blocks. Each [BasicBlock] is
//! an ordered list of [State]s and each state an ordered list of [Insn]s.
//! The IR is built with a [TableBuilder] (or loaded from JSON through
//! [from_json]) and is read-only from then on: scheduling results are
//! produced next to it, never written back into it.
mod builder;
pub mod classes;
mod delay;
pub mod from_json;
mod register;
mod resource;
mod table;

pub use builder::TableBuilder;
pub use delay::{DelayInfo, DelayModel};
pub use register::{RegIdx, RegKind, Register};
pub use resource::{ClassIdx, Resource, ResourceClass, ResourceIdx, ResourceParams};
pub use table::{BasicBlock, BbId, Insn, InsnId, State, Table};

// Re-export types from the utils crate.
pub use wiresched_utils::{GetName, Id};
