//! # Basic-block scheduling and wire planning
//!
//! This crate assigns every instruction of a [Table](wiresched_ir::Table) to
//! a state of the generated finite-state machine. Scheduling happens one
//! basic block at a time:
//!
//! 1. [analysis::BBDataPath] turns the block into a dependency graph whose
//!    nodes are instructions and whose edges are register dependencies.
//! 2. The graph is annotated with delays from a
//!    [DelayModel](wiresched_ir::DelayModel).
//! 3. [sched::BBScheduler] places every node in the lowest state that
//!    respects data dependencies, exclusive resources and the per-state
//!    delay budget.
//!
//! Around this, [sched::Explorer] searches for a wire plan: how many
//! replicas of each shared resource to instantiate so that multiplexers in
//! front of them stay small without over-provisioning hardware.
//! [sched::TableScheduler] drives the whole loop.
//!
//! ```rust
//! use wiresched_ir::{self as ir, classes, DelayInfo, RegKind};
//! use wiresched_opt::{config::SchedConfig, sched::TableScheduler};
//! use wiresched_utils::SchedResult;
//!
//! fn main() -> SchedResult<()> {
//!     let mut b = ir::TableBuilder::new("main");
//!     b.install_default_classes();
//!     let mul = b.add_resource_of("mul0", classes::MUL)?;
//!     let a = b.add_register("a", RegKind::Reg, true)?;
//!     let x = b.add_register("x", RegKind::Reg, false)?;
//!     let y = b.add_register("y", RegKind::Reg, false)?;
//!     b.add_block(ir::BasicBlock::new(0, vec![ir::State::new(vec![
//!         ir::Insn::new(1, mul, &[a, a], &[x]),
//!         ir::Insn::new(2, mul, &[a, a], &[y]),
//!     ])]))?;
//!     let table = b.build();
//!
//!     let delay = DelayInfo::new(10);
//!     let result = TableScheduler::new(&table, &delay, SchedConfig::default()).run();
//!     assert_eq!(result.blocks[0].num_states, 2);
//!     Ok(())
//! }
//! ```
pub mod analysis;
pub mod config;
pub mod sched;
