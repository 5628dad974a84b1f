//! Analyses that build and annotate the per-block dependency graphs.
mod conflict_tracker;
mod data_path;
mod virtual_resource;

pub use conflict_tracker::{Checkpoint, ConflictTracker};
pub use data_path::{
    BBDataPath, DataPathSet, EdgeIdx, EdgeKind, NodeIdx, PathEdge, PathNode,
};
pub use virtual_resource::{VirtualResource, VirtualResourceSet, VresIdx};
