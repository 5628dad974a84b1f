//! Shared utilities for the wiresched scheduler.
mod errors;
mod id;
mod idx;
mod out_file;

pub use errors::{Error, ErrorKind, MultiError, SchedResult};
pub use id::{GetName, Id};
pub use idx::{IndexRef, IndexedMap, SecondaryMap};
pub use out_file::OutputFile;
