//! Errors generated by the scheduler.
use crate::Id;

/// Convenience wrapper to represent success or meaningful scheduler error.
pub type SchedResult<T> = std::result::Result<T, Error>;

/// The different kinds of errors the scheduler can report.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ErrorKind {
    /// An instruction reads a register that nothing above it writes and that
    /// was not marked as initialized.
    #[error(
        "instruction {insn} reads `{reg}`, which has no writer above it and is not initialized"
    )]
    DanglingRead { insn: u32, reg: Id },

    /// The dependency graph of a block has a cycle.
    #[error("dependency cycle through instruction {insn}")]
    CyclicDependency { insn: u32 },

    /// The block cannot be scheduled under the current wire plan.
    #[error("infeasible schedule: {0}")]
    Infeasible(String),

    /// The input program refers to something that does not exist or is
    /// otherwise ill-formed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("{0}")]
    Misc(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("json error: {0}")]
    Json(String),
}

/// Standard error type for wiresched errors.
#[derive(Clone)]
pub struct Error {
    kind: Box<ErrorKind>,
    /// Basic block the error was raised for.
    block: Option<u32>,
    /// Message printed after the main error.
    post_msg: Option<String>,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
            block: None,
            post_msg: None,
        }
    }

    pub fn dangling_read(insn: u32, reg: Id) -> Self {
        Self::new(ErrorKind::DanglingRead { insn, reg })
    }

    pub fn cyclic_dependency(insn: u32) -> Self {
        Self::new(ErrorKind::CyclicDependency { insn })
    }

    pub fn infeasible<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::Infeasible(msg.to_string()))
    }

    pub fn malformed_input<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::MalformedInput(msg.to_string()))
    }

    pub fn misc<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::Misc(msg.to_string()))
    }

    /// Attach the identity of the basic block this error belongs to.
    pub fn in_block(mut self, block: impl Into<u32>) -> Self {
        self.block = Some(block.into());
        self
    }

    pub fn with_post_msg(mut self, msg: Option<String>) -> Self {
        self.post_msg = msg;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn block(&self) -> Option<u32> {
        self.block
    }

    /// Recoverable errors only reject the wire plan they were raised under;
    /// every other error is a defect of the input block.
    pub fn is_recoverable(&self) -> bool {
        matches!(*self.kind, ErrorKind::Infeasible(_))
    }

    /// The error message without the block prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(bb) = self.block {
            write!(f, "[bb{bb}] ")?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(post) = &self.post_msg {
            write!(f, "\n{post}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(e.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::new(ErrorKind::Json(e.to_string()))
    }
}

/// A collection of errors, one per failing unit of work.
#[derive(Clone, Default)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    pub fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }
}

impl From<Vec<Error>> for MultiError {
    fn from(errors: Vec<Error>) -> Self {
        MultiError { errors }
    }
}

impl From<Error> for MultiError {
    fn from(err: Error) -> Self {
        MultiError { errors: vec![err] }
    }
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for MultiError {}
