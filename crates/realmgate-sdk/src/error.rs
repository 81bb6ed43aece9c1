//! Exception model shared by the host runtime and the boundary code

use crate::value::HostValue;

/// Result type for host runtime operations
pub type HostResult<T> = Result<T, Exception>;

/// Host-level termination signals.
///
/// These end the whole engine turn. No interception layer may observe or
/// recover from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Termination {
    /// Execution was stopped on request of the embedder
    #[error("execution terminated")]
    Forced,

    /// The host ran out of a hard resource (heap budget)
    #[error("out of memory")]
    OutOfMemory,
}

/// An exception propagating through host frames.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Exception {
    /// A script-visible thrown value; may be caught
    #[error("uncaught exception: {0}")]
    Thrown(HostValue),

    /// Uncatchable termination
    #[error("{0}")]
    Terminated(Termination),
}

impl Exception {
    /// Whether a `catch` interceptor may observe this exception
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Exception::Thrown(_))
    }

    /// The thrown value, if recoverable
    pub fn thrown_value(&self) -> Option<&HostValue> {
        match self {
            Exception::Thrown(value) => Some(value),
            Exception::Terminated(_) => None,
        }
    }

    /// The termination signal, if unrecoverable
    pub fn termination(&self) -> Option<Termination> {
        match self {
            Exception::Thrown(_) => None,
            Exception::Terminated(signal) => Some(*signal),
        }
    }
}

impl From<Termination> for Exception {
    fn from(signal: Termination) -> Self {
        Exception::Terminated(signal)
    }
}

/// Built-in error constructors a host must be able to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `Error`
    Error,
    /// `TypeError`
    TypeError,
    /// `RangeError`
    RangeError,
    /// `ReferenceError`
    ReferenceError,
}

impl ErrorKind {
    /// All kinds, in prototype-creation order
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
    ];

    /// Constructor name
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
        }
    }
}
