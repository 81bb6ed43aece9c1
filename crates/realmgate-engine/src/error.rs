//! Error types for the realm boundary

use realmgate_sdk::{ErrorKind, Exception, HostRuntime, HostValue, RealmId, Termination};

/// Result type for boundary operations
pub type GateResult<T> = Result<T, GateError>;

/// Boundary error types
///
/// `new` on a non-constructible function never reaches this type: the host
/// rejects it through [`ConstructorBehavior::Throw`](realmgate_sdk::ConstructorBehavior)
/// before any boundary code runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateError {
    /// Fewer arguments than a fixed-arity entry point requires
    #[error("{entry}: expected at least {expected} argument(s), got {got}")]
    InvalidArgumentCount {
        /// Entry point name
        entry: &'static str,
        /// Required argument count
        expected: usize,
        /// Actual argument count
        got: usize,
    },

    /// An argument failed its shape check
    #[error("The \"{argument}\" argument must be of type {expected}, got {got}")]
    InvalidArgumentType {
        /// Argument name
        argument: String,
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        got: &'static str,
    },

    /// An option value has the wrong shape
    #[error("`options.{option}` {reason}")]
    InvalidOption {
        /// Option name
        option: String,
        /// What is wrong with it
        reason: String,
    },

    /// Lock stack misuse
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Conflicting interface/implementation association
    #[error("{0}")]
    Association(String),

    /// Uncatchable host termination
    #[error("Unrecoverable host signal: {0}")]
    Unrecoverable(Termination),

    /// Exception thrown by an implementation or hook, passed through unchanged
    #[error("Uncaught exception: {0}")]
    Exception(HostValue),
}

/// Lock stack errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// `leave_lock` without a matching lock frame on top
    #[error("The platform is not locked.")]
    NotLocked,

    /// `leave_unlock` without a matching unlock frame on top
    #[error("The platform is not unlocked.")]
    NotUnlocked,
}

impl From<Exception> for GateError {
    fn from(exception: Exception) -> Self {
        match exception {
            Exception::Thrown(value) => GateError::Exception(value),
            Exception::Terminated(termination) => GateError::Unrecoverable(termination),
        }
    }
}

impl GateError {
    /// Create an argument type error from the offending value
    pub fn argument_type(argument: &str, expected: &'static str, got: &HostValue) -> Self {
        GateError::InvalidArgumentType {
            argument: argument.to_string(),
            expected,
            got: got.type_name(),
        }
    }

    /// Create an option error
    pub fn option(option: &str, reason: impl Into<String>) -> Self {
        GateError::InvalidOption {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if a `catch` hook may intercept this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GateError::Unrecoverable(_))
    }

    /// Host error class used when raising this error into script
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            GateError::InvalidArgumentCount { .. }
            | GateError::InvalidArgumentType { .. }
            | GateError::InvalidOption { .. } => ErrorKind::TypeError,
            GateError::Association(_) => ErrorKind::ReferenceError,
            GateError::Lock(_) | GateError::Unrecoverable(_) | GateError::Exception(_) => {
                ErrorKind::Error
            }
        }
    }

    /// Raise this error in `realm`.
    ///
    /// Pass-through exceptions and termination signals keep their identity;
    /// everything else becomes a fresh host error object.
    pub fn into_exception(self, host: &dyn HostRuntime, realm: RealmId) -> Exception {
        match self {
            GateError::Exception(value) => Exception::Thrown(value),
            GateError::Unrecoverable(termination) => Exception::Terminated(termination),
            other => match host.new_error(realm, other.error_kind(), &other.to_string()) {
                Ok(error) => Exception::Thrown(error),
                Err(exception) => exception,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_conversion_keeps_termination() {
        let err = GateError::from(Exception::Terminated(Termination::OutOfMemory));
        assert_eq!(err, GateError::Unrecoverable(Termination::OutOfMemory));
        assert!(!err.is_recoverable());

        let err = GateError::from(Exception::Thrown(HostValue::from(3)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = GateError::argument_type("object", "object", &HostValue::from(1));
        assert_eq!(
            err.to_string(),
            "The \"object\" argument must be of type object, got number"
        );
        assert_eq!(
            GateError::from(LockError::NotLocked).to_string(),
            "The platform is not locked."
        );
        assert_eq!(
            GateError::option("before", "is not a function").to_string(),
            "`options.before` is not a function"
        );
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            GateError::Association("x".into()).error_kind(),
            ErrorKind::ReferenceError
        );
        assert_eq!(
            GateError::option("before", "is not a function").error_kind(),
            ErrorKind::TypeError
        );
        assert_eq!(GateError::Lock(LockError::NotLocked).error_kind(), ErrorKind::Error);
    }
}
