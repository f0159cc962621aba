use crate::{
    compile::CompileError, config::ConfigError, resolve::BindError, table::BackendError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `class`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without a structured detail payload.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a table-origin invariant violation.
    pub(crate) fn table_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Table,
            message.into(),
        )
    }

    #[must_use]
    pub const fn is_binding(&self) -> bool {
        matches!(self.class, ErrorClass::Binding)
    }

    #[must_use]
    pub const fn is_compile(&self) -> bool {
        matches!(self.class, ErrorClass::Compile | ErrorClass::Unsupported)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, class-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Compile(CompileError),
    #[error("{0}")]
    Bind(BindError),
    #[error("{0}")]
    Backend(BackendError),
    #[error("{0}")]
    Config(ConfigError),
}

impl From<CompileError> for InternalError {
    fn from(err: CompileError) -> Self {
        let class = if err.is_unsupported() {
            ErrorClass::Unsupported
        } else {
            ErrorClass::Compile
        };

        Self {
            class,
            origin: ErrorOrigin::Compiler,
            message: err.to_string(),
            detail: Some(ErrorDetail::Compile(err)),
        }
    }
}

impl From<BindError> for InternalError {
    fn from(err: BindError) -> Self {
        Self {
            class: ErrorClass::Binding,
            origin: ErrorOrigin::Resolver,
            message: err.to_string(),
            detail: Some(ErrorDetail::Bind(err)),
        }
    }
}

impl From<BackendError> for InternalError {
    fn from(err: BackendError) -> Self {
        Self {
            class: ErrorClass::Backend,
            origin: ErrorOrigin::Table,
            message: err.to_string(),
            detail: Some(ErrorDetail::Backend(err)),
        }
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self {
            class: ErrorClass::Config,
            origin: ErrorOrigin::Config,
            message: err.to_string(),
            detail: Some(ErrorDetail::Config(err)),
        }
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Compile,
    Unsupported,
    Binding,
    Backend,
    Config,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Compile => "compile",
            Self::Unsupported => "unsupported",
            Self::Binding => "binding",
            Self::Backend => "backend",
            Self::Config => "config",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Compiler,
    Resolver,
    Table,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Compiler => "compiler",
            Self::Resolver => "resolver",
            Self::Table => "table",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
