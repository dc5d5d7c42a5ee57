use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid module manifest {path:?}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("Unknown extension kind: {0}")]
    UnknownKind(String),

    #[error("Failed to instantiate extension: {0}")]
    Instantiation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FocusError {
    pub fn manifest(path: impl Into<PathBuf>, source: figment::Error) -> Self {
        FocusError::Manifest {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;

#[macro_export]
macro_rules! focus_error {
    (instantiation, $($arg:tt)*) => {
        $crate::error::FocusError::Instantiation(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::FocusError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::FocusError::Internal(format!($($arg)*))
    };
}
