use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    InvalidArgument,
    RemoteFailure,
    IterationExhausted,
    NotSupported,
    Corruption,
    IOError,
}

#[derive(Debug, Clone)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status {
            code: Code::InvalidArgument,
            message: Some(msg.into()),
        }
    }

    /// Transport or server error reported by a `RemoteStore`.
    pub fn remote_failure(msg: impl Into<String>) -> Self {
        Status {
            code: Code::RemoteFailure,
            message: Some(msg.into()),
        }
    }

    pub fn exhausted() -> Self {
        Status {
            code: Code::IterationExhausted,
            message: None,
        }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Status {
            code: Code::NotSupported,
            message: Some(msg.into()),
        }
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status {
            code: Code::Corruption,
            message: Some(msg.into()),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status {
            code: Code::IOError,
            message: Some(msg.into()),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == Code::InvalidArgument
    }

    pub fn is_remote_failure(&self) -> bool {
        self.code == Code::RemoteFailure
    }

    pub fn is_exhausted(&self) -> bool {
        self.code == Code::IterationExhausted
    }

    pub fn is_not_supported(&self) -> bool {
        self.code == Code::NotSupported
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::corruption(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_exhausted() {
        let status = Status::exhausted();
        assert!(status.is_exhausted());
        assert!(!status.is_remote_failure());
        assert_eq!(status.message(), None);
    }

    #[test]
    fn test_status_invalid_argument() {
        let status = Status::invalid_argument("'objectId' is null");
        assert!(status.is_invalid_argument());
        assert_eq!(status.message(), Some("'objectId' is null"));
    }

    #[test]
    fn test_status_display() {
        let status = Status::remote_failure("connection reset");
        assert_eq!(status.to_string(), "RemoteFailure: connection reset");
        assert_eq!(Status::exhausted().to_string(), "IterationExhausted");
    }

    #[test]
    fn test_status_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let status: Status = err.into();
        assert_eq!(status.code(), &Code::Corruption);
    }
}
