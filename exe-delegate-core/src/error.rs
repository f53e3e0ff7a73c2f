use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DelegateError>;

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// No marker inside the tail window.
    #[error("no delegate metadata found")]
    NotFound,

    /// A marker was found but the bytes after it are not a record.
    #[error("malformed delegate metadata")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode command record")]
    Encode(#[source] serde_json::Error),

    #[error("command record has an empty command")]
    EmptyCommand,

    #[error("unsupported command record kind `{0}`")]
    UnsupportedKind(String),

    #[error("metadata block is {size} bytes, larger than the {limit}-byte tail window")]
    RecordTooLarge { size: usize, limit: usize },

    #[error("failed to launch `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl DelegateError {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| DelegateError::Io { context, source }
    }

    /// Returns true when the error only means "this file is a plain binary".
    pub fn is_not_delegate(&self) -> bool {
        matches!(
            self,
            DelegateError::NotFound
                | DelegateError::Decode(_)
                | DelegateError::EmptyCommand
                | DelegateError::UnsupportedKind(_)
        )
    }

    /// Process exit code used when this error reaches the top level.
    ///
    /// Launch failures follow the shell convention: 127 when the command
    /// does not exist, 126 when it exists but cannot be executed.
    pub fn exit_code(&self) -> i32 {
        match self {
            DelegateError::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => 127,
                io::ErrorKind::PermissionDenied => 126,
                _ => 1,
            },
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_errors_use_shell_exit_codes() {
        let missing = DelegateError::Spawn {
            program: "nope".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let denied = DelegateError::Spawn {
            program: "nope".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(missing.exit_code(), 127);
        assert_eq!(denied.exit_code(), 126);
        assert_eq!(DelegateError::NotFound.exit_code(), 1);
    }

    #[test]
    fn format_errors_are_not_delegate() {
        assert!(DelegateError::NotFound.is_not_delegate());
        assert!(DelegateError::EmptyCommand.is_not_delegate());
        assert!(!DelegateError::Io {
            context: "read".into(),
            source: io::Error::from(io::ErrorKind::Other),
        }
        .is_not_delegate());
    }
}
