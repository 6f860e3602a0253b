use std::{error::Error as StdError, fmt::Write, io};

/// Failure input accepted by the error emitter: either a bare message or a
/// fault carrying a trace of its causes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorInput {
    Message(String),
    Fault {
        message: String,
        stack: Option<String>,
    },
}

impl ErrorInput {
    /// Captures an error and its `source()` chain, one cause per line.
    pub fn from_error<E: StdError + ?Sized>(e: &E) -> Self {
        let mut stack = String::new();
        let mut source = e.source();
        while let Some(cause) = source {
            if !stack.is_empty() {
                stack.push('\n');
            }
            let _ = write!(stack, "caused by: {cause}");
            source = cause.source();
        }
        ErrorInput::Fault {
            message: e.to_string(),
            stack: (!stack.is_empty()).then_some(stack),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorInput::Message(m) => m,
            ErrorInput::Fault { message, .. } => message,
        }
    }

    /// The trace, or an empty string when none is known.
    pub fn stack(&self) -> &str {
        match self {
            ErrorInput::Fault {
                stack: Some(stack), ..
            } => stack,
            _ => "",
        }
    }
}

impl From<&str> for ErrorInput {
    fn from(m: &str) -> Self {
        ErrorInput::Message(m.to_owned())
    }
}

impl From<String> for ErrorInput {
    fn from(m: String) -> Self {
        ErrorInput::Message(m)
    }
}

impl From<io::Error> for ErrorInput {
    fn from(e: io::Error) -> Self {
        ErrorInput::from_error(&e)
    }
}

impl From<crate::Error> for ErrorInput {
    fn from(e: crate::Error) -> Self {
        ErrorInput::from_error(&e)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for ErrorInput {
    fn from(e: Box<dyn StdError + Send + Sync>) -> Self {
        ErrorInput::from_error(e.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    #[test]
    fn plain_messages_have_no_stack() {
        let e = ErrorInput::from("bad credentials");
        assert_eq!(e.message(), "bad credentials");
        assert_eq!(e.stack(), "");
    }

    #[test]
    fn faults_render_their_cause_chain() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "read-only filesystem");
        let e = ErrorInput::from(Error::log_dir("logs", io));
        assert!(e.message().starts_with("Log directory 'logs' is not writable"));
        assert_eq!(e.stack(), "caused by: read-only filesystem");
    }
}
