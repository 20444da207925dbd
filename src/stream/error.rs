use std::io;
use thiserror::Error;

/// How a stream fault should be treated by whoever supervises the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Network or OS level trouble. The stream ended, nothing is broken.
    Transient,
    /// Anything else. Points at a defect rather than the environment.
    Unexpected,
}

/// Failure while opening or reading the network stream
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("stream has no audio track")]
    NoAudioTrack,

    #[error("unsupported stream: {0}")]
    Unsupported(String),

    #[error("demux error: {0}")]
    Demux(String),
}

impl IntakeError {
    pub fn kind(&self) -> FaultKind {
        match self {
            IntakeError::ConnectionReset(_)
            | IntakeError::ConnectionRefused(_)
            | IntakeError::Unreachable(_)
            | IntakeError::Timeout(_)
            | IntakeError::Io(_) => FaultKind::Transient,
            IntakeError::HttpStatus(_)
            | IntakeError::Http(_)
            | IntakeError::NoAudioTrack
            | IntakeError::Unsupported(_)
            | IntakeError::Demux(_) => FaultKind::Unexpected,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FaultKind::Transient
    }
}

impl From<io::Error> for IntakeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                IntakeError::ConnectionReset(err.to_string())
            }
            io::ErrorKind::ConnectionRefused => IntakeError::ConnectionRefused(err.to_string()),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                IntakeError::Timeout(err.to_string())
            }
            _ => IntakeError::Io(err),
        }
    }
}

impl From<ureq::Error> for IntakeError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => IntakeError::HttpStatus(code),
            ureq::Error::Transport(transport) => {
                let message = transport.to_string();
                match transport.kind() {
                    ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Io => {
                        classify_by_source(&transport, message)
                    }
                    ureq::ErrorKind::Dns => IntakeError::Unreachable(message),
                    _ => IntakeError::Http(message),
                }
            }
        }
    }
}

// ureq folds refused, reset and timed-out connects into one kind; the
// underlying io::Error in the source chain still carries the real one
fn classify_by_source(err: &(dyn std::error::Error + 'static), message: String) -> IntakeError {
    match find_io_error(err) {
        Some(io_err) => IntakeError::from(io::Error::new(io_err.kind(), message)),
        None => IntakeError::Unreachable(message),
    }
}

fn find_io_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        current = err.source();
    }
    None
}
