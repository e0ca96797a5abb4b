use pcap_parser::PcapError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Lower-level cause kept behind `Format` and `Truncated` so callers can walk
/// `source()` down to what the container parser actually reported.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(transparent)]
    Parser(#[from] PcapError<&'static [u8]>),

    #[error("{0}")]
    Invalid(String),
}

impl From<&str> for ContainerError {
    fn from(msg: &str) -> Self {
        ContainerError::Invalid(msg.to_string())
    }
}

impl From<String> for ContainerError {
    fn from(msg: String) -> Self {
        ContainerError::Invalid(msg)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// Container bytes do not match any known capture layout
    #[error("error reading container: {reason}")]
    Format {
        reason: String,
        #[source]
        source: ContainerError,
    },

    /// A record declares more bytes than remain in the input
    #[error("error reading container: unexpected end of input at record {record}")]
    Truncated {
        record: u64,
        #[source]
        source: ContainerError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis cancelled after {processed} frames")]
    Cancelled { processed: u64 },
}

impl Error {
    pub(crate) fn format(reason: impl Into<String>, cause: impl Into<ContainerError>) -> Self {
        Error::Format {
            reason: reason.into(),
            source: cause.into(),
        }
    }

    pub(crate) fn truncated(record: u64, cause: impl Into<ContainerError>) -> Self {
        Error::Truncated {
            record,
            source: cause.into(),
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format { .. })
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn truncated_keeps_cause() {
        let err = Error::truncated(42, "needed 60 more bytes");
        assert_eq!(
            err.to_string(),
            "error reading container: unexpected end of input at record 42"
        );
        assert_eq!(err.source().unwrap().to_string(), "needed 60 more bytes");
        assert!(err.is_truncated());
        assert!(!err.is_format());
    }

    #[test]
    fn format_mentions_reason() {
        let err = Error::format("unknown magic 0xdeadbeef", "header not recognized");
        assert!(err.to_string().contains("0xdeadbeef"));
        assert!(err.is_format());
    }

    #[test]
    fn parser_cause_is_typed() {
        let err = Error::truncated(3, PcapError::<&[u8]>::UnexpectedEof.to_owned_vec());
        let cause = err
            .source()
            .and_then(|s| s.downcast_ref::<ContainerError>())
            .unwrap();
        assert!(matches!(
            cause,
            ContainerError::Parser(PcapError::UnexpectedEof)
        ));
    }
}
