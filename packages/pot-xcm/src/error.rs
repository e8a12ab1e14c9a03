//! Error types for pot-xcm

use thiserror::Error;

/// Main error type for pot-xcm operations
#[derive(Debug, Clone, Error)]
pub enum PotXcmError {
    /// Malformed seed or derivation path
    #[error("{0}")]
    Derivation(String),
    /// Bad pot/user count or id range
    #[error("{0}")]
    InvalidRange(String),
    /// Pot is not part of the current working set
    #[error("pot {0} is not known")]
    UnknownPot(u32),
    /// Empty or out-of-bounds transact payload
    #[error("{0}")]
    InvalidPayload(String),
    /// The codec rejected the message
    #[error("{0}")]
    Encoding(String),
    /// Invalid SS58 address
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Unreadable, undecryptable or unsupported JSON keystore
    #[error("{0}")]
    Keystore(String),
    /// Unreadable or inconsistent settings
    #[error("{0}")]
    Config(String),
    /// Network or chain rejection, carried as returned by the client
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl PotXcmError {
    /// Name of the error kind, printed by the CLI before the message
    pub fn kind(&self) -> &'static str {
        match self {
            PotXcmError::Derivation(_) => "DerivationError",
            PotXcmError::InvalidRange(_) => "InvalidRangeError",
            PotXcmError::UnknownPot(_) => "UnknownPotError",
            PotXcmError::InvalidPayload(_) => "InvalidPayloadError",
            PotXcmError::Encoding(_) => "EncodingError",
            PotXcmError::InvalidAddress(_) => "InvalidAddressError",
            PotXcmError::Keystore(_) => "KeystoreError",
            PotXcmError::Config(_) => "ConfigError",
            PotXcmError::Submission(_) => "SubmissionError",
        }
    }
}

impl From<parity_scale_codec::Error> for PotXcmError {
    fn from(err: parity_scale_codec::Error) -> Self {
        PotXcmError::Encoding(format!("SCALE codec error: {}", err))
    }
}

impl From<hex::FromHexError> for PotXcmError {
    fn from(err: hex::FromHexError) -> Self {
        PotXcmError::InvalidPayload(format!("invalid hex: {}", err))
    }
}

/// Errors reported by a [`crate::client::ChainClient`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Could not reach the node or the connection dropped
    #[error("transport error: {0}")]
    Transport(String),
    /// The node refused the extrinsic (bad nonce, insufficient balance, ...)
    #[error("rejected by node: {0}")]
    Rejected(String),
    /// The extrinsic was included but its dispatch failed
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),
    /// Waiting for the node was interrupted
    #[error("submission cancelled")]
    Cancelled,
}

impl From<subxt::Error> for SubmissionError {
    fn from(err: subxt::Error) -> Self {
        match err {
            subxt::Error::Rpc(e) => SubmissionError::Transport(e.to_string()),
            subxt::Error::Io(e) => SubmissionError::Transport(e.to_string()),
            subxt::Error::Runtime(e) => SubmissionError::DispatchFailed(e.to_string()),
            other => SubmissionError::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PotXcmError::UnknownPot(7);
        assert_eq!(err.to_string(), "pot 7 is not known");
        assert_eq!(err.kind(), "UnknownPotError");
    }

    #[test]
    fn test_submission_error_is_transparent() {
        let inner = SubmissionError::Rejected("Priority is too low".to_string());
        let err: PotXcmError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
        assert_eq!(err.kind(), "SubmissionError");
        match err {
            PotXcmError::Submission(e) => assert_eq!(e, inner),
            _ => panic!("Expected Submission"),
        }
    }

    #[test]
    fn test_from_codec_error() {
        let err: PotXcmError = parity_scale_codec::Error::from("not enough data").into();
        assert_eq!(err.kind(), "EncodingError");
    }
}
