use std::num::ParseIntError;

use thiserror::Error;

/// Symbolic error codes carried by every `LayerError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    IllegalArgument,
    InvalidLayer,
    RemoteFailure,
    TransportFailure,
    FormatError,
    SerializationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IllegalArgument => "ERRCODE_ILLEGAL_ARGUMENT",
            ErrorCode::InvalidLayer => "ERRCODE_INVALID_LAYER",
            ErrorCode::RemoteFailure => "ERRCODE_REMOTE_FAILURE",
            ErrorCode::TransportFailure => "ERRCODE_TRANSPORT_FAILURE",
            ErrorCode::FormatError => "ERRCODE_FORMAT_ERROR",
            ErrorCode::SerializationError => "ERRCODE_SERIALIZATION_ERROR",
        }
    }
}

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("{message} ({})", .code.as_str())]
    InvalidArgument { code: ErrorCode, message: String },

    #[error("Invalid layer: {0}")]
    InvalidLayer(String),

    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response is not a number: {0}")]
    Format(#[from] ParseIntError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] geojson::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl LayerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LayerError::InvalidArgument { code, .. } => *code,
            LayerError::InvalidLayer(_) => ErrorCode::InvalidLayer,
            LayerError::Remote { .. } => ErrorCode::RemoteFailure,
            LayerError::Transport(_) => ErrorCode::TransportFailure,
            LayerError::Format(_) => ErrorCode::FormatError,
            LayerError::Serialization(_) | LayerError::Geometry(_) | LayerError::Url(_) => {
                ErrorCode::SerializationError
            }
        }
    }
}

pub type LayerResult<T> = Result<T, LayerError>;

pub fn invalid_argument(message: impl Into<String>) -> LayerError {
    LayerError::InvalidArgument {
        code: ErrorCode::IllegalArgument,
        message: message.into(),
    }
}
