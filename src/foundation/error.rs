/// Convenience result type used across the crate.
pub type TwibbonResult<T> = Result<T, TwibbonError>;

/// Top-level error taxonomy used by the compositing and detection APIs.
///
/// Geometry, planning and session operations never fail; only steps that touch
/// decoders, the filesystem or the detection worker return these.
#[derive(thiserror::Error, Debug)]
pub enum TwibbonError {
    /// Invalid user-provided data (manifest, config, photo file).
    #[error("validation error: {0}")]
    Validation(String),

    /// A detection was requested while another one is still outstanding.
    #[error("detection busy: another detection is already in progress")]
    DetectionBusy,

    /// Detection was requested before the detector finished initialising.
    #[error("detector not ready: call init() first")]
    DetectorNotReady,

    /// The detector itself reported an error.
    #[error("detection failed: {0}")]
    DetectionFailed(String),

    /// A layer image could not be decoded; the composite was aborted.
    #[error("decode failed for layer '{layer}': {reason}")]
    DecodeFailed {
        /// Human-readable layer identity (source path or `photo`).
        layer: String,
        /// Underlying decoder message.
        reason: String,
    },

    /// A newer composite request superseded this one.
    #[error("composite cancelled: superseded by a newer request")]
    CompositeCancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TwibbonError {
    /// Build a [`TwibbonError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TwibbonError::DetectionFailed`] value.
    pub fn detection_failed(msg: impl Into<String>) -> Self {
        Self::DetectionFailed(msg.into())
    }

    /// Build a [`TwibbonError::DecodeFailed`] value.
    pub fn decode_failed(layer: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DecodeFailed {
            layer: layer.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`TwibbonError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the caller should drop this error without surfacing it to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::DetectionBusy | Self::CompositeCancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
