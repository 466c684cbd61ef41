//! Error types for frame classification

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    /// The frame cannot hold the centre region of interest
    #[error("frame {width}x{height} is smaller than the {required}x{required} region of interest")]
    InvalidFrameSize {
        width: u32,
        height: u32,
        required: u32,
    },

    /// A vision primitive failed
    #[error("detection failed: {0}")]
    DetectionFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::DetectionFailure(err.to_string())
    }
}
