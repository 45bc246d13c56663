use std::path::PathBuf;
use thiserror::Error;

/// Rejected configuration, reported before any pixel is drawn
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board must have at least one square along {axis}, got {value}")]
    NoSquares { axis: char, value: u32 },

    #[error("square size must be positive")]
    ZeroSquareSize,

    #[error("canvas of {width}x{height} pixels exceeds the drawable limit")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("image count must be positive")]
    ZeroCount,

    #[error("distortion strength {0} is outside [0.0, 0.5]")]
    DistortionOutOfRange(f64),

    #[error("jpeg quality {0} is outside [1, 100]")]
    QualityOutOfRange(u8),

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The perturbed corners of image `index` admit no usable homography
    #[error("image {index}: {reason}")]
    Geometry { index: u32, reason: &'static str },

    #[error("batch cancelled after {completed} images")]
    Cancelled { completed: usize },

    #[error("batch worker terminated without reporting a result")]
    WorkerLost,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
