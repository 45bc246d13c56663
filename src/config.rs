use crate::{batch, error::ConfigError, types::Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Largest raster the board may be drawn on, 256 MiB of 8-bit pixels
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// Layout of the checkerboard drawn onto the base canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BoardFields")]
pub struct BoardConfig {
    /// Number of squares along the horizontal axis
    pub squares_x: u32,
    /// Number of squares along the vertical axis
    pub squares_y: u32,
    /// Side of a single square in pixels
    pub square_size: u32,
    /// Blank border around the grid in pixels
    pub margin: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(10, 7, 80)
    }
}

impl BoardConfig {
    /// Creates a board whose margin equals the square size
    pub fn new(squares_x: u32, squares_y: u32, square_size: u32) -> Self {
        Self {
            squares_x,
            squares_y,
            square_size,
            margin: square_size,
        }
    }

    pub fn with_margin(self, margin: u32) -> Self {
        Self { margin, ..self }
    }

    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.squares_x == 0 {
            return Err(ConfigError::NoSquares {
                axis: 'x',
                value: self.squares_x,
            });
        }
        if self.squares_y == 0 {
            return Err(ConfigError::NoSquares {
                axis: 'y',
                value: self.squares_y,
            });
        }
        if self.square_size == 0 {
            return Err(ConfigError::ZeroSquareSize);
        }
        self.canvas_size().map(|_| ())
    }

    /// Canvas dimensions: the grid plus the margin on both sides. Each side
    /// must fit an `i32` and the whole raster at most [`MAX_CANVAS_PIXELS`]
    pub fn canvas_size(&self) -> core::result::Result<(u32, u32), ConfigError> {
        let side = |squares: u32| {
            squares as u64 * self.square_size as u64 + 2 * self.margin as u64
        };
        let (width, height) = (side(self.squares_x), side(self.squares_y));

        let max_side = i32::MAX as u64;
        if width > max_side || height > max_side || width * height > MAX_CANVAS_PIXELS {
            return Err(ConfigError::CanvasTooLarge { width, height });
        }
        Ok((width as u32, height as u32))
    }

    /// Pixel position of the top-left corner of grid cell `(x, y)`
    pub fn cell_origin(&self, x: u32, y: u32) -> (u32, u32) {
        (
            self.margin + x * self.square_size,
            self.margin + y * self.square_size,
        )
    }
}

/// On-disk form of [`BoardConfig`] where an absent margin follows the square size
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoardFields {
    squares_x: Option<u32>,
    squares_y: Option<u32>,
    square_size: Option<u32>,
    margin: Option<u32>,
}

impl From<BoardFields> for BoardConfig {
    fn from(fields: BoardFields) -> Self {
        let default = BoardConfig::default();
        let square_size = fields.square_size.unwrap_or(default.square_size);
        Self {
            squares_x: fields.squares_x.unwrap_or(default.squares_x),
            squares_y: fields.squares_y.unwrap_or(default.squares_y),
            square_size,
            margin: fields.margin.unwrap_or(square_size),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Everything needed to run one generation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub board: BoardConfig,
    /// Number of warped images to produce
    pub count: u32,
    /// Fraction of each image dimension a corner may move inward, in `[0, 0.5]`
    pub distortion_strength: f64,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    /// Fixed seed for reproducible batches; entropy seeded when absent
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            count: 20,
            distortion_strength: 0.2,
            output_dir: PathBuf::from("ChessImages"),
            format: OutputFormat::Jpeg,
            jpeg_quality: batch::DEFAULT_JPEG_QUALITY,
            seed: None,
        }
    }
}

impl GenerationConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> core::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        self.board.validate()?;
        if self.count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        validate_strength(self.distortion_strength)?;
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::QualityOutOfRange(self.jpeg_quality));
        }
        Ok(())
    }

    /// Validates, draws the board and writes the whole batch on the calling thread
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        batch::run(self, &mut batch::NoProgress)
    }
}

pub(crate) fn validate_strength(strength: f64) -> core::result::Result<(), ConfigError> {
    if (0.0..=0.5).contains(&strength) {
        Ok(())
    } else {
        Err(ConfigError::DistortionOutOfRange(strength))
    }
}
