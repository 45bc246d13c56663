//! Synthetic checkerboard calibration images.
//!
//! A board is drawn once with [`build_canvas`], then [`generate`] writes a
//! batch of copies, each seen through a fresh random perspective warp.

pub mod batch;
pub mod board;
pub mod config;
pub mod error;
pub mod homography;
pub mod types;
pub mod warp;

pub use batch::{generate, generate_with, spawn, spawn_with, BatchHandle, BatchOptions, Progress};
pub use board::build_canvas;
pub use config::{BoardConfig, GenerationConfig, OutputFormat};
pub use error::{ConfigError, Error};
pub use homography::Homography;
pub use types::*;
