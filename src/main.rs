use anyhow::{Context, Result};
use chessgen::{batch, GenerationConfig, OutputFormat};
use clap::{ArgAction, Parser};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

const ABOUT: &str = "Chessgen draws a checkerboard calibration target and writes a batch of
copies of it, each seen through a random perspective warp that pulls the image corners
inward. The output is meant for exercising camera calibration and corner detection code.";

/// CLI tool to synthesize perspective-warped checkerboard images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = ABOUT)]
pub struct Args {
    /// JSON file with generation settings, explicit flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of squares along the horizontal axis [default: 10]
    #[arg(long)]
    pub squares_x: Option<u32>,

    /// Number of squares along the vertical axis [default: 7]
    #[arg(long)]
    pub squares_y: Option<u32>,

    /// Side of a single square in pixels [default: 80]
    #[arg(long)]
    pub square_size: Option<u32>,

    /// Blank border around the board in pixels [default: the square size]
    #[arg(long)]
    pub margin: Option<u32>,

    /// Number of images to generate [default: 20]
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Fraction of the image size a corner may move inward, 0.0 to 0.5 [default: 0.2]
    #[arg(short, long)]
    pub distortion: Option<f64>,

    /// Directory receiving the images [default: ChessImages]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Image file format [default: jpeg]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// JPEG quality from 1 to 100 [default: 95]
    #[arg(long)]
    pub quality: Option<u8>,

    /// Seed for reproducible batches
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Layers the explicit flags over the settings file and deserializes the
    /// result, so a margin absent from both still follows the square size
    fn into_config(self) -> Result<GenerationConfig> {
        let mut settings = match &self.config {
            Some(path) => read_settings(path)?,
            None => json!({}),
        };
        let root = settings
            .as_object_mut()
            .context("settings file must hold a JSON object")?;

        let board = root
            .entry("board")
            .or_insert_with(|| json!({}))
            .as_object_mut()
            .context("`board` settings must be a JSON object")?;
        put(board, "squares_x", self.squares_x)?;
        put(board, "squares_y", self.squares_y)?;
        put(board, "square_size", self.square_size)?;
        put(board, "margin", self.margin)?;

        put(root, "count", self.count)?;
        put(root, "distortion_strength", self.distortion)?;
        put(root, "output_dir", self.output)?;
        put(root, "format", self.format)?;
        put(root, "jpeg_quality", self.quality)?;
        put(root, "seed", self.seed)?;

        serde_json::from_value(settings).context("settings do not describe a generation run")
    }
}

fn read_settings(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn put<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: Option<T>) -> Result<()> {
    if let Some(value) = value {
        map.insert(key.to_owned(), serde_json::to_value(value)?);
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.into_config().context("failed to load settings")?;
    config.validate().context("invalid generation settings")?;

    let report = |index: usize, total: usize, path: &Path| {
        log::info!("[{index}/{total}] {}", path.display());
    };
    let paths = batch::spawn_with(config, report)
        .wait()
        .context("image generation failed")?;

    for path in &paths {
        println!("{}", path.display());
    }
    println!("Completed. {} images generated.", paths.len());
    Ok(())
}
