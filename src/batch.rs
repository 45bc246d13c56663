use super::{
    board,
    config::{validate_strength, GenerationConfig, OutputFormat},
    error::{ConfigError, Error},
    homography::Homography,
    types::*,
    warp,
};
use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    ColorType, ImageEncoder,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;
pub const FILE_PREFIX: &str = "chess_gen_";

/// Observer notified after every image written by a batch
pub trait Progress {
    fn image_written(&mut self, index: usize, total: usize, path: &Path);
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn image_written(&mut self, _: usize, _: usize, _: &Path) {}
}

impl<F: FnMut(usize, usize, &Path)> Progress for F {
    fn image_written(&mut self, index: usize, total: usize, path: &Path) {
        self(index, total, path)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub count: u32,
    pub distortion_strength: f64,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    /// Checked once before every image
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    pub fn new(count: u32, distortion_strength: f64, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            count,
            distortion_strength,
            output_dir: output_dir.into(),
            format: OutputFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            cancel: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl From<&GenerationConfig> for BatchOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            format: config.format,
            jpeg_quality: config.jpeg_quality,
            ..Self::new(config.count, config.distortion_strength, &config.output_dir)
        }
    }
}

/// Name of the `index`-th generated file, counting from one
pub fn output_file_name(index: u32, format: OutputFormat) -> String {
    format!("{FILE_PREFIX}{index:03}.{}", format.extension())
}

/// Writes `count` randomly warped JPEG copies of `canvas` into `output_dir`
pub fn generate<R: Rng + ?Sized>(
    canvas: &LumaImg<u8>,
    count: u32,
    distortion_strength: f64,
    output_dir: impl AsRef<Path>,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    let options = BatchOptions::new(count, distortion_strength, output_dir.as_ref());
    generate_with(canvas, &options, rng, &mut NoProgress)
}

/// Writes `options.count` randomly warped copies of `canvas` and returns the
/// written paths in generation order. The batch stops at the first failure;
/// files written before it stay on disk
pub fn generate_with<R: Rng + ?Sized, P: Progress + ?Sized>(
    canvas: &LumaImg<u8>,
    options: &BatchOptions,
    rng: &mut R,
    progress: &mut P,
) -> Result<Vec<PathBuf>> {
    if options.count == 0 {
        return Err(ConfigError::ZeroCount.into());
    }
    validate_strength(options.distortion_strength)?;
    if !(1..=100).contains(&options.jpeg_quality) {
        return Err(ConfigError::QualityOutOfRange(options.jpeg_quality).into());
    }

    let dir = &options.output_dir;
    fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;

    let (width, height) = canvas.dimensions();
    let corners = warp::image_corners(width, height);
    let total = options.count as usize;
    log::info!(
        "generating {total} {width}x{height} images with distortion {} into {}",
        options.distortion_strength,
        dir.display()
    );

    let mut written = Vec::with_capacity(total);
    for index in 1..=options.count {
        if options.is_cancelled() {
            log::warn!("batch cancelled after {} images", written.len());
            return Err(Error::Cancelled {
                completed: written.len(),
            });
        }

        let quad = warp::random_quad(width, height, options.distortion_strength, rng);
        let geometry = |reason| Error::Geometry { index, reason };
        let transform = Homography::from_quads(&corners, &quad).map_err(geometry)?;
        let warped = warp::warp_perspective(canvas, &transform, board::WHITE).map_err(geometry)?;

        let path = dir.join(output_file_name(index, options.format));
        save(&warped, &path, options.format, options.jpeg_quality)?;
        log::debug!("wrote {}", path.display());

        progress.image_written(index as usize, total, &path);
        written.push(path);
    }

    log::info!("completed, {} images generated", written.len());
    Ok(written)
}

fn save(image: &LumaImg<u8>, path: &Path, format: OutputFormat, quality: u8) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let mut writer = BufWriter::new(file);

    let (width, height) = image.dimensions();
    let encoded = match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut writer, quality).encode(
            image.as_raw(),
            width,
            height,
            ColorType::L8,
        ),
        OutputFormat::Png => {
            PngEncoder::new(&mut writer).write_image(image.as_raw(), width, height, ColorType::L8)
        }
    };
    encoded.map_err(|source| Error::Encode {
        path: path.to_owned(),
        source,
    })?;

    writer.flush().map_err(|err| Error::io(path, err))
}

/// Runs a whole configured batch on the calling thread
pub fn run<P: Progress + ?Sized>(
    config: &GenerationConfig,
    progress: &mut P,
) -> Result<Vec<PathBuf>> {
    execute(config, None, progress)
}

fn execute<P: Progress + ?Sized>(
    config: &GenerationConfig,
    cancel: Option<Arc<AtomicBool>>,
    progress: &mut P,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let canvas = board::build_canvas(&config.board)?;

    let mut rng = match config.seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy(),
    };

    let options = BatchOptions {
        cancel,
        ..BatchOptions::from(config)
    };
    generate_with(&canvas, &options, &mut rng, progress)
}

/// A batch running on its own worker thread
pub struct BatchHandle {
    cancel: Arc<AtomicBool>,
    done: mpsc::Receiver<Result<Vec<PathBuf>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl BatchHandle {
    /// Asks the worker to stop before its next image
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Blocks until the batch completes or fails
    pub fn wait(mut self) -> Result<Vec<PathBuf>> {
        let result = self.done.recv().unwrap_or(Err(Error::WorkerLost));
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        result
    }

    /// Returns the outcome if the batch has finished. The outcome is handed out once
    pub fn try_result(&self) -> Option<Result<Vec<PathBuf>>> {
        match self.done.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(Error::WorkerLost)),
        }
    }
}

/// Starts `config` on a worker thread that owns its own canvas and RNG
pub fn spawn(config: GenerationConfig) -> BatchHandle {
    spawn_with(config, NoProgress)
}

pub fn spawn_with<P>(config: GenerationConfig, mut progress: P) -> BatchHandle
where
    P: Progress + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, done) = mpsc::channel();

    let flag = Arc::clone(&cancel);
    let worker = thread::spawn(move || {
        let result = execute(&config, Some(flag), &mut progress);
        let _ = tx.send(result);
    });

    BatchHandle {
        cancel,
        done,
        worker: Some(worker),
    }
}
