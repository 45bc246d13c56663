use chessgen::{build_canvas, generate, BoardConfig, GenerationConfig, OutputFormat};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::fs;

#[test]
fn generates_decodable_jpegs_of_canvas_size() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("temp dir");

    let board = BoardConfig::new(10, 7, 80).with_margin(80);
    let canvas = build_canvas(&board).expect("valid board");
    assert_eq!(canvas.dimensions(), (960, 720));

    let mut rng = Pcg64::seed_from_u64(0xDEADC0DE);
    let paths = generate(&canvas, 3, 0.2, dir.path(), &mut rng).expect("batch succeeds");

    let expected = ["chess_gen_001.jpg", "chess_gen_002.jpg", "chess_gen_003.jpg"];
    assert_eq!(paths.len(), expected.len());
    for (path, name) in paths.iter().zip(expected) {
        assert_eq!(path, &dir.path().join(name));

        let decoded = image::open(path).expect("decodable jpeg");
        assert_eq!((decoded.width(), decoded.height()), (960, 720));
    }
}

#[test]
fn warped_images_keep_white_corners() {
    let dir = tempfile::tempdir().expect("temp dir");
    let canvas = build_canvas(&BoardConfig::new(8, 6, 20)).expect("valid board");
    let (w, h) = canvas.dimensions();

    let mut rng = Pcg64::seed_from_u64(12);
    let paths = chessgen::generate_with(
        &canvas,
        &chessgen::BatchOptions {
            format: OutputFormat::Png,
            ..chessgen::BatchOptions::new(4, 0.3, dir.path())
        },
        &mut rng,
        &mut chessgen::batch::NoProgress,
    )
    .expect("batch succeeds");

    for path in paths {
        let img = image::open(&path).expect("decodable png").into_luma8();
        // corners are either margin or border fill, both white
        for (x, y) in [(0, 0), (w - 1, 0), (w - 1, h - 1), (0, h - 1)] {
            assert_eq!(img.get_pixel(x, y)[0], 255, "{} at ({x}, {y})", path.display());
        }
        assert!(img.pixels().any(|p| p[0] == 0), "{} lost the board", path.display());
    }
}

#[test]
fn config_file_drives_a_full_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("images");
    let settings = dir.path().join("settings.json");
    let json = serde_json::json!({
        "board": { "squares_x": 5, "squares_y": 4, "square_size": 16, "margin": 8 },
        "count": 2,
        "distortion_strength": 0.15,
        "output_dir": out,
        "format": "png",
        "seed": 3
    });
    fs::write(&settings, json.to_string()).expect("write settings");

    let config = GenerationConfig::from_json_file(&settings).expect("valid settings");
    let first = config.run().expect("first run");
    let first_bytes: Vec<_> = first.iter().map(|p| fs::read(p).expect("read")).collect();

    let second = config.run().expect("second run");
    assert_eq!(first, second);
    for (path, bytes) in second.iter().zip(&first_bytes) {
        assert_eq!(&fs::read(path).expect("read"), bytes);
        let img = image::open(path).expect("decodable png");
        assert_eq!((img.width(), img.height()), (96, 80));
    }
}
