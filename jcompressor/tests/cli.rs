//! ビルド済みバイナリを実行する結合テスト

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb, RgbImage};
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32, quality: u8) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let noise = if (x / 3 + y / 3) % 2 == 0 { 0 } else { 60 };
        Rgb([
            ((x * 255 / width) as u8).saturating_add(noise),
            (y * 255 / height) as u8,
            (((x + y) * 255) / (width + height)) as u8,
        ])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode(img.as_raw(), width, height, ColorType::Rgb8)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

fn jcompressor(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jcompressor"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run jcompressor")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn is_jpeg(path: &Path) -> bool {
    fs::read(path)
        .map(|b| b.starts_with(&[0xFF, 0xD8]))
        .unwrap_or(false)
}

#[test]
fn basic_compression_into_directory() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("input.jpg"), 120, 90, 95);

    let out = jcompressor(dir.path(), &["-q", "40", "input.jpg", "results"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let expected = dir.path().join("results").join("input.jpg");
    assert!(is_jpeg(&expected));
    let text = stdout(&out);
    assert!(text.contains("Successfully compressed"), "{}", text);
    assert!(text.contains("quality: 40"), "{}", text);
    assert!(text.contains("results"), "{}", text);
}

#[test]
fn default_output_directory() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("photo.jpg"), 40, 40, 90);

    let out = jcompressor(dir.path(), &["photo.jpg"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(is_jpeg(&dir.path().join("compressed").join("photo.jpg")));
}

#[test]
fn file_mode_default_name() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("photo.jpg"), 40, 40, 90);

    let out = jcompressor(dir.path(), &["--mode", "file", "photo.jpg"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(is_jpeg(&dir.path().join("photo_compressed.jpg")));
}

#[test]
fn file_mode_overwrites_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("same.jpeg");
    write_jpeg(&input, 80, 80, 95);
    let before = fs::read(&input).unwrap();

    let out = jcompressor(dir.path(), &["-m", "file", "-q", "15", "same.jpeg", "same.jpeg"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(is_jpeg(&input));
    assert_ne!(fs::read(&input).unwrap(), before);
}

#[test]
fn no_create_dir_requires_existing_directory() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("photo.jpg"), 20, 20, 90);

    let out = jcompressor(dir.path(), &["--no-create-dir", "photo.jpg", "missing"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("output directory does not exist"));
    assert!(!dir.path().join("missing").exists());
}

#[test]
fn help_exits_zero() {
    let dir = TempDir::new().unwrap();
    for flag in ["-h", "--help"] {
        let out = jcompressor(dir.path(), &[flag]);
        assert_eq!(out.status.code(), Some(0));
        assert!(stdout(&out).contains("Usage"), "{}", stdout(&out));
    }
}

#[test]
fn invalid_arguments_exit_one() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("input.jpg"), 10, 10, 90);

    let cases: &[(&[&str], &str)] = &[
        (&[], "INPUT"),
        (&["-q", "0", "input.jpg"], "quality must be between 1 and 100"),
        (&["-q", "101", "input.jpg"], "quality must be between 1 and 100"),
        (&["-q", "-10", "input.jpg"], "quality must be between 1 and 100"),
        (&["-q", "99999999999999999999", "input.jpg"], "quality must be between 1 and 100"),
        (&["input.jpg", "out", "extra"], "unexpected argument"),
        (&["image.png"], "must be a JPEG image"),
    ];
    for (args, needle) in cases {
        let out = jcompressor(dir.path(), args);
        assert_eq!(out.status.code(), Some(1), "{:?}", args);
        assert!(stderr(&out).contains(needle), "{:?}: {}", args, stderr(&out));
        assert!(stdout(&out).is_empty(), "{:?}", args);
    }
}

#[test]
fn missing_and_corrupt_inputs_exit_one() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fake.jpg"), b"not a jpeg at all").unwrap();

    let missing = jcompressor(dir.path(), &["ghost.jpg"]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("failed to open input file"));

    let corrupt = jcompressor(dir.path(), &["fake.jpg"]);
    assert_eq!(corrupt.status.code(), Some(1));
    assert!(stderr(&corrupt).contains("failed to decode JPEG image"));
    assert!(!dir.path().join("compressed").join("fake.jpg").exists());
}

#[test]
fn lower_quality_gives_smaller_file() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("input.jpg"), 200, 200, 95);

    for (q, sub) in [("90", "high"), ("10", "low")] {
        let out = jcompressor(dir.path(), &["-q", q, "input.jpg", sub]);
        assert!(out.status.success(), "stderr: {}", stderr(&out));
    }

    let high = fs::metadata(dir.path().join("high").join("input.jpg")).unwrap().len();
    let low = fs::metadata(dir.path().join("low").join("input.jpg")).unwrap().len();
    assert!(high >= low, "q90={} q10={}", high, low);
}

#[test]
fn repeated_runs_are_idempotent() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("input.jpg"), 60, 60, 95);

    for _ in 0..3 {
        let out = jcompressor(dir.path(), &["-e", "image", "input.jpg"]);
        assert!(out.status.success(), "stderr: {}", stderr(&out));
    }
    assert!(is_jpeg(&dir.path().join("compressed").join("input.jpg")));
}

#[cfg(feature = "webp")]
#[test]
fn webp_flag_writes_sibling() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("photo.jpg"), 50, 50, 90);

    let out = jcompressor(dir.path(), &["-w", "photo.jpg", "out"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let webp = fs::read(dir.path().join("out").join("photo.webp")).unwrap();
    assert_eq!(&webp[..4], b"RIFF");
    assert_eq!(&webp[8..12], b"WEBP");
    assert!(stdout(&out).contains("Successfully created WebP"));
}

#[cfg(not(feature = "webp"))]
#[test]
fn webp_flag_without_support_fails_after_jpeg() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("photo.jpg"), 50, 50, 90);

    let out = jcompressor(dir.path(), &["-w", "photo.jpg", "out"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("WebP support is not available"));
    assert!(stderr(&out).contains("--features webp"));
    assert!(is_jpeg(&dir.path().join("out").join("photo.jpg")));
    assert!(!dir.path().join("out").join("photo.webp").exists());
}

#[test]
fn webp_copy_cannot_replace_jpeg_output() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("photo.jpg"), 30, 30, 90);

    let out = jcompressor(dir.path(), &["-w", "-m", "file", "photo.jpg", "out.webp"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("would be overwritten by the WebP copy"));
    assert!(stdout(&out).is_empty());
    assert!(!dir.path().join("out.webp").exists());
}

#[test]
fn log_file_receives_plain_lines() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("input.jpg"), 30, 30, 90);

    let out = jcompressor(
        dir.path(),
        &["-l", "info", "--log-file", "run.log", "input.jpg"],
    );

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let log = fs::read_to_string(dir.path().join("run.log")).unwrap();
    assert!(log.contains("[INFO]"), "{}", log);
    assert!(!log.contains('\u{1b}'), "{}", log);
}
