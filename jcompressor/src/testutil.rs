//! ユニットテスト用のフィクスチャ

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, Rgb, RgbImage};

/// 品質差が出るように細かい模様を混ぜたグラデーション画像
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = (((x + y) * 255) / (width + height).max(1)) as u8;
        let noise = if (x / 4 + y / 4) % 2 == 0 { 0 } else { 40 };
        Rgb([r.saturating_add(noise), g, b.saturating_sub(noise)])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn jpeg_bytes(image: &DynamicImage, quality: u8) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .expect("encode fixture");
    buffer
}

/// グラデーションのJPEGを `path` に書き出す（親ディレクトリも作成）
pub fn write_test_jpeg(path: &Path, width: u32, height: u32, quality: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, jpeg_bytes(&gradient_image(width, height), quality)).expect("write fixture");
}

pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).expect("stat").len()
}
