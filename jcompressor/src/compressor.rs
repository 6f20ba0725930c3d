use std::fs;
use std::io::Read;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, RgbImage};
use log::{debug, info};

use crate::cli::EncoderType;
use crate::error::{CompressError, Result};
use crate::util::formatter::format_bytes;
use crate::util::fs::write_atomically;

#[cfg(feature = "mozjpeg-encoder")]
use mozjpeg::{ColorSpace, Compress};

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// 品質値を1-100に丸める
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8
}

/// 圧縮処理の統計情報
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionStats {
    /// 圧縮率（圧縮後のサイズ / 元のサイズ）を計算
    pub fn get_size_ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        self.compressed_size as f64 / self.original_size as f64
    }

    /// 圧縮率（%表示用）を計算
    pub fn get_compression_ratio(&self) -> f64 {
        1.0 - self.get_size_ratio()
    }

    pub fn get_summary(&self) -> String {
        format!(
            "{} → {} ({:.1}% 削減)",
            format_bytes(self.original_size),
            format_bytes(self.compressed_size),
            self.get_compression_ratio() * 100.0
        )
    }
}

/// 品質値とエンコーダーを保持するJPEG圧縮器
///
/// 構築後は読み取り専用なので、複数の変換で共有してよい。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compressor {
    quality: u8,
    encoder: EncoderType,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Compressor {
    /// 範囲外の品質値は1-100に丸める
    pub fn new(quality: i64) -> Self {
        Self {
            quality: clamp_quality(quality),
            encoder: EncoderType::default(),
        }
    }

    pub fn with_encoder(mut self, encoder: EncoderType) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn encoder(&self) -> EncoderType {
        self.encoder
    }

    /// デコード済みの画像をJPEGにエンコードし、バイト列で返す
    pub fn compress(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let rgb = image.to_rgb8();
        debug!(
            "エンコード開始: {}x{} (品質: {}, エンコーダー: {})",
            rgb.width(),
            rgb.height(),
            self.quality,
            self.encoder
        );
        match self.encoder {
            EncoderType::Mozjpeg => encode_mozjpeg(&rgb, self.quality),
            EncoderType::Image => encode_image(&rgb, self.quality),
        }
    }

    /// デコード済みの画像を圧縮して `output_path` に書き込む
    ///
    /// 書き込んだバイト数を返す。
    pub fn compress_decoded(&self, image: &DynamicImage, output_path: &Path) -> Result<u64> {
        let bytes = self.compress(image)?;
        write_atomically(output_path, &bytes)?;
        Ok(bytes.len() as u64)
    }

    /// デコード済みの画像を圧縮して書き込み、元のサイズと比較した統計を返す
    pub fn compress_image(
        &self,
        image: &DynamicImage,
        original_size: u64,
        output_path: &Path,
    ) -> Result<CompressionStats> {
        let compressed_size = self.compress_decoded(image, output_path)?;
        Ok(CompressionStats {
            original_size,
            compressed_size,
        })
    }

    /// JPEGファイルを再圧縮する
    ///
    /// 入力は全て読み込んでデコードしてから書き込むため、入力と同じパスへの上書きも可能。
    pub fn compress_file(&self, input_path: &Path, output_path: &Path) -> Result<CompressionStats> {
        validate_extension(input_path)?;

        let (image, original_size) = read_jpeg(input_path)?;
        let stats = self.compress_image(&image, original_size, output_path)?;
        info!(
            "圧縮完了: {} → {} ({})",
            input_path.display(),
            output_path.display(),
            stats.get_summary()
        );
        Ok(stats)
    }
}

/// 品質を指定してJPEGファイルを圧縮する
pub fn compress_jpeg(input_path: &Path, output_path: &Path, quality: i64) -> Result<CompressionStats> {
    Compressor::new(quality).compress_file(input_path, output_path)
}

/// 拡張子が `.jpg`/`.jpeg`（大文字小文字を問わない）であることを確認する
pub fn validate_extension(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext == "jpg" || ext == "jpeg" {
        Ok(())
    } else {
        Err(CompressError::UnsupportedFormat {
            extension: if ext.is_empty() {
                String::new()
            } else {
                format!(".{}", ext)
            },
        })
    }
}

/// JPEGファイルを読み込んでデコードする
///
/// ファイルは全てメモリに読み込み、デコード前に閉じる。
pub fn decode_jpeg(input_path: &Path) -> Result<DynamicImage> {
    read_jpeg(input_path).map(|(image, _)| image)
}

/// [`decode_jpeg`] と同じだが、読み込んだファイルのバイト数も返す
pub fn read_jpeg(input_path: &Path) -> Result<(DynamicImage, u64)> {
    let open_err = |source| CompressError::Open {
        path: input_path.to_path_buf(),
        source,
    };

    let mut buffer = Vec::new();
    fs::File::open(input_path)
        .map_err(open_err)?
        .read_to_end(&mut buffer)
        .map_err(open_err)?;

    let image = image::load_from_memory_with_format(&buffer, ImageFormat::Jpeg).map_err(|source| {
        CompressError::Decode {
            path: input_path.to_path_buf(),
            source,
        }
    })?;
    debug!(
        "デコード完了: {} ({}x{}, {})",
        input_path.display(),
        image.width(),
        image.height(),
        format_bytes(buffer.len() as u64)
    );
    Ok((image, buffer.len() as u64))
}

/// imageクレートのJpegEncoderを使用した圧縮実装
fn encode_image(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| CompressError::encode("JPEG", e))?;
    Ok(buffer)
}

/// mozjpegを使用した高品質圧縮実装
#[cfg(feature = "mozjpeg-encoder")]
fn encode_mozjpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(rgb.width() as usize, rgb.height() as usize);
    comp.set_quality(quality as f32);
    comp.set_optimize_coding(true);

    let mut started = comp
        .start_compress(Vec::new())
        .map_err(|e| CompressError::encode("JPEG", e))?;
    started
        .write_scanlines(rgb.as_raw())
        .map_err(|e| CompressError::encode("JPEG", e))?;
    started.finish().map_err(|e| CompressError::encode("JPEG", e))
}

/// mozjpegが利用できない場合は標準のエンコーダーを使用
#[cfg(not(feature = "mozjpeg-encoder"))]
fn encode_mozjpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    log::warn!("mozjpeg encoder is not compiled in, falling back to the image encoder");
    encode_image(rgb, quality)
}
