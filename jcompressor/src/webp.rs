//! WebP出力
//!
//! ネイティブのlibwebpを使う実装と、常に [`CompressError::WebPUnsupported`] を返す
//! スタブ実装がある。どちらを使うかは起動時に [`default_backend`] で選び、
//! 変換処理には `&dyn WebPEncoder` として渡す。

use std::path::Path;

use image::DynamicImage;

use crate::error::{CompressError, Result};

/// WebPエンコーダーの共通インターフェース
pub trait WebPEncoder: Send + Sync {
    /// バックエンド名（ログ表示用）
    fn name(&self) -> &'static str;

    /// デコード済みの画像をWebPにエンコードして書き込む
    fn encode_webp(&self, image: Option<&DynamicImage>, output_path: &Path, quality: u8) -> Result<()>;

    /// JPEGファイルを読み込み、WebPとして書き込む
    fn compress_file_to_webp(&self, input_path: &Path, output_path: &Path, quality: u8) -> Result<()>;
}

/// 1-100の品質値をlibwebpの0.0-100.0に線形に対応させる
pub fn webp_quality(quality: u8) -> f32 {
    crate::compressor::clamp_quality(quality as i64) as f32
}

/// WebP非対応ビルド用のスタブ
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedWebP;

impl WebPEncoder for UnsupportedWebP {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn encode_webp(&self, _image: Option<&DynamicImage>, _output_path: &Path, _quality: u8) -> Result<()> {
        Err(CompressError::WebPUnsupported)
    }

    fn compress_file_to_webp(&self, _input_path: &Path, _output_path: &Path, _quality: u8) -> Result<()> {
        Err(CompressError::WebPUnsupported)
    }
}

#[cfg(feature = "webp")]
pub use native::NativeWebP;

#[cfg(feature = "webp")]
mod native {
    use std::path::Path;

    use image::DynamicImage;
    use log::debug;

    use super::{webp_quality, WebPEncoder};
    use crate::compressor::{decode_jpeg, validate_extension};
    use crate::error::{CompressError, Result};
    use crate::util::fs::write_atomically;

    /// WebPで表現できる最大の幅・高さ
    const MAX_DIMENSION: u32 = 16383;

    /// libwebpによる非可逆エンコード
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativeWebP;

    impl NativeWebP {
        pub fn encode_to_vec(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
            let rgba = image.to_rgba8();
            let (width, height) = rgba.dimensions();
            if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
                return Err(CompressError::encode(
                    "WebP",
                    format!("{}x{} is outside the supported size range", width, height),
                ));
            }

            let memory = ::webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                .encode(webp_quality(quality));
            if memory.is_empty() {
                return Err(CompressError::encode("WebP", "libwebp produced no output"));
            }
            debug!(
                "WebPエンコード完了: {}x{} (品質: {}, {} bytes)",
                width,
                height,
                quality,
                memory.len()
            );
            Ok(memory.to_vec())
        }
    }

    impl WebPEncoder for NativeWebP {
        fn name(&self) -> &'static str {
            "libwebp"
        }

        fn encode_webp(&self, image: Option<&DynamicImage>, output_path: &Path, quality: u8) -> Result<()> {
            let image = image.ok_or_else(|| CompressError::validation("no image to encode as WebP"))?;
            let bytes = self.encode_to_vec(image, quality)?;
            write_atomically(output_path, &bytes)
        }

        fn compress_file_to_webp(&self, input_path: &Path, output_path: &Path, quality: u8) -> Result<()> {
            validate_extension(input_path)?;
            let image = decode_jpeg(input_path)?;
            self.encode_webp(Some(&image), output_path, quality)
        }
    }
}

/// 利用可能なWebPバックエンドを返す
pub fn default_backend() -> Box<dyn WebPEncoder> {
    #[cfg(feature = "webp")]
    {
        Box::new(NativeWebP)
    }
    #[cfg(not(feature = "webp"))]
    {
        Box::new(UnsupportedWebP)
    }
}
