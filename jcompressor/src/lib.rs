//! JPEG再圧縮ユーティリティのライブラリクレート
//!
//! JPEG画像を指定品質で再エンコードし、必要に応じてWebPも出力します。
pub mod cli;
pub mod compressor;
pub mod convert;
pub mod error;
pub mod logger;
pub mod path;
pub mod util;
pub mod webp;

#[cfg(test)]
mod testutil;

pub use cli::{parse_request, Cli, ConversionRequest, EncoderType};
pub use compressor::{compress_jpeg, CompressionStats, Compressor};
pub use convert::{run_conversion, ConversionResult, OutputFormat, WrittenFile};
pub use error::{CompressError, Result};
pub use path::OutputMode;
pub use webp::{default_backend, UnsupportedWebP, WebPEncoder};

#[cfg(feature = "webp")]
pub use webp::NativeWebP;
