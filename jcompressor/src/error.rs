//! 変換処理の各段階で共通して使うエラー型

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 変換を中断させるエラーの一覧
///
/// `HelpRequested` と `WebPUnsupported` は入力の失敗ではない。
/// バイナリ側でヘルプ表示（終了コード0）や再ビルドの案内に使い分ける。
#[derive(Error, Debug)]
pub enum CompressError {
    /// フラグや引数の数が不正
    #[error("{0}")]
    Usage(String),

    /// `-h`/`--help` または `-V`/`--version`（表示用テキストを保持）
    #[error("help requested")]
    HelpRequested(String),

    /// 範囲外などの不正なパラメータ
    #[error("{0}")]
    Validation(String),

    /// 入力ファイルの拡張子が `.jpg`/`.jpeg` ではない
    #[error("input file must be a JPEG image (got {extension:?})")]
    UnsupportedFormat { extension: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("failed to open input file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode JPEG image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {format} image: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("WebP support is not available in this build (requires the `webp` feature and libwebp)")]
    WebPUnsupported,
}

pub type Result<T> = std::result::Result<T, CompressError>;

impl CompressError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_path<T: Into<String>>(msg: T) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn encode<T: ToString>(format: &'static str, err: T) -> Self {
        Self::Encode {
            format,
            message: err.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// WebP非対応ビルドのスタブが返すエラーかどうか
    pub fn is_webp_unsupported(&self) -> bool {
        matches!(self, Self::WebPUnsupported)
    }
}
