//! 1ファイル分の変換処理
//!
//! 出力先の決定 → ディレクトリ準備 → JPEG再圧縮 → （必要なら）WebP出力 を順に実行する。
//! 途中で失敗した場合はそこで打ち切り、それまでに書き込んだファイルはそのまま残す。

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cli::ConversionRequest;
use crate::compressor::{read_jpeg, validate_extension, CompressionStats, Compressor};
use crate::error::{CompressError, Result};
use crate::path::{resolve_output_location, webp_sibling};
use crate::util::fs::ensure_dir;
use crate::webp::WebPEncoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jpeg => write!(f, "JPEG"),
            OutputFormat::WebP => write!(f, "WebP"),
        }
    }
}

/// 書き込んだ出力ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub format: OutputFormat,
}

/// 変換結果
///
/// `error` が `Some` でも `written` には失敗前に書き込んだファイルが入る。
#[derive(Debug, Default)]
pub struct ConversionResult {
    pub written: Vec<WrittenFile>,
    pub stats: Option<CompressionStats>,
    pub error: Option<CompressError>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn written_paths(&self) -> impl Iterator<Item = &Path> {
        self.written.iter().map(|w| w.path.as_path())
    }

    /// 失敗していればエラーを返す
    pub fn into_result(self) -> Result<Vec<WrittenFile>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.written),
        }
    }
}

/// JPEGとWebPの出力先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub jpeg: PathBuf,
    pub webp: Option<PathBuf>,
}

/// リクエストから出力先を決定する（ファイルシステムには触れない）
///
/// WebPの出力先がJPEGの出力先と同じになる場合はエラーにする。
pub fn plan_outputs(request: &ConversionRequest) -> Result<OutputPlan> {
    let jpeg = resolve_output_location(&request.input_path, request.output.as_deref(), request.mode)?;
    let webp = request.produce_webp.then(|| webp_sibling(&jpeg));
    if webp.as_ref() == Some(&jpeg) {
        return Err(CompressError::validation(format!(
            "JPEG output {} would be overwritten by the WebP copy; choose a .jpg/.jpeg output name",
            jpeg.display()
        )));
    }
    Ok(OutputPlan { jpeg, webp })
}

/// 1件の変換を実行する
pub fn run_conversion(request: &ConversionRequest, webp: &dyn WebPEncoder) -> ConversionResult {
    let mut result = ConversionResult::default();
    if let Err(e) = convert_into(request, webp, &mut result) {
        result.error = Some(e);
    }
    result
}

fn convert_into(
    request: &ConversionRequest,
    webp: &dyn WebPEncoder,
    result: &mut ConversionResult,
) -> Result<()> {
    validate_extension(&request.input_path)?;
    let plan = plan_outputs(request)?;
    info!(
        "変換開始: {} → {} (品質: {}, モード: {}, エンコーダー: {})",
        request.input_path.display(),
        plan.jpeg.display(),
        request.quality,
        request.mode,
        request.encoder
    );

    if let Some(dir) = plan.jpeg.parent() {
        ensure_dir(dir, request.create_dirs)?;
    }

    let (image, original_size) = read_jpeg(&request.input_path)?;

    let compressor = Compressor::new(request.quality as i64).with_encoder(request.encoder);
    let stats = compressor.compress_image(&image, original_size, &plan.jpeg)?;
    info!("JPEG出力: {} ({})", plan.jpeg.display(), stats.get_summary());
    result.stats = Some(stats);
    result.written.push(WrittenFile {
        path: plan.jpeg.clone(),
        format: OutputFormat::Jpeg,
    });

    if let Some(webp_path) = plan.webp {
        debug!("WebPバックエンド: {}", webp.name());
        webp.encode_webp(Some(&image), &webp_path, request.quality)?;
        info!("WebP出力: {}", webp_path.display());
        result.written.push(WrittenFile {
            path: webp_path,
            format: OutputFormat::WebP,
        });
    }

    Ok(())
}
