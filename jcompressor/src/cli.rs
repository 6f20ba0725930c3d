use std::ffi::OsString;
use std::fmt;
use std::num::IntErrorKind;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use crate::compressor::{validate_extension, MAX_QUALITY, MIN_QUALITY};
use crate::error::{CompressError, Result};
use crate::path::OutputMode;

/// デフォルトの圧縮品質
pub const DEFAULT_QUALITY: i64 = 50;

/// コマンドライン引数の解析のためのデータ構造
#[derive(Parser, Debug)]
#[command(
    name = "jcompressor",
    author,
    version,
    about = "Re-encode a JPEG at a lower quality, optionally writing a WebP copy",
    after_help = "In directory mode OUTPUT is a directory (default ./compressed) and the file keeps its name.\nIn file mode OUTPUT is the destination file (default <name>_compressed.<ext>)."
)]
pub struct Cli {
    /// 入力JPEGファイル
    #[arg(value_name = "INPUT", help = "JPEG file to compress (.jpg/.jpeg)")]
    pub input: PathBuf,

    /// 出力先（モードによりディレクトリまたはファイル）
    #[arg(value_name = "OUTPUT", help = "Output directory or file, depending on --mode")]
    pub output: Option<PathBuf>,

    /// 圧縮の品質（1-100、高いほど高品質）
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_QUALITY,
        allow_negative_numbers = true,
        value_parser = parse_quality,
        help = "JPEG/WebP quality (1-100)"
    )]
    pub quality: i64,

    /// WebPファイルも出力する
    #[arg(short, long, help = "Also write a WebP copy next to the JPEG output")]
    pub webp: bool,

    /// OUTPUTの解釈方法
    #[arg(short, long, value_enum, default_value_t = OutputMode::Directory, help = "How OUTPUT is interpreted")]
    pub mode: OutputMode,

    /// 出力ディレクトリを自動作成しない
    #[arg(long, help = "Fail instead of creating a missing output directory")]
    pub no_create_dir: bool,

    /// エンコーダーの種類（mozjpeg=高品質・高圧縮率, image=imageクレートのJpegEncoder）
    #[arg(short = 'e', long, value_enum, default_value_t = EncoderType::Mozjpeg, help = "JPEG encoder backend")]
    pub encoder: EncoderType,

    /// ログレベル（error=エラーのみ, warn=警告, info=情報, debug=デバッグ, trace=詳細デバッグ）
    #[arg(short, long, value_enum, default_value_t = LogLevel::Warn, help = "Log level for diagnostics on stderr")]
    pub log_level: LogLevel,

    /// ログファイルのパス
    #[arg(long, value_name = "PATH", help = "Also append log lines to this file")]
    pub log_file: Option<PathBuf>,
}

/// ログレベルの列挙型
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// エンコーダーの種類の列挙型
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EncoderType {
    /// mozjpegエンコーダー（高品質・高圧縮率）
    #[default]
    Mozjpeg,
    /// imageクレートのJpegEncoder
    Image,
}

impl fmt::Display for EncoderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderType::Mozjpeg => write!(f, "mozjpeg"),
            EncoderType::Image => write!(f, "image"),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// 1回の変換に必要なパラメータ（検証済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: OutputMode,
    pub quality: u8,
    pub produce_webp: bool,
    pub create_dirs: bool,
    pub encoder: EncoderType,
}

impl ConversionRequest {
    /// 既定値で組み立てる（品質50、ディレクトリモード）
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output: None,
            mode: OutputMode::Directory,
            quality: DEFAULT_QUALITY as u8,
            produce_webp: false,
            create_dirs: true,
            encoder: EncoderType::default(),
        }
    }
}

impl Cli {
    /// 引数を検証して [`ConversionRequest`] に変換する
    ///
    /// ファイルには一切アクセスしない。
    pub fn to_request(&self) -> Result<ConversionRequest> {
        let quality = quality_validator(self.quality)?;
        validate_extension(&self.input)?;

        Ok(ConversionRequest {
            input_path: self.input.clone(),
            output: self.output.clone(),
            mode: self.mode,
            quality,
            produce_webp: self.webp,
            create_dirs: !self.no_create_dir,
            encoder: self.encoder,
        })
    }
}

/// 品質パラメータの解析
///
/// i64に収まらない整数は飽和させ、範囲外として [`quality_validator`] で検証する。
fn parse_quality(value: &str) -> std::result::Result<i64, String> {
    value.parse::<i64>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(format!("invalid quality value: {}", value)),
    })
}

/// 品質パラメータのバリデーション（1-100の範囲内であることを確認）
fn quality_validator(quality: i64) -> Result<u8> {
    if (MIN_QUALITY as i64..=MAX_QUALITY as i64).contains(&quality) {
        Ok(quality as u8)
    } else {
        Err(CompressError::validation(format!(
            "quality must be between {} and {} (got {})",
            MIN_QUALITY, MAX_QUALITY, quality
        )))
    }
}

/// 引数（先頭はプログラム名）を解析する
///
/// ヘルプとバージョン表示は [`CompressError::HelpRequested`]、
/// それ以外のclapのエラーは [`CompressError::Usage`] になる。
pub fn parse_cli<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            CompressError::HelpRequested(e.render().to_string())
        }
        _ => CompressError::Usage(e.render().to_string().trim_end().to_string()),
    })
}

/// 引数を解析し、検証済みの [`ConversionRequest`] を返す
pub fn parse_request<I, T>(args: I) -> Result<(Cli, ConversionRequest)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = parse_cli(args)?;
    let request = cli.to_request()?;
    Ok((cli, request))
}
