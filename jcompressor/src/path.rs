use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;

use crate::error::{CompressError, Result};

/// ファイルモードで拡張子の前に挿入するサフィックス
pub const COMPRESSED_SUFFIX: &str = "_compressed";

/// ディレクトリモードで出力先が未指定の場合のディレクトリ
pub const DEFAULT_OUTPUT_DIR: &str = "./compressed";

/// 省略可能なOUTPUT引数の解釈方法
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// OUTPUTはディレクトリ（ファイル名は入力と同じ）
    #[default]
    Directory,
    /// OUTPUTは出力ファイルそのもの
    File,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Directory => write!(f, "directory"),
            OutputMode::File => write!(f, "file"),
        }
    }
}

/// `photo.jpg` -> `photo_compressed.jpg`（親ディレクトリはそのまま）
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut name = OsString::from(stem);
    name.push(COMPRESSED_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// ファイルシステムに触れずに `.` と `..` を畳み込む
///
/// ルートより上には遡らない。相対パス先頭の `..` は残す。
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` を絶対パスに変換して正規化する
pub fn normalize(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(CompressError::invalid_path("empty path"));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|e| {
            CompressError::invalid_path(format!(
                "cannot resolve {} against the current directory: {}",
                path.display(),
                e
            ))
        })?;
        cwd.join(path)
    };

    let cleaned = clean(&absolute);
    if cleaned.as_os_str().is_empty() || !cleaned.is_absolute() {
        return Err(CompressError::invalid_path(format!(
            "{} does not resolve to an absolute path",
            path.display()
        )));
    }
    Ok(cleaned)
}

/// `input` に対するJPEGの最終的な出力先を決定する
///
/// ディレクトリモードでは `output`（未指定なら [`DEFAULT_OUTPUT_DIR`]）に入力のファイル名を連結し、
/// ファイルモードでは `output`（未指定なら [`default_output_path`]）をそのまま使う。
/// ディレクトリの作成は行わない。
pub fn resolve_output_location(
    input: &Path,
    output: Option<&Path>,
    mode: OutputMode,
) -> Result<PathBuf> {
    let target = match mode {
        OutputMode::Directory => {
            let file_name = input.file_name().ok_or_else(|| {
                CompressError::invalid_path(format!(
                    "input {} has no file name",
                    input.display()
                ))
            })?;
            let dir = output.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
            normalize(dir)?.join(file_name)
        }
        OutputMode::File => match output {
            Some(path) => normalize(path)?,
            None => normalize(&default_output_path(input))?,
        },
    };

    if target.file_name().is_none() {
        return Err(CompressError::invalid_path(format!(
            "{} does not name a file",
            target.display()
        )));
    }
    Ok(target)
}

/// JPEG出力と同じ場所に置くWebPファイルのパス
pub fn webp_sibling(jpeg_output: &Path) -> PathBuf {
    jpeg_output.with_extension("webp")
}
