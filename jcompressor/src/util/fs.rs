use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{CompressError, Result};

/// 一時ファイルに書き込んでから出力先にリネームする
///
/// 途中で失敗しても出力先には中途半端なファイルが残らない。
/// 新規ファイルのパーミッションはumaskに従い、既存ファイルを上書きする場合はそのパーミッションを引き継ぐ。
/// 出力先がシンボリックリンクの場合はリンク先のファイルを置き換える。
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let target = resolve_symlink(path).map_err(|e| CompressError::write(path, e))?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = temp_file_in(dir).map_err(|e| CompressError::write(path, e))?;
    tmp.write_all(bytes)
        .map_err(|e| CompressError::write(path, e))?;
    tmp.flush().map_err(|e| CompressError::write(path, e))?;

    if let Ok(existing) = fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| CompressError::write(path, e))?;
    }

    tmp.persist(&target)
        .map_err(|e| CompressError::write(path, e.error))?;
    Ok(())
}

/// シンボリックリンクならリンク先のパスを返す
fn resolve_symlink(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path).or_else(|_| -> io::Result<PathBuf> {
            // リンク切れの場合はリンク先を新規作成する
            let link = fs::read_link(path)?;
            Ok(path.parent().map(|p| p.join(&link)).unwrap_or(link))
        }),
        _ => Ok(path.to_path_buf()),
    }
}

/// NamedTempFileは既定で0600になるため、0666を要求してumaskを効かせる
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    use tempfile::Builder;

    Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

/// 出力ディレクトリを用意する
///
/// `create` が偽の場合は既存ディレクトリであることだけを確認する。
pub fn ensure_dir(dir: &Path, create: bool) -> Result<()> {
    if create {
        return fs::create_dir_all(dir).map_err(|e| {
            CompressError::invalid_path(format!(
                "failed to create output directory {}: {}",
                dir.display(),
                e
            ))
        });
    }

    if dir.is_dir() {
        Ok(())
    } else {
        Err(CompressError::invalid_path(format!(
            "output directory does not exist: {}",
            dir.display()
        )))
    }
}
