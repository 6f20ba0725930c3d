use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use regex::Regex;

use crate::cli::LogLevel;

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// ファイルパスの汎用正規表現（多様なパス形式と拡張子に対応）
fn path_pattern() -> Result<Regex> {
    Ok(Regex::new(
        r#"((^|[\s\(\["'])([A-Za-z]:)?[/\\]([^<>:"\|?*\r\n\s]|[^\x00-\x7F])*\.[a-zA-Z0-9]+)"#,
    )?)
}

/// 数値パターンの汎用正規表現（単位、パーセンテージなど）
fn number_pattern() -> Result<Regex> {
    Ok(Regex::new(
        r"(\b\d+(\.\d+)?\s?([KkMmGg]B|bytes|%)?)|(\d+x\d+)",
    )?)
}

/// ターミナル表示用にメッセージ内のパスと数値を色付けする
///
/// パスを緑、それ以外の部分の数値を紫にする。
pub fn highlight(message: &str, paths: &Regex, numbers: &Regex) -> String {
    let color_numbers = |text: &str| {
        numbers
            .replace_all(text, |caps: &regex::Captures| {
                caps[0].purple().bold().to_string()
            })
            .into_owned()
    };

    let mut colored_message = String::with_capacity(message.len());
    let mut last = 0;
    for m in paths.find_iter(message) {
        colored_message.push_str(&color_numbers(&message[last..m.start()]));
        colored_message.push_str(&m.as_str().green().to_string());
        last = m.end();
    }
    colored_message.push_str(&color_numbers(&message[last..]));
    colored_message
}

/// ロガーを初期化する
///
/// 標準出力は変換結果の表示に使うため、ログは標準エラー出力に流す。
/// `log_file` が指定された場合は色なしの行を追記する。
pub fn init_logger(log_level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let level_filter = LevelFilter::from(log_level);

    // カラー設定
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    let paths = path_pattern()?;
    let numbers = number_pattern()?;

    let stderr = fern::Dispatch::new()
        .format(move |out, message, record| {
            // 時間を青色で表示
            let timestamp = Local::now()
                .format("[%Y-%m-%d %H:%M:%S]")
                .to_string()
                .blue()
                .bold();

            // モジュール名を黄色で表示
            let module = record.target();
            let target_parts: Vec<&str> = module.split("::").collect();
            let target = if target_parts.len() > 1 {
                format!(
                    "[{}::{}]",
                    target_parts[0].yellow(),
                    target_parts[1..].join("::").yellow().bold()
                )
            } else {
                format!("[{}]", module.yellow())
            };

            let message = highlight(&message.to_string(), &paths, &numbers);
            out.finish(format_args!(
                "{} {} [{}] {}",
                timestamp,
                target,
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(level_filter)
        // 依存クレートのログは警告以上のみ
        .level_for("mozjpeg", LevelFilter::Warn)
        .chain(stderr);

    if let Some(path) = log_file {
        let file = fern::log_file(path)
            .with_context(|| format!("failed to open log file: {}", path.display()))?;
        let plain = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} [{}] [{}] {}",
                    Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .chain(file);
        dispatch = dispatch.chain(plain);
    }

    dispatch
        .apply()
        .context("failed to install the logger")?;
    Ok(())
}
