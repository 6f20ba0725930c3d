use std::process::ExitCode;

use anyhow::Result;
use log::{debug, info};

use jcompressor::convert::OutputFormat;
use jcompressor::{
    default_backend, logger, parse_request, run_conversion, CompressError, ConversionRequest,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<CompressError>() {
            Some(CompressError::HelpRequested(text)) => {
                print!("{}", text);
                ExitCode::SUCCESS
            }
            Some(CompressError::Usage(text)) => {
                eprintln!("{}", text);
                ExitCode::FAILURE
            }
            Some(CompressError::WebPUnsupported) => {
                eprintln!("Error: {}", e);
                eprintln!("Rebuild with WebP support enabled: cargo build --features webp");
                ExitCode::FAILURE
            }
            Some(err) => {
                eprintln!("Error: {}", err);
                ExitCode::FAILURE
            }
            None => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run() -> Result<()> {
    // コマンドライン引数の解析
    let (cli, request) = parse_request(std::env::args_os())?;

    // ログ設定
    logger::init_logger(cli.log_level, cli.log_file.as_deref())?;
    display_conversion_config(&request);

    let webp = default_backend();
    debug!("WebPバックエンド: {}", webp.name());

    let result = run_conversion(&request, webp.as_ref());

    // 失敗した場合も書き込み済みのファイルは表示する
    for written in &result.written {
        let label = match written.format {
            OutputFormat::Jpeg => "Successfully compressed",
            OutputFormat::WebP => "Successfully created WebP",
        };
        println!(
            "{} {} -> {} (quality: {})",
            label,
            request.input_path.display(),
            written.path.display(),
            request.quality
        );
    }

    if let Some(stats) = &result.stats {
        info!("容量: {}", stats.get_summary());
    }

    match result.error {
        Some(e) => {
            debug!("変換に失敗しました: {:?}", e);
            Err(e.into())
        }
        None => Ok(()),
    }
}

fn display_conversion_config(request: &ConversionRequest) {
    info!("jcompressor v{}", env!("CARGO_PKG_VERSION"));
    info!(" - 入力ファイル: {}", request.input_path.display());
    info!(
        " - 出力先: {} ({})",
        request
            .output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string()),
        request.mode
    );
    info!(" - 圧縮品質: {}/100", request.quality);
    info!(" - エンコーダー: {}", request.encoder);
    info!(" - WebP出力: {}", if request.produce_webp { "on" } else { "off" });
}
