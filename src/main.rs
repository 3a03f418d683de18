//! # 证件篡改检测工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果输出。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use doc_tamper::comparison::{ComparisonHandler, ImageSource, RegionSet};
use doc_tamper::error::AppError;
use doc_tamper::settings;
use doc_tamper::storage::{self, DeliveredArtifacts, DirectorySink};

#[derive(Parser, Debug)]
#[command(name = "doc-tamper", version, about = "Compare an uploaded document image against the stored reference")]
struct Cli {
    /// Uploaded image to check
    candidate: PathBuf,

    /// JSON config file
    #[arg(long, default_value = "doc-tamper.json")]
    config: PathBuf,

    /// Directory holding image.{jpg,jpeg,png,webp,bmp}
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Directory receiving the normalized upload
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Directory receiving the annotated artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also write the 2x2 comparison montage
    #[arg(long)]
    montage: bool,

    /// Print a JSON summary instead of the plain label
    #[arg(long)]
    json: bool,

    /// Write the effective config (after overrides) back to --config
    #[arg(long)]
    save_config: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    score: f64,
    percentage: f64,
    label: String,
    otsu_level: u8,
    regions: &'a RegionSet,
    artifacts: &'a DeliveredArtifacts,
    finished_at: String,
}

#[derive(Serialize)]
struct FailureSummary<'a> {
    error: &'a AppError,
    finished_at: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("比对失败: {err}");
            if json {
                let summary = FailureSummary {
                    error: &err,
                    finished_at: chrono::Local::now().to_rfc3339(),
                };
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("error: {err}"),
                }
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = settings::load_config(&cli.config)?;
    if let Some(dir) = cli.reference_dir {
        config.reference_dir = dir;
    }
    if let Some(dir) = cli.upload_dir {
        config.upload_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    config.write_montage |= cli.montage;

    let handler = ComparisonHandler::new(config)?;
    if cli.save_config {
        settings::save_config(&cli.config, handler.config())?;
        log::info!("配置已保存到 {}", cli.config.display());
    }
    let reference = storage::locate_reference(&handler.config().reference_dir)?;
    let mut sink = DirectorySink::from_config(handler.config());

    let (report, artifacts) = handler.compare_and_deliver(
        ImageSource::FilePath(reference),
        ImageSource::FilePath(cli.candidate),
        &mut sink,
    )?;

    if cli.json {
        let summary = Summary {
            score: report.similarity.score,
            percentage: report.percentage(),
            label: report.label(),
            otsu_level: report.extraction.level,
            regions: report.regions(),
            artifacts: &artifacts,
            finished_at: chrono::Local::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{json}");
    } else {
        println!("{}", report.label());
    }

    Ok(())
}
