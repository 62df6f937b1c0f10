#![deny(clippy::all)]
#![forbid(unsafe_code)]

use std::{ops::Deref, panic, path::PathBuf, process::ExitCode};

use clap::Parser;
use rvolib::{
    annotate,
    cfg::{self, get_log_folder, Cfg},
    demo,
    file_util::path_to_str,
    result::{trace_ok_err, RvResult},
    tracing_setup,
    util::version_label,
    AnnotateReport, DEFAULT_OUTPUT_PATH,
};
use tracing::{error, info};

/// Draws the normalized bounding boxes of a json annotation file onto an image.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    image_path: PathBuf,
    json_path: PathBuf,
    #[arg(default_value = DEFAULT_OUTPUT_PATH)]
    output_path: PathBuf,
    /// Config file, defaults to ~/.rvoverlay/rvo_cfg.toml
    #[arg(long)]
    cfg: Option<PathBuf>,
    /// Write a demo annotation file if the json file does not exist
    #[arg(long)]
    demo_if_missing: bool,
}

fn run(cli: &Cli, cfg: &Cfg) -> RvResult<AnnotateReport> {
    if cli.demo_if_missing && demo::write_demo_if_missing(&cli.json_path)? {
        info!("wrote demo annotations to {}", path_to_str(&cli.json_path)?);
    }
    annotate(&cli.image_path, &cli.json_path, &cli.output_path, cfg)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match &cli.cfg {
        Some(cfg_path) => cfg::read_cfg(cfg_path),
        None => cfg::get_cfg(),
    };
    let log_folder = get_log_folder(cfg.as_ref().unwrap_or(&Cfg::default()));
    let _guard_flush_to_logfile = tracing_setup::tracing_setup(&log_folder);
    info!("rvoverlay {}", version_label());
    let cfg = trace_ok_err(cfg).unwrap_or_else(cfg::get_default_cfg);

    match panic::catch_unwind(|| run(&cli, &cfg)) {
        Ok(Ok(report)) => {
            info!(
                "drew {} annotations onto {:?} using the {}, {} warnings",
                report.drawn.len(),
                report.output_path,
                report.font,
                report.warnings.len()
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            let panic_s = e
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| e.downcast_ref::<&'static str>().map(Deref::deref));
            error!("{:?}", panic_s);
            if let Some(b) = tracing_setup::BACKTRACE.with(|b| b.borrow_mut().take()) {
                error!("{:?}", b);
            }
            ExitCode::FAILURE
        }
    }
}
