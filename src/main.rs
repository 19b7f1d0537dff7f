use anyhow::{Context, Result};
use clap::Parser;
use page_harvest::{CancelHandle, Harvest, HarvestConfig, cancel_pair};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            ::log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let Command::Run(run_args) = args.command;

    let mut config = match &run_args.config {
        Some(path) => HarvestConfig::from_file(path)
            .with_context(|| format!("could not load config {}", path.display()))?,
        None => HarvestConfig::default(),
    };
    config.crawl.apply_env();
    run_args.apply_to(&mut config);

    let total_timeout = config.crawl.total_timeout()?;
    let (handle, signal) = cancel_pair();
    cancel_on_ctrl_c(handle.clone());
    if let Some(limit) = total_timeout {
        cancel_after(handle, limit);
    }

    ::log::info!(
        "Crawling requires a WebDriver server (e.g. ChromeDriver) at {}",
        config.crawl.webdriver_url
    );

    let harvest = Harvest::new(config).with_cancel_signal(signal);
    let launcher = Arc::new(harvest.webdriver_launcher());
    let report = harvest
        .run(launcher)
        .await
        .context("could not start crawling")?;

    report.outcome.write_summary_to_stderr(report.duration);
    if report.failed_sinks > 0 {
        ::log::warn!("{} output file(s) could not be written", report.failed_sinks);
    }

    if report.outcome.is_aborted() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn cancel_on_ctrl_c(handle: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupted, finishing in-flight pages and exporting results");
            handle.cancel();
        }
    });
}

fn cancel_after(handle: CancelHandle, limit: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(limit).await;
        ::log::warn!(
            "Total timeout of {:.1}s reached, stopping the crawl",
            limit.as_secs_f64()
        );
        handle.cancel();
    });
}
