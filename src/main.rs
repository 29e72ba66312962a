use crate::config::{Cli, HarvestConfig};
use crate::errors::AppError;
use crate::exports::{write_extra_xlsx, write_outputs, WriteOutcome};
use crate::pipeline::{Pipeline, PipelineReport, StrategyStatus};
use crate::scraper::{CancelFlag, HttpFetcher, RunContext, Strategy};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod domain;
mod errors;
mod exports;
mod pipeline;
mod scraper;

#[cfg(test)]
mod tests;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "harvest failed");
            eprintln!("❌ {e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = HarvestConfig::from_cli(cli)?;

    println!("🚗 Listing harvest for \"{}\"", config.query);
    println!("{}", "=".repeat(60));

    // Ctrl+C only raises the flag; strategies unwind and close their sessions.
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.cancel()) {
        tracing::warn!(error = %e, "could not install Ctrl+C handler");
    }

    if let Some(dir) = &config.debug_dump {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot create debug dump directory");
        }
    }

    let fetcher = HttpFetcher::new()?;
    let strategies = config
        .strategies
        .iter()
        .map(|kind| Strategy::from_kind(*kind, &config))
        .collect();

    let ctx = RunContext {
        fetcher: &fetcher,
        cancel,
        pacing: config.pacing.clone(),
        debug_dump: config.debug_dump.clone(),
    };

    let report = Pipeline::new(strategies, config.limits, ctx).run(&config.query);

    print_summary(&report);

    if report.is_empty() {
        print_guidance();
        return Ok(if config.fail_on_empty {
            ExitCode::from(2)
        } else {
            ExitCode::SUCCESS
        });
    }

    if let WriteOutcome::Written { files, count } =
        write_outputs(&report.listings, &config.csv_path(), &config.json_path())?
    {
        for file in files {
            println!("💾 Saved {}", file.display());
        }
        if config.xlsx {
            let path = config.xlsx_path();
            match write_extra_xlsx(&report.listings, &path) {
                Some(saved) => println!("💾 Saved {}", saved.display()),
                None => println!("⚠ Could not save {}", path.display()),
            }
        }
        println!("\n🎉 SUCCESS! Total listings collected: {count}");
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &PipelineReport) {
    println!();
    for (i, s) in report.strategies.iter().enumerate() {
        let status = match &s.status {
            StrategyStatus::Ok => format!("✅ {} listings ({} raw)", s.kept_count, s.raw_count),
            StrategyStatus::Empty => "❌ nothing found".to_string(),
            StrategyStatus::Failed(msg) => format!("❌ error: {msg}"),
            StrategyStatus::Skipped => "⏭ skipped".to_string(),
        };
        println!(
            "🔧 METHOD {}: {:<16} [{}] {}",
            i + 1,
            s.name,
            s.source,
            status
        );
    }

    if report.duplicates_removed > 0 {
        println!("🔁 {} duplicate listings removed", report.duplicates_removed);
    }
    if report.interrupted {
        println!("⚠ Interrupted; keeping what was collected so far");
    }
}

fn print_guidance() {
    println!("\n❌ No listings found with any method");
    println!("💡 Recommendations:");
    println!("   • Try running at different times");
    println!("   • Use a VPN service");
    println!("   • Consider manual data collection");
    println!("   • Look into paid proxy services");
}
