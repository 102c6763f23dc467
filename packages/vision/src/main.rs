//! Connect Vision CLI
//!
//! A thin glue layer that scans a connect template and prints the summary.

use anyhow::Context;
use clap::{ArgAction, Parser};
use colored::Colorize;
use connect_vision::{
    ArtifactStore, ChromeRenderer, Comparator, Config, Environment, FileSessionStore,
    ScanRequest, ScanSummary, Scanner,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "connect-vision")]
#[command(about = "Visual regression checks for connect preview screens", long_about = None)]
struct Cli {
    /// Connect template to render
    #[arg(long = "connect-template", alias = "connect_template")]
    connect_template: String,

    /// Use the partner screen catalog
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    partner: bool,

    /// Only check this screen
    #[arg(long)]
    screen: Option<String>,

    /// Only check this device (desktop, mobile320, mobile360, mobile414)
    #[arg(long)]
    device: Option<String>,

    /// Preview theme
    #[arg(long, default_value = "light")]
    theme: String,

    /// Environment (localhost, staging, production)
    #[arg(long, default_value = "localhost")]
    env: String,

    /// Show the browser window
    #[arg(long)]
    show: bool,

    /// Accept the current captures as new baselines
    #[arg(long)]
    approve: bool,

    /// Config file (defaults to ./connect-vision.config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run_scan(cli) {
        Ok(summary) => {
            print_summary(&summary);
            if !summary.is_clean() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!();
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            eprintln!();
            std::process::exit(1);
        }
    }
}

fn run_scan(cli: Cli) -> anyhow::Result<ScanSummary> {
    let cwd = std::env::current_dir().context("Cannot get current directory")?;

    let config = match &cli.config {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
            Config::load_file(path)?
        }
        None => Config::load(&cwd)?,
    };

    let environment = Environment::parse_or_default(&cli.env);

    let request = ScanRequest {
        template: cli.connect_template,
        environment,
        theme: cli.theme,
        partner: cli.partner,
        screen: cli.screen,
        device: cli.device,
        approve: cli.approve,
    };

    let store = ArtifactStore::new(config.resolve_dir(&cwd, &config.screenshots_dir));
    info!("Screenshots: {}", store.root().display());
    let scanner = Scanner::new(store, Comparator::new(config.compare_options()));

    let sessions = FileSessionStore::new(config.resolve_dir(&cwd, &config.cookies_dir), environment);

    // Dropping the renderer closes the browser, on success and on error alike
    let mut renderer = ChromeRenderer::launch(cli.show)?;
    renderer.authenticate(
        environment,
        &sessions,
        chrono::Duration::hours(config.session_ttl_hours),
    )?;

    let summary = scanner.run(&mut renderer, &request)?;
    Ok(summary)
}

fn print_summary(summary: &ScanSummary) {
    println!();
    println!("{}", "📊 Scan Summary:".magenta().bold());

    if summary.is_clean() {
        println!("{}", "✅ No differences found.".green());
    }

    for failure in &summary.changed {
        println!(
            "{}",
            format!("❌ {} on {}", failure.screen, failure.device).red()
        );
    }

    for error in &summary.errors {
        println!(
            "{} {}",
            format!("⚠️  {} on {}:", error.screen, error.device).yellow(),
            error.message
        );
    }

    for device in &summary.skipped {
        println!("{}", format!("Skipped unknown device: {}", device).dimmed());
    }
}
