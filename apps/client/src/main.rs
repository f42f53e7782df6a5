use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use client::api_client::{AnalysisClient, ProgressFn};
use client::config::Config;
use client::models::analysis::AnalysisResult;
use client::upload::ResumeFile;

#[derive(Debug, Parser)]
#[command(
    name = "client",
    version,
    about = "Upload a resume to the analysis service and print the AI feedback"
)]
struct Cli {
    /// Resume to analyze (PDF, DOC, or DOCX, max 5 MB)
    #[arg(required_unless_present = "analytics")]
    resume: Option<PathBuf>,

    /// Ask the server to bypass any cached prior result
    #[arg(long)]
    fresh: bool,

    /// Fetch aggregate analytics instead of uploading a resume
    #[arg(long, conflicts_with_all = ["resume", "fresh"])]
    analytics: bool,

    /// Print the raw JSON payload instead of the formatted report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the log filter default is available
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Resume analyzer client v{}", env!("CARGO_PKG_VERSION"));

    let client = AnalysisClient::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.upload_timeout_secs),
    );

    if cli.analytics {
        let stats = client.analytics().await?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let Some(path) = cli.resume.as_deref() else {
        bail!("a resume path is required");
    };

    let file = ResumeFile::from_path(path)?;
    info!(
        file = %file.file_name,
        bytes = file.size_bytes(),
        endpoint = %config.api_base_url,
        "resume validated, uploading"
    );

    let on_progress: ProgressFn = Arc::new(|percent| {
        info!("Upload progress: {percent}%");
    });

    let analysis = if cli.fresh {
        client.upload_resume_fresh(&file, Some(on_progress)).await?
    } else {
        client.upload_resume(&file, Some(on_progress)).await?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_report(&file.file_name, &analysis);
    }

    Ok(())
}

fn print_report(file_name: &str, analysis: &AnalysisResult) {
    println!("Resume analysis for {file_name}");
    println!();
    println!(
        "Job fit score: {:.0}/100 - {}",
        analysis.job_fit_score,
        analysis.score_interpretation()
    );

    if !analysis.summary.is_empty() {
        println!();
        println!("{}", analysis.summary);
    }

    print_section("Strengths", &analysis.strengths);
    print_section("Weaknesses", &analysis.weaknesses);
    print_section("Missing skills", &analysis.missing_skills);

    if let Some(ms) = analysis.processing_time {
        println!();
        let cached_note = if analysis.cached == Some(true) {
            " (cached result)"
        } else {
            ""
        };
        println!("Processed in {ms:.0} ms{cached_note}");
    }
}

fn print_section(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{title}:");
    for item in items {
        println!("  - {item}");
    }
}
