// src/cli.rs
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::archive::ARCHIVE_FILE_NAME;
use crate::batch::BatchRequest;
use crate::config::{derive_mode, PromptConfiguration, Tolerance, DEFAULT_TOLERANCE};
use crate::core::{ConfigManager, FsOps, ServiceClient};
use crate::pipeline::{JdSource, TAILORED_PDF_FILE_NAME, TAILORED_TEXT_FILE_NAME};
use crate::session::Session;
use crate::types::{Provider, TailoringRequest};
use crate::utils::read_text_file;

#[derive(Parser)]
#[command(name = "resume-tailor")]
#[command(about = "Tailor a resume to one or many job descriptions")]
pub struct TailorCli {
    #[command(subcommand)]
    pub command: TailorCommand,

    /// Backend base URL (overrides RESUME_TAILOR_API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Directory receiving downloaded artifacts
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct ShapingArgs {
    /// 0 keeps the resume close to the original, 100 rewrites freely
    #[arg(long, default_value_t = DEFAULT_TOLERANCE as i64, value_parser = parse_tolerance)]
    pub tolerance: i64,

    /// Generation provider (defaults to the configured one)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Custom prompt file; replaces tolerance-derived instructions
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum TailorCommand {
    /// Show the mode a tolerance maps to
    Mode {
        #[arg(value_parser = parse_tolerance)]
        tolerance: i64,
    },
    /// Check that the backend is reachable
    Health,
    /// Print the job description behind a posting link
    Extract {
        #[arg(long)]
        url: String,
    },
    /// Print the tailoring plan for a resume/JD pair
    Plan {
        #[arg(long)]
        resume: PathBuf,
        #[arg(long)]
        jd: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TOLERANCE as i64, value_parser = parse_tolerance)]
        tolerance: i64,
    },
    /// Tailor one resume to one job description
    Tailor {
        #[arg(long)]
        resume: PathBuf,
        /// Job description text file
        #[arg(long, conflicts_with = "jd_url", required_unless_present = "jd_url")]
        jd: Option<PathBuf>,
        /// Job posting link to extract the description from
        #[arg(long)]
        jd_url: Option<String>,
        #[command(flatten)]
        shaping: ShapingArgs,
        /// Generate a plan first and pass it to tailoring
        #[arg(long)]
        with_plan: bool,
        /// Also export tailored_resume.pdf
        #[arg(long)]
        pdf: bool,
    },
    /// Tailor one resume to up to 10 job links and download the archive
    Batch {
        #[arg(long)]
        resume: PathBuf,
        /// File with one job link per line
        #[arg(long)]
        links: PathBuf,
        #[command(flatten)]
        shaping: ShapingArgs,
    },
}

fn parse_tolerance(value: &str) -> Result<i64, String> {
    let parsed: i64 = value.parse().map_err(|_| format!("'{}' is not a number", value))?;
    Tolerance::new(parsed).map(|t| t.value() as i64).map_err(|e| e.to_string())
}

impl ShapingArgs {
    async fn prompt(&self) -> Result<PromptConfiguration> {
        match &self.prompt_file {
            Some(path) => Ok(PromptConfiguration::custom(read_text_file(path).await?)),
            None => Ok(PromptConfiguration::default_prompt()),
        }
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::clamped(self.tolerance)
    }
}

fn apply_overrides(cli: &TailorCli, mut config: ConfigManager) -> ConfigManager {
    if let Some(api_base) = &cli.api_base {
        config.service.api_base = api_base.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    config
}

async fn save(dir: &Path, file_name: &str, content: &[u8]) -> Result<()> {
    let path = FsOps::write_artifact(dir, file_name, content).await?;
    println!("✓ Saved {}", path.display());
    Ok(())
}

pub async fn handle_command(cli: TailorCli, config: ConfigManager) -> Result<()> {
    let config = apply_overrides(&cli, config);

    match cli.command {
        TailorCommand::Mode { tolerance } => {
            let tolerance = Tolerance::clamped(tolerance);
            println!("Tolerance {}: {}", tolerance, derive_mode(tolerance));
        }

        TailorCommand::Health => {
            let client = ServiceClient::new(
                &config.service.api_base,
                config.service.timeout(),
                config.service.batch_timeout(),
            )?;
            match client.health().await {
                Ok(true) => println!("✅ Backend healthy: {}", client.base_url()),
                Ok(false) => anyhow::bail!("Backend at {} reports unhealthy", client.base_url()),
                Err(e) => {
                    error!("Health check failed: {}", e);
                    anyhow::bail!("❌ Backend unreachable at {}: {}", client.base_url(), e)
                }
            }
        }

        TailorCommand::Extract { url } => {
            let session = Session::connect(&config)?;
            let mut jd_text = String::new();
            session
                .extract_jd_into(&url, &mut jd_text)
                .await
                .with_context(|| format!("Failed to extract job description from {}", url))?;
            println!("{}", jd_text);
        }

        TailorCommand::Plan {
            resume,
            jd,
            tolerance,
        } => {
            let session = Session::connect(&config)?;
            let request = TailoringRequest::new(read_text_file(&resume).await?, read_text_file(&jd).await?)
                .with_tolerance(Tolerance::clamped(tolerance));
            let plan = session.generate_plan(&request).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }

        TailorCommand::Tailor {
            resume,
            jd,
            jd_url,
            shaping,
            with_plan,
            pdf,
        } => {
            config.ensure_directories().await?;
            let session = Session::connect(&config)?;
            let mut request = TailoringRequest::new(read_text_file(&resume).await?, "")
                .with_tolerance(shaping.tolerance())
                .with_provider(shaping.provider.unwrap_or(config.service.provider));
            if let Some(text) = shaping.prompt().await?.effective_text() {
                request = request.with_prompt_override(text);
            }

            let source = match (jd, jd_url) {
                (Some(path), _) => JdSource::Text(read_text_file(&path).await?),
                (None, Some(url)) => JdSource::Link(url),
                (None, None) => anyhow::bail!("Provide --jd or --jd-url"),
            };

            info!(
                "Tailoring with tolerance {} ({})",
                request.tolerance,
                request.tolerance.mode()
            );

            let tailored = if with_plan {
                let source_text = match source {
                    JdSource::Text(text) => text,
                    JdSource::Link(url) => {
                        let mut jd_text = String::new();
                        session.extract_jd_into(&url, &mut jd_text).await?;
                        jd_text
                    }
                };
                let request = TailoringRequest {
                    jd_text: source_text,
                    ..request
                };
                session.generate_plan(&request).await?;
                session.generate_tailored_with_plan(&request).await?
            } else {
                session.run_single(request, source).await?
            };

            save(&config.output_dir, TAILORED_TEXT_FILE_NAME, tailored.as_bytes()).await?;

            if pdf {
                let bytes = session.export_pdf(&tailored).await?;
                save(&config.output_dir, TAILORED_PDF_FILE_NAME, &bytes).await?;
            }
        }

        TailorCommand::Batch {
            resume,
            links,
            shaping,
        } => {
            config.ensure_directories().await?;
            let session = Session::connect(&config)?;
            let request = BatchRequest::new(read_text_file(&links).await?, read_text_file(&resume).await?)
                .with_tolerance(shaping.tolerance())
                .with_provider(shaping.provider.unwrap_or(config.service.provider))
                .with_prompt(shaping.prompt().await?);

            let outcome = session.run_batch(&request).await?;
            save(&config.output_dir, ARCHIVE_FILE_NAME, &outcome.archive).await?;

            match outcome.result() {
                Ok(result) => {
                    println!(
                        "Batch {} finished at {}: {} succeeded, {} failed",
                        outcome.run_id,
                        outcome.completed_at.format("%Y-%m-%d %H:%M:%S"),
                        result.succeeded.len(),
                        result.failed.len()
                    );
                    for job in &result.succeeded {
                        println!("  ✓ {} ({})", job.link, job.artifact_refs.join(", "));
                    }
                    for job in &result.failed {
                        println!("  ✗ {} -> {}", job.link, job.error_message);
                    }
                }
                Err(e) => {
                    error!("Could not read batch archive: {}", e);
                    println!("Archive saved, but its report could not be read: {}", e);
                }
            }
        }
    }

    Ok(())
}
