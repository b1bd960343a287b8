//! Redline CLI - Command-line interface
//!
//! Usage:
//!   redline analyze <file> [--perspective P] [--format json|text] [--output FILE]
//!   redline redlines <file> [--perspective P]
//!   redline rules [--clause-type T] [--perspective P]
//!
//! Author: hephaex@gmail.com

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use redline_analyzer::{render_redline_document, render_text_report, ContractAnalyzer};
use redline_core::{AppConfig, ClauseType, ContractReport, LoggingConfig, Perspective};
use redline_risk::RiskEngine;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "redline")]
#[command(about = "Contract clause segmentation and risk analysis")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON playbook with additional rules
    #[arg(long, global = true)]
    playbook: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a contract and print the report
    Analyze {
        /// Contract file (PDF, DOCX, TXT, MD or image)
        file: PathBuf,

        /// Negotiating role to read the contract from
        #[arg(long, short)]
        perspective: Option<Perspective>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the redline suggestions for a contract
    Redlines {
        file: PathBuf,

        #[arg(long, short)]
        perspective: Option<Perspective>,
    },
    /// Print the rule table for auditing
    Rules {
        #[arg(long)]
        clause_type: Option<ClauseType>,

        #[arg(long, short)]
        perspective: Option<Perspective>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Analyze {
            file,
            perspective,
            format,
            output,
        } => {
            let perspective = perspective.unwrap_or(config.risk.default_perspective);
            let report = analyze(config, cli.playbook.as_deref(), &file, perspective).await?;
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                OutputFormat::Text => render_text_report(&report),
            };
            write_output(&rendered, output.as_deref())?;
        }
        Commands::Redlines { file, perspective } => {
            let perspective = perspective.unwrap_or(config.risk.default_perspective);
            let report = analyze(config, cli.playbook.as_deref(), &file, perspective).await?;
            print!("{}", render_redline_document(&report));
        }
        Commands::Rules {
            clause_type,
            perspective,
        } => {
            let engine = build_engine(&config, cli.playbook.as_deref())?;
            print_rules(&engine, clause_type, perspective);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("redline={}", logging.level).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_engine(config: &AppConfig, playbook: Option<&Path>) -> anyhow::Result<RiskEngine> {
    let engine = match playbook {
        Some(path) => RiskEngine::with_playbook(&config.risk, path)
            .with_context(|| format!("loading playbook {}", path.display()))?,
        None => RiskEngine::new(&config.risk)?,
    };
    Ok(engine)
}

async fn analyze(
    config: AppConfig,
    playbook: Option<&Path>,
    file: &Path,
    perspective: Perspective,
) -> anyhow::Result<ContractReport> {
    let engine = build_engine(&config, playbook)?;
    let analyzer = ContractAnalyzer::new(Arc::new(config))?.with_engine(engine);

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with template explanations");
            on_interrupt.cancel();
        }
    });

    info!(file = %filename, perspective = %perspective, "Analyzing contract");
    let report = analyzer
        .analyze_with_cancel(&bytes, &filename, perspective, cancel)
        .await?;
    Ok(report)
}

fn write_output(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn print_rules(engine: &RiskEngine, clause_type: Option<ClauseType>, perspective: Option<Perspective>) {
    if clause_type.is_none() && perspective.is_none() {
        println!("{:<8} {:<7} {:<36} {}", "ID", "LEVEL", "RATIONALE", "NAME");
        for rule in engine.rules() {
            println!(
                "{:<8} {:<7} {:<36} {}",
                rule.id,
                rule.default_level.as_str(),
                rule.rationale_code,
                rule.name()
            );
        }
        return;
    }

    let clause_types: Vec<ClauseType> = clause_type.map_or(ClauseType::ALL.to_vec(), |t| vec![t]);
    let perspectives: Vec<Perspective> = perspective.map_or(Perspective::ALL.to_vec(), |p| vec![p]);

    for clause_type in &clause_types {
        for perspective in &perspectives {
            let Some(rule_set) = engine.rule_set(*clause_type, *perspective) else {
                continue;
            };
            if rule_set.is_empty() {
                continue;
            }

            println!("[{clause_type} / {perspective}]");
            println!("  thresholds: {:?}", rule_set.thresholds);
            for (i, entry) in rule_set.rules.iter().enumerate() {
                println!(
                    "  {:>2}. {:<8} {:<7} {:<36} {}",
                    i + 1,
                    entry.rule.id,
                    entry.level.as_str(),
                    entry.rule.rationale_code,
                    entry.rule.predicate
                );
            }
            println!();
        }
    }
}
