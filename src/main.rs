//! Veles CLI - Command-line tool for exporting typed model graphs.
//!
//! This is the main entry point for the Veles command-line application.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use veles::prelude::*;

/// Veles - typed model-graph export tool
#[derive(Parser)]
#[command(name = "veles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a model project to schema and instance documents
    Export {
        /// Path to the model project JSON file
        #[arg(short, long, env = "VELES_PROJECT")]
        project: PathBuf,

        /// Output directory
        #[arg(short, long, env = "VELES_OUTPUT")]
        output: PathBuf,

        /// Namespace URI recorded in the document envelopes
        #[arg(long)]
        ns_uri: Option<String>,
    },

    /// List the meta types of a model project
    Types {
        /// Path to the model project JSON file
        #[arg(short, long, env = "VELES_PROJECT")]
        project: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export { project, output, ns_uri } => {
            cmd_export(&project, &output, ns_uri).await?;
        }
        Commands::Types { project } => {
            cmd_types(&project)?;
        }
    }

    Ok(())
}

fn load_store(project: &PathBuf) -> Result<InMemoryModel> {
    ModelProject::from_path(project)
        .with_context(|| format!("Failed to read model project {}", project.display()))?
        .into_store()
        .context("Failed to build model store")
}

async fn cmd_export(project: &PathBuf, output: &PathBuf, ns_uri: Option<String>) -> Result<()> {
    println!("Loading project: {}", project.display());

    let start = Instant::now();
    let store = load_store(project)?;

    let mut options = ExportOptions::default();
    if let Some(ns_uri) = ns_uri {
        options.ns_uri = ns_uri;
    }

    let report = ExportCoordinator::with_options(&store, options)
        .export(&XmlCodec::new(), &FileSink::new(output))
        .await
        .context("Export failed")?;

    println!(
        "Exported language '{}' in {:?}",
        report.language,
        start.elapsed()
    );
    for artifact in &report.artifacts {
        println!("  {}", artifact.location);
    }

    Ok(())
}

fn cmd_types(project: &PathBuf) -> Result<()> {
    let store = load_store(project)?;
    let types = store.type_set().context("Failed to read type set")?;
    let closure =
        TypeClosureIndex::build(&store, &types).context("Failed to compute subtype closure")?;

    println!("{} meta types", types.len());
    for ty in &types {
        let base = ty
            .base
            .as_ref()
            .and_then(|path| types.iter().find(|t| &t.path == path))
            .map(|t| t.name.as_str())
            .unwrap_or("-");
        let derived = closure.derived_of(&ty.path).len();

        println!(
            "  {:<24} base={:<16} derived={:<4}{}",
            ty.name,
            base,
            derived,
            if ty.is_abstract { " (abstract)" } else { "" }
        );
    }

    Ok(())
}
