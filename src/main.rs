use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use layout_codegen::{is_layout_file, Generator, GeneratorConfig, ProcessReport, StageStatus};

#[derive(Parser)]
#[command(name = "layoutgen")]
#[command(about = "Keeps layout parameter files, themes and view bindings in sync with layout XML")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root (contains res/ and node_modules/)
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file (defaults to <workspace>/layoutgen.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the workspace and process every saved layout file
    Watch,

    /// Process one layout file, or every layout with --all
    Generate {
        /// Layout file under res/<dir>/layout/
        file: Option<PathBuf>,

        /// Process every layout of the workspace
        #[arg(long, conflicts_with = "file")]
        all: bool,
    },

    /// Print the import table built from the module repository
    Imports,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let workspace = fs::canonicalize(&cli.workspace)
        .with_context(|| format!("workspace {} not found", cli.workspace.display()))?;
    let config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::load(&workspace)?,
    };
    let generator = Generator::new(&workspace, config)?;

    match cli.command {
        Commands::Watch => watch(&generator)?,

        Commands::Generate { file, all } => {
            let reports = match (file, all) {
                (_, true) => generator.process_workspace(),
                (Some(file), false) => {
                    let file = fs::canonicalize(&file)
                        .with_context(|| format!("{} not found", file.display()))?;
                    vec![generator.process_layout(&file)]
                }
                (None, false) => bail!("pass a layout file or --all"),
            };

            for report in &reports {
                print_report(report);
            }
            let failed = reports.iter().filter(|r| r.has_failures()).count();
            if failed > 0 {
                bail!("{} of {} layouts had failures", failed, reports.len());
            }
            if reports.iter().any(|r| r.not_applicable) {
                bail!("not a layout file (expected res/<dir>/layout/<name>.xml)");
            }
        }

        Commands::Imports => {
            let table = generator.import_table()?;
            for (name, statement) in table.iter() {
                println!("{:<32} {}", name, statement);
            }
            println!("{} types", table.len());
        }
    }

    Ok(())
}

fn print_report(report: &ProcessReport) {
    if report.not_applicable {
        println!("skipped  {}", report.layout.display());
        return;
    }
    println!("{}", report.layout.display());
    for (path, status) in report.statuses() {
        let label = match status {
            StageStatus::Written => "written".to_string(),
            StageStatus::Unchanged => "unchanged".to_string(),
            StageStatus::Skipped => "skipped".to_string(),
            StageStatus::Failed(message) => format!("FAILED: {}", message),
        };
        println!("  {:<10} {}", label, path.display());
    }
}

/// Blocks forever. Events arriving together are coalesced so one save is processed once.
fn watch(generator: &Generator) -> Result<()> {
    let workspace = generator.workspace();
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher
        .watch(workspace, RecursiveMode::Recursive)
        .with_context(|| format!("cannot watch {}", workspace.display()))?;
    log::info!("watching {}", workspace.display());

    while let Ok(first) = rx.recv() {
        let mut changed = BTreeSet::new();
        for event in std::iter::once(first).chain(rx.try_iter()) {
            match event {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        changed.extend(
                            event
                                .paths
                                .into_iter()
                                .filter(|p| is_layout_file(workspace, p)),
                        );
                    }
                }
                Err(e) => log::warn!("watch error: {}", e),
            }
        }

        for path in changed {
            process_saved(generator, &path);
        }
    }

    Ok(())
}

fn process_saved(generator: &Generator, path: &Path) {
    if !path.is_file() {
        return;
    }
    let report = generator.process_layout(path);
    if report.is_unchanged() {
        log::debug!("{} already up to date", path.display());
    }
}
