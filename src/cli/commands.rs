//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::StdinPromptAdapter;
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::MergeOutcome;
use crate::cli::args::{BatchArgs, DurationsArgs, MergeArgs, RunArgs};
use crate::cli::{Cli, Commands};
use crate::config_initialization::{initialize_configuration_hierarchy, Settings, SettingsOverlay};
use crate::domain::model::*;
use crate::utils::format_elapsed;

/// Dispatch the parsed command line
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => run(args, config).await,
        Commands::Batch(args) => batch(args, config).await,
        Commands::Merge(args) => merge(args, config).await,
        Commands::Durations(args) => durations(args, config).await,
    }
}

fn load_settings(config: Option<&Path>, overlay: SettingsOverlay) -> Result<Settings> {
    initialize_configuration_hierarchy(config, overlay).context("Failed to load configuration")
}

/// Execute the run command
pub async fn run(args: RunArgs, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config, args.encode.overlay())?;
    let options = settings.encode_options()?;
    info!("Starting run: {}", args.input.display());

    let container = DefaultAppContainer::new(&settings);
    let outcome = container
        .encode_interactor()
        .execute(&args.input, &options)
        .await
        .with_context(|| format!("Failed to process {}", args.input.display()))?;

    print_outcome(&outcome);
    Ok(())
}

/// Execute the batch command
pub async fn batch(args: BatchArgs, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config, args.collect.extend(args.encode.overlay()))?;
    let options = settings.encode_options()?;
    let collect = settings.collect_options(&args.collect.folder);

    let container = DefaultAppContainer::new(&settings);
    let summary = container
        .batch_interactor()
        .execute(&collect, &options)
        .await
        .context("Batch run failed")?;

    if summary.total() > 0 {
        println!();
        for line in summary.report_lines() {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Execute the merge command
pub async fn merge(args: MergeArgs, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config, args.collect.extend(args.encode.overlay()))?;
    let collect = settings.collect_options(&args.collect.folder);
    let container = DefaultAppContainer::new(&settings);
    let merger = container.merge_interactor();
    let mut prompt = StdinPromptAdapter::new();

    let outcome = if args.merge_only {
        merger
            .merge_only(&collect, args.yes, &mut prompt)
            .await
            .context("Merge-only run failed")?
    } else {
        let options = settings.encode_options()?;
        merger
            .merge_and_process(&collect, &options, args.yes, &mut prompt)
            .await
            .context("Merge run failed")?
    };

    match outcome {
        MergeOutcome::Encoded(outcome) => print_outcome(&outcome),
        MergeOutcome::Merged { output, elapsed } => {
            println!("[stats] merge: {}", format_elapsed(elapsed));
            println!("Merged output: {}", output.display());
        }
        MergeOutcome::Cancelled => println!("Operation cancelled"),
    }
    Ok(())
}

/// Execute the durations command
pub async fn durations(args: DurationsArgs, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config, args.collect.extend(SettingsOverlay::default()))?;
    let collect = settings.collect_options(&args.collect.folder);

    let container = DefaultAppContainer::new(&settings);
    let report = container
        .merge_interactor()
        .duration_report(&collect)
        .await
        .context("Duration report failed")?;

    if !report.entries.is_empty() {
        for line in report.report_lines() {
            println!("{}", line);
        }
    }
    Ok(())
}

fn print_outcome(outcome: &EncodeOutcome) {
    if outcome.is_skipped() {
        println!("[skipped] Output exists: {}", outcome.output.display());
        return;
    }
    println!("Output: {}", outcome.output.display());
    if let Some(log_file) = &outcome.log_file {
        println!("Log: {}", log_file.display());
    }
    println!(
        "Total: {} ({:.2}x realtime)",
        format_elapsed(outcome.stats.total),
        outcome.stats.realtime()
    );
}
