use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wowza_bootstrap::cli::commands::{HistoryCommand, RunCommand, SchemaCommand, ValidateCommand};
use wowza_bootstrap::cli::output::*;
use wowza_bootstrap::cli::{Cli, Command};
use wowza_bootstrap::codec;
use wowza_bootstrap::core::{BootstrapConfig, HandlerRegistry};
use wowza_bootstrap::execution::{ContinuationExecutor, ExecutionEvent};
use wowza_bootstrap::persistence::{create_summary, PersistenceBackend, RunSummary};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set logging subscriber")?;

    let config = BootstrapConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = Arc::new(config);

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, config).await?,
        Command::Validate(cmd) => validate_pipeline(cmd, config).await?,
        Command::Schema(cmd) => show_schema(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn open_store() -> Result<Arc<dyn PersistenceBackend>> {
    let store = wowza_bootstrap::persistence::SqliteRunStore::with_default_path().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_store() -> Result<Arc<dyn PersistenceBackend>> {
    tracing::warn!("Built without the sqlite feature; run history is not kept between invocations");
    Ok(Arc::new(wowza_bootstrap::persistence::InMemoryPersistence::new()))
}

async fn run_pipeline(cmd: &RunCommand, config: Arc<BootstrapConfig>) -> Result<()> {
    let registry = HandlerRegistry::with_builtin_handlers()?;
    let source = cmd.source.to_source(&config);

    let Some(context) = codec::load(&registry, &source, Arc::clone(&config))
        .await
        .with_context(|| format!("Failed to load pipeline from {}", source.describe()))?
    else {
        println!("{} Pipeline is empty, nothing to run", INFO);
        return Ok(());
    };

    println!(
        "{} Loaded pipeline {} from {} ({} actions)",
        INFO,
        style(context.id()).dim(),
        style(source.describe()).bold(),
        style(context.len()).cyan()
    );

    if let Some(instance) = format_instance(&config.instance) {
        println!("{} Bootstrapping {}", ROCKET, instance);
    }

    // Set up persistence
    let store = if cmd.no_history { None } else { Some(open_store().await?) };

    let progress = create_progress_bar(context.len());
    let bar = progress.clone();
    let executor = ContinuationExecutor::new(context.clone()).with_event_handler(move |event| {
        bar.println(format_execution_event(&event));
        if matches!(event, ExecutionEvent::ActionFinished { .. }) {
            bar.inc(1);
        }
    });

    let started_at = Utc::now();
    let result = executor.run_to_completion().await;
    progress.finish_and_clear();

    if let Some(path) = &cmd.save {
        codec::save(&context, path).await?;
        println!("{} Pipeline document saved to {}", INFO, style(path.display()).bold());
    }

    // Save to history
    let summary = create_summary(&context, started_at);
    if let Some(store) = &store {
        store.save_run(&summary).await?;
        println!(
            "{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    match result {
        Ok(_) if summary.succeeded() => {
            println!(
                "\n{} Pipeline completed {}",
                CHECK,
                style("successfully").green()
            );
            Ok(())
        }
        Ok(_) => {
            println!(
                "\n{} Pipeline completed with {} failed actions:",
                CROSS,
                style(summary.failed_actions()).red()
            );
            for outcome in summary.outcomes.iter().filter(|o| o.failed) {
                println!("  #{} {}", outcome.index, style(&outcome.action_name).red());
            }
            std::process::exit(1);
        }
        Err(e) => {
            println!("\n{} Pipeline {}", CROSS, style("halted").red());
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn validate_pipeline(cmd: &ValidateCommand, config: Arc<BootstrapConfig>) -> Result<()> {
    let registry = HandlerRegistry::with_builtin_handlers()?;
    let source = cmd.source.to_source(&config);

    let checked = async {
        let document = source.fetch_document().await?;
        // Decoding proves every action resolves; nothing is executed.
        codec::decode(&registry, &document, Arc::clone(&config))?;
        codec::validate_document(&registry, &document)
    }
    .await;

    let reports = match checked {
        Ok(reports) => reports,
        Err(e) => {
            if cmd.json {
                let data = serde_json::json!({ "valid": false, "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(e).red());
            }
            std::process::exit(1);
        }
    };

    let valid = reports.iter().all(|r| r.is_valid());
    if cmd.json {
        let data = serde_json::json!({ "valid": valid, "actions": reports });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{} Validating {}", INFO, style(source.describe()).bold());
        for report in &reports {
            println!("{}", format_record_report(report));
        }
        if valid {
            println!("{} Pipeline is valid ({} actions)", CHECK, style(reports.len()).cyan());
        } else {
            println!("{} Pipeline has invalid actions", CROSS);
        }
    }

    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

fn show_schema(cmd: &SchemaCommand) -> Result<()> {
    let registry = HandlerRegistry::with_builtin_handlers()?;
    let catalog = registry.field_catalog();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else {
        for (action_name, fields) in &catalog {
            println!("{}\n", format_field_schema(action_name, fields));
        }
    }
    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_store().await?;

    // If a specific run is requested
    if let Some(run_id) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(summary) if cmd.json => println!("{}", serde_json::to_string_pretty(&summary)?),
            Some(summary) => print_run_details(&summary)?,
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    let runs = store.list_runs(cmd.limit).await?;
    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);
    for summary in &runs {
        println!("  {}", format_run_summary(summary));
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary) -> Result<()> {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  State: {}", format_state(summary.state));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }

    println!("\n  {}", style("Actions:").bold());
    for outcome in &summary.outcomes {
        let icon = match (outcome.completed, outcome.failed) {
            (true, false) => CHECK,
            (true, true) => CROSS,
            _ => SPINNER,
        };
        println!("    {} #{} {}", icon, outcome.index, outcome.action_name);
    }

    println!("\n  {}", style("Document:").bold());
    for line in summary.document.to_json_pretty()?.lines() {
        println!("    {}", line);
    }

    Ok(())
}
