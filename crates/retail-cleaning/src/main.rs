//! CLI entry point for the retail cleaning pipelines.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use retail_cleaning::{
    CleaningConfig, CleaningOrchestrator, CleaningSummary, CsvTableSink, CsvTableSource, Entity,
    MemoryTables, TableSink, write_summary_report,
};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// CLI-compatible entity enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliEntity {
    /// Legacy users (legacy_users -> dim_users)
    Users,
    /// Card payments (card_details -> dim_card_details)
    Cards,
    /// Stores (store_details -> dim_store_details)
    Stores,
    /// Products (products -> dim_products)
    Products,
    /// Orders (orders_table -> orders_table)
    Orders,
    /// Date events (date_details -> dim_date_times)
    Events,
}

impl From<CliEntity> for Entity {
    fn from(cli: CliEntity) -> Self {
        match cli {
            CliEntity::Users => Entity::Users,
            CliEntity::Cards => Entity::Cards,
            CliEntity::Stores => Entity::Stores,
            CliEntity::Products => Entity::Products,
            CliEntity::Orders => Entity::Orders,
            CliEntity::Events => Entity::Events,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Retail data cleaning pipelines",
    long_about = "Cleans raw retail extracts into warehouse-ready tables.\n\n\
                  Raw tables are read from <input>/<source_name>.csv and cleaned tables\n\
                  are written to <output>/<warehouse_table>.csv.\n\n\
                  EXAMPLES:\n  \
                  # Clean every entity\n  \
                  retail-cleaning -i raw/ -o cleaned/\n\n  \
                  # Only stores and products\n  \
                  retail-cleaning -i raw/ -e stores -e products\n\n  \
                  # Clean without writing, print summaries as JSON\n  \
                  retail-cleaning -i raw/ --dry-run --json"
)]
struct Args {
    /// Directory holding the raw CSV extracts
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for cleaned tables
    ///
    /// Overrides `output_dir` from the config file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Entity to clean (repeatable; default: all, in pipeline order)
    #[arg(short, long, value_enum)]
    entity: Vec<CliEntity>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clean without writing any output
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the cleaning summaries are printed.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout holds only JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !args.input.is_dir() {
        return Err(anyhow!("Input directory not found: {}", args.input.display()));
    }

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            CleaningConfig::from_json_file(path)?
        }
        None => CleaningConfig::default(),
    };
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    let entities = selected_entities(&args.entity);
    let write_output = !args.dry_run && config.save_to_disk;
    let output_dir = config.output_dir.clone();

    let orchestrator = CleaningOrchestrator::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{}] {} {:.0}%: {}",
                update.entity,
                update.stage.display_name(),
                update.progress * 100.0,
                update.message
            );
        })
        .build()?;

    let source = CsvTableSource::new(&args.input);
    let sink: Box<dyn TableSink> = if write_output {
        Box::new(CsvTableSink::new(&output_dir))
    } else {
        info!("Dry run: cleaned tables will not be written");
        Box::new(MemoryTables::default())
    };

    let outcomes = match orchestrator.run_many(&entities, &source, sink.as_ref()) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Cleaning failed: {}", e);
            return Err(anyhow!("Cleaning failed: {}", e));
        }
    };
    let summaries: Vec<CleaningSummary> = outcomes.into_iter().map(|o| o.summary).collect();

    if write_output {
        write_summary_report(&output_dir, &summaries)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    print_human_readable_summary(&summaries, write_output.then_some(&output_dir));
    Ok(())
}

/// Entities to run, in pipeline order, without duplicates.
fn selected_entities(requested: &[CliEntity]) -> Vec<Entity> {
    if requested.is_empty() {
        return Entity::all().to_vec();
    }
    let requested: Vec<Entity> = requested.iter().map(|e| (*e).into()).collect();
    Entity::all()
        .iter()
        .copied()
        .filter(|entity| requested.contains(entity))
        .collect()
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the CLI's primary output and must be
/// visible regardless of log level.
fn print_human_readable_summary(summaries: &[CleaningSummary], output_dir: Option<&PathBuf>) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "{:<10} {:<18} {:>12} {:>8} {:>11} {:>9} {:>8}",
        "Entity", "Table", "Rows", "Removed", "Invalidated", "Degraded", "Time"
    );
    println!("{}", "-".repeat(80));
    for summary in summaries {
        println!("{}", summary_row(summary));
    }
    println!();

    let warnings: Vec<&String> = summaries.iter().flat_map(|s| &s.warnings).collect();
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    match output_dir {
        Some(dir) => println!("Cleaned tables written to: {}", dir.display()),
        None => println!("Dry run: nothing was written"),
    }
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

/// One line of the human-readable summary table.
fn summary_row(summary: &CleaningSummary) -> String {
    format!(
        "{:<10} {:<18} {:>12} {:>7.1}% {:>11} {:>9} {:>6}ms",
        summary.entity.as_str(),
        summary.entity.warehouse_table(),
        format!("{} -> {}", summary.rows_before, summary.rows_after),
        summary.rows_removed_percentage(),
        summary.rows_invalidated,
        summary.cells_degraded,
        summary.duration_ms
    )
}
