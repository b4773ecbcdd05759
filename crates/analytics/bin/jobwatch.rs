//! jobwatch：抓取、增强并汇总职位数据

use analytics::preprocessing::{prepare, PreparationConfig};
use analytics::summary::{breakdown, summarize, Breakdown, DatasetSummary};
use analytics::tabular::{enriched_table, prepared_table, summary_table, timeseries_table, Table};
use analytics::timeseries::{parse_frequencies, resample};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use etl::source::adzuna::{AdzunaConfig, AdzunaSource};
use etl::{
    harvest, EnrichedJobRecord, HarvestPlan, JobPipeline, JobStore, PipelineConfig,
    PipelineOutput, PipelineReport, RawJobRecord, TracingObserver,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jobwatch")]
#[command(about = "Job listing enrichment and reporting pipeline", long_about = None)]
struct Cli {
    /// Pipeline config JSON (missing keys use built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Encoder field lists JSON
    #[arg(long, global = true)]
    prepare_config: Option<PathBuf>,

    /// Output directory
    #[arg(long, global = true, default_value = "data/processed")]
    output_dir: PathBuf,

    /// Resample frequency (D, W, M); repeatable
    #[arg(long = "frequency", global = true, default_values_t = vec!["D".to_string(), "W".to_string()])]
    frequencies: Vec<String>,

    /// Standardize numeric columns of the model-ready table
    #[arg(long, global = true)]
    standardize: bool,

    /// Number of companies/locations in the console report
    #[arg(long, global = true, default_value_t = 10)]
    top: usize,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve postings from Adzuna (ADZUNA_APP_ID / ADZUNA_API_KEY) and process them
    Harvest {
        /// Also store normalized records in this SQLite database
        #[arg(long)]
        database: Option<String>,
    },
    /// Process a saved JSON array of raw records
    Analyze {
        input: PathBuf,
    },
    /// Re-enrich records accumulated in the store
    History {
        #[arg(long, default_value = "sqlite://data/jobs.db")]
        database: String,

        /// Only records created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only records created on or before this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
}

/// summary.json 的内容
#[derive(Serialize)]
struct AnalysisReport<'a> {
    generated_at: DateTime<Utc>,
    pipeline: &'a PipelineReport,
    summary: &'a DatasetSummary,
    breakdown: &'a Breakdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let pipeline_config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading pipeline config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let pipeline = JobPipeline::new(&pipeline_config)?;

    let output = match &cli.command {
        Commands::Harvest { database } => {
            run_harvest(&cli, &pipeline, &pipeline_config, database.as_deref()).await?
        }
        Commands::Analyze { input } => {
            let raw = read_raw_records(input)?;
            pipeline.process(&raw, &TracingObserver)
        }
        Commands::History {
            database,
            since,
            until,
        } => run_history(&pipeline, database, *since, *until).await?,
    };

    write_outputs(&cli, &output)?;
    Ok(())
}

async fn run_harvest(
    cli: &Cli,
    pipeline: &JobPipeline,
    config: &PipelineConfig,
    database: Option<&str>,
) -> Result<PipelineOutput> {
    let source = AdzunaSource::new(AdzunaConfig::from_env()?)?;
    let plan = HarvestPlan::from_pipeline(config);

    let raw = harvest(&source, &plan).await;
    if raw.is_empty() {
        tracing::warn!("No job records retrieved; check API credentials");
    }

    fs::create_dir_all(&cli.output_dir)?;
    let raw_path = cli.output_dir.join(format!(
        "raw_jobs_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    fs::write(&raw_path, serde_json::to_string_pretty(&raw)?)?;
    tracing::info!("Saved {} raw records to {}", raw.len(), raw_path.display());

    let output = pipeline.process(&raw, &TracingObserver);

    if let Some(url) = database {
        let store = JobStore::new(url).await?;
        let jobs: Vec<_> = output.records.iter().map(|r| r.job.clone()).collect();
        let saved = store.save_records(&jobs).await?;
        let stats = store.stats().await?;
        tracing::info!(
            "Stored {} new records ({} total in {})",
            saved,
            stats.total_jobs,
            url
        );
    }

    Ok(output)
}

async fn run_history(
    pipeline: &JobPipeline,
    database: &str,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> Result<PipelineOutput> {
    let store = JobStore::new(database).await?;

    let jobs = if since.is_none() && until.is_none() {
        store.load_all().await?
    } else {
        let start = since
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
        let end = until
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|d| d.and_utc());
        store.query_by_timerange(start, end).await?
    };
    tracing::info!("Loaded {} stored records from {}", jobs.len(), database);

    Ok(pipeline.process_normalized(jobs, &TracingObserver))
}

fn read_raw_records(path: &Path) -> Result<Vec<RawJobRecord>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let raw: Vec<RawJobRecord> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of job records", path.display()))?;
    Ok(raw)
}

fn write_outputs(cli: &Cli, output: &PipelineOutput) -> Result<()> {
    let records = &output.records;
    let frequencies = parse_frequencies(&cli.frequencies)?;
    let prepare_config = match &cli.prepare_config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<PreparationConfig>(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => PreparationConfig::default(),
    };

    fs::create_dir_all(&cli.output_dir)?;

    write_table(&cli.output_dir, "enriched.csv", &enriched_table(records))?;

    let mut dataset = prepare(records, &prepare_config)?;
    if cli.standardize {
        dataset.standardize_numeric()?;
    }
    write_table(&cli.output_dir, "model_ready.csv", &prepared_table(&dataset))?;

    for frequency in frequencies {
        let points = resample(records, frequency);
        if points.is_empty() {
            tracing::warn!("No dated records for {} time series", frequency);
            continue;
        }
        let name = format!("timeseries_{}.csv", frequency.label());
        write_table(&cli.output_dir, &name, &timeseries_table(&points))?;
    }

    let summary = summarize(records);
    let breakdown = breakdown(records, cli.top);
    let report = AnalysisReport {
        generated_at: Utc::now(),
        pipeline: &output.report,
        summary: &summary,
        breakdown: &breakdown,
    };
    write_table(&cli.output_dir, "summary.csv", &summary_table(&summary))?;
    let summary_path = cli.output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!("Wrote {}", summary_path.display());

    print_report(records, &summary, &breakdown);
    Ok(())
}

fn write_table(dir: &Path, name: &str, table: &Table) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, table.to_csv()).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn print_report(records: &[EnrichedJobRecord], summary: &DatasetSummary, breakdown: &Breakdown) {
    println!("\n{}", "=".repeat(60));
    println!("DATASET SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Total jobs:         {}", summary.total_jobs);
    println!("Unique companies:   {}", summary.unique_companies);
    println!("Unique locations:   {}", summary.unique_locations);
    println!(
        "Big Tech jobs:      {} ({:.1}%)",
        summary.big_tech_jobs, summary.big_tech_percentage
    );
    println!("Jobs with salary:   {}", summary.jobs_with_salary);
    if summary.avg_salary > 0.0 {
        println!("Average salary:     ${:.0}", summary.avg_salary);
        println!("Median salary:      ${:.0}", summary.median_salary);
    }
    if let (Some(start), Some(end)) = (summary.date_range.start, summary.date_range.end) {
        println!(
            "Date range:         {} to {}",
            start.date_naive(),
            end.date_naive()
        );
    }

    if records.is_empty() {
        return;
    }

    println!("\nTop companies:");
    for (i, company) in breakdown.top_companies.iter().enumerate() {
        println!("  {:2}. {}: {} postings", i + 1, company.name, company.count);
    }

    println!("\nTop locations:");
    for location in &breakdown.top_locations {
        println!(
            "  {}: {} jobs ({:.1}%)",
            location.name, location.count, location.percentage
        );
    }

    println!("\nExperience levels:");
    for level in &breakdown.experience_levels {
        println!("  {}: {} jobs ({:.1}%)", level.name, level.count, level.percentage);
    }

    println!("\nMost mentioned technologies:");
    for tech in breakdown.tech_mentions.iter().filter(|t| t.count > 0).take(10) {
        println!(
            "  {}: {} mentions ({:.1}%)",
            tech.name, tech.count, tech.percentage
        );
    }
}
