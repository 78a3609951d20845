//! pixerr command-line interface.
//!
//! Runs the read-out error analysis of single runs, run plans and plan
//! comparisons, and manages the run selection and the result cache.
#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use pixerr_analysis::{
    AnalysisCollection, AnalysisConfig, AnalysisError, DrawContext, ErrorAnalyser, JsonPlotSink,
    PlanCollection, RunSelection,
};
use pixerr_io::{ResultCache, RunCatalog};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    #[error("I/O error: {0}")]
    PixerrIo(#[from] pixerr_io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] pixerr_io::CacheError),
}

/// Read-out error analysis for CMS pixel modules.
#[derive(Parser)]
#[command(name = "pixerr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory with the run files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Result cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Plot output directory
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Run plan file
    #[arg(long, global = true)]
    run_plans: Option<PathBuf>,

    /// Do not write plots
    #[arg(long, global = true)]
    no_plots: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single run
    Run {
        /// Run number
        #[arg(default_value = "16")]
        run: u32,
    },

    /// Analyse the runs of a run plan
    Collection {
        /// Run plan id
        plan: u32,
    },

    /// Compare several run plans
    Plans {
        /// Run plan ids, comma separated
        #[arg(value_delimiter = ',', default_values_t = vec![2, 3, 4, 5])]
        ids: Vec<u32>,
    },

    /// List the runs of the data directory and the stored run plans
    Catalog,

    /// Select a range of runs and optionally store it as a run plan
    Select {
        /// First run
        #[arg(long)]
        from: u32,

        /// Last run (inclusive), defaults to the first
        #[arg(long)]
        to: Option<u32>,

        /// Store the selection under this plan id
        #[arg(long)]
        plan: Option<u32>,

        /// Trim setting (JSON value or plain text)
        #[arg(long, default_value = "null")]
        trim: String,

        /// Control register setting (JSON value or plain text)
        #[arg(long, default_value = "null")]
        ctrlreg: String,
    },

    /// Delete a category of the result cache
    ClearCache {
        /// Category, e.g. Histos or ValidHits
        category: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let plots = !cli.no_plots;

    match cli.command {
        Commands::Run { run } => {
            print_banner(&format!("STARTING ERROR ANALYSER FOR RUN {run}"));
            let catalog = RunCatalog::scan(&config.data_dir)?;
            let ana = ErrorAnalyser::open(&config, &catalog, run)?;

            println!("Hit Rate:   {}", ana.hit_rate_string()?);
            println!("Event Rate: {}", ana.event_rate_string()?);
            println!("{:6.4}% Buffer Corruptions", ana.buffer_proportion()?);
            println!("Invalid Addresses:      {}", ana.invalid_addresses()?);
            println!("Invalid Pulse Heights:  {}", ana.invalid_pulse_heights()?);

            if plots {
                let mut ctx = DrawContext::new(JsonPlotSink::new(&config.results_dir));
                ctx.set_sub_dir(Some(ana.save_dir()));
                ana.draw_module_occupancy(&mut ctx)?;
                ana.draw_buffer_map(&mut ctx, false)?;
                ana.draw_buffer_map(&mut ctx, true)?;
                ana.draw_time_profile(&mut ctx)?;
                if let Some(lambda) = ana.draw_event_size(&mut ctx, true)? {
                    println!("Mean Hits per Event: {:.3}", lambda);
                }
            }
        }

        Commands::Collection { plan } => {
            print_banner("STARTING ERROR ANALYSER COLLECTION");
            let mut selection = RunSelection::load(&config)?;
            selection.select_runs_from_plan(plan);
            let collection = AnalysisCollection::new(&selection, &config, Some(plan))?;

            println!("Run\tHit Rate\tBuffer Corruptions [%]");
            let rates = collection.hit_rates()?;
            let proportions = collection.buffer_proportions()?;
            for ((run, rate), proportion) in collection.runs().iter().zip(&rates).zip(&proportions) {
                println!("{:>3}\t{:>8.1} MHz\t{:>10.4}", run, rate / 1e6, proportion);
            }

            if plots {
                let mut ctx = DrawContext::new(JsonPlotSink::new(&config.results_dir));
                ctx.set_sub_dir(Some(collection.save_dir()));
                collection.draw_buffer_errors(&mut ctx)?;
                collection.draw_module_occupancy(&mut ctx)?;
                collection.draw_buffer_map(&mut ctx, true)?;
            }
        }

        Commands::Plans { ids } => {
            print_banner("STARTING RUNPLAN COLLECTION");
            let plans = PlanCollection::new(&ids, &config)?;
            let series = if plots {
                let mut ctx = DrawContext::new(JsonPlotSink::new(&config.results_dir));
                plans.draw_buffer_corruptions(&mut ctx)?
            } else {
                plans.buffer_error_series()?
            };
            for (key, s) in plans.plan_keys().iter().zip(&series) {
                println!("Plan {key} ({}): {} runs", s.label, s.x.len());
            }
        }

        Commands::Catalog => {
            print_banner("RUN CATALOG");
            let selection = RunSelection::load(&config)?;
            print!("{}", selection.run_info_table());
            println!();
            for (key, plan) in selection.plans() {
                println!("Plan {key}: runs {:?}", plan.runs);
            }
        }

        Commands::Select {
            from,
            to,
            plan,
            trim,
            ctrlreg,
        } => {
            print_banner("STARTING RUN SELECTION");
            let mut selection = RunSelection::load(&config)?;
            selection.select_range(from, to.unwrap_or(from));
            print!("{}", selection.selected_runs_table());
            if let Some(id) = plan {
                selection.add_selection_to_runplan(id, parse_setting(&trim), parse_setting(&ctrlreg))?;
            }
        }

        Commands::ClearCache { category } => {
            print_banner(&format!("CLEARING CACHE CATEGORY {category}"));
            ResultCache::new(&config.cache_dir).clear_category(&category)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(dir) = &cli.results_dir {
        config = config.with_results_dir(dir);
    }
    if let Some(path) = &cli.run_plans {
        config = config.with_run_plan_path(path);
    }
    log::debug!("{config:?}");
    Ok(config)
}

/// Parses a plan setting as JSON, falling back to a plain string.
fn parse_setting(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn print_banner(msg: &str) {
    let delim = "=".repeat(msg.chars().count());
    println!("\n{delim}\n{msg}\n{delim}\n");
}
