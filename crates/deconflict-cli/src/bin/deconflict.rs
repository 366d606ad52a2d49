//! Mission deconfliction from the command line.
//!
//! Usage:
//!   cargo run -p deconflict-cli --bin deconflict -- demo --scenario all
//!   cargo run -p deconflict-cli --bin deconflict -- verify --file mission.json --json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deconflict_cli::{format_report, format_stats, load_classifier, load_scenario_file};
use deconflict_core::{
    scenarios, ConflictClassifier, DeconflictionRules, ScreeningPipeline,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Built-in demo scenarios
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioChoice {
    /// Primary loses separation with Drone-A
    Conflict,
    /// Traffic separated by altitude and time
    Clear,
    /// Both, in order
    All,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the built-in scenarios
    Demo {
        #[arg(long, value_enum, default_value = "all")]
        scenario: ScenarioChoice,
    },
    /// Verify a primary mission from a JSON file
    Verify {
        /// File containing `{"primary": ..., "others": [...]}`
        #[arg(long)]
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Strategic pre-flight deconfliction
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Minimum 3D separation in meters
    #[arg(long, global = true, default_value_t = 15.0)]
    safety_buffer: f64,

    /// Classifier probability at or above which a mission is checked
    #[arg(long, global = true, default_value_t = 0.2)]
    ml_threshold: f64,

    /// Logistic classifier weights (JSON); pre-screen disabled without it
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deconflict=warn")))
        .init();

    let args = Args::parse();
    let rules = DeconflictionRules {
        safety_buffer_m: args.safety_buffer,
        ml_threshold: args.ml_threshold,
        ..Default::default()
    };

    let classifier: Option<Box<dyn ConflictClassifier>> = match &args.model {
        Some(path) => Some(Box::new(load_classifier(path)?)),
        None => None,
    };
    let mut pipeline =
        ScreeningPipeline::new(&rules, classifier).context("invalid deconfliction rules")?;

    match args.command {
        Command::Demo { scenario } => run_demo(&mut pipeline, scenario),
        Command::Verify { file, json } => run_verify(&mut pipeline, file, json),
    }
}

fn run_demo(pipeline: &mut ScreeningPipeline, choice: ScenarioChoice) -> Result<()> {
    let selected = scenarios::all()?
        .into_iter()
        .filter(|(name, _)| match choice {
            ScenarioChoice::Conflict => *name == "conflict",
            ScenarioChoice::Clear => *name == "clear",
            ScenarioChoice::All => true,
        });

    println!(
        "ML pre-screen: {}",
        if pipeline.has_classifier() {
            format!("enabled (threshold {})", pipeline.threshold())
        } else {
            "disabled".to_string()
        }
    );
    for (_, scenario) in selected {
        let report = pipeline.verify(&scenario.primary, &scenario.others);
        println!();
        print!("{}", format_report(&scenario.name.to_uppercase(), &report));
    }

    println!();
    print!("{}", format_stats(&pipeline.stats()));
    Ok(())
}

fn run_verify(pipeline: &mut ScreeningPipeline, file: PathBuf, json: bool) -> Result<()> {
    let scenario = load_scenario_file(&file)?;
    tracing::debug!(
        "Loaded {} with {} other mission(s) from {}",
        scenario.primary.id(),
        scenario.others.len(),
        file.display()
    );
    let report = pipeline.verify(&scenario.primary, &scenario.others);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&file.display().to_string(), &report));
    }
    Ok(())
}
