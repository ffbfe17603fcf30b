//! filter-bench: sampling pipeline simulator and transfer-function analysis.
//!
//! This is the main entry point for the filter-bench tool.

mod config;
mod orchestrator;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_dsp::{BodeRequest, FrequencyGrid, TransferFunction};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "filter-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sampling pipeline
    Simulate {
        /// Path to the pipeline configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Sweep a transfer function over frequency
    Bode {
        /// Rational expression in s, e.g. "1000/(s+1000)"
        #[arg(long)]
        tf: String,

        /// First decade of the sweep (Hz)
        #[arg(long, default_value = "-2", allow_hyphen_values = true)]
        start_decade: f64,

        /// Last decade of the sweep (Hz)
        #[arg(long, default_value = "6", allow_hyphen_values = true)]
        stop_decade: f64,

        /// Number of frequency points
        #[arg(long, default_value = "200")]
        points: usize,

        /// Report gain in dB
        #[arg(long)]
        db: bool,
    },

    /// Print the zeros, poles and gain of a transfer function
    Roots {
        #[arg(long)]
        tf: String,

        /// Report roots in Hz instead of rad/s
        #[arg(long)]
        hz: bool,
    },

    /// Classify a first- or second-order transfer function
    Classify {
        #[arg(long)]
        tf: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Simulate { config, output } => {
            run_simulation(&config, &output, cli.format)?;
        }
        Commands::Bode { tf, start_decade, stop_decade, points, db } => {
            let grid = FrequencyGrid::Log { start_decade, stop_decade, points };
            bode(&tf, grid, db, cli.format)?;
        }
        Commands::Roots { tf, hz } => {
            roots(&tf, hz, cli.format)?;
        }
        Commands::Classify { tf } => {
            classify(&tf, cli.format)?;
        }
    }

    Ok(())
}

fn run_simulation(config_path: &PathBuf, output_dir: &PathBuf, format: OutputFormat) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    let mut pipeline = orchestrator::Pipeline::new(config)?;

    tracing::info!("Starting simulation...");
    let results = pipeline.run()?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    output::write_results(&results, output_dir, format)?;
    output::print_results(&results);

    tracing::info!("Simulation complete. Results written to {:?}", output_dir);
    Ok(())
}

fn parse_tf(text: &str) -> Result<TransferFunction> {
    TransferFunction::from_expression(text, false)
        .with_context(|| format!("Failed to parse transfer function {:?}", text))
}

fn bode(text: &str, grid: FrequencyGrid, db: bool, format: OutputFormat) -> Result<()> {
    let tf = parse_tf(text)?;
    let response = tf.bode(&BodeRequest { grid, in_db: db });

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Csv => {
            output::write_bode_csv(&mut std::io::stdout().lock(), &response)?;
        }
        OutputFormat::Text => {
            println!("H(s) = {}", tf.to_expression_text(true));
            let unit = if db { "dB" } else { "" };
            for i in 0..response.len() {
                println!(
                    "  {:>12.4} Hz  {:>12.6} {:<2}  {:>10.3} deg  {:>12.6e} s",
                    response.frequency_hz[i],
                    response.gain[i],
                    unit,
                    response.phase_deg[i],
                    response.group_delay[i]
                );
            }
        }
    }

    Ok(())
}

fn roots(text: &str, hz: bool, format: OutputFormat) -> Result<()> {
    let tf = parse_tf(text)?;
    let (zeros, poles, k) = if hz {
        tf.zpk_hz()
    } else {
        (tf.zeros().to_vec(), tf.poles().to_vec(), tf.k())
    };
    let unit = if hz { "Hz" } else { "rad/s" };

    match format {
        OutputFormat::Json => {
            let pairs = |roots: &[num_complex::Complex64]| -> Vec<[f64; 2]> {
                roots.iter().map(|r| [r.re, r.im]).collect()
            };
            let json = serde_json::json!({
                "unit": unit,
                "zeros": pairs(&zeros),
                "poles": pairs(&poles),
                "k": k,
                "pole_q": tf.pole_q(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("kind,re,im");
            for z in &zeros {
                println!("zero,{},{}", z.re, z.im);
            }
            for p in &poles {
                println!("pole,{},{}", p.re, p.im);
            }
            println!("gain,{},0", k);
        }
        OutputFormat::Text => {
            println!("Zeros ({}):", unit);
            for z in &zeros {
                println!("  {:.6} {:+.6}j", z.re, z.im);
            }
            println!("Poles ({}):", unit);
            for p in &poles {
                println!("  {:.6} {:+.6}j", p.re, p.im);
            }
            println!("Gain: {}", k);
            if let Some(q) = tf.pole_q() {
                println!("Pole Q: {:.4}", q);
            }
        }
    }

    Ok(())
}

fn classify(text: &str, format: OutputFormat) -> Result<()> {
    let tf = parse_tf(text)?;
    let classification = tf.classify();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "class": format!("{:?}", classification.class),
                "label": classification.label,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("class,label");
            println!("{:?},{}", classification.class, classification.label);
        }
        OutputFormat::Text => {
            println!("{}", classification.label);
        }
    }

    Ok(())
}
