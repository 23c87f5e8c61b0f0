//! haptic-prep CLI
//!
//! Dataset preparation for haptic adjective learning.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use haptic_prep::{
    config::{parse_field_list, Config},
    core::{assemble, assemble_dataset, extract_dataset, normalize_dataset, split},
    ledger::ProcessingLedger,
    pipeline::{self, DatasetInput},
    record::{motion_lengths, total_records},
    source::{CsvLabelSource, JsonRawSource},
    VERSION,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "haptic-prep")]
#[command(version = VERSION)]
#[command(about = "Dataset preparation for haptic adjective learning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a raw run log into a sensor dataset
    Convert {
        /// Raw run log (JSON)
        #[arg(long, short)]
        input: PathBuf,

        /// Output dataset file (.json)
        #[arg(long, short)]
        output: PathBuf,

        /// Only report what was converted, do not write the dataset
        #[arg(long)]
        no_save: bool,
    },

    /// Attach adjective labels to a sensor dataset
    Label {
        /// Sensor dataset file
        #[arg(long)]
        dataset: PathBuf,

        /// Adjective annotation table (CSV)
        #[arg(long)]
        labels: PathBuf,

        /// Output dataset file (.json)
        #[arg(long, short)]
        output: PathBuf,

        /// Only report label coverage, do not write the dataset
        #[arg(long)]
        no_save: bool,
    },

    /// Normalize every record against its baseline
    Normalize {
        #[arg(long, short)]
        input: PathBuf,

        #[arg(long, short)]
        output: PathBuf,

        /// Keep raw channels alongside the normalized ones
        #[arg(long)]
        keep_raw: bool,
    },

    /// Extract feature records from a normalized dataset
    Extract {
        #[arg(long, short)]
        input: PathBuf,

        #[arg(long, short)]
        output: PathBuf,
    },

    /// Assemble feature vectors from a feature dataset
    Vectors {
        #[arg(long, short)]
        input: PathBuf,

        /// Comma-separated feature fields, in column order
        #[arg(long)]
        fields: Option<String>,

        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format (json or jsonl)
        #[arg(long, default_value = "jsonl")]
        format: String,
    },

    /// Split a dataset into train and test sets
    Split {
        #[arg(long, short)]
        input: PathBuf,

        #[arg(long)]
        train_out: PathBuf,

        #[arg(long)]
        test_out: PathBuf,

        /// Share of runs used for training
        #[arg(long)]
        fraction: Option<f64>,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Input holds feature records instead of sensor records
        #[arg(long)]
        features: bool,
    },

    /// Show processing statistics
    Status,

    /// Show configuration, or update and save it
    Config {
        /// Default share of runs used for training
        #[arg(long)]
        train_fraction: Option<f64>,

        /// Default shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Default comma-separated feature fields
        #[arg(long)]
        fields: Option<String>,

        /// Whether normalization drops raw channels by default
        #[arg(long)]
        discard_raw: Option<bool>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("haptic_prep=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    let mut config = Config::load().context("loading configuration")?;

    if let Commands::Config {
        train_fraction,
        seed,
        fields,
        discard_raw,
    } = command
    {
        let changed = train_fraction.is_some()
            || seed.is_some()
            || fields.is_some()
            || discard_raw.is_some();
        if let Some(fraction) = train_fraction {
            config.train_fraction = fraction;
        }
        if seed.is_some() {
            config.seed = seed;
        }
        if let Some(fields) = fields {
            config.feature_fields = parse_field_list(&fields);
        }
        if let Some(discard_raw) = discard_raw {
            config.discard_raw = discard_raw;
        }
        if changed {
            config.save().context("saving configuration")?;
            println!("Saved configuration to {:?}", Config::config_path());
            println!();
        }
        cmd_config(&config);
        return Ok(());
    }

    let ledger = ProcessingLedger::with_persistence(config.ledger_path());

    match command {
        Commands::Convert {
            input,
            output,
            no_save,
        } => cmd_convert(&ledger, &input, &output, !no_save)?,
        Commands::Label {
            dataset,
            labels,
            output,
            no_save,
        } => cmd_label(&ledger, dataset, &labels, &output, !no_save)?,
        Commands::Normalize {
            input,
            output,
            keep_raw,
        } => cmd_normalize(&ledger, &input, &output, config.discard_raw && !keep_raw)?,
        Commands::Extract { input, output } => cmd_extract(&ledger, &input, &output)?,
        Commands::Vectors {
            input,
            fields,
            output,
            format,
        } => {
            let fields = fields
                .map(|f| parse_field_list(&f))
                .unwrap_or_else(|| config.feature_fields.clone());
            cmd_vectors(&ledger, &input, &fields, output.as_deref(), &format)?
        }
        Commands::Split {
            input,
            train_out,
            test_out,
            fraction,
            seed,
            features,
        } => cmd_split(
            &ledger,
            &input,
            &train_out,
            &test_out,
            fraction.unwrap_or(config.train_fraction),
            seed.or(config.seed),
            features,
        )?,
        Commands::Status => {
            println!("{}", ledger.summary());
            return Ok(());
        }
        Commands::Config { .. } => unreachable!("handled above"),
    }

    ledger
        .save()
        .with_context(|| format!("saving ledger to {:?}", config.ledger_path()))?;
    Ok(())
}

fn cmd_convert(ledger: &ProcessingLedger, input: &Path, output: &Path, save: bool) -> Result<()> {
    let dataset = pipeline::convert(&JsonRawSource, input, output, save)
        .with_context(|| format!("converting {input:?}"))?;

    ledger.record_loaded(total_records(&dataset) as u64);

    println!("Converted {} records", total_records(&dataset));
    for (motion, count) in motion_lengths(&dataset) {
        println!("  {motion}: {count}");
    }
    if save {
        println!("Saved to {output:?}");
    }
    Ok(())
}

fn cmd_label(
    ledger: &ProcessingLedger,
    dataset: PathBuf,
    labels: &Path,
    output: &Path,
    save: bool,
) -> Result<()> {
    let (_, report) = pipeline::attach_labels(
        DatasetInput::Path(dataset),
        output,
        &CsvLabelSource,
        labels,
        save,
    )
    .with_context(|| format!("attaching labels from {labels:?}"))?;

    ledger.record_labels(report.labeled as u64, report.unlabeled as u64);

    println!(
        "Labeled {} records ({} without labels)",
        report.labeled, report.unlabeled
    );
    if save {
        println!("Saved to {output:?}");
    }
    Ok(())
}

fn cmd_normalize(ledger: &ProcessingLedger, input: &Path, output: &Path, discard_raw: bool) -> Result<()> {
    let mut dataset = pipeline::load(input).with_context(|| format!("loading {input:?}"))?;
    let count = normalize_dataset(&mut dataset, discard_raw).context("normalizing dataset")?;
    pipeline::persist(&dataset, output).with_context(|| format!("writing {output:?}"))?;

    ledger.record_normalized(count as u64);

    println!(
        "Normalized {count} records{}",
        if discard_raw { " (raw channels discarded)" } else { "" }
    );
    println!("Saved to {output:?}");
    Ok(())
}

fn cmd_extract(ledger: &ProcessingLedger, input: &Path, output: &Path) -> Result<()> {
    let dataset = pipeline::load(input).with_context(|| format!("loading {input:?}"))?;
    let features = extract_dataset(&dataset).context("extracting features")?;
    pipeline::persist(&features, output).with_context(|| format!("writing {output:?}"))?;

    let count = total_records(&features);
    ledger.record_extracted(count as u64);

    println!("Extracted features for {count} records");
    println!("Saved to {output:?}");
    Ok(())
}

fn cmd_vectors(
    ledger: &ProcessingLedger,
    input: &Path,
    fields: &[String],
    output: Option<&Path>,
    format: &str,
) -> Result<()> {
    if fields.is_empty() {
        bail!("no feature fields given");
    }
    let dataset = pipeline::load_features(input).with_context(|| format!("loading {input:?}"))?;

    let mut lines = Vec::new();
    let count = if format == "json" {
        let matrices = assemble_dataset(&dataset, fields)?;
        lines.push(serde_json::to_string_pretty(&matrices)?);
        total_records(&dataset)
    } else {
        // JSON Lines format
        for (motion, records) in &dataset {
            for record in records {
                let features = assemble(record, fields)?;
                lines.push(serde_json::to_string(&serde_json::json!({
                    "motion": motion,
                    "name": record.name,
                    "run_number": record.run_number,
                    "labels": record.labels,
                    "features": features,
                }))?);
            }
        }
        lines.len()
    };

    let text = lines.join("\n");
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {path:?}"))?;
            eprintln!("Wrote {count} vectors to {path:?}");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }

    ledger.record_vectors(count as u64);
    Ok(())
}

fn cmd_split(
    ledger: &ProcessingLedger,
    input: &Path,
    train_out: &Path,
    test_out: &Path,
    fraction: f64,
    seed: Option<u64>,
    features: bool,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (train_count, test_count) = if features {
        let dataset = pipeline::load_features(input).with_context(|| format!("loading {input:?}"))?;
        let (train, test) = split(&dataset, fraction, &mut rng)?;
        pipeline::persist(&train, train_out)?;
        pipeline::persist(&test, test_out)?;
        (total_records(&train), total_records(&test))
    } else {
        let dataset = pipeline::load(input).with_context(|| format!("loading {input:?}"))?;
        let (train, test) = split(&dataset, fraction, &mut rng)?;
        pipeline::persist(&train, train_out)?;
        pipeline::persist(&test, test_out)?;
        (total_records(&train), total_records(&test))
    };

    ledger.record_split();

    println!("Split {input:?} with train fraction {fraction}");
    println!("  Train: {train_count} records -> {train_out:?}");
    println!("  Test: {test_count} records -> {test_out:?}");
    Ok(())
}

fn cmd_config(config: &Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}
