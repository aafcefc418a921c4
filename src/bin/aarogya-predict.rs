//! Developer utility: train on a dataset and run one symptom check from a JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aarogya::config;
use aarogya::{ModelService, SymptomChecker, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut config = match &options.config {
        Some(path) => config::load_from(path).map_err(|err| err.to_string())?,
        None => config::load_or_default().map_err(|err| err.to_string())?,
    };
    if let Some(dataset) = options.dataset {
        config.dataset.path = dataset;
    }
    config.validate().map_err(|err| err.to_string())?;
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let record = read_record(&options.record)?;
    let checker = SymptomChecker::new(Arc::new(ModelService::from_config(config)));
    let report = checker.check(&record).map_err(|err| err.to_string())?;
    let text = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

fn read_record(path: &Path) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read record {}: {err}", path.display()))?;
    serde_json::from_str(&text).map_err(|err| format!("Invalid record JSON {}: {err}", path.display()))
}

#[derive(Debug, Clone)]
struct CliOptions {
    config: Option<PathBuf>,
    dataset: Option<PathBuf>,
    record: PathBuf,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut config: Option<PathBuf> = None;
    let mut dataset: Option<PathBuf> = None;
    let mut record: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                dataset = Some(PathBuf::from(value));
            }
            "--record" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--record requires a value".to_string())?;
                record = Some(PathBuf::from(value));
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }

    let record = record.ok_or_else(|| format!("--record is required\n\n{}", help_text()))?;
    Ok(CliOptions {
        config,
        dataset,
        record,
    })
}

fn help_text() -> String {
    [
        "aarogya-predict",
        "",
        "Train the symptom classifier and print a report for one record.",
        "",
        "Usage:",
        "  aarogya-predict --record <record.json> [--config <config.toml>] [--dataset <data.csv>]",
        "",
        "Options:",
        "  --record <path>   JSON object with age, gender, primary_symptom_duration and symptom flags.",
        "  --config <path>   TOML config (default: config.toml in the app directory, if present).",
        "  --dataset <path>  Dataset CSV, overriding the configured path.",
    ]
    .join("\n")
}
