//! certscan command-line interface.
//!
//! `scan` extracts configured number fields from one image or a directory of
//! scans and writes a JSON report; `overlay` renders the configured search
//! regions onto an image for tuning; `generate` fills a DOCX certificate
//! template from a JSON value map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use certscan::{CertScanner, ScanConfig, overlay, render_template};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Parser)]
#[command(name = "certscan", version, about = "Certificate number extraction via region OCR")]
struct Cli {
    /// Path to certscan.toml; discovered in parent directories when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one image or every image in a directory
    Scan {
        /// Image file or directory of scans
        input: PathBuf,

        /// Report destination
        #[arg(short, long, default_value = "result.json")]
        output: PathBuf,
    },

    /// Draw the configured search regions onto an image
    Overlay {
        /// Image file
        input: PathBuf,

        /// Annotated PNG destination
        #[arg(short, long)]
        output: PathBuf,

        /// Draw only this field's region
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Fill a DOCX certificate template with values from a JSON file
    Generate {
        /// DOCX template with {{Key}} placeholders
        template: PathBuf,

        /// JSON object mapping placeholder names to values
        values: PathBuf,

        /// Rendered DOCX destination
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan { input, output } => scan(cli.config.as_deref(), &input, &output).await,
        Commands::Overlay { input, output, field } => render_overlay(cli.config.as_deref(), &input, &output, field),
        Commands::Generate {
            template,
            values,
            output,
        } => generate(&template, &values, &output),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::from_toml_file(path).with_context(|| format!("loading {}", path.display())),
        None => ScanConfig::discover()
            .context("searching for certscan.toml")?
            .context("no certscan.toml found; pass --config"),
    }
}

async fn scan(config_path: Option<&Path>, input: &Path, output: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let scanner = CertScanner::new(config)?;

    let files = collect_images(input)?;
    if files.is_empty() {
        bail!("no images found under {}", input.display());
    }

    let total = files.len();
    let mut report: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();

    for (index, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        tracing::info!(document = %name, "processing {} of {}", index + 1, total);

        let entry = match process_one(&scanner, file).await {
            Ok(Some(document)) => serde_json::to_value(&document.fields)?,
            Ok(None) => json!({ "error": "no usable data" }),
            Err(err) => {
                tracing::warn!(document = %name, error = %err, "document failed");
                json!({ "error": err.to_string() })
            }
        };
        report.insert(name, entry);

        // Incremental save so a long batch survives interruption.
        std::fs::write(output, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", output.display()))?;
    }

    tracing::info!(report = %output.display(), documents = total, "scan complete");
    Ok(())
}

async fn process_one(scanner: &CertScanner, file: &Path) -> certscan::Result<Option<certscan::DocumentResult>> {
    let image = std::fs::read(file)?;
    scanner.process(image).await
}

fn collect_images(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("{} is neither a file nor a directory", input.display());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input)
        .with_context(|| format!("reading {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn render_overlay(config_path: Option<&Path>, input: &Path, output: &Path, field: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;

    let regions: Vec<_> = match &field {
        Some(name) => {
            let spec = config
                .fields
                .get(name)
                .with_context(|| format!("field '{name}' is not configured"))?;
            vec![spec.region]
        }
        None => config.fields.values().map(|spec| spec.region).collect(),
    };

    let image = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let annotated = overlay::draw_regions(&image, &regions)?;
    std::fs::write(output, annotated).with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(output = %output.display(), regions = regions.len(), "overlay written");
    Ok(())
}

fn generate(template: &Path, values: &Path, output: &Path) -> Result<()> {
    let docx = std::fs::read(template).with_context(|| format!("reading {}", template.display()))?;
    let values_json = std::fs::read_to_string(values).with_context(|| format!("reading {}", values.display()))?;
    let values: HashMap<String, String> =
        serde_json::from_str(&values_json).with_context(|| format!("parsing {}", values.display()))?;

    let rendered = render_template(&docx, &values)?;
    std::fs::write(output, rendered).with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(output = %output.display(), "certificate generated");
    Ok(())
}
