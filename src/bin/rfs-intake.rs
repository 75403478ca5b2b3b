//! CLI binary for rfs-intake.
//!
//! A thin shim over the library exposing the locally runnable pipeline
//! stages: page splitting, page classification, and entity extraction
//! from a captured analysis result. The storage- and service-backed
//! stages need deployment wiring and are library-only.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rfs_intake::model::{AnalysisResult, JobRecord};
use rfs_intake::pipeline::{assemble, extract, split};
use rfs_intake::IntakeConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a fax bundle into single-page PDFs
  rfs-intake split fax_0042.pdf -o pages/

  # Classify a page from its recognised text
  rfs-intake classify page_text.txt

  # Extract entities from a captured analysis result
  rfs-intake entities job_result.json --signature-threshold 65
"#;

#[derive(Parser)]
#[command(
    name = "rfs-intake",
    version,
    about = "Split PDF forms, classify pages, and extract structured entities",
    after_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a multi-page PDF into one file per page.
    Split {
        /// Source PDF file.
        pdf: PathBuf,
        /// Output directory for the page files.
        #[arg(short, long, default_value = "pages")]
        output: PathBuf,
    },
    /// Classify a page as blank, RFS, or other from its recognised text.
    Classify {
        /// Text file holding the page's recognised text.
        text_file: PathBuf,
        /// Pages with fewer words than this classify as blank.
        #[arg(long, env = "BLANK_PAGE_THRESHOLD", default_value_t = 20)]
        blank_page_threshold: usize,
    },
    /// Extract the entity list from one captured analysis result (JSON).
    Entities {
        /// Raw analysis-result file (JobStatus + Blocks).
        result_json: PathBuf,
        /// Minimum signature confidence for the signed verdict.
        #[arg(long, env = "SIGNATURE_THRESHOLD", default_value_t = 50.0)]
        signature_threshold: f64,
        /// Pages with fewer words than this classify as blank.
        #[arg(long, env = "BLANK_PAGE_THRESHOLD", default_value_t = 20)]
        blank_page_threshold: usize,
    },
}

fn init_logging() {
    // RUST_LOG wins; LOG_LEVEL mirrors the deployment contract.
    let filter = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Split { pdf, output } => cmd_split(&pdf, &output),
        Command::Classify {
            text_file,
            blank_page_threshold,
        } => cmd_classify(&text_file, blank_page_threshold),
        Command::Entities {
            result_json,
            signature_threshold,
            blank_page_threshold,
        } => cmd_entities(&result_json, signature_threshold, blank_page_threshold),
    }
}

fn cmd_split(pdf: &PathBuf, output: &PathBuf) -> Result<()> {
    let bytes = std::fs::read(pdf).with_context(|| format!("reading {}", pdf.display()))?;
    let pages = split::split_pages(&bytes)?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("creating {}", output.display()))?;
    let stem = pdf
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    for (idx, page) in pages.iter().enumerate() {
        let path = output.join(format!("{}_page_{:03}.pdf", stem, idx + 1));
        std::fs::write(&path, page).with_context(|| format!("writing {}", path.display()))?;
        println!("{}", path.display());
    }
    eprintln!("{} page(s) written", pages.len());
    Ok(())
}

fn cmd_classify(text_file: &PathBuf, blank_page_threshold: usize) -> Result<()> {
    let text = std::fs::read_to_string(text_file)
        .with_context(|| format!("reading {}", text_file.display()))?;
    let page_type = extract::classify_page(text.trim(), blank_page_threshold);
    println!("{page_type}");
    Ok(())
}

fn cmd_entities(
    result_json: &PathBuf,
    signature_threshold: f64,
    blank_page_threshold: usize,
) -> Result<()> {
    let bytes = std::fs::read(result_json)
        .with_context(|| format!("reading {}", result_json.display()))?;
    let result: AnalysisResult =
        serde_json::from_slice(&bytes).context("parsing analysis result JSON")?;

    let config = IntakeConfig::builder("local")
        .signature_threshold(signature_threshold)
        .blank_page_threshold(blank_page_threshold)
        .build()?;
    let job = JobRecord {
        job_id: "local".to_string(),
        page_num: 1,
    };
    let page = assemble::page_record(&job, &result, &config);

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
