//! Stockcheck CLI - validate inventory spreadsheets
//!
//! # Commands
//!
//! ```bash
//! stockcheck serve                     # Start HTTP server (port 3000)
//! stockcheck check stock.xlsx          # Run the validation rules on a file
//! stockcheck parse stock.csv           # Just parse to normalized JSON rows
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use stockcheck::{check_bytes, parse_file, parser::mime_for_path, AppConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockcheck")]
#[command(
    about = "Validate client inventory spreadsheets against business rules",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Persist uploads under this directory (default: $STOCKCHECK_DATA_DIR, else in memory)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Parse a CSV/XLSX file and output its headers and normalized rows
    Parse {
        /// Input file
        input: PathBuf,

        /// MIME type (inferred from the extension if not specified)
        #[arg(long)]
        mime: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate a file, exiting with 1 when it fails
    Check {
        /// Input file
        input: PathBuf,

        /// MIME type (inferred from the extension if not specified)
        #[arg(long)]
        mime: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port, data_dir } => cmd_serve(port, data_dir).await,

        Commands::Parse {
            input,
            mime,
            output,
        } => cmd_parse(&input, mime.as_deref(), output.as_deref()),

        Commands::Check { input, mime } => cmd_check(&input, mime.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env().with_overrides(port, data_dir);
    stockcheck::server::start_server(config).await
}

fn cmd_parse(
    input: &Path,
    mime: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let bytes = fs::read(input)?;
    let mime = mime.unwrap_or_else(|| mime_for_path(input));
    let parsed = parse_file(&bytes, mime)?;

    eprintln!("   Columns: {}", parsed.headers.join(", "));
    eprintln!("✅ Parsed {} rows", parsed.rows.len());

    let json = serde_json::to_string_pretty(&json!({
        "headers": parsed.headers,
        "rows": parsed.rows,
    }))?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_check(input: &Path, mime: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Checking: {}", input.display());

    let bytes = fs::read(input)?;
    let mime = mime.unwrap_or_else(|| mime_for_path(input));
    let report = check_bytes(&bytes, mime)?;

    eprintln!("   Columns: {}", report.headers.join(", "));
    eprintln!("   Rows: {}", report.row_count);
    for result in &report.results {
        let mark = if result.passed { "✅" } else { "❌" };
        match result.count() {
            Some(count) => eprintln!("   {} {} ({})", mark, result.rule, count),
            None => eprintln!("   {} {}", mark, result.rule),
        }
    }
    eprintln!("\n📊 Status: {}", report.status);

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.overall_pass {
        std::process::exit(1);
    }

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
