use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bankparse_core::{Summary, Transaction, export};
use bankparse_gemini::{GeminiClient, GeminiConfig, StatementParser};

#[derive(Parser, Debug)]
#[command(
    name = "bankparse",
    version,
    about = "Extract transactions from bank-statement PDFs via Gemini"
)]
struct Cli {
    /// Path to the PDF bank statement
    pdf: PathBuf,

    /// Gemini API key (overrides GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Print summary statistics only
    #[arg(long)]
    summary: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Write output to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Table,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bankparse=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = GeminiConfig::resolve(cli.api_key.clone())?;
    let client = GeminiClient::new(config)?;
    let parser = StatementParser::new(client);

    let parsed = parser.parse_path(&cli.pdf)?;

    if parsed.rejected > 0 {
        eprintln!(
            "Dropped {} malformed record(s) from the model response",
            parsed.rejected
        );
    }

    let mut out: Box<dyn Write> = match &cli.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    if cli.summary {
        let summary = parsed.summary();
        match cli.format {
            Format::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            }
            Format::Table => print_summary(&mut out, &summary)?,
            Format::Csv => write_summary_csv(&mut out, &summary)?,
        }
    } else {
        match cli.format {
            Format::Json => export::write_json(&mut out, &parsed.transactions)?,
            Format::Csv => export::write_csv(&mut out, &parsed.transactions)?,
            Format::Table => print_table(&mut out, &parsed.transactions)?,
        }
    }

    Ok(())
}

fn print_summary(out: &mut dyn Write, summary: &Summary) -> Result<()> {
    writeln!(out, "Total Transactions: {}", summary.total_transactions)?;
    writeln!(out, "Total Credits: {}", summary.total_credit)?;
    writeln!(out, "Total Debits: {}", summary.total_debit)?;
    writeln!(out, "Net: {}", summary.net_amount)?;
    if let Some((lo, hi)) = &summary.date_range {
        writeln!(out, "Dates: {lo} .. {hi}")?;
    }
    Ok(())
}

/// One-row CSV rendering of the summary; empty date cells for empty input.
fn write_summary_csv(out: &mut dyn Write, summary: &Summary) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "total_transactions",
        "total_credit",
        "total_debit",
        "net_amount",
        "date_min",
        "date_max",
    ])?;

    let (date_min, date_max) = summary.date_range.clone().unwrap_or_default();
    writer.write_record([
        summary.total_transactions.to_string(),
        summary.total_credit.to_string(),
        summary.total_debit.to_string(),
        summary.net_amount.to_string(),
        date_min,
        date_max,
    ])?;

    writer.flush()?;
    Ok(())
}

fn print_table(out: &mut dyn Write, transactions: &[Transaction]) -> Result<()> {
    for (i, txn) in transactions.iter().enumerate() {
        writeln!(
            out,
            "{}. {} | {} | {} | {}",
            i + 1,
            txn.date,
            txn.particulars,
            txn.amount,
            txn.transaction_type.as_str()
        )?;
    }
    Ok(())
}
