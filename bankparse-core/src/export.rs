//! Export adapters: JSON envelope and CSV, fixed column order.
//!
//! Amounts render through `Decimal`'s exact string form, so sums computed
//! from exported data match the in-memory sums.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::transaction::Transaction;

/// Interchange column order, shared by both adapters.
pub const FIELD_ORDER: [&str; 9] = [
    "date",
    "particulars",
    "amount",
    "transaction_type",
    "balance",
    "reference_no",
    "value_date",
    "narration",
    "cheque_no",
];

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    extracted_at: String,
    total_transactions: usize,
    transactions: &'a [Transaction],
}

/// Write the JSON envelope: extraction timestamp, count, then the records.
/// Missing optionals serialize as `null`, never as empty strings.
pub fn write_json<W: Write>(mut out: W, transactions: &[Transaction]) -> Result<()> {
    let envelope = JsonEnvelope {
        extracted_at: Utc::now().to_rfc3339(),
        total_transactions: transactions.len(),
        transactions,
    };
    serde_json::to_writer_pretty(&mut out, &envelope).context("serializing transactions")?;
    out.write_all(b"\n").context("writing trailing newline")?;
    Ok(())
}

/// Write CSV with the interchange header. CSV has no null, so absent
/// optionals become empty cells; that is a property of the format, not of
/// the records.
pub fn write_csv<W: Write>(out: W, transactions: &[Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(FIELD_ORDER).context("writing header")?;

    for txn in transactions {
        let amount = txn.amount.to_string();
        let balance = txn.balance.map(|b| b.to_string()).unwrap_or_default();
        writer
            .write_record([
                txn.date.as_str(),
                txn.particulars.as_str(),
                amount.as_str(),
                txn.transaction_type.as_str(),
                balance.as_str(),
                txn.reference_no.as_deref().unwrap_or(""),
                txn.value_date.as_deref().unwrap_or(""),
                txn.narration.as_deref().unwrap_or(""),
                txn.cheque_no.as_deref().unwrap_or(""),
            ])
            .context("writing record")?;
    }

    writer.flush().context("flushing csv")?;
    Ok(())
}
