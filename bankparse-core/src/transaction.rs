//! Transaction record types shared across the pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a statement entry. The sign lives here, never in `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "DEBIT")]
    Debit,
    #[serde(rename = "CREDIT")]
    Credit,
}

impl TransactionType {
    /// Map the textual variants banks and models emit onto the two
    /// canonical values. An unrecognized label fails the whole record.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "debit" | "dr" | "withdrawal" | "dbt" => Some(Self::Debit),
            "credit" | "cr" | "deposit" | "cdt" => Some(Self::Credit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

/// One normalized statement entry (bank-agnostic).
///
/// Built exclusively by the normalizer and read-only afterwards. Dates stay
/// opaque strings: statement formats vary by bank and locale and nothing in
/// this crate attempts to parse them. `None` on an optional field means the
/// source did not provide it; empty strings never stand in for missing data.
///
/// Field declaration order is the interchange order and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub particulars: String,
    /// Magnitude, always >= 0.
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub balance: Option<Decimal>,
    pub reference_no: Option<String>,
    pub value_date: Option<String>,
    pub narration: Option<String>,
    pub cheque_no: Option<String>,
}

impl Transaction {
    /// Amount with the direction applied: credits positive, debits negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }
}
