//! Summary statistics over one parsed statement.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::transaction::{Transaction, TransactionType};

/// Aggregate view of a transaction sequence. Pure function of its input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_transactions: usize,
    pub total_credit: Decimal,
    pub total_debit: Decimal,
    /// `total_credit - total_debit`.
    pub net_amount: Decimal,
    /// Lexicographic (min, max) of the opaque date strings. Best-effort:
    /// only meaningful when the source emits a sortable format. None for
    /// empty input.
    pub date_range: Option<(String, String)>,
}

impl Summary {
    pub fn of(transactions: &[Transaction]) -> Self {
        let mut total_credit = Decimal::ZERO;
        let mut total_debit = Decimal::ZERO;

        for txn in transactions {
            match txn.transaction_type {
                TransactionType::Credit => total_credit += txn.amount,
                TransactionType::Debit => total_debit += txn.amount,
            }
        }

        let min = transactions.iter().map(|t| t.date.as_str()).min();
        let max = transactions.iter().map(|t| t.date.as_str()).max();

        Self {
            total_transactions: transactions.len(),
            total_credit,
            total_debit,
            net_amount: total_credit - total_debit,
            date_range: min.zip(max).map(|(lo, hi)| (lo.to_string(), hi.to_string())),
        }
    }
}
