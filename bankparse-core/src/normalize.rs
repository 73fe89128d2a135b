//! Completion-text normalizer: raw model output in, validated transactions out.
//!
//! The upstream model has no schema guarantee, so parsing the payload is the
//! primary failure mode. Individual bad records are never fatal; they are
//! dropped and counted.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::transaction::{Transaction, TransactionType};

/// Currency symbols, thousands separators, and stray whitespace stripped
/// from numeric fields before decimal parsing.
static NUMERIC_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[₹$€£,\s]+").expect("valid literal regex"));

/// Sanity bound used for observability only: more candidates than this per
/// extracted page logs a warning, drops nothing.
const CANDIDATES_PER_PAGE_BOUND: usize = 200;

/// Result of normalizing one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    /// Surviving records, in the order the model emitted them.
    pub transactions: Vec<Transaction>,
    /// Candidates dropped during coercion.
    pub rejected: usize,
}

/// Outcome of coercing a single candidate mapping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coerced {
    Ok(Transaction),
    Rejected(String),
}

/// Parse the raw completion into validated transactions.
///
/// Errors only when no structured payload can be found at all; a non-empty
/// candidate list whose every entry fails coercion is a legitimate outcome
/// (empty `transactions`, `rejected` equal to the candidate count).
pub fn normalize_completion(raw: &str, page_count: usize) -> Result<NormalizedBatch, ParseError> {
    let candidates = parse_candidates(raw)?;

    if candidates.len() > page_count.max(1) * CANDIDATES_PER_PAGE_BOUND {
        tracing::warn!(
            candidates = candidates.len(),
            page_count,
            "candidate count out of proportion to page count"
        );
    }

    let mut transactions = Vec::with_capacity(candidates.len());
    let mut rejected = 0usize;

    for (index, candidate) in candidates.iter().enumerate() {
        match coerce_candidate(candidate) {
            Coerced::Ok(txn) => transactions.push(txn),
            Coerced::Rejected(reason) => {
                tracing::warn!(index, %reason, "dropping candidate record");
                rejected += 1;
            }
        }
    }

    Ok(NormalizedBatch {
        transactions,
        rejected,
    })
}

/// Extract the candidate list from the completion text.
///
/// First a straight parse of the whole text; on failure or non-array shape,
/// exactly one recovery attempt on the first balanced `[...]` payload (the
/// model often wraps the array in prose or a code fence).
fn parse_candidates(raw: &str) -> Result<Vec<Value>, ParseError> {
    let trimmed = raw.trim().trim_start_matches('\u{feff}');

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(items);
    }

    if let Some(slice) = first_balanced_array(trimmed) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(slice) {
            return Ok(items);
        }
    }

    tracing::debug!(raw_len = raw.len(), "no structured payload in completion");
    Err(ParseError::MalformedResponse {
        raw: raw.to_string(),
    })
}

/// Locate the first `[` and return the substring through its matching `]`,
/// tracking nesting depth and skipping brackets inside string literals.
fn first_balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Coerce one candidate mapping into a `Transaction`.
///
/// Required fields: `date`, `particulars`, `amount`, `transaction_type`.
/// Any of them missing or uncoercible rejects the record. Optional fields
/// degrade to `None` instead.
fn coerce_candidate(candidate: &Value) -> Coerced {
    let Some(map) = candidate.as_object() else {
        return Coerced::Rejected("candidate is not an object".to_string());
    };

    let Some(date) = required_text(map, "date") else {
        return Coerced::Rejected("missing or empty date".to_string());
    };
    let Some(particulars) = required_text(map, "particulars") else {
        return Coerced::Rejected("missing or empty particulars".to_string());
    };

    let amount = match map.get("amount").map(coerce_decimal) {
        Some(Ok(amount)) if amount >= Decimal::ZERO => amount,
        Some(Ok(amount)) => {
            return Coerced::Rejected(format!("negative amount magnitude: {amount}"));
        }
        Some(Err(reason)) => return Coerced::Rejected(format!("bad amount: {reason}")),
        None => return Coerced::Rejected("missing amount".to_string()),
    };

    let transaction_type = match map.get("transaction_type").and_then(Value::as_str) {
        Some(label) => match TransactionType::from_label(label) {
            Some(tt) => tt,
            None => {
                return Coerced::Rejected(format!("unknown transaction_type: {label:?}"));
            }
        },
        None => return Coerced::Rejected("missing transaction_type".to_string()),
    };

    // Optional running balance: unparseable values degrade to None rather
    // than rejecting an otherwise valid record.
    let balance = map.get("balance").and_then(|v| coerce_decimal(v).ok());

    Coerced::Ok(Transaction {
        date,
        particulars,
        amount,
        transaction_type,
        balance,
        reference_no: optional_text(map, "reference_no"),
        value_date: optional_text(map, "value_date"),
        narration: optional_text(map, "narration"),
        cheque_no: optional_text(map, "cheque_no"),
    })
}

/// Non-empty trimmed string or nothing: required fields never default.
fn required_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Absent, null, or empty all collapse to `None`, preserving the
/// missing-vs-present distinction downstream.
fn optional_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a numeric field that may arrive as a JSON number or as a string
/// with currency symbols and thousands separators.
fn coerce_decimal(value: &Value) -> Result<Decimal, String> {
    match value {
        Value::Number(n) => {
            Decimal::from_str(&n.to_string()).map_err(|e| format!("unparseable number {n}: {e}"))
        }
        Value::String(s) => {
            let cleaned = NUMERIC_NOISE.replace_all(s, "");
            if cleaned.is_empty() {
                return Err(format!("no digits in {s:?}"));
            }
            Decimal::from_str(&cleaned).map_err(|e| format!("unparseable amount {s:?}: {e}"))
        }
        Value::Null => Err("null value".to_string()),
        other => Err(format!("unsupported value shape: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_plain_array_with_separators_and_dr_code() {
        let raw = r#"[{"date":"01-01-2024","particulars":"ATM WDL","amount":"1,000.00","transaction_type":"DR"}]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.rejected, 0);
        assert_eq!(batch.transactions.len(), 1);
        let txn = &batch.transactions[0];
        assert_eq!(txn.amount, dec("1000.00"));
        assert_eq!(txn.transaction_type, TransactionType::Debit);
        assert_eq!(txn.balance, None);
        assert_eq!(txn.narration, None);
    }

    #[test]
    fn test_recovers_payload_wrapped_in_prose() {
        let raw = r#"Here is the data: [{"date":"02-01-2024","particulars":"Salary","amount":"50000","transaction_type":"credit"}] Hope this helps!"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].transaction_type, TransactionType::Credit);
        assert_eq!(batch.transactions[0].amount, dec("50000"));
    }

    #[test]
    fn test_recovers_payload_in_code_fence() {
        let raw = "```json\n[{\"date\":\"03-01-2024\",\"particulars\":\"NEFT\",\"amount\":250,\"transaction_type\":\"CR\"}]\n```";
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].amount, dec("250"));
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = normalize_completion("not json at all", 1).unwrap_err();
        match err {
            ParseError::MalformedResponse { raw } => assert_eq!(raw, "not json at all"),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_single_mapping_without_array_is_malformed() {
        let raw = r#"{"date":"01-01-2024","particulars":"x","amount":1,"transaction_type":"DR"}"#;
        assert!(matches!(
            normalize_completion(raw, 1),
            Err(ParseError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_missing_required_field_rejects_only_that_record() {
        let raw = r#"[
            {"date":"01-01-2024","particulars":"ATM WDL","amount":"100.00","transaction_type":"DR"},
            {"date":"02-01-2024","particulars":"Broken","transaction_type":"DR"}
        ]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.rejected, 1);
        assert_eq!(batch.transactions[0].particulars, "ATM WDL");
    }

    #[test]
    fn test_negative_amount_rejected_not_negated() {
        let raw = r#"[{"date":"01-01-2024","particulars":"Refund","amount":"-50.00","transaction_type":"CR"}]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert!(batch.transactions.is_empty());
        assert_eq!(batch.rejected, 1);
    }

    #[test]
    fn test_all_rejected_is_not_an_error() {
        let raw = r#"[{"particulars":"no date"},{"date":"x"}]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert!(batch.transactions.is_empty());
        assert_eq!(batch.rejected, 2);
    }

    #[test]
    fn test_order_preserved_no_dedup() {
        let raw = r#"[
            {"date":"02-01-2024","particulars":"B","amount":2,"transaction_type":"CR"},
            {"date":"01-01-2024","particulars":"A","amount":1,"transaction_type":"DR"},
            {"date":"01-01-2024","particulars":"A","amount":1,"transaction_type":"DR"}
        ]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        let order: Vec<&str> = batch
            .transactions
            .iter()
            .map(|t| t.particulars.as_str())
            .collect();
        assert_eq!(order, ["B", "A", "A"]);
    }

    #[test]
    fn test_currency_symbols_stripped() {
        let raw = r#"[{"date":"01-01-2024","particulars":"UPI","amount":"₹ 1,234.56","transaction_type":"DR","balance":"$5,000.00"}]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.transactions[0].amount, dec("1234.56"));
        assert_eq!(batch.transactions[0].balance, Some(dec("5000.00")));
    }

    #[test]
    fn test_unparseable_balance_degrades_to_none() {
        let raw = r#"[{"date":"01-01-2024","particulars":"X","amount":"10","transaction_type":"DR","balance":"n/a"}]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].balance, None);
    }

    #[test]
    fn test_empty_optional_strings_become_none() {
        let raw = r#"[{"date":"01-01-2024","particulars":"X","amount":"10","transaction_type":"DR","reference_no":"","narration":"  "}]"#;
        let batch = normalize_completion(raw, 1).unwrap();
        let txn = &batch.transactions[0];
        assert_eq!(txn.reference_no, None);
        assert_eq!(txn.narration, None);
    }

    #[test]
    fn test_decimal_coercion_idempotent() {
        // Re-coercing the rendered value yields the same decimal.
        let first = coerce_decimal(&Value::String("1,000.00".to_string())).unwrap();
        let again = coerce_decimal(&Value::String(first.to_string())).unwrap();
        assert_eq!(first, again);
        assert_eq!(again.to_string(), "1000.00");
    }

    #[test]
    fn test_balanced_scan_ignores_brackets_in_strings() {
        let raw = r#"noise [{"date":"01-01-2024","particulars":"FEE [Q1] adj","amount":1,"transaction_type":"DR"}] tail"#;
        let batch = normalize_completion(raw, 1).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].particulars, "FEE [Q1] adj");
    }
}
