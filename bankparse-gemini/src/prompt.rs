//! Prompt assembly for the extraction call.

use bankparse_ingest::ExtractedDocument;

/// Upper bound on statement text included in one prompt.
const MAX_TEXT_CHARS: usize = 8000;

/// Build the extraction prompt: role, field list, the DR/CR convention, the
/// statement text, and a worked output example. The model is told to return
/// only the JSON array; the normalizer copes when it does not.
pub fn build_prompt(doc: &ExtractedDocument) -> String {
    let text = truncate_chars(&doc.text, MAX_TEXT_CHARS);

    format!(
        r#"You are a financial data extraction expert. Extract all transactions from this bank statement.

INSTRUCTIONS:
1. Extract each transaction with: date, particulars, amount, transaction_type (DR/CR), balance, reference_no, value_date, narration, cheque_no
2. Handle different bank formats (ICICI, SBI, Axis, Yes Bank, etc.)
3. Amounts are non-negative magnitudes; the direction goes in transaction_type
4. Return ONLY a valid JSON array of transactions

TEXT CONTENT:
{text}

OUTPUT FORMAT:
[
  {{
    "date": "15/03/2024",
    "particulars": "ATM WITHDRAWAL",
    "amount": 1000.00,
    "transaction_type": "DR",
    "balance": 5000.00,
    "reference_no": "TXN123456",
    "value_date": "15/03/2024",
    "narration": "ATM withdrawal",
    "cheque_no": null
  }}
]

Return ONLY the JSON array, no additional text."#
    )
}

/// Cut at a char boundary; byte slicing could split a multibyte character.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
