//! bankparse-core: transaction data model, completion normalizer, summary
//! statistics, and export adapters. No I/O and no network in this crate.

pub mod error;
pub mod export;
pub mod normalize;
pub mod summary;
pub mod transaction;

pub use error::ParseError;
pub use normalize::{NormalizedBatch, normalize_completion};
pub use summary::Summary;
pub use transaction::{Transaction, TransactionType};
