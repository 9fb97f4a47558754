//! Durable daily summaries and the history query engine
//!
//! One row per local calendar day, written on day rollover when the
//! coverage gate passes, queried by the three fixed history modes.

pub mod query;
pub mod store;

pub use query::HistoryQuery;
pub use store::{DailySummary, DailySummaryRecord, StoreError, SummaryStore};
