//! Weekly digest of open corrective actions, emailed per client.

pub mod digest;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use digest::{ActionBacklog, ActionCounts, DigestLine};
pub use router::weekly_summary_router;
pub use service::{ClientSummary, SummaryResult, WeeklySummaryError, WeeklySummaryService};
