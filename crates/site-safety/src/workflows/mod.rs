//! Tenant-scoped safety workflows exposed over HTTP.

pub mod actions;
pub mod inspections;
pub mod weekly_summary;

#[cfg(test)]
pub(crate) mod fixtures;
