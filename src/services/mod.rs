pub mod analytics;
pub mod catalog;

pub use analytics::{summarize, AnalyticsSummary};
pub use catalog::{CatalogError, CatalogService};
