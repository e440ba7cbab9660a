//! Output formatting
//!
//! Console banners and summaries, the per-request metrics file, and the
//! optional JSON run summary.

pub mod json;
pub mod metrics;
pub mod text;
