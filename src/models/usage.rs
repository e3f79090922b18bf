//! Monthly usage histogram returned by the dashboard.

use serde::{Deserialize, Serialize};

/// One calendar month of uploads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyUsage {
    /// `YYYY-MM` key.
    pub month: String,

    /// Display name such as `October 2026`.
    pub month_name: String,

    /// Cumulative bytes uploaded during the month.
    pub total_size: i64,

    pub file_count: u64,

    #[serde(rename = "sizeInMB")]
    pub size_in_mib: f64,
}

/// Totals across the whole trailing window.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_size_in_bytes: i64,
    #[serde(rename = "totalSizeInMB")]
    pub total_size_in_mib: f64,
    #[serde(rename = "totalSizeInGB")]
    pub total_size_in_gib: f64,
    pub total_files: u64,
}

/// Dense 12-month series, oldest month first, plus its summary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UsageReport {
    pub months: Vec<MonthlyUsage>,
    pub summary: UsageSummary,
}
