//! Trailing 12-month upload histogram.

use chrono::{DateTime, Datelike, Utc};

use crate::models::{
    object::StorageObject,
    usage::{MonthlyUsage, UsageReport, UsageSummary},
};

pub const WINDOW_MONTHS: i32 = 12;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Months since year 0, so calendar months can be compared and subtracted.
fn month_index<T: Datelike>(date: &T) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn empty_bucket(index: i32) -> MonthlyUsage {
    let year = index.div_euclid(12);
    let month0 = index.rem_euclid(12) as usize;
    MonthlyUsage {
        month: format!("{:04}-{:02}", year, month0 + 1),
        month_name: format!("{} {}", MONTH_NAMES[month0], year),
        total_size: 0,
        file_count: 0,
        size_in_mib: 0.0,
    }
}

/// Bucket `records` by the UTC calendar month of `uploaded_at`.
///
/// Always yields exactly [`WINDOW_MONTHS`] buckets, oldest first, ending with
/// the month containing `now`. Records outside the window are skipped. The
/// result does not depend on the order of `records`.
pub fn monthly_usage(records: &[StorageObject], now: DateTime<Utc>) -> UsageReport {
    let newest = month_index(&now);
    let oldest = newest - (WINDOW_MONTHS - 1);

    let mut months: Vec<MonthlyUsage> = (oldest..=newest).map(empty_bucket).collect();

    for record in records {
        let idx = month_index(&record.uploaded_at);
        if idx < oldest || idx > newest {
            continue;
        }
        let bucket = &mut months[(idx - oldest) as usize];
        bucket.total_size += record.size_bytes;
        bucket.file_count += 1;
    }

    let mut total_size = 0i64;
    let mut total_files = 0u64;
    for bucket in &mut months {
        bucket.size_in_mib = bucket.total_size as f64 / BYTES_PER_MIB;
        total_size += bucket.total_size;
        total_files += bucket.file_count;
    }

    UsageReport {
        months,
        summary: UsageSummary {
            total_size_in_bytes: total_size,
            total_size_in_mib: total_size as f64 / BYTES_PER_MIB,
            total_size_in_gib: total_size as f64 / BYTES_PER_GIB,
            total_files,
        },
    }
}
