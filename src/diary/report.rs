use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use chrono::{Datelike, Month, NaiveDate};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::utils::time::format_minutes;

use super::{entities::ActivityRecord, error::DiaryResult, record_storage::RecordStorage};

/// Granularity of a report.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Daily => write!(f, "daily"),
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
        }
    }
}

impl Period {
    pub fn bucket(&self, date: NaiveDate) -> Bucket {
        match self {
            Period::Daily => Bucket::Day(date),
            Period::Weekly => Bucket::Week(date.iso_week().week()),
            Period::Monthly => Bucket::Month(date.month()),
        }
    }
}

/// Aggregation key derived from a record's date. Weeks and months are numbers only, so the same
/// week of different years ends up in one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Day(NaiveDate),
    /// ISO-8601 week number, 1 to 53.
    Week(u32),
    /// Calendar month, 1 to 12.
    Month(u32),
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bucket::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Bucket::Week(week) => write!(f, "W{week:02}"),
            Bucket::Month(month) => match u8::try_from(*month).ok().map(Month::try_from) {
                Some(Ok(month)) => write!(f, "{}", month.name()),
                _ => write!(f, "M{month:02}"),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub bucket: String,
    pub activity: String,
    pub minutes: f64,
}

/// Minutes spent per `(bucket, activity)`. Iteration is ascending by bucket, then by activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    totals: BTreeMap<(Bucket, String), f64>,
}

impl Report {
    pub fn from_records<'a>(
        period: Period,
        records: impl IntoIterator<Item = &'a ActivityRecord>,
    ) -> Self {
        let mut groups = BTreeMap::<(Bucket, String), Vec<f64>>::new();
        for record in records {
            groups
                .entry((period.bucket(record.date), record.activity.clone()))
                .or_default()
                .push(record.duration_minutes);
        }

        // Floating point addition isn't associative. Summing in sorted order makes the totals
        // independent from the order records were stored in.
        let totals = groups
            .into_iter()
            .map(|(key, mut durations)| {
                durations.sort_by(f64::total_cmp);
                (key, durations.into_iter().sum())
            })
            .collect();

        Self { totals }
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn get(&self, bucket: Bucket, activity: &str) -> Option<f64> {
        self.totals.get(&(bucket, activity.to_string())).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (Bucket, &str, f64)> {
        self.totals
            .iter()
            .map(|((bucket, activity), minutes)| (*bucket, activity.as_str(), *minutes))
    }

    /// Distinct buckets in ascending order.
    pub fn buckets(&self) -> Vec<Bucket> {
        let mut buckets = self.totals.keys().map(|(b, _)| *b).collect::<Vec<_>>();
        buckets.dedup();
        buckets
    }

    /// Distinct activities in ascending order.
    pub fn activities(&self) -> Vec<&str> {
        self.totals
            .keys()
            .map(|(_, a)| a.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn bucket_total(&self, bucket: Bucket) -> f64 {
        self.entries()
            .filter(|(b, _, _)| *b == bucket)
            .map(|(_, _, minutes)| minutes)
            .sum()
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.entries()
            .map(|(bucket, activity, minutes)| ReportRow {
                bucket: bucket.to_string(),
                activity: activity.to_string(),
                minutes,
            })
            .collect()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (bucket, activity, minutes) in self.entries() {
            writeln!(f, "{bucket}\t{}\t{activity}", format_minutes(minutes))?;
        }
        Ok(())
    }
}

/// Builds [Report]s out of everything in the storage.
pub struct ReportAggregator<R: RecordStorage> {
    storage: R,
}

impl<R: RecordStorage> ReportAggregator<R> {
    pub fn new(storage: R) -> Self {
        Self { storage }
    }

    /// An empty storage gives an empty report. Missing storage is reported by the storage itself.
    #[instrument(skip(self))]
    pub async fn aggregate(&self, period: Period) -> DiaryResult<Report> {
        let records = self.storage.load_all().await?;
        let report = Report::from_records(period, &records);
        debug!(
            "Aggregated {} records into {} entries",
            records.len(),
            report.len()
        );
        Ok(report)
    }
}
