use chrono::NaiveDate;
use chrono::NaiveTime;

use serde::Deserialize;
use serde::Serialize;

/// Column names of the diary file, in the order they are written.
pub const HEADER: [&str; 5] = ["Date", "Activity", "Start Time", "End Time", "Duration (min)"];

/// One logged interval of time spent on a named activity. This is exactly one row of the diary
/// file. Records are never modified after they are appended, so the duration is computed once by
/// [ActivityRecord::new] and stored alongside the times it was derived from.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Activity")]
    pub activity: String,
    #[serde(rename = "Start Time", with = "hour_minute")]
    pub start_time: NaiveTime,
    #[serde(rename = "End Time", with = "hour_minute")]
    pub end_time: NaiveTime,
    #[serde(rename = "Duration (min)")]
    pub duration_minutes: f64,
}

impl ActivityRecord {
    /// `duration_minutes` is taken as is, because live logging measures it with sub-minute
    /// precision while the stored times are truncated to minutes.
    pub fn new(
        date: NaiveDate,
        activity: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_minutes: f64,
    ) -> Self {
        Self {
            date,
            activity: activity.into(),
            start_time,
            end_time,
            duration_minutes,
        }
    }
}

mod hour_minute {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(s.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
