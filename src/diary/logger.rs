use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{info, instrument};

use crate::utils::{
    clock::Clock,
    time::{parse_date, parse_time, truncate_to_minute},
};

use super::{
    entities::ActivityRecord,
    error::{DiaryError, DiaryResult},
    record_storage::RecordStorage,
};

/// Signal that ends a live activity. Waiting may block for as long as the activity goes on.
#[async_trait(?Send)]
pub trait StopSignal {
    async fn wait(&mut self) -> std::io::Result<()>;
}

/// Turns start/end pairs into [ActivityRecord]s and hands them to the storage.
pub struct ActivityLogger<R: RecordStorage, C: Clock> {
    storage: R,
    clock: C,
}

impl<R: RecordStorage, C: Clock> ActivityLogger<R, C> {
    pub fn new(storage: R, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &R {
        &self.storage
    }

    /// Logs `activity` between `start` and `end`. Everything is validated before the storage is
    /// touched, so a failed call never leaves a partial write.
    #[instrument(skip(self))]
    pub async fn log(
        &self,
        activity: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DiaryResult<ActivityRecord> {
        let activity = validate_activity(activity)?;

        if start.date() != end.date() {
            return Err(DiaryError::InvalidTime(format!(
                "activity from {start} to {end} spans midnight"
            )));
        }
        if end < start {
            return Err(DiaryError::InvalidTime(format!(
                "end time {} is before start time {}",
                end.format("%H:%M"),
                start.format("%H:%M")
            )));
        }

        let duration_minutes = (end - start).num_milliseconds() as f64 / 60_000.;
        let record = ActivityRecord::new(
            start.date(),
            activity,
            truncate_to_minute(start.time()),
            truncate_to_minute(end.time()),
            duration_minutes,
        );

        self.storage.append(&record).await?;
        info!("Logged {activity} for {duration_minutes} minutes");
        Ok(record)
    }

    /// Starts `activity` now and logs it once `stop` fires.
    pub async fn log_live(
        &self,
        activity: &str,
        stop: &mut (impl StopSignal + ?Sized),
    ) -> DiaryResult<ActivityRecord> {
        let activity = validate_activity(activity)?;
        let start = self.clock.now();
        info!("Started {activity} at {start}");
        stop.wait().await?;
        let end = self.clock.now();
        self.log(activity, start, end).await
    }

    /// Logs an activity that already happened. Empty `date` means today.
    pub async fn log_retroactive(
        &self,
        activity: &str,
        date: &str,
        start: &str,
        end: &str,
    ) -> DiaryResult<ActivityRecord> {
        let activity = validate_activity(activity)?;
        let date = parse_date(date, self.clock.now().date())?;
        let start = parse_time(start)?;
        let end = parse_time(end)?;
        self.log(activity, date.and_time(start), date.and_time(end))
            .await
    }
}

fn validate_activity(activity: &str) -> DiaryResult<&str> {
    let activity = activity.trim();
    if activity.is_empty() {
        Err(DiaryError::EmptyActivity)
    } else {
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        diary::{
            error::DiaryError,
            logger::{ActivityLogger, StopSignal},
            record_storage::{MemoryRecordStorage, RecordStorage},
        },
        utils::clock::MockClock,
    };

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn fixed_clock(now: NaiveDateTime) -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now().returning(move || now);
        clock
    }

    struct Immediate;

    #[async_trait(?Send)]
    impl StopSignal for Immediate {
        async fn wait(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_log_appends_one_record() -> Result<()> {
        let logger = ActivityLogger::new(MemoryRecordStorage::new(), fixed_clock(at(1, 0, 0, 0)));

        let record = logger.log("Read", at(1, 9, 0, 0), at(1, 9, 30, 0)).await?;
        assert_eq!(record.duration_minutes, 30.);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        logger.log(" Walk ", at(1, 10, 0, 0), at(1, 10, 15, 30)).await?;

        let stored = logger.storage().load_all().await?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].activity, "Walk");
        assert_eq!(stored[1].duration_minutes, 15.5);
        assert_eq!(stored[1].end_time, NaiveTime::from_hms_opt(10, 15, 0).unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_log_zero_length_activity() -> Result<()> {
        let logger = ActivityLogger::new(MemoryRecordStorage::new(), fixed_clock(at(1, 0, 0, 0)));
        let record = logger.log("Nap", at(1, 13, 0, 0), at(1, 13, 0, 0)).await?;
        assert_eq!(record.duration_minutes, 0.);
        Ok(())
    }

    #[tokio::test]
    async fn test_log_rejects_invalid_input_without_writes() -> Result<()> {
        let logger = ActivityLogger::new(MemoryRecordStorage::new(), fixed_clock(at(1, 0, 0, 0)));

        assert!(matches!(
            logger.log("Read", at(1, 10, 0, 0), at(1, 9, 0, 0)).await,
            Err(DiaryError::InvalidTime(_))
        ));
        assert!(matches!(
            logger.log("Read", at(1, 23, 0, 0), at(2, 1, 0, 0)).await,
            Err(DiaryError::InvalidTime(_))
        ));
        assert!(matches!(
            logger.log("   ", at(1, 9, 0, 0), at(1, 10, 0, 0)).await,
            Err(DiaryError::EmptyActivity)
        ));
        assert!(matches!(
            logger
                .log_retroactive("Read", "2024-13-40", "09:00", "10:00")
                .await,
            Err(DiaryError::InvalidDate(_))
        ));
        assert!(matches!(
            logger
                .log_retroactive("Read", "2024-01-01", "25:61", "10:00")
                .await,
            Err(DiaryError::InvalidTime(_))
        ));

        assert_eq!(logger.storage().records(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_log_retroactive_defaults_to_today() -> Result<()> {
        let logger = ActivityLogger::new(MemoryRecordStorage::new(), fixed_clock(at(5, 20, 0, 0)));

        let record = logger.log_retroactive("Gym", "", "18:00", "19:10").await?;
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(record.duration_minutes, 70.);

        let record = logger
            .log_retroactive("Gym", "2023-12-31", "07:00", "07:45")
            .await?;
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_log_live_uses_clock_around_stop() -> Result<()> {
        let mut clock = MockClock::new();
        let mut times = vec![at(3, 14, 0, 0), at(3, 14, 42, 30)].into_iter();
        clock
            .expect_now()
            .times(2)
            .returning(move || times.next().unwrap());
        let logger = ActivityLogger::new(MemoryRecordStorage::new(), clock);

        let record = logger.log_live("Write", &mut Immediate).await?;
        assert_eq!(record.duration_minutes, 42.5);
        assert_eq!(record.start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(record.end_time, NaiveTime::from_hms_opt(14, 42, 0).unwrap());
        Ok(())
    }
}
