use std::io::Write;

use tracing::{debug, warn};

use crate::{
    diary::{
        entities::ActivityRecord,
        error::{DiaryError, DiaryResult},
        logger::ActivityLogger,
        record_storage::RecordStorage,
        report::{Period, Report, ReportAggregator},
    },
    utils::{clock::Clock, time::format_minutes},
};

use super::chart::Plotter;

/// Everything a command needs: the logger (write path) and the aggregator (read path) sharing
/// one storage.
pub struct Session<R: RecordStorage, C: Clock> {
    pub logger: ActivityLogger<R, C>,
    pub aggregator: ReportAggregator<R>,
}

impl<R: RecordStorage + Clone, C: Clock> Session<R, C> {
    pub fn new(storage: R, clock: C) -> Self {
        Self {
            logger: ActivityLogger::new(storage.clone(), clock),
            aggregator: ReportAggregator::new(storage),
        }
    }
}

impl<R: RecordStorage, C: Clock> Session<R, C> {
    /// Prints the report for `period` and charts it. Returns [DiaryError::EmptyData] without
    /// charting if there is nothing to show.
    pub async fn show_report(
        &self,
        period: Period,
        plotter: &mut dyn Plotter,
        out: &mut impl Write,
    ) -> DiaryResult<Report> {
        let report = self.generate_report(period, out).await?;
        if let Err(e) = plotter.plot(&report) {
            warn!("Failed to plot {period} report {e:?}");
            writeln!(out, "Failed to display the chart: {e}")?;
        }
        Ok(report)
    }

    /// Prints the report for `period` without charting it.
    pub async fn generate_report(&self, period: Period, out: &mut impl Write) -> DiaryResult<Report> {
        let report = self.aggregator.aggregate(period).await?;
        if report.is_empty() {
            debug!("Nothing to report for {period}");
            return Err(DiaryError::EmptyData);
        }
        write!(out, "{report}")?;
        Ok(report)
    }
}

pub fn print_logged(out: &mut impl Write, record: &ActivityRecord) -> std::io::Result<()> {
    writeln!(
        out,
        "Logged: {} for {} minutes.",
        record.activity,
        format_minutes(record.duration_minutes)
    )
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveTime};

    use crate::{
        cli::chart::MockPlotter,
        diary::{
            entities::ActivityRecord, error::DiaryError, record_storage::MemoryRecordStorage,
            report::Period,
        },
        utils::clock::LocalClock,
    };

    use super::Session;

    #[tokio::test]
    async fn test_show_report_plots_non_empty() -> Result<()> {
        let storage = Rc::new(MemoryRecordStorage::with_records(vec![ActivityRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "Read",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            45.,
        )]));
        let session = Session::new(storage, LocalClock);
        let mut plotter = MockPlotter::new();
        plotter
            .expect_plot()
            .withf(|report| report.len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        let mut out = Vec::<u8>::new();

        session
            .show_report(Period::Monthly, &mut plotter, &mut out)
            .await?;
        assert_eq!(String::from_utf8(out)?, "January\t45\tRead\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_show_report_skips_plot_when_empty() -> Result<()> {
        let session = Session::new(Rc::new(MemoryRecordStorage::with_records(vec![])), LocalClock);
        let mut plotter = MockPlotter::new();
        plotter.expect_plot().never();

        let result = session
            .show_report(Period::Daily, &mut plotter, &mut Vec::new())
            .await;
        assert!(matches!(result, Err(DiaryError::EmptyData)));
        Ok(())
    }
}
