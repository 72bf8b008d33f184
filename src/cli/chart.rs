use std::io::Write;

use ansi_term::Colour;
use anyhow::Result;

use crate::{diary::report::Report, utils::time::format_minutes};

/// Renders a [Report]. Only called with non-empty reports.
#[cfg_attr(test, mockall::automock)]
pub trait Plotter {
    fn plot(&mut self, report: &Report) -> Result<()>;
}

const TITLE: &str = "Time Spent on Activities";
const DEFAULT_WIDTH: usize = 50;
const GLYPHS: [char; 6] = ['█', '▓', '▒', '░', '#', '='];
const COLOURS: [Colour; 6] = [
    Colour::Blue,
    Colour::Yellow,
    Colour::Green,
    Colour::Red,
    Colour::Purple,
    Colour::Cyan,
];

/// Stacked horizontal bar chart in the terminal. One bar per bucket, one segment per activity,
/// bar length proportional to minutes.
pub struct TerminalChart<W> {
    out: W,
    width: usize,
    colored: bool,
}

impl TerminalChart<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), DEFAULT_WIDTH, true)
    }
}

impl<W: Write> TerminalChart<W> {
    pub fn new(out: W, width: usize, colored: bool) -> Self {
        Self {
            out,
            width,
            colored,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, index: usize, text: String) -> String {
        if self.colored {
            COLOURS[index % COLOURS.len()].paint(text).to_string()
        } else {
            text
        }
    }
}

impl<W: Write> Plotter for TerminalChart<W> {
    fn plot(&mut self, report: &Report) -> Result<()> {
        let activities = report.activities();
        let buckets = report.buckets();
        let labels = buckets.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let label_width = labels.iter().map(|v| v.chars().count()).max().unwrap_or(0);
        let max_total = buckets
            .iter()
            .map(|b| report.bucket_total(*b))
            .fold(0., f64::max);

        let mut chart = String::new();
        chart += &format!("{TITLE}\n");
        chart += &format!("{:label_width$}   Duration (minutes)\n", "Time Period");

        for (bucket, label) in buckets.iter().zip(&labels) {
            let mut bar = String::new();
            for (index, activity) in activities.iter().enumerate() {
                let Some(minutes) = report.get(*bucket, activity) else {
                    continue;
                };
                let cells = if max_total > 0. {
                    (minutes / max_total * self.width as f64).round() as usize
                } else {
                    0
                };
                let glyph = GLYPHS[index % GLYPHS.len()];
                bar += &self.paint(index, glyph.to_string().repeat(cells));
            }
            chart += &format!(
                "{label:label_width$} | {bar} {}\n",
                format_minutes(report.bucket_total(*bucket))
            );
        }

        let legend = activities
            .iter()
            .enumerate()
            .map(|(index, activity)| {
                let glyph = GLYPHS[index % GLYPHS.len()];
                format!("{} {activity}", self.paint(index, glyph.to_string().repeat(2)))
            })
            .collect::<Vec<_>>()
            .join("  ");
        chart += &format!("{legend}\n");

        self.out.write_all(chart.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveTime};

    use crate::diary::{
        entities::ActivityRecord,
        report::{Period, Report},
    };

    use super::{Plotter, TerminalChart};

    fn record(activity: &str, day: u32, minutes: f64) -> ActivityRecord {
        ActivityRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            activity,
            NaiveTime::MIN,
            NaiveTime::MIN,
            minutes,
        )
    }

    #[test]
    fn test_stacked_bars() -> Result<()> {
        let report = Report::from_records(
            Period::Daily,
            &[
                record("Read", 1, 30.),
                record("Walk", 1, 10.),
                record("Walk", 2, 20.),
            ],
        );
        let mut chart = TerminalChart::new(Vec::<u8>::new(), 8, false);
        chart.plot(&report)?;
        let output = String::from_utf8(chart.into_inner())?;

        assert_eq!(
            output,
            "Time Spent on Activities\n\
             Time Period   Duration (minutes)\n\
             2024-01-01 | ██████▓▓ 40\n\
             2024-01-02 | ▓▓▓▓ 20\n\
             ██ Read  ▓▓ Walk\n"
        );
        Ok(())
    }
}
