use std::io::{self, Write};

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tracing::{debug, error};

use crate::{
    diary::{
        error::{DiaryError, DiaryResult},
        record_storage::RecordStorage,
        report::Period,
    },
    utils::clock::Clock,
};

use super::{
    chart::Plotter,
    prompt::{Prompt, StopOnEnter},
    session::{print_logged, Session},
};

const MENU: &str = "\n\
1. Start an activity\n\
2. Log a past activity\n\
3. Generate a daily report\n\
4. Generate a weekly report\n\
5. Generate a monthly report\n\
0. Exit\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    StartActivity,
    LogPastActivity,
    Report(Period),
    Exit,
}

impl MenuCommand {
    pub fn parse(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::StartActivity),
            "2" => Some(Self::LogPastActivity),
            "3" => Some(Self::Report(Period::Daily)),
            "4" => Some(Self::Report(Period::Weekly)),
            "5" => Some(Self::Report(Period::Monthly)),
            "0" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Interactive loop. Every failed command is reported and the loop goes on, only `0` or closed
/// input end it.
pub async fn run_menu<R: RecordStorage, C: Clock, I: AsyncBufRead + Unpin>(
    session: &Session<R, C>,
    prompt: &mut Prompt<I>,
    plotter: &mut dyn Plotter,
    out: &mut impl Write,
) -> Result<()> {
    loop {
        write!(out, "{MENU}")?;
        let choice = match prompt.ask(out, "\nChoose an option: ").await {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                writeln!(out)?;
                return say_goodbye(out);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(command) = MenuCommand::parse(&choice) else {
            writeln!(out, "Invalid choice, please try again.")?;
            continue;
        };
        debug!("Menu command {command:?}");

        let result = match command {
            MenuCommand::Exit => return say_goodbye(out),
            MenuCommand::StartActivity => start_activity(session, prompt, out).await,
            MenuCommand::LogPastActivity => log_past_activity(session, prompt, out).await,
            MenuCommand::Report(period) => session
                .show_report(period, plotter, out)
                .await
                .map(|_| ()),
        };

        if let Err(e) = result {
            report_error(out, &e)?;
        }
    }
}

fn say_goodbye(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Goodbye!")?;
    Ok(())
}

/// Prints an error to the user. Storage failures are additionally logged.
pub fn report_error(out: &mut impl Write, e: &DiaryError) -> io::Result<()> {
    if matches!(e, DiaryError::Io(_) | DiaryError::Csv(_)) {
        error!("Command failed {e:?}");
    }
    writeln!(out, "{e}")
}

async fn start_activity<R: RecordStorage, C: Clock, I: AsyncBufRead + Unpin>(
    session: &Session<R, C>,
    prompt: &mut Prompt<I>,
    out: &mut impl Write,
) -> DiaryResult<()> {
    let activity = prompt.ask(out, "Enter the activity name: ").await?;
    let record = {
        let mut stop = StopOnEnter::new(prompt, out, &activity, false);
        session.logger.log_live(&activity, &mut stop).await?
    };
    print_logged(out, &record)?;
    Ok(())
}

async fn log_past_activity<R: RecordStorage, C: Clock, I: AsyncBufRead + Unpin>(
    session: &Session<R, C>,
    prompt: &mut Prompt<I>,
    out: &mut impl Write,
) -> DiaryResult<()> {
    let activity = prompt.ask(out, "Enter the activity: ").await?;
    let date = prompt
        .ask(
            out,
            "Enter the date of activity (YYYY-MM-DD) or press Enter for today's date: ",
        )
        .await?;
    let start = prompt.ask(out, "Enter start time (HH:MM): ").await?;
    let end = prompt.ask(out, "Enter end time (HH:MM): ").await?;

    let record = session
        .logger
        .log_retroactive(&activity, &date, &start, &end)
        .await?;
    print_logged(out, &record)?;
    Ok(())
}
