pub mod chart;
pub mod menu;
pub mod prompt;
pub mod session;

use std::{io::Write, path::PathBuf, rc::Rc};

use anyhow::Result;
use chart::{Plotter, TerminalChart};
use clap::{Parser, Subcommand};
use menu::run_menu;
use prompt::{Prompt, StopOnEnter};
use session::{print_logged, Session};
use tokio::io::BufReader;
use tracing::info;

use crate::{
    diary::{
        record_storage::{CsvRecordStorage, RecordStorage},
        report::Period,
    },
    utils::{
        clock::{Clock, LocalClock},
        dir::{create_application_default_path, create_dir, default_diary_path},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Timediary", version, long_about = None)]
#[command(about = "Log activities and see where your time goes", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/timediary or $HOME/.local/state/timediary"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Activity file. By default time_diary.csv inside the application directory"
    )]
    file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Interactive menu. Used when no command is given")]
    Menu,
    #[command(about = "Start an activity now and log it once Enter or Ctrl-C is pressed")]
    Start { activity: String },
    #[command(about = "Log an activity that already happened")]
    Log {
        activity: String,
        #[arg(long, help = "Date of the activity as YYYY-MM-DD. Today by default")]
        date: Option<String>,
        #[arg(long, help = "Start time as HH:MM")]
        start: String,
        #[arg(long, help = "End time as HH:MM")]
        end: String,
    },
    #[command(about = "Show minutes spent per activity")]
    Report {
        period: Period,
        #[arg(long, help = "Don't draw the chart")]
        no_chart: bool,
        #[arg(long, help = "Print the report as json rows instead")]
        json: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, create_dir)?;

    enable_logging(&app_dir, args.log)?;

    let diary_path = args.file.unwrap_or_else(|| default_diary_path(&app_dir));
    info!("Using activity file {diary_path:?}");
    let session = Session::new(Rc::new(CsvRecordStorage::new(diary_path)?), LocalClock);

    let mut prompt = Prompt::new(BufReader::new(tokio::io::stdin()));
    let mut plotter = TerminalChart::stdout();
    let mut out = std::io::stdout();

    match args.commands.unwrap_or(Commands::Menu) {
        Commands::Menu => run_menu(&session, &mut prompt, &mut plotter, &mut out).await,
        Commands::Start { activity } => {
            let record = {
                let mut stop = StopOnEnter::new(&mut prompt, &mut out, &activity, true);
                session.logger.log_live(&activity, &mut stop).await?
            };
            print_logged(&mut out, &record)?;
            Ok(())
        }
        Commands::Log {
            activity,
            date,
            start,
            end,
        } => {
            let record = session
                .logger
                .log_retroactive(&activity, date.as_deref().unwrap_or(""), &start, &end)
                .await?;
            print_logged(&mut out, &record)?;
            Ok(())
        }
        Commands::Report {
            period,
            no_chart,
            json,
        } => process_report_command(&session, period, no_chart, json, &mut plotter, &mut out).await,
    }
}

/// `report` command. Missing or empty activity file is a message, not a failure.
async fn process_report_command<R: RecordStorage, C: Clock>(
    session: &Session<R, C>,
    period: Period,
    no_chart: bool,
    json: bool,
    plotter: &mut dyn Plotter,
    out: &mut impl Write,
) -> Result<()> {
    let result = if json {
        match session.aggregator.aggregate(period).await {
            Ok(report) => {
                serde_json::to_writer_pretty(&mut *out, &report.rows())?;
                writeln!(out)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    } else if no_chart {
        session.generate_report(period, out).await.map(|_| ())
    } else {
        session.show_report(period, plotter, out).await.map(|_| ())
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_benign() => {
            writeln!(out, "{e}")?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
