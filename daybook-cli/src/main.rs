mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use daybook_core::config::GlobalConfig;
use daybook_core::recurrence::{Frequency, RecurrencePattern};
use daybook_core::store::{JsonFileKv, Store};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Tasks, events and notes with recurring occurrences and remote sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RecurrenceArgs {
    /// Repeat frequency: daily, weekly or monthly
    #[arg(long, value_name = "FREQ")]
    every: Option<String>,

    /// Repeat every N units of the frequency
    #[arg(long, default_value_t = 1)]
    interval: u32,

    /// Weekdays for weekly repeats, e.g. "mon,wed" or "1,3"
    #[arg(long, value_name = "DAYS")]
    on: Option<String>,

    /// Last date an occurrence may fall on (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    until: Option<String>,

    /// Stop after this many occurrences
    #[arg(long, value_name = "N")]
    times: Option<u32>,
}

impl RecurrenceArgs {
    fn to_pattern(&self) -> Result<Option<RecurrencePattern>> {
        let Some(every) = &self.every else {
            return Ok(None);
        };
        let frequency = match every.as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            other => anyhow::bail!("Unknown frequency '{other}'. Expected daily, weekly or monthly"),
        };
        let days_of_week = match (frequency, &self.on) {
            (Frequency::Weekly, Some(days)) => Some(utils::parse_weekdays(days)?),
            (Frequency::Weekly, None) => {
                anyhow::bail!("Weekly repeats need --on, e.g. --on mon,wed")
            }
            _ => None,
        };
        let end_date = self.until.as_deref().map(utils::parse_date_arg).transpose()?;
        Ok(Some(RecurrencePattern {
            frequency,
            interval: self.interval,
            end_date,
            end_after: self.times,
            days_of_week,
        }))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        text: String,

        /// Due date (YYYY-MM-DD); the anchor date when repeating
        #[arg(long, value_name = "DATE")]
        due: Option<String>,

        /// Priority: low, medium or high
        #[arg(long, value_name = "LEVEL")]
        priority: Option<String>,

        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Mark a task (or one occurrence of a repeating task) done
    Done {
        /// Task id, or a unique prefix of one
        id: String,

        /// Occurrence date for repeating tasks (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        on: Option<String>,

        /// Mark not-done instead
        #[arg(long)]
        undo: bool,
    },
    /// Remove completed tasks
    Clear,
    /// Add a calendar event
    Event {
        text: String,

        /// Event date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date: String,

        /// Start time (HH:MM)
        #[arg(long, value_name = "TIME")]
        at: Option<String>,

        /// End time (HH:MM); defaults to one hour after the start
        #[arg(long, value_name = "TIME")]
        end: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// All-day event, no time slot
        #[arg(long)]
        all_day: bool,

        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },
    /// Show tasks and events for a date (or a span of days)
    Agenda {
        /// Date to show (YYYY-MM-DD), default today
        #[arg(long, value_name = "DATE")]
        date: Option<String>,

        /// Number of days to show
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
    /// Read or write the journal for a day
    Journal {
        /// Date (YYYY-MM-DD), default today
        date: Option<String>,

        /// Replace the day's entry with this content
        #[arg(long, value_name = "TEXT")]
        write: Option<String>,
    },
    /// Manage project notes
    Project {
        #[command(subcommand)]
        command: commands::project::ProjectCommands,
    },
    /// Merge local state with the remote replica
    Sync {
        /// Keep running and apply live remote changes as they arrive
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GlobalConfig::load()?;
    let kv = JsonFileKv::open(config.data_dir()?)?;
    let mut store = Store::open(Box::new(kv))?;

    match cli.command {
        Commands::Add {
            text,
            due,
            priority,
            recurrence,
        } => {
            let due = due.as_deref().map(utils::parse_date_arg).transpose()?;
            let priority = priority.as_deref().map(utils::parse_priority).transpose()?;
            commands::add::run(&mut store, text, due, priority, recurrence.to_pattern()?)
        }
        Commands::List { all } => commands::list::run(&store, all),
        Commands::Done { id, on, undo } => {
            let on = on.as_deref().map(utils::parse_date_arg).transpose()?;
            commands::done::run(&mut store, &id, on, !undo)
        }
        Commands::Clear => {
            store.clear_completed()?;
            println!("Cleared completed tasks");
            Ok(())
        }
        Commands::Event {
            text,
            date,
            at,
            end,
            location,
            all_day,
            recurrence,
        } => commands::event::run(
            &mut store,
            text,
            utils::parse_date_arg(&date)?,
            at.as_deref().map(utils::parse_time_arg).transpose()?,
            end.as_deref().map(utils::parse_time_arg).transpose()?,
            location,
            all_day,
            recurrence.to_pattern()?,
        ),
        Commands::Agenda { date, days } => {
            let date = match date.as_deref() {
                Some(s) => utils::parse_date_arg(s)?,
                None => daybook_core::date::today(),
            };
            commands::agenda::run(&store, date, days)
        }
        Commands::Journal { date, write } => {
            let date = match date.as_deref() {
                Some(s) => utils::parse_date_arg(s)?,
                None => daybook_core::date::today(),
            };
            commands::journal::run(&mut store, date, write)
        }
        Commands::Project { command } => commands::project::run(&mut store, command),
        Commands::Sync { watch } => commands::sync::run(&mut store, &config, watch).await,
    }
}
