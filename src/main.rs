mod commands;
mod lookup;
mod render;
mod utils;

use anyhow::Result;
use chores_core::SyncStore;
use chores_core::config::ChoresConfig;
use chores_core::gateway::FileGateway;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::utils::tui;

#[derive(Parser)]
#[command(name = "chores")]
#[command(about = "Track recurring team chores on a shared calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage team members
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },
    /// Manage chores
    Chore {
        #[command(subcommand)]
        command: ChoreCommand,
    },
    /// Show chore occurrences on the calendar
    Calendar {
        /// month, week or day (defaults to default_view from config)
        #[arg(short, long)]
        view: Option<String>,

        /// Date the view is anchored on (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Explicit range start, overrides --view
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Explicit range end (inclusive)
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a chore occurrence as done
    Done {
        /// Chore id or title
        chore: String,

        /// Occurrence date (e.g. "2025-03-20", "today", "last fri")
        date: String,

        /// Member who did it (id or name)
        #[arg(short, long)]
        by: String,
    },
    /// Un-mark a completed chore occurrence
    Undo {
        /// Chore id or title
        chore: String,

        /// Occurrence date
        date: String,
    },
    /// Show who completed what
    History {
        /// Only completions by this member
        #[arg(short, long)]
        member: Option<String>,

        /// Only completions of this chore
        #[arg(short, long)]
        chore: Option<String>,
    },
}

#[derive(Subcommand)]
enum MemberCommand {
    /// List team members
    List,
    /// Add a team member
    Add {
        name: String,

        /// Hex color (defaults to the next unused palette color)
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a team member and unassign their chores
    Remove {
        /// Member id or name
        member: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ChoreCommand {
    /// List chores
    List,
    /// Create a chore
    Add {
        title: String,

        /// First (or only) date, e.g. "2025-03-20" or "next monday"
        #[arg(short, long)]
        start: String,

        #[arg(long)]
        description: Option<String>,

        /// Member id or name
        #[arg(short, long)]
        assignee: Option<String>,

        /// daily, weekly or monthly; omit for a one-time chore
        #[arg(short, long)]
        every: Option<String>,

        /// Repeat every N days/weeks/months
        #[arg(short, long, default_value_t = 1)]
        interval: u32,

        /// Weekdays for weekly chores, e.g. "mon,wed" (defaults to the start's weekday)
        #[arg(long)]
        days: Option<String>,

        /// Day of month for monthly chores (defaults to the start's day)
        #[arg(long)]
        day_of_month: Option<u8>,

        /// Last possible occurrence
        #[arg(long)]
        until: Option<String>,
    },
    /// Change a chore's details or how it repeats
    Edit {
        /// Chore id or title
        chore: String,

        #[arg(short, long)]
        title: Option<String>,

        /// New description; pass "" to clear it
        #[arg(long)]
        description: Option<String>,

        /// New first date
        #[arg(short, long)]
        start: Option<String>,

        /// daily, weekly or monthly; switching resets days and day of month
        #[arg(short, long)]
        every: Option<String>,

        #[arg(short, long)]
        interval: Option<u32>,

        /// Weekdays for weekly chores, e.g. "mon,wed"
        #[arg(long)]
        days: Option<String>,

        #[arg(long)]
        day_of_month: Option<u8>,

        /// Last possible occurrence
        #[arg(long)]
        until: Option<String>,

        /// Repeat with no end date
        #[arg(long)]
        no_until: bool,

        /// Make the chore one-time
        #[arg(long)]
        no_repeat: bool,
    },
    /// Assign a chore, or unassign it when no member is given
    Assign {
        /// Chore id or title
        chore: String,

        /// Member id or name
        member: Option<String>,
    },
    /// Remove a chore and its completion history
    Remove {
        /// Chore id or title
        chore: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("chores=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ChoresConfig::load()?;
    let store = open_store(&config).await?;

    match cli.command {
        Commands::Member { command } => match command {
            MemberCommand::List => commands::member::list(&store),
            MemberCommand::Add { name, color } => {
                commands::member::add(&store, &name, color.as_deref()).await
            }
            MemberCommand::Remove { member, yes } => {
                commands::member::remove(&store, &member, yes).await
            }
        },
        Commands::Chore { command } => match command {
            ChoreCommand::List => commands::chore::list(&store),
            ChoreCommand::Add {
                title,
                start,
                description,
                assignee,
                every,
                interval,
                days,
                day_of_month,
                until,
            } => {
                let args = commands::chore::AddArgs {
                    title,
                    start,
                    description,
                    assignee,
                    every,
                    interval,
                    days,
                    day_of_month,
                    until,
                };
                commands::chore::add(&store, args).await
            }
            ChoreCommand::Edit {
                chore,
                title,
                description,
                start,
                every,
                interval,
                days,
                day_of_month,
                until,
                no_until,
                no_repeat,
            } => {
                let args = commands::chore::EditArgs {
                    title,
                    description,
                    start,
                    every,
                    interval,
                    days,
                    day_of_month,
                    until,
                    no_until,
                    no_repeat,
                };
                commands::chore::edit(&store, &chore, args).await
            }
            ChoreCommand::Assign { chore, member } => {
                commands::chore::assign(&store, &chore, member.as_deref()).await
            }
            ChoreCommand::Remove { chore, yes } => {
                commands::chore::remove(&store, &chore, yes).await
            }
        },
        Commands::Calendar {
            view,
            date,
            from,
            to,
            json,
        } => {
            let range = commands::calendar::resolve_range(
                &config,
                view.as_deref(),
                date.as_deref(),
                from.as_deref(),
                to.as_deref(),
            )?;
            commands::calendar::run(&store, range, json)
        }
        Commands::Done { chore, date, by } => {
            commands::completion::done(&store, &chore, &date, &by).await
        }
        Commands::Undo { chore, date } => commands::completion::undo(&store, &chore, &date).await,
        Commands::History { member, chore } => {
            commands::history::run(&store, member.as_deref(), chore.as_deref())
        }
    }?;

    if let Some(error) = store.error() {
        eprintln!("{}", error.red());
        std::process::exit(1);
    }

    Ok(())
}

/// Open the data file and load everything into the store.
async fn open_store(config: &ChoresConfig) -> Result<SyncStore<FileGateway>> {
    let data_path = config.data_path();
    debug!(path = %data_path.display(), "opening data file");

    let gateway = FileGateway::open(&data_path)?;
    let store = SyncStore::new(gateway);

    let loaded = tui::with_spinner("Loading chores", store.initialize()).await;

    if !loaded {
        anyhow::bail!(
            "{}\n\nData file: {}",
            store.error().unwrap_or_default(),
            data_path.display()
        );
    }

    Ok(store)
}
