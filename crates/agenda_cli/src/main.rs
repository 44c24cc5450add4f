//! Agenda CLI.
//!
//! Thin probe over `agenda_core`: prints ranks and replays a reorder
//! scenario against an in-memory database.

use agenda_core::db::open_db_in_memory;
use agenda_core::rank::alphabet::MAX_INDEX;
use agenda_core::{
    default_log_level, has_room_between, init_logging, rank_between, rank_for_index,
    SqliteTopicRepository, TopicService,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(version)]
#[command(about = "Rank keys for ordered meeting topics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "AGENDA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "AGENDA_LOG_DIR")]
    log_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,

    /// Print the rank assigned to the Nth created topic
    Index {
        /// Zero-based creation index
        #[arg(value_parser = clap::value_parser!(u64).range(..=MAX_INDEX))]
        index: u64,
    },

    /// Print a rank strictly between two ranks
    Between {
        /// Lower rank, or `-` for the list head
        lower: String,
        /// Upper rank, or `-` for the list tail
        upper: String,
    },

    /// Create three topics, move the third between the first two, and list
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Ping => {
            println!("agenda_core ping={}", agenda_core::ping());
            println!("agenda_core version={}", agenda_core::core_version());
        }
        Commands::Index { index } => println!("{}", rank_for_index(index)),
        Commands::Between { lower, upper } => {
            let lower = parse_bound(&lower)?;
            let upper = parse_bound(&upper)?;
            if !has_room_between(&lower, &upper) {
                return Err(format!("no rank fits between `{lower}` and `{upper}`").into());
            }
            println!("{}", rank_between(&lower, &upper));
        }
        Commands::Demo => demo()?,
    }
    Ok(())
}

/// Maps `-` to the open-boundary sentinel and validates everything else.
fn parse_bound(value: &str) -> Result<String, Box<dyn Error>> {
    if value == "-" {
        return Ok(String::new());
    }
    Ok(agenda_core::Rank::parse(value)?.into_string())
}

fn demo() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn)?);

    let meeting = service.create_meeting("Demo")?;
    let t1 = service.create_topic(meeting.meeting_uuid, "T1")?;
    let t2 = service.create_topic(meeting.meeting_uuid, "T2")?;
    let t3 = service.create_topic(meeting.meeting_uuid, "T3")?;
    print_topics("created", &service.list_topics(meeting.meeting_uuid)?);

    service.move_topic(t3.topic_uuid, Some(t1.topic_uuid), Some(t2.topic_uuid))?;
    info!("event=cli_demo module=cli status=ok");
    print_topics("moved T3", &service.list_topics(meeting.meeting_uuid)?);
    Ok(())
}

fn print_topics(label: &str, topics: &[agenda_core::Topic]) {
    println!("{label}:");
    for topic in topics {
        println!("  {:<8} {}", topic.rank, topic.title);
    }
}
