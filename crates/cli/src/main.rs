//! Waggle command-line interface.
//!
//! Each invocation opens the database, runs a single operation, prints one
//! JSON document to stdout, and exits. Logs go to stderr so stdout stays
//! machine-readable. Failures print a structured error object and exit
//! nonzero.

use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::warn;

use database::{ChannelKind, Database, DatabaseError, Importance, ThreadStatus, ValidationError};

/// Database URL used when neither `--db` nor `WAGGLE_DB` is set.
const DEFAULT_DB_URL: &str = "sqlite:waggle.db?mode=rwc";

/// How many times a busy operation is re-run before giving up. Every
/// operation is a single transaction, so a busy failure leaves nothing behind.
const BUSY_RETRIES: u32 = 3;

#[derive(Debug, Parser)]
#[command(name = "waggle")]
#[command(about = "Messaging hub for autonomous agents")]
struct Cli {
    /// Database URL. Falls back to the WAGGLE_DB env var, then to
    /// sqlite:waggle.db?mode=rwc.
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database file and schema
    Init,

    /// Send a message to a thread
    Send {
        /// Sending agent ID
        #[arg(long)]
        from: String,

        /// Target thread ID
        #[arg(long)]
        thread: i64,

        /// Message text
        #[arg(long)]
        body: String,

        /// low, normal, high, or urgent (default: normal)
        #[arg(long)]
        importance: Option<String>,

        /// Agent session reference
        #[arg(long)]
        session: Option<String>,
    },

    /// Create a thread
    NewThread {
        /// Thread title
        #[arg(long)]
        title: String,

        /// Creating agent ID (always added as a member)
        #[arg(long)]
        from: String,

        /// Comma-separated member agent IDs
        #[arg(long, required = true, value_delimiter = ',')]
        agents: Vec<String>,

        /// External task reference
        #[arg(long)]
        task: Option<String>,

        /// Channel name to attach the thread to
        #[arg(long)]
        channel: Option<String>,
    },

    /// Unread messages across all threads the agent belongs to
    Inbox {
        /// Agent ID
        #[arg(long)]
        agent: String,
    },

    /// Show one thread with its messages and members
    Thread {
        /// Thread ID
        id: i64,
    },

    /// List threads, most recently active first
    Threads {
        /// Only threads this agent is a member of
        #[arg(long)]
        agent: Option<String>,
    },

    /// Change a thread's status or membership
    UpdateThread {
        /// Thread ID
        #[arg(long)]
        id: i64,

        /// active, paused, or closed
        #[arg(long)]
        status: Option<String>,

        /// Comma-separated agent IDs to add
        #[arg(long, value_delimiter = ',')]
        add_agents: Vec<String>,

        /// Comma-separated agent IDs to remove
        #[arg(long, value_delimiter = ',')]
        remove_agents: Vec<String>,
    },

    /// Advance a read receipt
    MarkRead {
        /// Agent ID
        #[arg(long)]
        agent: String,

        /// Thread ID
        #[arg(long)]
        thread: i64,

        /// Message ID to mark read through
        #[arg(long)]
        message: i64,
    },

    /// Update one agent's presence, or query presence
    Presence {
        /// Agent ID
        #[arg(long)]
        agent: Option<String>,

        /// New status (requires --agent)
        #[arg(long)]
        status: Option<String>,

        /// What the agent is currently working on
        #[arg(long)]
        task: Option<String>,

        /// List presence for all agents
        #[arg(long)]
        all: bool,
    },

    /// Full-text search over message bodies
    Search {
        /// Query string
        query: String,

        /// Maximum number of hits
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Create a channel
    NewChannel {
        /// Unique channel name
        #[arg(long)]
        name: String,

        /// public or dm (default: public)
        #[arg(long)]
        kind: Option<String>,
    },

    /// List channels
    Channels,

    /// Aggregate counters
    Stats,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Database(#[from] DatabaseError),

    #[error("output encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    fn kind(&self) -> &'static str {
        match self {
            CliError::Database(err) => err.kind(),
            CliError::Encode(_) => "internal",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let url = cli
        .db
        .clone()
        .or_else(|| env::var("WAGGLE_DB").ok())
        .unwrap_or_else(|| DEFAULT_DB_URL.to_string());

    match run(&url, &cli.command).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let payload = json!({
                "error": {
                    "kind": err.kind(),
                    "message": err.to_string(),
                }
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
            ExitCode::FAILURE
        }
    }
}

async fn run(url: &str, command: &Command) -> Result<serde_json::Value, CliError> {
    let db = Database::connect(url).await?;
    db.migrate().await?;

    let mut attempt = 0;
    let result = loop {
        match execute(&db, command).await {
            Err(CliError::Database(DatabaseError::Busy)) if attempt < BUSY_RETRIES => {
                attempt += 1;
                let delay = Duration::from_millis(50 * u64::from(1u32 << attempt));
                warn!(attempt, "Database busy, retrying");
                tokio::time::sleep(delay).await;
            }
            other => break other,
        }
    };

    db.close().await;
    result
}

async fn execute(db: &Database, command: &Command) -> Result<serde_json::Value, CliError> {
    let pool = db.pool();

    let value = match command {
        // Connecting already created the file; migrations ran above.
        Command::Init => json!({ "status": "ok" }),

        Command::Send {
            from,
            thread,
            body,
            importance,
            session,
        } => {
            let importance = parse_importance(importance.as_deref())?;
            let message = database::message::send_message(
                pool,
                *thread,
                from,
                body,
                importance,
                session.as_deref(),
            )
            .await?;
            json!({ "id": message.id })
        }

        Command::NewThread {
            title,
            from,
            agents,
            task,
            channel,
        } => {
            let channel_id = match channel {
                Some(name) => Some(database::channel::get_channel(pool, name).await?.id),
                None => None,
            };
            let thread = database::thread::create_thread(
                pool,
                title,
                from,
                agents,
                task.as_deref(),
                channel_id,
            )
            .await?;
            json!({ "id": thread.id })
        }

        Command::Inbox { agent } => {
            serde_json::to_value(database::receipt::inbox(pool, agent).await?)?
        }

        Command::Thread { id } => {
            serde_json::to_value(database::thread::get_thread(pool, *id).await?)?
        }

        Command::Threads { agent } => serde_json::to_value(
            database::thread::list_threads(pool, agent.as_deref()).await?,
        )?,

        Command::UpdateThread {
            id,
            status,
            add_agents,
            remove_agents,
        } => {
            let status = match status.as_deref() {
                Some(raw) => Some(parse_status(raw)?),
                None => None,
            };
            let thread =
                database::thread::update_thread(pool, *id, status, add_agents, remove_agents)
                    .await?;
            serde_json::to_value(thread)?
        }

        Command::MarkRead {
            agent,
            thread,
            message,
        } => serde_json::to_value(
            database::receipt::mark_read(pool, *thread, agent, *message).await?,
        )?,

        Command::Presence {
            agent,
            status,
            task,
            all,
        } => {
            if *all {
                serde_json::to_value(database::presence::list_presence(pool).await?)?
            } else {
                match (agent.as_deref(), status.as_deref()) {
                    (Some(agent), Some(status)) => serde_json::to_value(
                        database::presence::update_presence(pool, agent, status, task.as_deref())
                            .await?,
                    )?,
                    (None, Some(_)) => {
                        return Err(DatabaseError::from(ValidationError::Empty(
                            "agent".to_string(),
                        ))
                        .into())
                    }
                    (Some(agent), None) => {
                        serde_json::to_value(database::presence::get_presence(pool, agent).await?)?
                    }
                    (None, None) => {
                        serde_json::to_value(database::presence::list_presence(pool).await?)?
                    }
                }
            }
        }

        Command::Search { query, limit } => {
            let limit = limit.unwrap_or(database::message::DEFAULT_SEARCH_LIMIT);
            serde_json::to_value(database::message::search_messages(pool, query, limit).await?)?
        }

        Command::NewChannel { name, kind } => {
            let kind = match kind.as_deref() {
                Some(raw) => ChannelKind::from_str(raw).map_err(DatabaseError::from)?,
                None => ChannelKind::default(),
            };
            serde_json::to_value(database::channel::create_channel(pool, name, kind).await?)?
        }

        Command::Channels => serde_json::to_value(database::channel::list_channels(pool).await?)?,

        Command::Stats => serde_json::to_value(database::stats::get_stats(pool).await?)?,
    };

    Ok(value)
}

fn parse_importance(value: Option<&str>) -> Result<Importance, CliError> {
    match value {
        Some(raw) => Importance::from_str(raw)
            .map_err(DatabaseError::from)
            .map_err(CliError::from),
        None => Ok(Importance::default()),
    }
}

fn parse_status(value: &str) -> Result<ThreadStatus, CliError> {
    ThreadStatus::from_str(value)
        .map_err(DatabaseError::from)
        .map_err(CliError::from)
}
