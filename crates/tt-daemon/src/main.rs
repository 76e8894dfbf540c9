//! # tt-daemon
//!
//! Task tracker HTTP API and deadline reminder.
//!
//! Serves the task and goal routes behind an identity gateway that forwards
//! verified claims as `X-Caller-*` headers, and runs the deadline reminder
//! on a timer. Configuration comes from environment variables (see
//! [`config::ServiceConfig`]).
//!
//! ## Usage
//!
//! ```text
//! tt-daemon serve --bind 127.0.0.1:8080 --reminder-interval 86400
//! tt-daemon --outbox ./outbox.jsonl serve      # write mail to a file
//! tt-daemon remind                             # one reminder run, then exit
//! ```

mod caller;
mod config;
mod response;
mod routes;
mod scheduler;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tt_identity::{JsonUserDirectory, MemoryUserDirectory, UserDirectory, UserProvisioner};
use tt_notify::{JsonlOutbox, Mailer, Notifier, SmtpMailer};
use tt_store::{FileRecordStore, MemoryRecordStore, RecordStore};
use tt_workflow::{DeadlineReminder, GoalWorkflow, Tables, TaskWorkflow};

use crate::config::ServiceConfig;
use crate::routes::AppState;

/// Task tracker daemon.
#[derive(Parser)]
#[command(name = "tt-daemon", about = "Task and goal tracker HTTP API")]
struct Cli {
    /// Append outgoing mail to this JSONL file instead of sending over SMTP.
    #[arg(long, global = true)]
    outbox: Option<PathBuf>,

    /// Keep records and accounts in memory; nothing is written to DATA_DIR.
    #[arg(long, global = true)]
    memory: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and run scheduled reminders (default).
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Seconds between deadline reminder runs; 0 disables them.
        #[arg(long, default_value_t = 86_400)]
        reminder_interval: u64,
    },
    /// Run the deadline reminder once and exit.
    Remind,
}

/// Everything the routes and the reminder share.
struct Services {
    tasks: TaskWorkflow,
    goals: GoalWorkflow,
    reminder: DeadlineReminder,
}

fn build_services(cli: &Cli, config: &ServiceConfig) -> Result<Services> {
    let store: Arc<dyn RecordStore> = if cli.memory {
        Arc::new(MemoryRecordStore::new().with_page_size(config.scan_page_size))
    } else {
        let root = config.data_dir.join("store");
        Arc::new(
            FileRecordStore::new(&root)
                .with_context(|| format!("opening record store at {}", root.display()))?
                .with_page_size(config.scan_page_size),
        )
    };

    let directory: Arc<dyn UserDirectory> = if cli.memory {
        Arc::new(MemoryUserDirectory::new())
    } else {
        let root = config.data_dir.join("users");
        Arc::new(
            JsonUserDirectory::open(&root, &config.user_pool_id)
                .with_context(|| format!("opening user directory at {}", root.display()))?,
        )
    };

    let mailer: Arc<dyn Mailer> = match &cli.outbox {
        Some(path) => {
            tracing::info!(path = %path.display(), "writing mail to outbox file");
            Arc::new(JsonlOutbox::new(path))
        }
        None => Arc::new(SmtpMailer::new(config.smtp_settings())),
    };
    let notifier = Notifier::new(mailer, config.mail_user.clone());
    let tables = Tables::new(&config.tasks_table, &config.goals_table);

    Ok(Services {
        tasks: TaskWorkflow::new(
            store.clone(),
            tables.tasks.clone(),
            UserProvisioner::new(directory),
            notifier.clone(),
            config.admin_email.clone(),
        ),
        goals: GoalWorkflow::new(store.clone(), tables.tasks.clone(), tables.goals),
        reminder: DeadlineReminder::new(store, tables.tasks, notifier),
    })
}

async fn serve(services: Services, bind: SocketAddr, reminder_interval: u64) -> Result<()> {
    if reminder_interval > 0 {
        let reminder = Arc::new(services.reminder);
        tokio::spawn(scheduler::run_reminders(
            reminder,
            Duration::from_secs(reminder_interval),
        ));
        tracing::info!(every_secs = reminder_interval, "deadline reminder scheduled");
    } else {
        tracing::info!("scheduled deadline reminders disabled");
    }

    let app = routes::router(AppState::new(services.tasks, services.goals));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(addr = %bind, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("HTTP server error")?;
    Ok(())
}

/// Logs go to stderr; `--log-json` switches to one JSON object per event.
fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("tt_daemon=info".parse()?)
        .add_directive("tt_workflow=info".parse()?)
        .add_directive("tt_identity=info".parse()?)
        .add_directive("tt_notify=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        tasks_table = %config.tasks_table,
        goals_table = %config.goals_table,
        data_dir = %config.data_dir.display(),
        memory = cli.memory,
        "starting task tracker"
    );
    let services = build_services(&cli, &config)?;

    match cli.command {
        Some(Command::Remind) => {
            let report = scheduler::remind_once(Arc::new(services.reminder)).await?;
            tracing::info!(
                scanned = report.scanned,
                upcoming = report.upcoming.len(),
                sent = report.reminders_sent,
                truncated = report.truncated,
                "reminder run complete"
            );
            Ok(())
        }
        Some(Command::Serve {
            bind,
            reminder_interval,
        }) => serve(services, bind, reminder_interval).await,
        None => serve(services, SocketAddr::from(([127, 0, 0, 1], 8080)), 86_400).await,
    }
}
