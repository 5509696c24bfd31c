//! Crosspost CLI — command-line client for the Crosspost API.
//!
//! Set CROSSPOST_API_URL (or API_URL) and, once logged in, CROSSPOST_TOKEN.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crosspost_cli::{init_tracing, render_progress_bar};
use crosspost_client::{ApiClient, HistoryState, PollState, StatusPoller, UploadSession};
use crosspost_core::models::{Platform, ScheduleRequest};
use crosspost_core::{validation::MediaKind, ClientConfig};

#[derive(Parser)]
#[command(name = "crosspost", about = "Crosspost API CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Register {
        username: String,
        password: String,
    },
    /// Log in and print the session token
    Login {
        username: String,
        password: String,
    },
    /// Invalidate the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Upload a video + audio pair (optional thumbnail) as one project
    Upload {
        /// Path to the video file
        video: PathBuf,
        /// Path to the audio file
        audio: PathBuf,
        /// Optional thumbnail image
        #[arg(long)]
        thumbnail: Option<PathBuf>,
        /// Keep polling until the job reaches a terminal status
        #[arg(long)]
        watch: bool,
    },
    /// Get the processing status of a project
    Status {
        project_id: String,
        /// Keep polling until the job reaches a terminal status
        #[arg(long)]
        watch: bool,
    },
    /// Show the upload history, grouped by project
    History,
    /// Schedule a project for publication
    Schedule {
        project_id: String,
        /// Target platform (repeatable): youtube, tiktok, instagram
        #[arg(long = "platform", required = true)]
        platforms: Vec<Platform>,
        /// Publication time, RFC 3339 (e.g. 2026-09-01T08:00:00Z)
        #[arg(long)]
        at: DateTime<Utc>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Poll until terminal and print each status transition as it lands.
async fn watch_job(client: &ApiClient, config: &ClientConfig, project_id: &str) -> anyhow::Result<()> {
    let poller = StatusPoller::new(client.clone(), config.poll_interval);
    let mut rx = poller.subscribe();
    poller.start(project_id);

    loop {
        {
            let state = rx.borrow_and_update();
            match &*state {
                PollState::Polling { status, .. } => eprintln!("status: {}", status),
                PollState::Done { status, .. } => {
                    print_json(&serde_json::json!({
                        "project_id": project_id,
                        "status": status,
                    }))?;
                    return Ok(());
                }
                PollState::Stopped { message, .. } => anyhow::bail!(message.clone()),
                // No further sends follow once the poller has gone idle.
                PollState::Idle => anyhow::bail!("status polling stopped"),
            }
        }
        if rx.changed().await.is_err() {
            anyhow::bail!("status poller stopped unexpectedly");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    let client = ApiClient::new(config.clone())
        .context("Failed to create API client. Set CROSSPOST_API_URL (or API_URL)")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Register { username, password } => {
            let user = client.register(&username, &password).await?;
            print_json(&user)?;
            if let Some(token) = client.session().token() {
                eprintln!("export CROSSPOST_TOKEN={}", token);
            }
        }
        Commands::Login { username, password } => {
            let user = client.login(&username, &password).await?;
            print_json(&user)?;
            if let Some(token) = client.session().token() {
                eprintln!("export CROSSPOST_TOKEN={}", token);
            }
        }
        Commands::Logout => {
            client.logout().await;
            print_json(&serde_json::json!({ "success": true }))?;
        }
        Commands::Whoami => match client.bootstrap().await? {
            Some(user) => print_json(&user)?,
            None => {
                eprintln!("Not logged in. Set CROSSPOST_TOKEN or run `crosspost login`.");
                std::process::exit(1);
            }
        },
        Commands::Upload {
            video,
            audio,
            thumbnail,
            watch,
        } => {
            let session = Arc::new(UploadSession::new(client.clone()));
            session.set_file_from_path(MediaKind::Video, &video)?;
            session.set_file_from_path(MediaKind::Audio, &audio)?;
            if let Some(path) = &thumbnail {
                session.set_file_from_path(MediaKind::Thumbnail, path)?;
            }

            let mut progress = session.progress();
            let printer = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let percent = *progress.borrow();
                    eprint!("\r{}", render_progress_bar(percent, 30));
                    let _ = std::io::stderr().flush();
                }
            });

            let result = session.submit().await;
            printer.abort();
            eprintln!();
            let project_id = result?;
            print_json(&serde_json::json!({ "project_id": project_id }))?;

            if watch {
                watch_job(&client, &config, &project_id).await?;
            }
        }
        Commands::Status { project_id, watch } => {
            if watch {
                watch_job(&client, &config, &project_id).await?;
            } else {
                let status = client.job_status(&project_id).await?;
                print_json(&serde_json::json!({
                    "project_id": project_id,
                    "status": status,
                }))?;
            }
        }
        Commands::History => {
            let feed = crosspost_client::HistoryFeed::new(client.clone());
            feed.refresh().await;
            match feed.state() {
                HistoryState::Populated { projects } => print_json(&projects)?,
                HistoryState::Empty => print_json(&serde_json::json!([]))?,
                HistoryState::Error { message } => anyhow::bail!(message),
                HistoryState::Loading => unreachable!("refresh completed"),
            }
        }
        Commands::Schedule {
            project_id,
            platforms,
            at,
        } => {
            let outcome = client
                .schedule(&ScheduleRequest {
                    project_id,
                    platforms,
                    scheduled_time: at,
                })
                .await?;
            print_json(&outcome)?;
        }
    }

    Ok(())
}
