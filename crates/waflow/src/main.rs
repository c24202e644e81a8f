// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! waflow - rate-limited WhatsApp outbound dispatcher.
//!
//! This is the binary entry point: the long-running `serve` loop plus the
//! one-shot operator commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod commands;
mod health;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use waflow_core::WaflowError;

use crate::app::App;
use crate::commands::{QueueAddArgs, QueueBroadcastArgs, SenderAddArgs};

/// waflow - rate-limited WhatsApp outbound dispatcher.
#[derive(Parser, Debug)]
#[command(name = "waflow", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the standard lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler: health report, nurture sweep, periodic drain.
    Serve,
    /// Run one drain cycle and print its summary.
    Drain {
        /// Send only the high-priority tier.
        #[arg(long)]
        high_only: bool,
    },
    /// Promote the nurture messages due on a day and send them.
    Sweep {
        /// Business date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Manage leads.
    Lead {
        #[command(subcommand)]
        action: LeadCommands,
    },
    /// Inspect or add to the outbound queue.
    Queue {
        #[command(subcommand)]
        action: QueueCommands,
    },
    /// Provision or list sender numbers.
    Senders {
        #[command(subcommand)]
        action: SenderCommands,
    },
    /// Print the system health report.
    Health {
        /// Also send it to the management recipient.
        #[arg(long)]
        send: bool,
    },
}

#[derive(Subcommand, Debug)]
enum LeadCommands {
    /// Record a lead and schedule its nurture sequence.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        /// Lead date, DD-MM-YYYY or YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        branch: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum QueueCommands {
    /// Queue one message.
    Add(QueueAddArgs),
    /// Queue one message for every contact of an audience.
    Broadcast(QueueBroadcastArgs),
    /// List pending messages, high tier first.
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum SenderCommands {
    /// Create or update a sender.
    Add(SenderAddArgs),
    /// List senders with today's usage.
    List {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => waflow_config::load_and_validate_path(path),
        None => waflow_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            waflow_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match App::open(config).await {
        Ok(app) => run(cli.command, app).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, app: App) -> Result<(), WaflowError> {
    let result = match command {
        Commands::Serve => return serve::run_serve(app).await,
        Commands::Drain { high_only } => commands::run_drain(&app, high_only).await,
        Commands::Sweep { date } => commands::run_sweep(&app, date.as_deref()).await,
        Commands::Lead {
            action:
                LeadCommands::Add {
                    name,
                    phone,
                    date,
                    branch,
                },
        } => commands::run_lead_add(&app, name, phone, date.as_deref(), branch).await,
        Commands::Queue {
            action: QueueCommands::Add(args),
        } => commands::run_queue_add(&app, args).await,
        Commands::Queue {
            action: QueueCommands::Broadcast(args),
        } => commands::run_queue_broadcast(&app, args).await,
        Commands::Queue {
            action: QueueCommands::List { limit },
        } => commands::run_queue_list(&app, limit).await,
        Commands::Senders {
            action: SenderCommands::Add(args),
        } => commands::run_senders_add(&app, args).await,
        Commands::Senders {
            action: SenderCommands::List { plain },
        } => commands::run_senders_list(&app, plain).await,
        Commands::Health { send } => health::run_health(&app, send).await,
    };
    app.close().await?;
    result
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waflow={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn drain_flag_parses() {
        let cli = Cli::try_parse_from(["waflow", "drain", "--high-only"]).unwrap();
        assert!(matches!(cli.command, Commands::Drain { high_only: true }));
    }

    #[test]
    fn queue_add_parses_priority_and_media() {
        let cli = Cli::try_parse_from([
            "waflow",
            "queue",
            "add",
            "--phone",
            "9876543210",
            "--message",
            "Hi {Name}",
            "--priority",
            "high",
            "--media-url",
            "https://example.com/a.png",
        ])
        .unwrap();
        let Commands::Queue {
            action: QueueCommands::Add(args),
        } = cli.command
        else {
            panic!("expected queue add");
        };
        assert_eq!(args.priority, "high");
        assert_eq!(args.media_url.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn queue_broadcast_defaults_to_leads() {
        let cli = Cli::try_parse_from(["waflow", "queue", "broadcast", "--message", "Hi {Name}"])
            .unwrap();
        let Commands::Queue {
            action: QueueCommands::Broadcast(args),
        } = cli.command
        else {
            panic!("expected queue broadcast");
        };
        assert_eq!(args.audience, "leads");
        assert!(args.media_url.is_none());
    }

    #[test]
    fn lead_add_requires_phone() {
        assert!(Cli::try_parse_from(["waflow", "lead", "add", "--name", "Asha"]).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = waflow_config::load_and_validate_str("[execution]\nsimulate_sends = true\n")
            .unwrap_or_else(|_| panic!("default config should be valid"));
        assert_eq!(config.service.name, "waflow");
    }
}
