//! AgentHub - background task execution for automation agents

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    agents_command, approve_command, cancel_command, init_command, list_command, status_command,
    submit_command, worker_command, SubmitArgs, WorkerArgs,
};

/// AgentHub - run agent tasks from a shared queue
#[derive(Parser)]
#[command(name = "agenthub")]
#[command(about = "Task execution engine for LLM automation agents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and data directory
    Init,
    /// List the agent catalog
    Agents,
    /// Submit a task to an agent
    Submit {
        /// Agent type, e.g. bookkeeper
        #[arg(short, long)]
        agent: String,
        /// Owning user id
        #[arg(short, long, default_value = "local")]
        user: String,
        /// Natural-language instruction
        #[arg(short, long)]
        task: String,
        /// Extra context as a JSON object
        #[arg(short, long)]
        context: Option<String>,
        /// Hold the task until it is approved
        #[arg(long)]
        approval: bool,
        /// Retry budget for the queue entry
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Approve (or reject) a task awaiting approval
    Approve {
        /// Task id
        id: String,
        /// Reject instead of approving
        #[arg(long)]
        reject: bool,
        /// Reviewer feedback
        #[arg(short, long)]
        feedback: Option<String>,
    },
    /// Cancel a task
    Cancel {
        /// Task id
        id: String,
    },
    /// Show a task, its queue entry and its events
    Status {
        /// Task id
        id: String,
    },
    /// List recent tasks
    List {
        /// Only tasks with this status
        #[arg(short, long)]
        status: Option<String>,
        /// Maximum number of tasks
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Run a queue worker until Ctrl+C
    Worker {
        /// Sleep between empty polls
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// Lock holder name
        #[arg(long)]
        worker_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Agents => agents_command().await,
        Commands::Submit {
            agent,
            user,
            task,
            context,
            approval,
            max_attempts,
        } => {
            submit_command(SubmitArgs {
                agent,
                user,
                task,
                context,
                approval,
                max_attempts,
            })
            .await
        }
        Commands::Approve {
            id,
            reject,
            feedback,
        } => approve_command(id, !reject, feedback).await,
        Commands::Cancel { id } => cancel_command(id).await,
        Commands::Status { id } => status_command(id).await,
        Commands::List { status, limit } => list_command(status, limit).await,
        Commands::Worker {
            poll_interval_ms,
            worker_id,
        } => {
            worker_command(WorkerArgs {
                poll_interval_ms,
                worker_id,
            })
            .await
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
