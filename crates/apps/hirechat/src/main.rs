//! hirechat - Terminal client for job-board messaging
//!
//! This is the main entry point for the hirechat command-line application.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error};
use messaging::{ApiClient, ClientConfig, SessionStore, UserType};
use std::path::PathBuf;
use std::sync::Arc;

mod chat;
mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API base URL (overrides client.json and HIRECHAT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "HIRECHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        email: String,
        username: String,
        #[arg(long, value_enum, default_value = "student")]
        role: Role,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long, env = "HIRECHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List conversations, most recent first
    Conversations,
    /// Open a conversation interactively
    Chat { id: i64 },
    /// Send one message
    Send {
        id: i64,
        #[arg(long)]
        file: Option<PathBuf>,
        text: Vec<String>,
    },
    /// Download an attachment by its stored name
    Download {
        stored: String,
        name: String,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// List students (employers only)
    Students,
    /// Start a conversation with a student (employers only)
    Start { student_id: i64 },
    /// Job applications
    #[command(subcommand)]
    Jobs(JobsCommand),
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    List,
    Apply {
        employer_id: i64,
        title: Vec<String>,
    },
    Accept {
        id: i64,
    },
    Reject {
        id: i64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Role {
    Student,
    Employer,
}

impl From<Role> for UserType {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => UserType::Student,
            Role::Employer => UserType::Employer,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load()?;
    if let Some(url) = &cli.api_url {
        config.api_url = ClientConfig::with_api_url(url)?.api_url;
    }
    debug!("Using API at {}", config.api_url);

    let session = Arc::new(SessionStore::open_default()?);
    let client = Arc::new(ApiClient::from_config(&config, session));

    match cli.command {
        Command::Login { email, password } => commands::login(client, email, password).await,
        Command::Register {
            email,
            username,
            role,
            full_name,
            password,
        } => commands::register(client, email, username, role.into(), full_name, password).await,
        Command::Logout => commands::logout(&client),
        Command::Whoami => commands::whoami(client).await,
        Command::Conversations => commands::conversations(client, &config).await,
        Command::Chat { id } => chat::run(client, &config, id.into()).await,
        Command::Send { id, file, text } => commands::send(client, id.into(), file, text.join(" ")).await,
        Command::Download { stored, name, dir } => commands::download(client, stored, name, dir).await,
        Command::Students => commands::students(client).await,
        Command::Start { student_id } => commands::start(client, student_id.into()).await,
        Command::Jobs(JobsCommand::List) => commands::list_applications(client).await,
        Command::Jobs(JobsCommand::Apply { employer_id, title }) => {
            commands::apply(client, employer_id.into(), title.join(" ")).await
        }
        Command::Jobs(JobsCommand::Accept { id }) => commands::decide(client, id.into(), true).await,
        Command::Jobs(JobsCommand::Reject { id }) => commands::decide(client, id.into(), false).await,
    }
}
