pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::LibraryClient;

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "librarian")]
#[command(about = "Librarian - command-line client for the library admin service")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "LIBRARIAN_SERVER", default_value = DEFAULT_SERVER, help = "Server base URL")]
    pub server: String,

    #[arg(long, global = true, env = "LIBRARIAN_TOKEN", hide_env_values = true, help = "Admin access token")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in and print an access token")]
    Login {
        #[arg(long, help = "Admin email")]
        email: String,
        #[arg(long, env = "LIBRARIAN_PASSWORD", hide_env_values = true, help = "Password")]
        password: String,
    },

    #[command(about = "List books as shown on the dashboard")]
    List {
        #[arg(long, help = "Search title and author")]
        search: Option<String>,
        #[arg(long, help = "Exact level filter")]
        level: Option<String>,
        #[arg(long, help = "Exact subject filter")]
        subject: Option<String>,
        #[arg(long, help = "1-based page number")]
        page: Option<u32>,
    },

    #[command(about = "Show one book")]
    Show {
        #[arg(help = "Book ID")]
        id: String,
    },

    #[command(about = "Upload a PDF with metadata and an optional cover")]
    Upload(commands::books::UploadArgs),

    #[command(about = "Delete a book and its files")]
    Delete {
        #[arg(help = "Book ID")]
        id: String,
        #[arg(long, help = "The book's exact title, to confirm")]
        confirm: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = LibraryClient::new(&cli.server, cli.token)?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&client, &email, &password, output_format).await,
        Commands::List { search, level, subject, page } => {
            let query = crate::books::BookQuery { search, level, subject, page };
            commands::books::list(&client, &query, output_format).await
        }
        Commands::Show { id } => commands::books::show(&client, &id, output_format).await,
        Commands::Upload(args) => commands::books::upload(&client, args, output_format).await,
        Commands::Delete { id, confirm } => commands::books::delete(&client, &id, &confirm, output_format).await,
    }
}
