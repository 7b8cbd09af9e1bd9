use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::UserId;
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "CONNECTION_STRING", default_value = "sqlite://./data/bot.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One line per stored profile.
    List,
    /// Print a profile as JSON.
    Show { user_id: i64 },
    /// Remove a profile so the user starts over.
    Delete { user_id: i64 },
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List => {
            for user in storage.list_users().await? {
                println!(
                    "{}\t{}\t{}",
                    user.user_id,
                    user.name.as_deref().unwrap_or("-"),
                    if user.is_complete() { "complete" } else { "incomplete" }
                );
            }
        }
        Command::Show { user_id } => {
            let user = storage
                .get_user(UserId(user_id))
                .await?
                .with_context(|| format!("no profile for user_id={user_id}"))?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Delete { user_id } => {
            storage.delete_user(UserId(user_id)).await?;
            println!("deleted user_id={user_id}");
        }
        Command::Stats => {
            let counts = storage.count_profiles().await?;
            println!("{}", serde_json::to_string(&counts)?);
        }
    }

    Ok(())
}
