use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::UserId;
use storage::{password::hash_password, NewUser, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/admin.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateUser {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, env = "ADMIN_USER_PASSWORD")]
        password: String,
    },
    ListUsers,
    DeleteUser {
        user_id: i64,
    },
    /// Allows or blocks sign-in for an account without deleting it.
    SetEnabled {
        user_id: i64,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open database '{}'", cli.database_url))?;

    match cli.command {
        Command::CreateUser {
            username,
            email,
            first_name,
            last_name,
            password,
        } => {
            if storage.username_exists(&username).await? {
                bail!("username '{username}' already exists");
            }
            if storage.email_exists(&email).await? {
                bail!("email '{email}' already exists");
            }
            let password_hash = hash_password(&password)?;
            let user_id = storage
                .create_user(NewUser {
                    username: &username,
                    email: &email,
                    first_name: &first_name,
                    last_name: &last_name,
                    password_hash: &password_hash,
                })
                .await?;
            info!(%user_id, %username, "user created");
            println!("created user_id={user_id}");
        }
        Command::ListUsers => {
            for user in storage.list_users().await? {
                println!(
                    "{}\t{}\t{} {}\t{}\t{}",
                    user.user_id,
                    user.username,
                    user.first_name,
                    user.last_name,
                    user.email,
                    if user.enabled { "enabled" } else { "disabled" }
                );
            }
        }
        Command::DeleteUser { user_id } => {
            if !storage.delete_user(UserId(user_id)).await? {
                bail!("user {user_id} not found");
            }
            println!("deleted user_id={user_id}");
        }
        Command::SetEnabled { user_id, enabled } => {
            if !storage.set_enabled(UserId(user_id), enabled).await? {
                bail!("user {user_id} not found");
            }
            println!("user_id={user_id} enabled={enabled}");
        }
    }

    Ok(())
}
