use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    form::FormBuffer,
    shell::{SetupView, TopMenu},
    FormField, HttpDirectoryClient, HttpTransport, NavigationShell, Route, SessionStore,
    UserFormController,
};
use shared::domain::UserId;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "ADMIN_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long, env = "ADMIN_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows the signed-in account.
    Whoami,
    #[command(subcommand)]
    Users(UsersCommand),
    /// Resolves a path through the route guard and prints where it lands.
    Route { path: String },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List,
    Show { id: i64 },
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: i64,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    let transport = HttpTransport::new(&cli.server_url)
        .with_context(|| format!("invalid server url '{}'", cli.server_url))?;
    let shell = Arc::new(NavigationShell::new());
    let mut session = SessionStore::new(transport.clone(), shell.clone());

    let signed_in = match (&cli.username, &cli.password) {
        (Some(username), Some(password)) => {
            session
                .login(username, password)
                .await
                .context("sign-in failed")?;
            true
        }
        (Some(_), None) | (None, Some(_)) => {
            bail!("--username and --password must be given together")
        }
        (None, None) => {
            session.check_session().await?;
            false
        }
    };

    let outcome = run(cli.command, &mut session, &shell, transport).await;

    if signed_in {
        TopMenu::new(shell.clone()).on_logout(&mut session).await;
    }
    outcome
}

async fn run(
    command: Command,
    session: &mut SessionStore,
    shell: &Arc<NavigationShell>,
    transport: HttpTransport,
) -> Result<()> {
    match command {
        Command::Whoami => {
            let user = session.require_user()?;
            println!(
                "{}\t{}\t{} {}\t{}",
                user.id, user.username, user.first_name, user.last_name, user.email
            );
        }
        Command::Route { path } => {
            let route = shell.navigate(&path, &*session);
            println!("{}\t{}", route.path(), route.title());
        }
        Command::Users(command) => {
            if TopMenu::new(shell.clone()).on_setup(&*session) != Route::Setup {
                bail!("sign in with --username and --password to manage users");
            }
            let mut setup = SetupView::default();
            setup.set_active_tab("users");
            info!(tab = setup.active_tab().label(), "setup opened");

            let directory = Arc::new(HttpDirectoryClient::new(transport));
            let mut form = UserFormController::new(directory);
            run_users(command, &mut form).await?;
        }
    }
    Ok(())
}

async fn run_users(command: UsersCommand, form: &mut UserFormController) -> Result<()> {
    match command {
        UsersCommand::List => {
            form.load_list().await?;
            for user in form.users() {
                println!(
                    "{}\t{}\t{} {}",
                    user.id, user.username, user.first_name, user.last_name
                );
            }
        }
        UsersCommand::Show { id } => {
            form.select_record(UserId(id)).await?;
            if let Some(buffer) = form.buffer() {
                print_buffer(UserId(id), buffer);
            }
        }
        UsersCommand::Create(args) => {
            form.start_create();
            form.edit(FormField::Username, args.username);
            form.edit(FormField::FirstName, args.first_name);
            form.edit(FormField::LastName, args.last_name);
            form.edit(FormField::Email, args.email);
            form.edit(FormField::Password, args.password);
            if !form.can_save() {
                bail!("all fields are required and must not be blank");
            }
            form.save().await?;
            if let (Some(id), Some(buffer)) = (form.selected_id(), form.baseline()) {
                println!("created user_id={id}");
                print_buffer(id, buffer);
            }
        }
        UsersCommand::Update(args) => {
            let id = UserId(args.id);
            form.select_record(id).await?;
            for (field, value) in [
                (FormField::FirstName, args.first_name),
                (FormField::LastName, args.last_name),
                (FormField::Email, args.email),
            ] {
                if let Some(value) = value {
                    form.edit(field, value);
                }
            }
            if !form.is_dirty() {
                println!("nothing to change for user_id={id}");
                return Ok(());
            }
            if !form.is_valid() {
                bail!("first name, last name and email must not be blank");
            }
            form.save().await?;
            if let Some(buffer) = form.baseline() {
                print_buffer(id, buffer);
            }
        }
        UsersCommand::Delete { id } => {
            form.delete_record(UserId(id)).await?;
            println!("deleted user_id={id}");
        }
    }
    Ok(())
}

fn print_buffer(id: UserId, buffer: &FormBuffer) {
    println!("id:         {id}");
    println!("username:   {}", buffer.username);
    println!("first name: {}", buffer.first_name);
    println!("last name:  {}", buffer.last_name);
    println!("email:      {}", buffer.email);
}
