//! Identity Service - command line front end for user identities.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use identity_service_lib::commands::{self, CreateUserArgs, MigrateAction};
use identity_service_lib::config::IdentityServiceConfig;

#[derive(Parser)]
#[command(name = "identity-service")]
#[command(about = "User identity and credential management")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// User management commands
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Print the role, status and user type lists
    Lookups,
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a new user
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "IDENTITY_SERVICE_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role value (defaults to 10)
        #[arg(long)]
        role: Option<i32>,
        /// User type value (defaults to 10)
        #[arg(long)]
        user_type: Option<i32>,
    },
    /// Show an active user with resolved role, status and type
    Show { username: String },
    /// Issue a password reset token and print it
    RequestReset { email: String },
    /// Set a new password using a reset token
    ResetPassword {
        token: String,
        #[arg(long, env = "IDENTITY_SERVICE_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> commands::CommandResult {
    let config = IdentityServiceConfig::from_env();

    match cli.command {
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            commands::run_migrations(&config, migrate_action).await
        }
        Commands::User { action } => {
            let service = identity_service_lib::connect(&config).await?;
            match action {
                UserCommands::Create {
                    username,
                    email,
                    password,
                    role,
                    user_type,
                } => {
                    commands::create_user(
                        &service,
                        CreateUserArgs {
                            username,
                            email,
                            password,
                            role,
                            user_type,
                        },
                    )
                    .await
                }
                UserCommands::Show { username } => commands::show_user(&service, &username).await,
                UserCommands::RequestReset { email } => {
                    commands::request_reset(&service, &email).await
                }
                UserCommands::ResetPassword { token, password } => {
                    commands::reset_password(&service, &token, &password).await
                }
            }
        }
        Commands::Lookups => {
            let service = identity_service_lib::connect(&config).await?;
            commands::print_lookups(&service).await
        }
    }
}
