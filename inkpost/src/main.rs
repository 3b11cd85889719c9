use clap::Parser;
use inkpost::{
    ClientKey, Inkpost, InkpostBuilder, RepositoryProvider, Settings, SqliteRepositoryProvider,
    hash_password, post::generate_slug,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for Inkpost
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Client whose login state to act on
    #[arg(long, global = true, default_value = "default")]
    client: ClientKey,

    /// Settings file (missing file is ignored)
    #[arg(long, global = true, default_value = inkpost::settings::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Database connection string, overrides the settings
    #[arg(long, global = true)]
    db_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Log in as the administrator
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Discard the client's session token
    Logout,
    /// Show the client's lockout state
    Status,
    /// Clear the client's failed attempts and any lockout
    Unlock,
    /// Print an Argon2 hash for use as the admin password hash
    HashPassword { password: String },
    /// Print the URL slug for a post title
    Slug { title: String },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::HashPassword { password } => {
            println!("{}", hash_password(password));
            return Ok(());
        }
        Commands::Slug { title } => {
            println!("{}", generate_slug(title));
            return Ok(());
        }
        Commands::Version => {
            println!("Inkpost v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let settings = Settings::load_from(&cli.config)?;
    let database_url = cli.db_url.unwrap_or_else(|| settings.database_url.clone());

    match cli.command {
        Commands::Migrate => {
            tracing::info!(database_url = %database_url, "Running migrations");
            let provider = SqliteRepositoryProvider::connect(&database_url).await?;
            provider.migrate().await?;
            println!("Migrations applied");
        }
        Commands::Login { email, password } => {
            let inkpost = open(&settings, &database_url).await?;
            let token = inkpost
                .login(&cli.client, &email, &password)
                .await?
                .into_result()?;
            println!("{token}");
        }
        Commands::Logout => {
            let inkpost = open(&settings, &database_url).await?;
            inkpost.logout(&cli.client).await;
            println!("Logged out");
        }
        Commands::Status => {
            let inkpost = open(&settings, &database_url).await?;
            let status = inkpost.lockout_status(&cli.client).await;
            let authenticated = inkpost.is_authenticated(&cli.client).await;
            let report = serde_json::json!({
                "status": status,
                "retryAfterSeconds": status.retry_after_seconds(),
                "authenticated": authenticated,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Unlock => {
            let inkpost = open(&settings, &database_url).await?;
            if inkpost.unlock(&cli.client).await? {
                println!("Client {} unlocked", cli.client);
            } else {
                println!("Client {} was not locked", cli.client);
            }
        }
        Commands::HashPassword { .. } | Commands::Slug { .. } | Commands::Version => {}
    }

    Ok(())
}

async fn open(
    settings: &Settings,
    database_url: &str,
) -> Result<Inkpost<SqliteRepositoryProvider>, Box<dyn std::error::Error>> {
    let inkpost = InkpostBuilder::new()
        .with_sqlite(database_url)
        .await?
        .with_guard_config(settings.guard_config()?)
        .with_admin(settings.admin_credentials()?)
        .apply_migrations(true)
        .build()
        .await?;
    Ok(inkpost)
}
