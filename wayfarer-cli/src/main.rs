//! wayfarer - inspect and drive the Wayfarer state store
//!
//! Each invocation opens the configured storage, waits for the persisted
//! session to be restored, applies at most one action and prints the
//! resulting state as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libwayfarer::logging::{LogFormat, LoggingConfig};
use libwayfarer::store::{
    Action, AuthStatusPayload, FailurePayload, LoginPayload, Store, Tab, UserProfile,
};
use libwayfarer::{Config, WayfarerError};
use std::io::Read;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Inspect and update persisted Wayfarer client state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (defaults to $WAYFARER_CONFIG or the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (text, json, pretty)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current state
    State,

    /// Dispatch a raw action, e.g. '{"type":"tab-explore"}' ('-' reads stdin)
    Dispatch {
        /// Action as JSON
        action: String,
    },

    /// Record a successful login
    Login {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        token: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Avatar image reference
        #[arg(long)]
        avatar: Option<String>,

        /// Cover image reference
        #[arg(long)]
        cover: Option<String>,
    },

    /// Record a failed login
    LoginFail {
        /// Message shown to the user
        #[arg(long)]
        msg: Option<String>,
    },

    /// Log out and clear the session
    Logout,

    /// Revalidate the session (uses the stored token unless --token is given)
    CheckAuth {
        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        msg: Option<String>,
    },

    /// Replace the avatar image
    Avatar {
        /// Image reference
        image: String,
    },

    /// Replace the cover image
    Cover {
        /// Image reference
        image: String,
    },

    /// Select the active tab (home, explore, my-trips, group, message, profile)
    Tab {
        tab: Tab,
    },

    /// Delete all persisted state
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format);
    }
    if cli.verbose {
        logging = logging.verbose();
    }
    logging.init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        let code = e
            .downcast_ref::<WayfarerError>()
            .map(WayfarerError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    let store = Store::open(&config)
        .await
        .context("Failed to open state store")?;

    match cli.command {
        Commands::State => {}
        Commands::Dispatch { action } => {
            store.dispatch(parse_action(&action)?);
        }
        Commands::Login {
            user_id,
            token,
            first_name,
            last_name,
            avatar,
            cover,
        } => {
            store.dispatch(Action::LoginSuccess(LoginPayload {
                user_id: Some(user_id),
                user_profile: UserProfile {
                    first_name,
                    last_name,
                },
                avatar_img: avatar,
                cover_img: cover,
                token: Some(token),
            }));
        }
        Commands::LoginFail { msg } => {
            store.dispatch(Action::LoginFail(FailurePayload { msg }));
        }
        Commands::Logout => {
            store.dispatch(Action::Logout);
        }
        Commands::CheckAuth { token, msg } => check_auth(&store, token, msg).await?,
        Commands::Avatar { image } => {
            store.dispatch(Action::UpdateAvatarImage(Some(image)));
        }
        Commands::Cover { image } => {
            store.dispatch(Action::UpdateCoverImage(Some(image)));
        }
        Commands::Tab { tab } => {
            store.dispatch(Action::SelectTab(tab));
        }
        Commands::Reset => {
            store.purge().await.context("Failed to purge persisted state")?;
            println!("Persisted state cleared");
            return Ok(());
        }
    }

    store.flush().await;
    println!("{}", serde_json::to_string_pretty(&*store.get_state())?);
    Ok(())
}

/// Parse an action given inline or, for `-`, on stdin
fn parse_action(input: &str) -> Result<Action> {
    let raw = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read action from stdin")?;
        buffer
    } else {
        input.to_string()
    };

    let action = serde_json::from_str(&raw).map_err(|e| {
        WayfarerError::InvalidInput(format!(
            "Action must be a JSON object with a string \"type\" field: {}",
            e
        ))
    })?;
    Ok(action)
}

/// Revalidate the session as a deferred task
async fn check_auth(store: &Store, token: Option<String>, msg: Option<String>) -> Result<()> {
    store
        .dispatch_thunk(move |dispatch| async move {
            let token = token.or_else(|| dispatch.get_state().auth.token.clone());
            dispatch.dispatch(Action::CheckAuthStatus(AuthStatusPayload { token, msg }));
        })
        .await
        .context("Session check task failed")?;
    Ok(())
}
