use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ticketflow::auth::AuthContext;
use ticketflow::cmd::Outcome;
use ticketflow::cmd::auth as auth_cmd;
use ticketflow::cmd::config::{self as config_cmd, ConfigArgs};
use ticketflow::cmd::ticket::{self as ticket_cmd, TicketArgs};
use ticketflow::config::AppConfig;
use ticketflow::context::AppContext;
use ticketflow::error::AppResult;
use ticketflow::infra::gotrue::GoTrueClient;
use ticketflow::infra::postgrest::PostgrestTicketClient;
use ticketflow::infra::session::SessionStore;
use ticketflow::infra::supabase::SupabaseEndpoint;
use ticketflow::infra::terminal::TerminalNotifier;
use ticketflow::query::TicketQueryClient;

#[derive(Parser)]
#[command(name = "ticketflow", author, version, about = "Personal ticket tracker")]
struct Cli {
    /// Log request and cache activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, edit and delete your tickets.
    Ticket(TicketArgs),
    /// Sign in with email and password.
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(Outcome::Done) => {}
        Ok(Outcome::Failed) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "ticketflow=debug"
    } else {
        "ticketflow=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> AppResult<Outcome> {
    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(Outcome::Done)
        }
        Commands::Ticket(args) => {
            ticket_cmd::run(&build_context(Auth::Resolve)?, args.command).await
        }
        Commands::Login { email } => {
            auth_cmd::login(&build_context(Auth::Skip)?, email).await?;
            Ok(Outcome::Done)
        }
        Commands::Logout => {
            auth_cmd::logout(&build_context(Auth::Skip)?).await?;
            Ok(Outcome::Done)
        }
        Commands::Whoami => {
            auth_cmd::whoami(&build_context(Auth::Resolve)?)?;
            Ok(Outcome::Done)
        }
    }
}

/// Login and logout manage the session themselves and must work even when
/// the stored one or the token override cannot be read.
enum Auth {
    Resolve,
    Skip,
}

fn build_context(auth: Auth) -> AppResult<AppContext> {
    let config = AppConfig::load()?;

    if config.backend_url.is_none() {
        eprintln!("Warning: backend URL not configured; run `ticketflow config init`.");
    }
    if config.anon_key.is_none() {
        eprintln!("Warning: anon key not configured; run `ticketflow config init`.");
    }

    let sessions = SessionStore::open()?;
    let auth = match auth {
        Auth::Resolve => {
            AuthContext::resolve(sessions.load_or_forget(), config.access_token.as_deref())?
        }
        Auth::Skip => AuthContext::anonymous(),
    };
    match auth.current_user() {
        Some(identity) => tracing::debug!(user = %identity.id, "using stored identity"),
        None => tracing::debug!("no signed-in user"),
    }

    let endpoint = SupabaseEndpoint::new(config.backend_url.clone(), config.anon_key.clone());
    let ticket_service = Arc::new(PostgrestTicketClient::new(
        endpoint.clone(),
        auth.access_token().map(str::to_string),
    ));
    let auth_service = Arc::new(GoTrueClient::new(endpoint));
    let tickets = TicketQueryClient::new(ticket_service, Arc::new(TerminalNotifier::new()), auth);

    Ok(AppContext::new(config, sessions, auth_service, tickets))
}
