use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use finbot_assistant::insights::{analyze_spending, daily_summary, monthly_trends};
use finbot_assistant::{ChatService, IntentOracle, Interpreter, MessagingGateway, NoopOracle, QueryType, respond};
use finbot_core::time::{parse_tz, today_in};
use finbot_core::{
    MemStorage, Storage, UserFinancialContext, UserId, admin_stats, export_transactions_csv,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod auth;
mod chat;
mod config;
mod llm;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "finbot", version, about = "Personal finance assistant that understands Portuguese chat messages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage ~/.finbot/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store model credentials in ~/.finbot/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage ledger users
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Send one message and print the reply
    Say {
        message: String,
        #[arg(long)]
        user: Option<UserId>,
        /// Print the full reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat session
    Chat {
        #[arg(long)]
        user: Option<UserId>,
    },

    /// WhatsApp-style gateway: link phones and replay inbound messages
    Whatsapp {
        #[command(subcommand)]
        command: WhatsappCommand,
    },

    /// Overview report plus today's summary
    Summary {
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Rule-based spending analysis as JSON
    Insights {
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Income and expenses per month (last six months) as JSON
    Trends {
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Ledger-wide administration
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Export a user's transactions
    Export {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        user: Option<UserId>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an API key for the intent oracle
    SetKey {
        /// openai or anthropic
        #[arg(long, default_value = "openai")]
        provider: String,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// User counts, activity and retention as JSON
    Stats,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user and make it the active one
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// List users
    List,

    /// Switch the active user
    Use { id: UserId },
}

#[derive(Subcommand, Debug)]
enum WhatsappCommand {
    /// Link a phone number to a user
    Link {
        phone: String,
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Process one inbound message as if it came from `from`
    Send { from: String, message: String },
}

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cfg.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_service(cfg: &Config, store: Arc<MemStorage>) -> Result<ChatService<MemStorage, Box<dyn IntentOracle>>> {
    let tz = parse_tz(&cfg.assistant.timezone)?;
    let oracle: Box<dyn IntentOracle> = match llm::LlmOracle::from_config(&cfg.llm)? {
        Some(o) => Box::new(o),
        None => Box::new(NoopOracle),
    };
    let interpreter = Interpreter::new(oracle)?.with_timezone(tz);
    Ok(ChatService::new(store, interpreter))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_tracing(&cfg);

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::SetKey { provider } => {
                auth::store_key_interactive(llm::Provider::parse(&provider)?)?
            }
        },

        Command::User { command } => user_command(command)?,

        Command::Say { message, user, json } => {
            let user_id = state::resolve_user(user)?;
            let store = Arc::new(state::load_ledger()?);
            let service = build_service(&cfg, store.clone())?;
            let reply = service.handle(user_id, &message)?;
            if reply.transaction_created.is_some() {
                state::save_ledger(&store)?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", reply.response);
            }
        }

        Command::Chat { user } => {
            let user_id = state::resolve_user(user)?;
            let store = Arc::new(state::load_ledger()?);
            if store.user(user_id)?.is_none() {
                bail!("unknown user {user_id}");
            }
            let service = build_service(&cfg, store)?;
            chat::run_chat(&service, user_id)?;
        }

        Command::Whatsapp { command } => {
            let store = Arc::new(state::load_ledger()?);
            let gateway = MessagingGateway::new(build_service(&cfg, store.clone())?);
            match command {
                WhatsappCommand::Link { phone, user } => {
                    let user_id = state::resolve_user(user)?;
                    gateway.link(&phone, user_id)?;
                    state::save_ledger(&store)?;
                    println!("Linked {phone} to user {user_id}");
                }
                WhatsappCommand::Send { from, message } => {
                    if let Some(reply) = gateway.process_inbound(&from, &message) {
                        println!("{reply}");
                    }
                    state::save_ledger(&store)?;
                }
            }
        }

        Command::Summary { user } => {
            let user_id = state::resolve_user(user)?;
            let store = state::load_ledger()?;
            let tz = parse_tz(&cfg.assistant.timezone)?;
            let today = today_in(tz);
            let u = store
                .user(user_id)?
                .with_context(|| format!("unknown user {user_id}"))?;
            let summary = store.user_summary(user_id)?;
            let txns = store.transactions_by_user(user_id)?;
            let ctx = UserFinancialContext::new(&summary, u.name.clone());

            println!("{}\n", respond(QueryType::Generic, &ctx, &txns, today));
            println!("{}", daily_summary(&u.name, &txns, summary.balance, today).summary);
        }

        Command::Insights { user } => {
            let user_id = state::resolve_user(user)?;
            let store = state::load_ledger()?;
            let today = today_in(parse_tz(&cfg.assistant.timezone)?);
            let txns = store.transactions_by_user(user_id)?;
            println!("{}", serde_json::to_string_pretty(&analyze_spending(&txns, today))?);
        }

        Command::Trends { user } => {
            let user_id = state::resolve_user(user)?;
            let store = state::load_ledger()?;
            let txns = store.transactions_by_user(user_id)?;
            println!("{}", serde_json::to_string_pretty(&monthly_trends(&txns))?);
        }

        Command::Admin { command } => match command {
            AdminCommand::Stats => {
                let store = state::load_ledger()?;
                let tz = parse_tz(&cfg.assistant.timezone)?;
                let stats = admin_stats(&store.users()?, today_in(tz), tz);
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        },

        Command::Export { csv, user } => {
            let user_id = state::resolve_user(user)?;
            let store = state::load_ledger()?;
            let txns = store.transactions_by_user(user_id)?;
            export_transactions_csv(&txns, &csv)?;
            println!("Exported {} transactions to {}", txns.len(), csv.display());
        }
    }

    Ok(())
}

fn user_command(command: UserCommand) -> Result<()> {
    let store = state::load_ledger()?;
    match command {
        UserCommand::Add { name, email } => {
            let user = store.create_user(&name, &email)?;
            state::save_ledger(&store)?;
            state::write_profile(&state::Profile {
                active_user: Some(user.id),
            })?;
            println!("Created user {} ({}) and made it active", user.id, user.name);
        }
        UserCommand::List => {
            let active = state::read_profile()?.active_user;
            for u in store.users()? {
                let marker = if Some(u.id) == active { "*" } else { " " };
                println!("{marker} {:>3}  {:<20} {}", u.id, u.name, u.email);
            }
        }
        UserCommand::Use { id } => {
            if store.user(id)?.is_none() {
                bail!("unknown user {id}");
            }
            state::write_profile(&state::Profile { active_user: Some(id) })?;
            println!("Active user: {id}");
        }
    }
    Ok(())
}
