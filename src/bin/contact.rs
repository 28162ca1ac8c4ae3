use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use contact_relay::logging::init_tracing;
use contact_relay::models::NoticeKind;
use contact_relay::oauth::clean_return_url;
use contact_relay::presentation::{initial_theme, toggle_theme, Acknowledger, FixedAnswer, Theme};
use contact_relay::session::{load_pending, FileStore, SessionState};
use contact_relay::{ContactForm, ContactRelay, FlowOutcome, Notice, RelayConfig};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

const WARNING: &str = "\
You will be sent to GitHub to confirm your identity (read:user scope only).
Your GitHub username is attached to the message. Continue? [y/N] ";

#[derive(Parser)]
#[command(name = "contact", about = "Send a message through the portfolio contact relay")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "CONTACT_RELAY_CONFIG")]
    config: PathBuf,

    /// Where session state survives between invocations.
    #[arg(long, default_value = ".contact-session.json", env = "CONTACT_SESSION_FILE")]
    session_file: PathBuf,

    /// Theme reported by the system when none is saved.
    #[arg(long, default_value = "light")]
    system_theme: String,

    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "warn", env = "CONTACT_RELAY_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit the form.
    Submit {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        message: String,
        /// CAPTCHA token for the direct relay channel.
        #[arg(long)]
        token: Option<String>,
        /// Accept the identity warning without prompting.
        #[arg(long)]
        yes: bool,
    },
    /// Complete the identity round trip with the URL GitHub redirected to.
    Callback { return_url: String },
    /// Show the pending payload, if any.
    Status,
    /// Show the theme, or flip it.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

struct Prompt;

#[async_trait]
impl Acknowledger for Prompt {
    async fn confirm(&self) -> bool {
        tokio::task::spawn_blocking(|| {
            print!("{WARNING}");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            if std::io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim(), "y" | "Y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = RelayConfig::load(&cli.config)?;
    let system_theme = Theme::parse(&cli.system_theme)
        .with_context(|| format!("unknown theme {:?}", cli.system_theme))?;
    let store = Arc::new(FileStore::new(cli.session_file.clone()));

    match cli.command {
        Command::Submit { name, message, token, yes } => {
            let acknowledger: Arc<dyn Acknowledger> = if yes {
                Arc::new(FixedAnswer(true))
            } else {
                Arc::new(Prompt)
            };
            let relay = ContactRelay::from_config(&config, store, acknowledger, system_theme)?;
            let outcome = relay.submit(ContactForm { name, message, token }).await?;
            report(outcome);
        }
        Command::Callback { return_url } => {
            let relay = ContactRelay::from_config(&config, store, Arc::new(Prompt), system_theme)?;
            let outcome = relay.handle_callback(&return_url).await?;
            println!("{}", clean_return_url(&return_url));
            report(outcome);
        }
        Command::Status => match load_pending(store.as_ref())? {
            Some(pending) => println!("{}", serde_json::to_string_pretty(&pending)?),
            None => println!("no pending message"),
        },
        Command::Theme { toggle } => {
            let mut state = SessionState::new(initial_theme(store.as_ref(), system_theme)?, 0.0);
            if toggle {
                toggle_theme(&mut state, store.as_ref())?;
            }
            println!("{}", state.theme.as_str());
        }
    }
    Ok(())
}

fn report(outcome: FlowOutcome) {
    match outcome {
        FlowOutcome::Ignored => eprintln!("a message is already being sent"),
        FlowOutcome::Declined | FlowOutcome::NoCallback => {}
        FlowOutcome::Redirect { authorize_url } => {
            println!("Open this URL to confirm your identity:\n{authorize_url}");
        }
        FlowOutcome::Delivered { notice, compose_uri } => {
            show(&notice);
            if let Some(uri) = compose_uri {
                println!("{uri}");
            }
        }
        FlowOutcome::Invalid(notice) | FlowOutcome::SessionExpired(notice) | FlowOutcome::Failed { notice } => {
            show(&notice);
        }
    }
}

fn show(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("{}", notice.text),
        NoticeKind::Error => eprintln!("{}", notice.text),
    }
}
