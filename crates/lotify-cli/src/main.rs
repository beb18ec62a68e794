//! lotify: LINE Notify command line client
//!
//! Usage:
//!   lotify auth-link <state>          - Print the OAuth2 authorization URL
//!   lotify token <code>               - Exchange an authorization code for an access token
//!   lotify status <token>             - Show the status of an access token
//!   lotify send <token> <message>     - Send a notification
//!   lotify revoke <token>             - Revoke an access token

use anyhow::{Context, bail};
use lotify::{ClientConfig, NotifyClient, NotifyMessage};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Subcommand
#[derive(Debug, PartialEq, Eq)]
enum Command {
    AuthLink { state: String },
    Token { code: String },
    Status { token: String },
    Send { token: String, message: NotifyMessage },
    Revoke { token: String },
    Help,
    Version,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::AuthLink { .. } => "auth-link",
            Self::Token { .. } => "token",
            Self::Status { .. } => "status",
            Self::Send { .. } => "send",
            Self::Revoke { .. } => "revoke",
            Self::Help => "help",
            Self::Version => "version",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("lotify {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let config = ClientConfig::load().context("Failed to load LINE Notify configuration")?;
    info!("Configuration loaded (api: {}, bot: {})", config.api_origin, config.bot_origin);
    let client = NotifyClient::new(config).context("Failed to create LINE Notify client")?;

    run(&client, command).await
}

async fn run(client: &NotifyClient, command: Command) -> anyhow::Result<()> {
    debug!("Dispatching {}", command.name());

    match command {
        Command::AuthLink { state } => {
            println!("{}", client.auth_link(&state));
        }
        Command::Token { code } => {
            let token = client.get_token(&code).await.context("Token exchange failed")?;
            println!("{}", token);
        }
        Command::Status { token } => {
            let status = client.status(&token).await.context("Status check failed")?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Send { token, message } => {
            let result = client.send(&token, &message).await.context("Send failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Revoke { token } => {
            let result = client.revoke(&token).await.context("Revoke failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Help | Command::Version => {}
    }

    Ok(())
}

/// Parse command line arguments (without the program name)
fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Help);
    };

    let positional = |index: usize, name: &str| -> anyhow::Result<String> {
        args.get(index)
            .cloned()
            .with_context(|| format!("Missing <{}> for `{}`", name, first))
    };

    let command = match first.as_str() {
        "--help" | "-h" | "help" => Command::Help,
        "--version" | "-v" => Command::Version,
        "auth-link" => Command::AuthLink {
            state: positional(1, "state")?,
        },
        "token" => Command::Token {
            code: positional(1, "code")?,
        },
        "status" => Command::Status {
            token: positional(1, "token")?,
        },
        "revoke" => Command::Revoke {
            token: positional(1, "token")?,
        },
        "send" => Command::Send {
            token: positional(1, "token")?,
            message: parse_send_options(positional(2, "message")?, &args[3..])?,
        },
        other => bail!("Unknown command: {} (see --help)", other),
    };

    Ok(command)
}

/// Parse `send` flags following the message
fn parse_send_options(text: String, rest: &[String]) -> anyhow::Result<NotifyMessage> {
    let mut message = NotifyMessage::new(text);
    let mut iter = rest.iter();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--sticker" => {
                let package_id = iter.next().context("--sticker needs <package-id> <sticker-id>")?;
                let sticker_id = iter.next().context("--sticker needs <package-id> <sticker-id>")?;
                message = message.with_sticker(
                    package_id.parse().context("Invalid sticker package id")?,
                    sticker_id.parse().context("Invalid sticker id")?,
                );
            }
            "--image" => {
                let thumbnail = iter.next().context("--image needs <thumbnail-url> <fullsize-url>")?;
                let fullsize = iter.next().context("--image needs <thumbnail-url> <fullsize-url>")?;
                message = message.with_image(thumbnail.as_str(), fullsize.as_str());
            }
            "--silent" => {
                message = message.silent();
            }
            other => bail!("Unknown option for send: {}", other),
        }
    }

    Ok(message)
}

/// Print help message
fn print_help() {
    println!("lotify - LINE Notify client");
    println!();
    println!("Usage:");
    println!("  lotify auth-link <state>        Print the OAuth2 authorization URL");
    println!("  lotify token <code>             Exchange an authorization code for an access token");
    println!("  lotify status <token>           Show the status of an access token");
    println!("  lotify send <token> <message>   Send a notification");
    println!("      [--sticker <package-id> <sticker-id>]");
    println!("      [--image <thumbnail-url> <fullsize-url>]");
    println!("      [--silent]");
    println!("  lotify revoke <token>           Revoke an access token");
    println!("  lotify --help                   Show this help message");
    println!("  lotify --version                Show version");
    println!();
    println!("Configuration is read from ./lotify.toml ([line_notify] table) or the environment:");
    println!("  LINE_NOTIFY_CLIENT_ID           OAuth client id (required)");
    println!("  LINE_NOTIFY_CLIENT_SECRET       OAuth client secret (required)");
    println!("  LINE_NOTIFY_REDIRECT_URI        Registered redirect URI (required)");
    println!("  LINE_NOTIFY_BOT_ORIGIN          Default: https://notify-bot.line.me");
    println!("  LINE_NOTIFY_API_ORIGIN          Default: https://notify-api.line.me");
    println!("  LINE_NOTIFY_TIMEOUT_SECS        Request timeout (default: 30)");
    println!("  LINE_NOTIFY_ALLOW_INSECURE_TLS  Skip certificate verification (default: false)");
}
