//! Command-line client for chatting with personas and reviewing coaching.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use rapport::Rapport;
use rapport::config::{LayeredConfigOptions, RapportConfig};
use rapport::core::{AdvanceOutcome, TurnOutcome};
use rapport::memory::ConversationKey;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line options for the Rapport client.
#[derive(Parser)]
#[command(name = "rapport", version)]
struct Cli {
    /// Extra rapport.json5 layered over the user and cwd configs
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override storage.path
    #[arg(long, global = true)]
    storage: Option<PathBuf>,
    /// Override directory.path
    #[arg(long, global = true)]
    directory: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message, or chat interactively when no message is given
    Chat {
        #[command(flatten)]
        conversation: ConversationArgs,
        message: Option<String>,
    },
    /// Score new user/assistant pairs and print all recommendations
    Suggest {
        #[command(flatten)]
        conversation: ConversationArgs,
        /// Print recommendations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the stored conversation
    History {
        #[command(flatten)]
        conversation: ConversationArgs,
    },
    /// Delete the conversation, its memories, and its recommendations
    Forget {
        #[command(flatten)]
        conversation: ConversationArgs,
    },
}

#[derive(Args)]
struct ConversationArgs {
    #[arg(long)]
    session: String,
    #[arg(long)]
    persona: String,
}

impl ConversationArgs {
    fn key(&self) -> ConversationKey {
        ConversationKey::new(self.session.clone(), self.persona.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rapport::init_logging();
    let cli = Cli::parse();
    info!(
        "starting rapport (config_set={}, storage_set={}, directory_set={})",
        cli.config.is_some(),
        cli.storage.is_some(),
        cli.directory.is_some()
    );
    let config = load_config(&cli)?;
    let rapport = Rapport::open(config).context("failed to open rapport")?;

    let result = run(&rapport, cli.command).await;
    rapport.close();
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<RapportConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered =
        RapportConfig::load_layered_with_options(options).context("failed to load config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    if let Some(storage) = cli.storage.as_ref() {
        config.storage.path = Some(storage.to_string_lossy().to_string());
    }
    if let Some(directory) = cli.directory.as_ref() {
        config.directory.path = Some(directory.to_string_lossy().to_string());
    }
    Ok(config)
}

async fn run(rapport: &Rapport, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Chat {
            conversation,
            message: Some(message),
        } => {
            let outcome = rapport
                .conversations()
                .respond(&conversation.key(), &message)
                .await
                .context("chat turn failed")?;
            println!("{}", outcome.text());
        }
        Command::Chat {
            conversation,
            message: None,
        } => chat_loop(rapport, &conversation.key()).await?,
        Command::Suggest { conversation, json } => {
            let outcome = rapport
                .recommendations()
                .advance(&conversation.key())
                .await
                .context("recommendation pass failed")?;
            match outcome {
                AdvanceOutcome::NoHistory => bail!("no chat history found"),
                AdvanceOutcome::UnknownPersona => bail!("unknown persona: {}", conversation.persona),
                AdvanceOutcome::Advanced {
                    new_count,
                    recommendations,
                } if json => {
                    let body = serde_json::json!({
                        "new_recommendations_added": new_count,
                        "recommendations": recommendations,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                AdvanceOutcome::Advanced {
                    new_count,
                    recommendations,
                } => {
                    println!("{new_count} new recommendation(s)");
                    for rec in recommendations {
                        println!(
                            "\n#{} [{}/5] {}\n  suggestion: {}\n  next move: {}",
                            rec.message_index,
                            rec.rating,
                            rec.user_message,
                            rec.suggestion,
                            rec.next_move
                        );
                    }
                }
            }
        }
        Command::History { conversation } => {
            let messages = rapport
                .conversations()
                .history(&conversation.key())
                .await
                .context("failed to read history")?;
            for message in messages {
                println!("{}: {}", message.role, message.content);
            }
        }
        Command::Forget { conversation } => {
            let outcome = rapport
                .conversations()
                .forget(&conversation.key())
                .await
                .context("failed to forget conversation")?;
            if outcome.removed_anything() {
                println!("conversation deleted");
            } else {
                println!("nothing to delete");
            }
        }
    }
    Ok(())
}

async fn chat_loop(rapport: &Rapport, key: &ConversationKey) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        let outcome = rapport
            .conversations()
            .respond(key, line)
            .await
            .context("chat turn failed")?;
        if matches!(outcome, TurnOutcome::PersonaNotFound) {
            eprintln!("{}", outcome.text());
            break;
        }
        println!("{}", outcome.text());
    }
    Ok(())
}
