//! Terminal chat client.
//!
//! Reads prompts from stdin, streams replies from the relay as they arrive
//! and keeps the conversation in a [`ChatThread`].

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use weather_chat::client::WeatherClient;
use weather_chat::session::ChatThread;
use weather_chat::telemetry;

const HELP: &str = "\
Commands:
  /retry          resend the last prompt
  /clear          clear the conversation
  /search <text>  list messages containing <text>
  /export [path]  write the transcript to a file
  /history        show the whole conversation
  /help           show this help
  /quit           exit";

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with the weather agent from a terminal")]
struct Args {
    /// Base URL of the relay
    #[arg(long, env = "WEATHER_CHAT_URL", default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Whole-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

/// A parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Prompt(&'a str),
    Retry,
    Clear,
    Search(&'a str),
    Export(Option<&'a str>),
    History,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Prompt(line);
        };
        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(n, a)| (n, a.trim()));
        match name {
            "retry" => Self::Retry,
            "clear" => Self::Clear,
            "search" => Self::Search(arg),
            "export" => Self::Export(Some(arg).filter(|a| !a.is_empty())),
            "history" => Self::History,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(name),
        }
    }
}

#[derive(Debug)]
struct Repl {
    client: WeatherClient,
    thread: ChatThread,
    input: Lines<BufReader<Stdin>>,
}

impl Repl {
    async fn run(&mut self) -> Result<()> {
        println!("Weather Chat Assistant. Ask about the weather, or /help.");
        loop {
            prompt_marker()?;
            let Some(line) = self.input.next_line().await? else {
                break;
            };
            match Command::parse(&line) {
                Command::Prompt("") => {}
                Command::Prompt(text) => self.send(text).await?,
                Command::Retry => match self.thread.retry_prompt().map(str::to_owned) {
                    Some(prompt) => self.send(&prompt).await?,
                    None => println!("Nothing to retry."),
                },
                Command::Clear => self.clear().await?,
                Command::Search(query) => self.search(query),
                Command::Export(path) => self.export(path).await?,
                Command::History => self.history(),
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Unknown(name) => println!("Unknown command /{name}. Type /help."),
            }
        }
        Ok(())
    }

    async fn send(&mut self, prompt: &str) -> Result<()> {
        let id = match self.thread.begin_send(prompt) {
            Ok(id) => id,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };

        let thread = &mut self.thread;
        let result = self
            .client
            .send_message(prompt.trim(), |chunk| {
                thread.append_chunk(id, chunk);
                print!("{chunk}");
                let _ = std::io::stdout().flush();
            })
            .await;

        match result {
            Ok(_) => {
                println!();
                if let Some(icon) = self.thread.messages().last().and_then(|m| m.weather_icon()) {
                    println!("{icon}");
                }
                self.thread.complete(id);
            }
            Err(e) => {
                println!();
                tracing::warn!(name: "client.request.failed", error = ?e, "Request failed");
                self.thread.fail(id, e.to_string());
                if e.is_retryable() {
                    println!("Error: {e} (type /retry to try again)");
                } else {
                    println!("Error: {e}");
                }
            }
        }
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        if self.thread.messages().is_empty() {
            return Ok(());
        }
        print!("Are you sure you want to clear the chat history? [y/N] ");
        std::io::stdout().flush()?;
        let answer = self.input.next_line().await?.unwrap_or_default();
        if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            self.thread.clear();
            println!("Cleared.");
        }
        Ok(())
    }

    fn search(&self, query: &str) {
        let hits = self.thread.search(query);
        if hits.is_empty() {
            println!("No messages found matching \"{query}\"");
        }
        for m in hits {
            println!("[{:?}] {}", m.role, m.content);
        }
    }

    async fn export(&self, path: Option<&str>) -> Result<()> {
        if self.thread.messages().is_empty() {
            println!("Nothing to export.");
            return Ok(());
        }
        let path = path.map_or_else(
            || PathBuf::from(ChatThread::export_file_name(chrono::Local::now().date_naive())),
            PathBuf::from,
        );
        tokio::fs::write(&path, self.thread.export())
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Exported to {}", path.display());
        Ok(())
    }

    fn history(&self) {
        if self.thread.messages().is_empty() {
            println!("No messages yet.");
            return;
        }
        println!("{}", self.thread.export());
        if let Some(error) = self.thread.error() {
            println!("\nLast error: {error}");
        }
    }
}

fn prompt_marker() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let args = Args::parse();
    telemetry::init(telemetry::CLI_FILTER, args.log_json);

    let client = WeatherClient::new(&args.url)
        .with_context(|| format!("invalid relay URL: {}", args.url))?
        .with_timeout(Duration::from_secs(args.timeout_secs));

    let mut repl = Repl {
        client,
        thread: ChatThread::new(),
        input: BufReader::new(tokio::io::stdin()).lines(),
    };
    repl.run().await
}
