//! The spotlight in a terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use spotlight::core::Stage;
use spotlight::core::result::ResultItem;
use spotlight::render::{FileRows, render_error, render_item};
use spotlight::settings::{SettingsStore, config_dir};
use spotlight::{Session, SessionBuilder};
use spotlight_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use spotlight_mcp::{CONFIG_FILE_NAME, McpServersConfig};
use spotlight_proxy_model::{ProxyConfig, ProxyProvider};
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::select;
use tokio::sync::mpsc;

enum SessionEvent {
    Stage(Stage),
    Results(Vec<ResultItem>),
}

const HELP: &str = "\
Type a query, an arithmetic expression, or one of:
  /tools        list the available tools
  /key <value>  save the API key
  /quit         exit";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let builder = match env::var("SPOTLIGHT_PROXY_URL") {
        Ok(url) => {
            let config = ProxyConfig::with_base_url(url);
            info!("using the proxy at {}", config.endpoint());
            SessionBuilder::with_model_provider(ProxyProvider::new(config))
        }
        Err(_) => {
            let mut config = match env::var("GOOGLE_API_KEY") {
                Ok(api_key) => GeminiConfigBuilder::with_api_key(api_key),
                Err(_) => GeminiConfigBuilder::new(),
            };
            if let Ok(model) = env::var("GEMINI_MODEL") {
                config = config.with_model(model);
            }
            SessionBuilder::with_model_provider(GeminiProvider::new(
                config.build(),
            ))
        }
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut builder = builder
        .with_mcp_servers(load_mcp_servers())
        .on_stage({
            let event_tx = event_tx.clone();
            move |stage| {
                event_tx.send(SessionEvent::Stage(stage)).ok();
            }
        })
        .on_results(move |results| {
            event_tx.send(SessionEvent::Results(results.to_vec())).ok();
        });
    if let Some(store) = SettingsStore::in_config_dir() {
        builder = builder.with_settings_store(store);
    }
    let mut session = builder.build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let new_progress_bar = |message: &'static str| {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message(message);
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar
    };

    if session.has_tool_servers() {
        let progress_bar = new_progress_bar("🔌 Starting tool servers...");
        let count = session.refresh_tools().await;
        progress_bar.finish_and_clear();
        if count == 0 {
            println!("{}", "No tools are available yet.".bright_yellow());
        } else {
            println!("{}", format!("{count} tool(s) available.").dimmed());
        }
    }
    println!("{}", HELP.dimmed());

    let mut stdin = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let query = line.trim();
        let (command, arg) =
            query.split_once(char::is_whitespace).unwrap_or((query, ""));
        match command {
            "" => continue,
            "/quit" | "/exit" => break,
            "/key" => {
                save_api_key(&mut session, arg);
                continue;
            }
            _ => {}
        }

        // Drop events left over from the previous turn.
        while event_rx.try_recv().is_ok() {}

        let progress_bar = new_progress_bar("🔎 Searching...");
        let mut file_rows = FileRows::default();
        let turn = {
            let submit = session.submit(query);
            tokio::pin!(submit);
            loop {
                select! {
                    turn = &mut submit => break turn,
                    Some(event) = event_rx.recv() => match event {
                        SessionEvent::Stage(stage) => {
                            if let Some(message) = stage_message(stage) {
                                progress_bar.set_message(message);
                            }
                        }
                        SessionEvent::Results(results) => {
                            let rendered: Vec<_> = file_rows
                                .take_new(&results)
                                .into_iter()
                                .filter_map(render_item)
                                .collect();
                            if !rendered.is_empty() {
                                progress_bar.suspend(|| {
                                    for row in &rendered {
                                        println!("{row}");
                                    }
                                });
                            }
                        }
                    },
                }
            }
        };
        // Finish the progress bar before printing anything else.
        progress_bar.finish_and_clear();

        for item in file_rows.remaining(&turn.results) {
            if let Some(rendered) = render_item(item) {
                println!("{rendered}");
            }
        }
        if let Some(err) = &turn.error {
            println!("{}", render_error(err));
        }
        println!();
    }
}

fn load_mcp_servers() -> McpServersConfig {
    let Some(dir) = config_dir() else {
        warn!("no configuration directory, starting without tool servers");
        return Default::default();
    };
    let root = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(CONFIG_FILE_NAME);
    McpServersConfig::load_or_init(&path, &McpServersConfig::bundled(&root))
        .unwrap_or_else(|err| {
            error!("failed to load {path:?}: {err}");
            Default::default()
        })
}

fn save_api_key(session: &mut Session, api_key: &str) {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        println!("{}", "Usage: /key <value>".bright_yellow());
        return;
    }
    match session.save_api_key(api_key) {
        Ok(()) => println!("{}", "API key saved.".bright_green()),
        Err(err) => {
            error!("failed to save settings: {err}");
            println!(
                "{}",
                "The API key is used for now, but couldn't be saved."
                    .bright_yellow()
            );
        }
    }
}

#[inline]
fn stage_message(stage: Stage) -> Option<&'static str> {
    match stage {
        Stage::Thinking => Some("🤔 Thinking..."),
        Stage::CallingTools => Some("🛠️  Calling tools..."),
        Stage::Summarizing => Some("📝 Summarizing..."),
        Stage::Ready | Stage::Error => None,
    }
}

async fn read_line(stdin: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    match stdin.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
