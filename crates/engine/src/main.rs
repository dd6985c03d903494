//! Tianji Engine - terminal REPL.
//!
//! Plain input is a narrative turn. Lines starting with `/` are panel actions.

use std::sync::Arc;

use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tianji_domain::{NewCharacter, SessionId, SixAttributes};
use tianji_engine::infrastructure::{
    clock::SystemClock,
    memory_store::InMemorySaveStore,
    ollama::OllamaClient,
    ports::GenerationOptions,
    settings::EngineConfig,
    terminal::{stdin_lines, SharedLines, TerminalDisplay, TerminalRetryPrompt},
};
use tianji_engine::use_cases::{GameSession, SessionError};
use tianji_engine::App;

const HELP: &str = "Commands: /equip <id>  /unequip <id>  /use <id> [qty]  /cultivate <id>  \
/stop <id>  /undo  /save  /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tianji_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tianji Engine");

    let config = EngineConfig::from_env();
    let generation = Arc::new(OllamaClient::from_settings(&config.generation));
    tracing::info!(
        model = generation.model(),
        max_auto_attempts = config.retry.max_auto_attempts,
        base_delay_ms = config.retry.base_delay.as_millis() as u64,
        "Generation client configured"
    );

    let lines = stdin_lines();
    let app = App::new(
        config,
        generation,
        Arc::new(TerminalRetryPrompt::new(lines.clone())),
        Arc::new(TerminalDisplay),
        Arc::new(InMemorySaveStore::new()),
        Arc::new(SystemClock),
    );

    let character = create_character(&lines).await?;
    let session = app.open_session(SessionId::new(), Some(character)).await?;
    println!("{HELP}");

    loop {
        let Some(line) = lines.lock().await.next_line().await? else {
            break;
        };
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            let mut words = command.split_whitespace();
            let verb = words.next().unwrap_or_default();
            let arg = words.next().unwrap_or_default();
            let result = match verb {
                "quit" | "exit" => break,
                "save" => session.save().await.map(|_| "saved".to_string()),
                "undo" => session.undo_last().await.map(|o| o.message),
                "equip" => session.equip(arg).await.map(|o| o.message),
                "unequip" => session.unequip(arg).await.map(|o| o.message),
                "cultivate" => session.cultivate(arg).await.map(|o| o.message),
                "stop" => session.stop_cultivation(arg).await.map(|o| o.message),
                "use" => {
                    let quantity = words.next().and_then(|q| q.parse().ok()).unwrap_or(1);
                    session.use_item(arg, quantity).await.map(|o| o.message)
                }
                _ => {
                    println!("{HELP}");
                    continue;
                }
            };
            match result {
                Ok(message) => println!("{message}"),
                Err(e) => println!("! {e}"),
            }
            continue;
        }

        converse(&session, line).await;
    }

    session.save().await?;
    tracing::info!(session = %session.id(), "Session closed");
    Ok(())
}

async fn converse(session: &GameSession, input: &str) {
    match session.converse(input, GenerationOptions::default()).await {
        Ok(outcome) => print_turn(&outcome.narrative, outcome.report.rejected() + outcome.report.gated()),
        Err(SessionError::AutosaveFailed { outcome, source }) => {
            print_turn(&outcome.narrative, outcome.report.rejected() + outcome.report.gated());
            println!("! autosave failed: {source}");
        }
        Err(e) => println!("! {e}"),
    }
}

fn print_turn(narrative: &str, dropped: usize) {
    println!("\n{narrative}\n");
    if dropped > 0 {
        println!("  ({dropped} commands were not applied)");
    }
}

/// Ask for a name, gender and age; innate attributes are rolled.
async fn create_character(lines: &SharedLines) -> anyhow::Result<NewCharacter> {
    let name = ask(lines, "Name [Wanderer]: ").await?.unwrap_or_else(|| "Wanderer".into());
    let gender = ask(lines, "Gender [male]: ").await?.unwrap_or_else(|| "male".into());
    let age = ask(lines, "Age [16]: ")
        .await?
        .and_then(|a| a.parse().ok())
        .unwrap_or(16);

    let mut rng = rand::thread_rng();
    let mut roll = || rng.gen_range(3..=8);
    let innate = SixAttributes::new(roll(), roll(), roll(), roll(), roll(), roll());
    Ok(NewCharacter::new(name, gender, age, innate))
}

async fn ask(lines: &SharedLines, prompt: &str) -> anyhow::Result<Option<String>> {
    println!("{prompt}");
    let answer = lines.lock().await.next_line().await?;
    Ok(answer.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()))
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
