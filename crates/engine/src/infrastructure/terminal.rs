//! Terminal adapters for the REPL binary: the display prints notifications
//! and the retry prompt reads the answer from stdin.

use std::sync::Arc;

use async_trait::async_trait;
use tianji_shared::DisplayEvent;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::infrastructure::ports::{DisplayPort, FailureSummary, RetryChoice, RetryDecisionPort};

/// Stdin line reader shared between the REPL loop and the retry prompt.
pub type SharedLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> SharedLines {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

#[derive(Debug, Default)]
pub struct TerminalDisplay;

impl DisplayPort for TerminalDisplay {
    fn notify(&self, event: DisplayEvent) {
        match event {
            DisplayEvent::QueueAdded { entry } => println!("  + queued: {}", entry.description),
            DisplayEvent::QueueRemoved { id } => println!("  - unqueued: {id}"),
            DisplayEvent::QueueCleared => println!("  (pending actions handed to the story)"),
            DisplayEvent::Changelog { entries } => {
                for entry in entries {
                    println!("  ~ {} {}", entry.action, entry.path);
                }
            }
        }
    }
}

pub struct TerminalRetryPrompt {
    lines: SharedLines,
}

impl TerminalRetryPrompt {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl RetryDecisionPort for TerminalRetryPrompt {
    async fn ask(&self, failure: &FailureSummary) -> RetryChoice {
        println!(
            "Generation failed after {} attempts: {}\nRetry? [y/N]",
            failure.attempts, failure.reason
        );
        let answer = match self.lines.lock().await.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read retry answer");
                String::new()
            }
        };
        parse_answer(&answer)
    }
}

fn parse_answer(answer: &str) -> RetryChoice {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "r" | "retry" => RetryChoice::Retry,
        _ => RetryChoice::Abort,
    }
}
