//! Terminal REPL for exercising the chat engine by hand.
//!
//! ```text
//! > how do I deploy a docker container?
//! /mode multi
//! /split on
//! /reset
//! /quit
//! ```

use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use chat_orchestrator::application::{ChatEngine, LaneResult, SendOutcome, TurnOutcome};
use chat_orchestrator::bootstrap::{build_deps, tracing_events};
use chat_orchestrator::config::AppConfig;
use chat_orchestrator::domain::foundation::{Identity, SessionId};
use chat_orchestrator::domain::settings::{AIConfigPatch, ChatMode};
use chat_orchestrator::telemetry::init_tracing;

const HELP: &str = "commands: /reset  /mode <default|single|multi>  /split <on|off>  /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.telemetry);

    let deps = build_deps(&config, tracing_events()).await?;
    let identity = Identity::anonymous("127.0.0.1")?;
    let engine = Arc::new(ChatEngine::new(
        deps,
        config.engine_settings(),
        SessionId::new(),
        identity,
    ));

    println!("chat-orchestrator ready. {}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/reset", _) => {
                engine.reset().await;
                println!("-- conversation reset");
            }
            ("/mode", arg) => match ChatMode::from_str(arg.trim()) {
                Ok(mode) => print_notices(&engine, AIConfigPatch::mode(mode)).await,
                Err(e) => println!("-- {}", e),
            },
            ("/split", arg) => match arg.trim() {
                "on" => print_notices(&engine, AIConfigPatch::split_screen(true)).await,
                "off" => print_notices(&engine, AIConfigPatch::split_screen(false)).await,
                _ => println!("-- {}", HELP),
            },
            (cmd, _) if cmd.starts_with('/') => println!("-- {}", HELP),
            _ => match engine.send(line, Vec::new()).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => println!("-- {}", e),
            },
        }
    }

    engine.reset().await;
    Ok(())
}

async fn print_notices(engine: &ChatEngine, patch: AIConfigPatch) {
    let update = engine.update_config(patch).await;
    for notice in &update.notices {
        println!("-- {}", notice);
    }
    if update.lanes_cleared {
        println!("-- split lanes cleared");
    }
}

fn print_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Dropped => println!("-- still answering the previous message"),
        SendOutcome::Discarded => println!("-- reply discarded"),
        SendOutcome::QuotaExceeded {
            retry_after_secs, ..
        } => println!("-- message limit reached, try again in {}s", retry_after_secs),
        SendOutcome::Completed(TurnOutcome::Single(result)) => print_lane("assistant", result),
        SendOutcome::Completed(TurnOutcome::Split { primary, secondary }) => {
            print_lane("primary", primary);
            print_lane("secondary", secondary);
        }
    }
}

fn print_lane(label: &str, result: &LaneResult) {
    match result {
        LaneResult::Replied { message, .. } => {
            let model = message.model().unwrap_or("unknown");
            println!("[{} · {}]\n{}\n", label, model, message.content());
        }
        LaneResult::Failed { model, error, .. } => {
            println!("[{} · {}] failed ({}): {}", label, model, error.failure_category(), error);
        }
        LaneResult::Discarded { .. } => {}
    }
}
