use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};

use athanor::ai::AiClient;
use athanor::commands::{self, Command};
use athanor::game_state::{AddSubstanceHook, GameState};
use athanor::logging;
use athanor::save;
use athanor::settings::Settings;
use athanor::substance::Substance;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = logging::init();

    let settings = Settings::load().unwrap_or_default();
    if let Some(api_key) = &settings.openai_api_key {
        if !Settings::validate_api_key(api_key).await {
            warn!("the configured OpenAI API key failed validation");
        }
    }
    let ai = AiClient::new(&settings)?;

    // Every admission flows through this channel; the receiving task saves
    // the world and prints the announcement.
    let (announce_sender, mut announce_receiver) = mpsc::unbounded_channel::<Substance>();
    let hook: AddSubstanceHook = Arc::new(move |substance: &Substance| {
        let _ = announce_sender.send(substance.clone());
    });

    let world_path = save::world_path();
    let (state, fresh) = if world_path.exists() {
        let snapshot = save::load_world(&world_path)?;
        info!(
            "restored {} substances from {}",
            snapshot.substances.len(),
            world_path.display()
        );
        (GameState::from_snapshot(snapshot, hook), false)
    } else {
        (GameState::new(hook), true)
    };
    let state = Arc::new(Mutex::new(state));

    let announcer_state = Arc::clone(&state);
    tokio::spawn(async move {
        while let Some(substance) = announce_receiver.recv().await {
            let snapshot = announcer_state.lock().await.snapshot();
            if let Err(e) = save::save_world(&save::world_path(), &snapshot) {
                warn!("failed to save the world: {e}");
            }
            println!("{}", commands::announcement(&substance));
        }
    });

    if fresh {
        state.lock().await.seed_starters(&ai).await?;
    }

    println!(
        "Athanor is ready! Commands: !process <image_url> <symbols...> | !substances | !ssearch <query>"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };

        // One command at a time: ranking, the copy check, symbol resolution
        // and the append are a single transaction over the world.
        let mut state = state.lock().await;
        match commands::dispatch(&mut state, &ai, command).await {
            Ok(replies) => {
                for reply in replies {
                    println!("{reply}");
                }
            }
            Err(e) => println!("{}", commands::error_reply(&e)),
        }
    }

    Ok(())
}
