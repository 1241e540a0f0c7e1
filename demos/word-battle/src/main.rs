//! Word Battle: a complete simulated match over the loopback gateway.
//!
//! Two players trade words; longer words score more. One process
//! plays both seats — each transmitted turn becomes the next inbound
//! turn, exactly as it would round-trip through the host platform.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use turnforge::{
    FixedRect, LoopbackGateway, TurnConfig, TurnEvent, TurnSession, VariableInput, VariableValue,
};

const TURN_LIMIT: i64 = 6;
const PLAYS: [&str; 6] = ["fern", "quartz", "ox", "jukebox", "tea", "syzygy"];

fn word_score(word: &str) -> i64 {
    word.len() as i64
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let gateway = Arc::new(LoopbackGateway::new());
    let config = TurnConfig {
        turn_limit: Some(TURN_LIMIT),
        turns_saved_limit: Some(4),
        default_turn_variables: vec![VariableInput::new("word", VariableValue::Str(String::new()))],
        ..Default::default()
    };

    // Each loop iteration is one player's turn on "their device": a
    // fresh session against the shared gateway.
    loop {
        let mut session = TurnSession::new(config.clone(), gateway.clone());
        let mut events = session.events().expect("events taken once per session");
        session.start().await;

        while let Ok(event) = events.try_recv() {
            if let TurnEvent::TurnStart { turn_count, current_user_index, previous_turn_variables, .. } = event {
                let reply_to = previous_turn_variables
                    .get("word")
                    .and_then(|w| w.as_str())
                    .unwrap_or("(nothing)");
                info!(turn_count, player = current_user_index, reply_to, "turn started");
            }
        }

        let turn = session.controller().turn_count();
        let player = session.controller().current_user_index();
        let word = PLAYS[turn as usize % PLAYS.len()];
        let points = word_score(word);

        session.set_variable("word", json!(word)).await;
        session.set_variable("points", json!(points)).await;

        let score_key = format!("score{player}");
        let store = session.global_storage();
        let total = store.get(&score_key).await.and_then(|v| v.as_i64()).unwrap_or(0) + points;
        store.set(&score_key, json!(total)).await;
        info!(player, word, points, total, "word played");

        // The reply message invites the next player to tap "play".
        session
            .tappables_mut()
            .add("play", Arc::new(FixedRect::new(0.5, 0.85, 0.3, 0.12)));

        session.end_turn();
        session.tick().await;

        let mut game_over = false;
        while let Ok(event) = events.try_recv() {
            match event {
                TurnEvent::TurnEnd { turn_count } => info!(turn_count, "turn submitted"),
                TurnEvent::GameOver { turn_count } => {
                    info!(turn_count, "final turn submitted");
                    game_over = true;
                }
                TurnEvent::SendFailed { reason } => info!(%reason, "send failed"),
                _ => {}
            }
        }

        if game_over {
            let score0 = store.get("score0").await.and_then(|v| v.as_i64()).unwrap_or(0);
            let score1 = store.get("score1").await.and_then(|v| v.as_i64()).unwrap_or(0);
            let history = session.controller().history().len();
            info!(score0, score1, retained_turns = history, "match over");
            println!(
                "word battle finished after {} turns: player 0 scored {score0}, player 1 scored {score1}",
                turn + 1
            );
            break;
        }
    }
}
