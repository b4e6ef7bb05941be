//! Plays a short scripted Knucklebones match in-process.
//!
//! Two players and a spectator walk into a zone, the players trade a few
//! turns (the dice are fixed so the second placement captures), then
//! player two walks away and the game resets. Every update the spectator
//! receives is logged as JSON.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p local-match
//! ```

use std::sync::Arc;

use knuckle::prelude::*;
use knuckle::UpdateReceiver;
use knuckle::sync::ParticipantLink;

const TOWN: &str = r#"{
    "width": 32,
    "height": 24,
    "layers": [
        { "type": "tilelayer", "name": "Ground" },
        {
            "type": "objectgroup",
            "name": "Objects",
            "objects": [
                { "type": "KnuckleGameArea", "name": "Knuckles1", "x": 96, "y": 160, "width": 96, "height": 64 }
            ]
        }
    ]
}"#;

#[tokio::main]
async fn main() -> Result<(), KnuckleError> {
    knuckle::telemetry::init();

    let config = TownConfig::from_json(TOWN)?;
    let sessions = config
        .zones()
        .iter()
        .map(|zone| -> Result<Session, KnuckleError> {
            let roller = SequenceRoller::from_values(&[3, 3, 5, 1]);
            Ok(Session::with_roller(Zone::from_descriptor(zone)?, Box::new(roller)))
        })
        .collect::<Result<Vec<_>, KnuckleError>>()?;

    let directory = Arc::new(InMemoryDirectory::new());
    for (id, name) in [("p1", "Ada"), ("p2", "Brook"), ("p3", "Cass")] {
        directory.insert(ParticipantRecord {
            id: ParticipantId::new(id),
            user_name: name.to_string(),
        });
    }
    let host = TownHost::from_sessions(sessions, directory, config.sync.clone())?;

    let area = SessionId::new("Knuckles1");
    let ada = ParticipantId::new("p1");
    let brook = ParticipantId::new("p2");
    let cass = ParticipantId::new("p3");

    host.enter(&area, ada.clone()).await?;
    host.enter(&area, brook.clone()).await?;
    host.enter(&area, cass.clone()).await?;

    let mut spectator = host.controller(&area, cass).await?;
    let (_sub, mut updates) = host.subscribe(&area).await?;
    let first = host.controller(&area, ada).await?;
    let second = host.controller(&area, brook.clone()).await?;

    first.request_start().await?;
    first.request_roll().await?;
    first.request_place(0).await?;
    second.request_roll().await?;
    second.request_place(0).await?;
    first.request_roll().await?;
    first.request_place(2).await?;
    // Not their turn: ignored, no update.
    first.request_roll().await?;

    follow(&host, &area, &mut spectator, &mut updates).await?;
    tracing::info!(
        board_one = ?spectator.board_one(),
        board_two = ?spectator.board_two(),
        "mid-game"
    );

    host.leave(&area, brook).await?;
    follow(&host, &area, &mut spectator, &mut updates).await?;
    tracing::info!(running = spectator.is_running(), "after player two left");

    host.shutdown().await;
    Ok(())
}

/// Feeds everything delivered so far into the mirror, logging each update.
async fn follow(
    host: &TownHost,
    area: &SessionId,
    mirror: &mut SessionController<ParticipantLink>,
    updates: &mut UpdateReceiver,
) -> Result<(), KnuckleError> {
    let codec = JsonCodec;
    // The session answers in order, so once this returns every earlier
    // request has been applied.
    host.snapshot(area).await?;
    while let Ok(update) = updates.try_recv() {
        let bytes = codec.encode(&update)?;
        tracing::info!(seq = update.seq, json = %String::from_utf8_lossy(&bytes), "update");
        let changes = mirror.receive_encoded(&codec, &bytes)?;
        for change in changes {
            tracing::debug!(field = ?change.field(), "changed");
        }
    }
    Ok(())
}
