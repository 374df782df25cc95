mod common;

use common::{wait_for, FakeNode, CLIENT_ID};
use open_link::{
    events::{Event, NodeEvent, PlayerEvent},
    LinkManager, ManagerOptions, NodeOptions, Player, PlayerOptions,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{sync::Arc, time::Duration};

struct Harness {
    manager: LinkManager,
    events: flume::Receiver<Event>,
    gateway: flume::Receiver<(GuildId, Value)>,
    player: Arc<Player>,
}

async fn setup(fake: &FakeNode) -> Harness {
    let (gateway_tx, gateway) = flume::unbounded();
    let node = NodeOptions::new("127.0.0.1", "secret")
        .with_port(fake.port())
        .with_name("fake")
        .with_retry(3, Duration::from_millis(50));

    let manager = LinkManager::new(ManagerOptions::new(vec![node]), move |guild_id: GuildId, payload: Value| {
        let _ = gateway_tx.send((guild_id, payload));
    })
    .unwrap();
    let events = manager.events();
    manager.init(UserId::new(CLIENT_ID));
    wait_for(&events, |e| matches!(e, Event::Node(NodeEvent::Connect { .. }))).await;

    let player = manager
        .create_player(PlayerOptions::new(GuildId::new(1), ChannelId::new(2), ChannelId::new(3)))
        .await
        .unwrap();
    assert_eq!(fake.next_frame().await["op"], "volume");

    Harness {
        manager,
        events,
        gateway,
        player,
    }
}

fn server_update(token: &str) -> Value {
    json!({
        "t": "VOICE_SERVER_UPDATE",
        "d": { "token": token, "guild_id": "1", "endpoint": "eu.discord.media:443" }
    })
}

fn state_update(user_id: u64, channel_id: Option<&str>, session_id: &str) -> Value {
    json!({
        "t": "VOICE_STATE_UPDATE",
        "d": {
            "guild_id": "1",
            "user_id": user_id.to_string(),
            "channel_id": channel_id,
            "session_id": session_id
        }
    })
}

fn voice_update(token: &str, session_id: &str) -> Value {
    json!({
        "op": "voiceUpdate",
        "guildId": "1",
        "sessionId": session_id,
        "event": { "token": token, "guild_id": "1", "endpoint": "eu.discord.media:443" }
    })
}

/// Un frame de volumen después de la operación prueba que no se envió nada antes
async fn assert_nothing_sent(fake: &FakeNode, player: &Player) {
    player.set_volume(77.0).await.unwrap();
    assert_eq!(
        fake.next_frame().await,
        json!({ "op": "volume", "guildId": "1", "volume": 77 })
    );
}

#[tokio::test]
async fn test_connect_sends_gateway_command() {
    let fake = FakeNode::start().await;
    let h = setup(&fake).await;

    h.player.connect().unwrap();

    let (guild_id, payload) = h.gateway.recv_async().await.unwrap();
    assert_eq!(guild_id, GuildId::new(1));
    assert_eq!(
        payload,
        json!({
            "op": 4,
            "d": { "guild_id": "1", "channel_id": "3", "self_mute": false, "self_deaf": true }
        })
    );
}

#[tokio::test]
async fn test_voice_update_is_forwarded_once() {
    let fake = FakeNode::start().await;
    let h = setup(&fake).await;

    h.manager.update_voice_state(&server_update("tok")).await;
    h.manager
        .update_voice_state(&state_update(CLIENT_ID, Some("3"), "sess"))
        .await;

    assert_eq!(fake.next_frame().await, voice_update("tok", "sess"));

    // el mismo conjunto no se reenvía
    h.manager
        .update_voice_state(&state_update(CLIENT_ID, Some("3"), "sess"))
        .await;
    assert_nothing_sent(&fake, &h.player).await;

    // un token nuevo sí
    h.manager.update_voice_state(&server_update("tok2")).await;
    assert_eq!(fake.next_frame().await, voice_update("tok2", "sess"));
}

#[tokio::test]
async fn test_fragments_in_any_order() {
    let fake = FakeNode::start().await;
    let h = setup(&fake).await;

    h.manager
        .update_voice_state(&state_update(CLIENT_ID, Some("3"), "sess"))
        .await;
    h.manager.update_voice_state(&server_update("tok")).await;

    assert_eq!(fake.next_frame().await, voice_update("tok", "sess"));
}

#[tokio::test]
async fn test_other_users_and_guilds_are_ignored() {
    let fake = FakeNode::start().await;
    let h = setup(&fake).await;

    h.manager.update_voice_state(&state_update(7, Some("3"), "other")).await;
    h.manager.update_voice_state(&server_update("tok")).await;
    h.manager
        .update_voice_state(&json!({
            "t": "VOICE_SERVER_UPDATE",
            "d": { "token": "x", "guild_id": "555", "endpoint": "e" }
        }))
        .await;
    h.manager
        .update_voice_state(&json!({ "t": "MESSAGE_CREATE", "d": { "content": "hi" } }))
        .await;

    assert_nothing_sent(&fake, &h.player).await;
}

#[tokio::test]
async fn test_move_and_disconnect_events() {
    let fake = FakeNode::start().await;
    let h = setup(&fake).await;

    h.manager
        .update_voice_state(&state_update(CLIENT_ID, Some("9"), "sess"))
        .await;

    let event = wait_for(&h.events, |e| matches!(e, Event::Player(PlayerEvent::Move { .. }))).await;
    match event {
        Event::Player(PlayerEvent::Move {
            old_channel,
            new_channel,
            ..
        }) => {
            assert_eq!(old_channel, Some(ChannelId::new(3)));
            assert_eq!(new_channel, ChannelId::new(9));
        }
        _ => unreachable!(),
    }
    assert_eq!(h.player.voice_channel_id(), Some(ChannelId::new(9)));

    h.manager.update_voice_state(&server_update("tok")).await;
    assert_eq!(fake.next_frame().await, voice_update("tok", "sess"));

    h.manager
        .update_voice_state(&state_update(CLIENT_ID, None, "sess"))
        .await;
    let event = wait_for(&h.events, |e| matches!(e, Event::Player(PlayerEvent::Disconnect { .. }))).await;
    match event {
        Event::Player(PlayerEvent::Disconnect { channel_id, .. }) => {
            assert_eq!(channel_id, Some(ChannelId::new(9)))
        }
        _ => unreachable!(),
    }
    assert_eq!(h.player.voice_channel_id(), None);

    // tras el reset hacen falta ambos fragmentos otra vez
    h.manager
        .update_voice_state(&state_update(CLIENT_ID, Some("9"), "sess"))
        .await;
    assert_nothing_sent(&fake, &h.player).await;

    h.manager.update_voice_state(&server_update("tok")).await;
    assert_eq!(fake.next_frame().await, voice_update("tok", "sess"));
}

#[tokio::test]
async fn test_disconnect_leaves_voice() {
    let fake = FakeNode::start().await;
    let h = setup(&fake).await;

    h.player.disconnect().await.unwrap();

    let (_, payload) = h.gateway.recv_async().await.unwrap();
    assert_eq!(payload["op"], 4);
    assert_eq!(payload["d"]["channel_id"], Value::Null);
    assert_eq!(h.player.voice_channel_id(), None);
}
