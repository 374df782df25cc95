use anyhow::{Context, Result};
use open_link::{
    events::{Event, NodeEvent, PlayerEvent, TrackEvent},
    LinkManager, ManagerOptions,
};
use serde_json::Value;
use serenity::model::id::{GuildId, UserId};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("open_link=debug".parse()?),
        )
        .init();

    info!("🎵 Iniciando open-link v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let options = ManagerOptions::load().context("Error al cargar configuración")?;
    info!("{}", options.summary());

    let client_id: u64 = std::env::var("CLIENT_ID")
        .context("CLIENT_ID no definido")?
        .parse()
        .context("CLIENT_ID debe ser numérico")?;
    anyhow::ensure!(client_id != 0, "CLIENT_ID no puede ser 0");

    // Sin gateway propio: los comandos de voz solo se registran
    let gateway = |guild_id: GuildId, payload: Value| {
        debug!("📤 Gateway {}: {}", guild_id, payload);
    };

    let manager = LinkManager::new(options, gateway).context("Error al crear el registro de nodos")?;
    let events = manager.events();
    manager.init(UserId::new(client_id));

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&manager).await;
    }

    // Manejar shutdown graceful
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("⚠️ Señal de shutdown recibida, cerrando...");
        }
        _ = async {
            while let Ok(event) = events.recv_async().await {
                log_event(&event);
            }
        } => {
            warn!("Canal de eventos cerrado");
        }
    }

    manager.shutdown().await;
    info!("👋 open-link detenido");
    Ok(())
}

fn log_event(event: &Event) {
    match event {
        Event::Node(NodeEvent::Connect { node }) => info!("✅ {} conectado", node),
        Event::Node(NodeEvent::Disconnect { node, code, reason }) => {
            warn!("🔌 {} desconectado ({} {})", node, code, reason)
        }
        Event::Node(NodeEvent::Error { node, error }) => error!("❌ {}: {}", node, error),
        Event::Node(event) => info!("{:?}", event),
        Event::Player(PlayerEvent::Move {
            guild_id,
            new_channel,
            ..
        }) => info!("🔀 {} movido a {}", guild_id, new_channel),
        Event::Player(event) => info!("{:?}", event),
        Event::Track(TrackEvent::QueueEnd { guild_id, .. }) => info!("🏁 Cola terminada en {}", guild_id),
        Event::Track(event) => debug!("{:?}", event),
        Event::Raw(frame) => debug!("📥 {}", frame),
    }
}

/// Espera la conexión de cada nodo y prueba su API REST
async fn health_check(manager: &LinkManager) -> Result<()> {
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let mut healthy = true;
    for node in manager.nodes() {
        let rest = node.load_tracks("ytsearch:health check").await;
        match (node.is_connected(), rest) {
            (true, Ok(_)) => info!("✅ {} OK", node.name()),
            (connected, rest) => {
                healthy = false;
                error!(
                    "❌ {}: websocket={} rest={}",
                    node.name(),
                    connected,
                    rest.map(|_| "ok".to_string()).unwrap_or_else(|e| e.to_string())
                );
            }
        }
    }

    manager.shutdown().await;
    anyhow::ensure!(healthy, "Health check falló");
    info!("✅ Health check OK");
    Ok(())
}
