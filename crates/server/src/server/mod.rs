//! Game server implementation.

use crate::config::Config;
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientCommand, ProtocolError, ServerEvent};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

pub mod game;

pub use game::{GameState, PendingEvents, run_game_loop};

/// An event addressed to a single session. Every connection handler
/// subscribes to the targeted channel and forwards only its own events.
#[derive(Debug, Clone)]
pub struct TargetedEvent {
    /// Target session id.
    pub player_id: String,
    /// The event to deliver.
    pub event: ServerEvent,
}

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }

        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }

        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    // Connection tracking state
    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));

    // One fan-out channel for world broadcasts, one for per-session events
    let (broadcast_tx, _broadcast_rx) = broadcast::channel::<ServerEvent>(256);
    let (targeted_tx, _targeted_rx) = broadcast::channel::<TargetedEvent>(256);

    // Shared game state
    let game_state = Arc::new(RwLock::new(GameState::new(
        &config,
        broadcast_tx.clone(),
        targeted_tx.clone(),
    )));

    // Start the game loop
    let game_loop_state = Arc::clone(&game_state);
    let tick_period = config.tick_period();
    tokio::spawn(async move {
        game::run_game_loop(game_loop_state, tick_period).await;
    });

    // Connection limits
    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;
    let broadcast_to_unregistered = config.server.broadcast_to_unregistered;

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, max_connections, ip_limit) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);
        let broadcast_rx = broadcast_tx.subscribe();
        let targeted_rx = targeted_tx.subscribe();

        tokio::spawn(async move {
            let result = handle_connection(
                stream,
                addr,
                game_state,
                broadcast_rx,
                targeted_rx,
                broadcast_to_unregistered,
            )
            .await;

            // Always remove from connection tracking when done
            {
                let mut state = conn_state.write().await;
                state.remove_connection(addr.ip());
            }

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    mut broadcast_rx: broadcast::Receiver<ServerEvent>,
    mut targeted_rx: broadcast::Receiver<TargetedEvent>,
    broadcast_to_unregistered: bool,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();

    // Create the session and hand the client its id and color
    let (player_id, init) = {
        let mut state = game_state.write().await;
        state.add_player(addr)
    };
    write.send(Message::Text(init.to_json()?.into())).await?;

    // Becomes true once our own `confirm` comes back over the targeted
    // channel. Gates world broadcasts for unregistered sessions when the
    // policy says so.
    let mut registered = false;

    // Message loop - handle both incoming commands and outgoing events
    loop {
        tokio::select! {
            // Handle incoming WebSocket messages
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientCommand::parse(text.as_str()) {
                            Ok(command) => {
                                let mut state = game_state.write().await;
                                state.handle_command(&player_id, command);
                            }
                            Err(e) => {
                                // Malformed input is dropped, not fatal
                                warn!("Bad command from {}: {}", addr, e);
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // Same policy as malformed JSON: drop, keep going
                        warn!("Bad command from {}: {}", addr, ProtocolError::NonTextFrame);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            // Handle world broadcasts
            event = broadcast_rx.recv() => {
                if let Ok(event) = event {
                    if !registered && !broadcast_to_unregistered {
                        continue;
                    }
                    let json = event.to_json()?;
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        warn!("Failed to send event to {}: {}", addr, e);
                        break;
                    }
                }
            }
            // Handle events targeted at this session
            targeted = targeted_rx.recv() => {
                if let Ok(targeted) = targeted {
                    if targeted.player_id != player_id {
                        continue;
                    }
                    if matches!(targeted.event, ServerEvent::Confirm { .. }) {
                        registered = true;
                    }
                    let json = targeted.event.to_json()?;
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        warn!("Failed to send event to {}: {}", addr, e);
                        break;
                    }
                }
            }
        }
    }

    // Remove the session
    {
        let mut state = game_state.write().await;
        state.remove_player(&player_id);
    }

    Ok(())
}
