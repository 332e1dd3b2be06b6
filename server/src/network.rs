//! Server network layer handling UDP communications and game loop coordination

use crate::client_manager::ClientManager;
use crate::config::WorldConfig;
use crate::game::GameState;
use crate::observer::{Notification, Outbox};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{ConnectionId, Packet, PROTOCOL_VERSION, TICK_MILLIS};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How often idle clients are swept: twice per timeout, between 10ms and 1s.
fn timeout_check_period(client_timeout: Duration) -> Duration {
    (client_timeout / 2).clamp(Duration::from_millis(10), Duration::from_secs(1))
}

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: ConnectionId,
    },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
    },
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub tick_duration: Duration,
    pub max_clients: usize,
    pub client_timeout: Duration,
    pub world: WorldConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_millis(TICK_MILLIS),
            max_clients: 64,
            client_timeout: Duration::from_secs(5),
            world: WorldConfig::default(),
        }
    }
}

/// Lets another task stop a running server.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Shutdown requested but server loop already stopped");
        }
    }
}

/// Main server coordinating networking and game simulation
///
/// Packet handling and ticks both run inside the `select!` loop of
/// [`Server::run`], so registry mutations never overlap a tick.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState<Outbox>,
    tick_duration: Duration,
    client_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(addr: &str, settings: ServerSettings) -> Result<Self, BoxError> {
        settings.world.validate_for(settings.max_clients)?;

        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                settings.max_clients,
                settings.client_timeout,
            ))),
            game_state: GameState::new(settings.world, Outbox::new()),
            tick_duration: settings.tick_duration,
            client_timeout: settings.client_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        let data = match serialize(&packet) {
                            Ok(data) => data,
                            Err(e) => {
                                error!("Failed to serialize broadcast: {}", e);
                                continue;
                            }
                        };

                        for (client_id, addr) in client_addrs {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                warn!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let period = timeout_check_period(self.client_timeout);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), BoxError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Hands everything the game emitted since the last flush to the sender task.
    async fn flush_notifications(&mut self) {
        let notifications = self.game_state.observer_mut().drain();
        if notifications.is_empty() {
            return;
        }

        let clients = self.clients.read().await;
        for notification in notifications {
            match notification {
                Notification::One { id, packet } => match clients.get_addr(id) {
                    Some(addr) => self.send_packet(packet, addr),
                    None => debug!("Dropping packet for departed client {}", id),
                },
                Notification::All { packet } => self.broadcast_packet(packet),
            }
        }
    }

    /// Processes incoming packets and updates game state
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    let response = Packet::Rejected {
                        reason: "Protocol version mismatch".to_string(),
                    };
                    self.send_packet(response, addr);
                    return;
                }

                // Remove existing connection if present
                let existing_client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(existing_id) = existing_client_id {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.game_state.disconnect(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match client_id {
                    Some(client_id) => self.send_packet(Packet::Connected { client_id }, addr),
                    None => {
                        let response = Packet::Rejected {
                            reason: "Server full".to_string(),
                        };
                        self.send_packet(response, addr);
                    }
                }
            }

            Packet::Join { name } => {
                let client_id = self.clients.write().await.touch(addr);
                match client_id {
                    Some(client_id) => {
                        self.game_state.join(client_id, name.as_deref());
                    }
                    None => warn!("Join from unconnected address {}", addr),
                }
            }

            Packet::Move { x, y } => {
                let client_id = self.clients.write().await.touch(addr);
                if let Some(client_id) = client_id {
                    self.game_state.move_player(client_id, x, y);
                }
            }

            Packet::Heartbeat => {
                self.clients.write().await.touch(addr);
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    self.clients.write().await.remove_client(&client_id);
                    self.game_state.disconnect(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }

        self.flush_notifications().await;
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Server started successfully ({}ms tick)",
            self.tick_duration.as_millis()
        );

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.game_state.disconnect(client_id);
                            self.flush_notifications().await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let report = self.game_state.tick();
                    self.flush_notifications().await;

                    if report.food_eaten > 0 || !report.deaths.is_empty() {
                        debug!("Tick {}: {:?}", self.game_state.tick, report);
                    }

                    // Periodic status line
                    if self.game_state.tick % 300 == 0 {
                        let client_count = self.clients.read().await.len();
                        if client_count > 0 {
                            debug!(
                                "Tick {}: {} clients, {} players",
                                self.game_state.tick,
                                client_count,
                                self.game_state.player_count()
                            );
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
