//! Fixed-capacity session table shared by the receive path and the idle watchdog.
//!
//! Every operation takes the table lock for its whole duration, including
//! queueing the outbound datagrams it produces, so broadcasts leave in the
//! same order the operations were serialized.

use crate::session::{GameSession, JoinOutcome, MoveOutcome};
use log::{debug, error, info, warn};
use match3_shared::{Command, PlayerMove, ServerMessage, GAME_TIMEOUT, MAX_GAMES};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};

/// A datagram waiting to be written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub payload: Vec<u8>,
}

struct SessionTable {
    games: Vec<GameSession>,
    next_game_id: i32,
    game_count: usize,
    rng: StdRng,
}

impl SessionTable {
    fn owner_of(&self, addr: SocketAddr) -> Option<usize> {
        self.games.iter().position(|g| g.owns(addr))
    }

    /// Prefers a session waiting for its second player, else claims a free slot.
    fn open_slot(&mut self) -> Option<usize> {
        if let Some(index) = self.games.iter().position(GameSession::is_open) {
            debug!("Found existing game {}", self.games[index].game_id);
            return Some(index);
        }

        let index = self.games.iter().position(GameSession::is_free)?;
        let game_id = self.next_game_id;
        let Some(next_game_id) = game_id.checked_add(1) else {
            warn!("Game ids exhausted, refusing to open game {}", game_id);
            return None;
        };
        self.next_game_id = next_game_id;
        self.game_count += 1;
        self.games[index].open(game_id);
        info!("Created new game {}", game_id);
        Some(index)
    }
}

pub struct SessionManager {
    table: Mutex<SessionTable>,
    outbox: mpsc::UnboundedSender<Outbound>,
}

impl SessionManager {
    pub fn new(outbox: mpsc::UnboundedSender<Outbound>) -> Self {
        Self::with_rng(MAX_GAMES, StdRng::from_entropy(), outbox)
    }

    pub fn with_rng(
        capacity: usize,
        rng: StdRng,
        outbox: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            table: Mutex::new(SessionTable {
                games: vec![GameSession::default(); capacity],
                next_game_id: 1,
                game_count: 0,
                rng,
            }),
            outbox,
        }
    }

    /// Routes one inbound datagram. Unparseable payloads are dropped.
    pub async fn dispatch(&self, addr: SocketAddr, payload: &[u8]) {
        match Command::parse(payload) {
            Ok(Command::Connect) => self.join(addr).await,
            Ok(Command::Disconnect) => self.disconnect(addr).await,
            Ok(Command::Move(mv)) => self.make_move(addr, mv).await,
            Err(e) => warn!("Dropping message from {}: {}", addr, e),
        }
    }

    pub async fn join(&self, addr: SocketAddr) {
        let mut table = self.table.lock().await;
        info!("Attempting to join game for player at {}", addr);

        let Some(index) = table.open_slot() else {
            warn!("Max games reached, dropping join from {}", addr);
            return;
        };

        let now = Instant::now();
        let SessionTable { games, rng, .. } = &mut *table;
        let game = &mut games[index];

        match game.bind_player(addr, rng, now) {
            JoinOutcome::Joined { player_id, started } => {
                self.send(addr, &ServerMessage::PlayerId(player_id));
                if started {
                    info!("Player 2 connected to game {}. Game started!", game.game_id);
                    self.broadcast(game);
                } else {
                    info!("Player 1 connected to game {}", game.game_id);
                }
            }
            JoinOutcome::Rejected => {
                warn!(
                    "Unable to join game {}. Game full or already started.",
                    game.game_id
                );
            }
        }
    }

    pub async fn make_move(&self, addr: SocketAddr, mv: PlayerMove) {
        let mut table = self.table.lock().await;

        let Some(index) = table.owner_of(addr) else {
            debug!("Move from {} does not belong to any game", addr);
            return;
        };

        let now = Instant::now();
        let SessionTable { games, rng, .. } = &mut *table;
        let game = &mut games[index];

        match game.apply_move(&mv, rng, now) {
            Ok(MoveOutcome::Scored(_)) | Ok(MoveOutcome::Reverted) => self.broadcast(game),
            Err(rejection) => warn!(
                "Game {}: rejected move {:?} from {}: {}",
                game.game_id, mv, addr, rejection
            ),
        }
    }

    pub async fn disconnect(&self, addr: SocketAddr) {
        let mut table = self.table.lock().await;

        let Some(index) = table.owner_of(addr) else {
            debug!("Disconnect from unknown endpoint {}", addr);
            return;
        };

        info!(
            "Player disconnected from game {}. Game reset.",
            table.games[index].game_id
        );
        self.end_game(&mut table, index);
    }

    /// One watchdog sweep using the current time.
    pub async fn tick(&self) -> usize {
        self.tick_at(Instant::now()).await
    }

    /// Ends every live game with a player idle longer than [`GAME_TIMEOUT`] at
    /// `now`. Returns the number of games ended.
    pub async fn tick_at(&self, now: Instant) -> usize {
        let mut table = self.table.lock().await;
        let mut evicted = 0;

        for index in 0..table.games.len() {
            if let Some(player) = table.games[index].idle_player(now, GAME_TIMEOUT) {
                info!(
                    "Player {} timed out in game {}",
                    player + 1,
                    table.games[index].game_id
                );
                self.end_game(&mut table, index);
                evicted += 1;
            }
        }

        evicted
    }

    /// Number of allocated slots, waiting or active.
    pub async fn active_sessions(&self) -> usize {
        self.table.lock().await.game_count
    }

    pub async fn snapshot(&self, game_id: i32) -> Option<GameSession> {
        if game_id == 0 {
            return None;
        }
        let table = self.table.lock().await;
        table.games.iter().find(|g| g.game_id == game_id).cloned()
    }

    /// Broadcasts the game-over state, then frees the slot.
    fn end_game(&self, table: &mut SessionTable, index: usize) {
        let game = &mut table.games[index];
        game.over = true;
        self.broadcast(game);
        game.reset();
        table.game_count = table.game_count.saturating_sub(1);
    }

    fn broadcast(&self, game: &GameSession) {
        let payload = match game.to_packet().encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Error serializing game {}: {}", game.game_id, e);
                return;
            }
        };

        for addr in game.endpoints() {
            self.queue(Outbound {
                addr,
                payload: payload.clone(),
            });
        }
    }

    fn send(&self, addr: SocketAddr, message: &ServerMessage) {
        match message.encode() {
            Ok(payload) => self.queue(Outbound { addr, payload }),
            Err(e) => error!("Error encoding message for {}: {}", addr, e),
        }
    }

    fn queue(&self, outbound: Outbound) {
        let addr = outbound.addr;
        if let Err(e) = self.outbox.send(outbound) {
            error!("Failed to queue datagram for {}: {}", addr, e);
        }
    }
}
