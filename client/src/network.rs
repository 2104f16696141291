use crate::bot::find_matching_swap;
use crate::game::{ClientEvent, ClientGameState};
use log::{debug, error, info, warn};
use match3_shared::{Board, Command, PlayerMove, ServerMessage, BUFLEN};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    connected: bool,

    game_state: ClientGameState,

    think: Duration,
    max_moves: u32,
    moves_sent: u32,
    /// Board we last sent a move for; a rebroadcast of it is not a new turn.
    answered: Option<Board>,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        think_ms: u64,
        max_moves: u32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            connected: false,
            game_state: ClientGameState::new(),
            think: Duration::from_millis(think_ms),
            max_moves,
            moves_sent: 0,
            answered: None,
        })
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    async fn send_command(&self, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
        self.socket
            .send_to(&command.to_bytes(), self.server_addr)
            .await?;
        Ok(())
    }

    pub async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_addr);
        self.send_command(&Command::Connect).await
    }

    pub async fn disconnect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.connected {
            self.send_command(&Command::Disconnect).await?;
            self.connected = false;
        }
        Ok(())
    }

    pub async fn send_move(&mut self, mv: PlayerMove) -> Result<(), Box<dyn std::error::Error>> {
        debug!("Sending move {}", mv);
        self.send_command(&Command::Move(mv)).await?;
        self.moves_sent += 1;
        Ok(())
    }

    /// Handles one datagram. Returns false once the game is over.
    fn handle_datagram(&mut self, payload: &[u8]) -> bool {
        let message = match ServerMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Undecodable message from server: {}", e);
                return true;
            }
        };

        match self.game_state.apply(message) {
            ClientEvent::Assigned(_) => {
                self.connected = true;
                true
            }
            ClientEvent::Updated => {
                if let Some(state) = &self.game_state.current {
                    debug!(
                        "Game {} turn {} scores {}-{}\n{}",
                        state.game_id,
                        state.current_turn,
                        state.player1_score,
                        state.player2_score,
                        state.board
                    );
                }
                true
            }
            ClientEvent::GameOver {
                player1_score,
                player2_score,
            } => {
                info!(
                    "Game Over! Player 1 Score: {}, Player 2 Score: {}",
                    player1_score, player2_score
                );
                self.connected = false;
                false
            }
            ClientEvent::Ignored => true,
        }
    }

    /// Picks the next move if it is our turn and we have not answered this board yet.
    fn next_move(&mut self) -> Option<PlayerMove> {
        if !self.game_state.is_my_turn() {
            return None;
        }
        let state = self.game_state.current.as_ref()?;
        let player_id = self.game_state.player_id?;
        if self.answered == Some(state.board) {
            return None;
        }
        self.answered = Some(state.board);

        match find_matching_swap(&state.board) {
            Some((from, to)) => Some(PlayerMove::new(player_id, from, to)),
            None => {
                warn!("No scoring swap available on this board");
                None
            }
        }
    }

    /// Connects, plays until the move budget is spent or the game ends, then disconnects.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut turn_interval = interval(Duration::from_millis(50));
        let mut buffer = [0u8; BUFLEN];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if !self.handle_datagram(&buffer[..len]) {
                                break;
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = turn_interval.tick() => {
                    if self.moves_sent >= self.max_moves {
                        info!("Played {} moves, leaving", self.moves_sent);
                        break;
                    }
                    if let Some(mv) = self.next_move() {
                        sleep(self.think).await;
                        if let Err(e) = self.send_move(mv).await {
                            error!("Error sending move: {}", e);
                        }
                    }
                },
            }
        }

        if let Some(score) = self.game_state.my_score() {
            info!("Final score: {}", score);
        }
        self.disconnect().await
    }
}
