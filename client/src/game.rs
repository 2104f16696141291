use log::{info, warn};
use match3_shared::{ServerMessage, StatePacket};

/// What changed after applying one server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Assigned(i32),
    Updated,
    GameOver {
        player1_score: i32,
        player2_score: i32,
    },
    /// A state record arrived for a different game than the last one seen.
    Ignored,
}

/// Client-side view of the match, rebuilt from server broadcasts.
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    pub player_id: Option<i32>,
    pub current: Option<StatePacket>,
    pub previous: Option<StatePacket>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, message: ServerMessage) -> ClientEvent {
        match message {
            ServerMessage::PlayerId(id) => {
                info!("Assigned player id {}", id);
                self.player_id = Some(id);
                ClientEvent::Assigned(id)
            }
            ServerMessage::State(state) => {
                if let Some(current) = &self.current {
                    if current.game_id != state.game_id && !current.game_over {
                        warn!(
                            "State for game {} while in game {}",
                            state.game_id, current.game_id
                        );
                        return ClientEvent::Ignored;
                    }
                }

                let event = if state.game_over {
                    ClientEvent::GameOver {
                        player1_score: state.player1_score,
                        player2_score: state.player2_score,
                    }
                } else {
                    ClientEvent::Updated
                };
                self.previous = self.current.replace(state);
                event
            }
        }
    }

    pub fn is_my_turn(&self) -> bool {
        match (&self.current, self.player_id) {
            (Some(state), Some(id)) => {
                state.game_started && !state.game_over && state.current_turn == id
            }
            _ => false,
        }
    }

    pub fn my_score(&self) -> Option<i32> {
        let state = self.current.as_ref()?;
        match self.player_id? {
            0 => Some(state.player1_score),
            _ => Some(state.player2_score),
        }
    }
}
