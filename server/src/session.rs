//! One two-player match: slot binding, turn tracking, scores and idle timers.
//!
//! A session moves through `Empty -> WaitingForPlayer2 -> Active -> Over`, and
//! is reset to `Empty` in the same operation that marks it over, so `Over` is
//! only ever observed in the final broadcast.

use crate::cascade::{self, Resolution};
use crate::rules::{self, MoveRejection};
use log::{debug, info};
use match3_shared::{Board, PlayerMove, StatePacket};
use rand::Rng;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    WaitingForPlayer2,
    Active,
    Over,
}

/// Outcome of binding an endpoint to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Bound as the given player slot. `started` is true once both slots are filled.
    Joined { player_id: i32, started: bool },
    /// Session full, already started, or the endpoint is already player 1.
    Rejected,
}

/// Outcome of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Scored(Resolution),
    /// The swap produced no match and was undone.
    Reverted,
}

#[derive(Debug, Clone, Default)]
pub struct GameSession {
    pub game_id: i32,
    pub board: Board,
    pub current_turn: i32,
    pub player1_score: i32,
    pub player2_score: i32,
    pub started: bool,
    pub over: bool,
    pub player1_addr: Option<SocketAddr>,
    pub player2_addr: Option<SocketAddr>,
    pub last_activity: [Option<Instant>; 2],
}

impl GameSession {
    pub fn state(&self) -> SessionState {
        if self.over {
            SessionState::Over
        } else if self.started {
            SessionState::Active
        } else if self.game_id != 0 {
            SessionState::WaitingForPlayer2
        } else {
            SessionState::Empty
        }
    }

    /// Slot holds no session and can be allocated.
    pub fn is_free(&self) -> bool {
        self.game_id == 0
    }

    /// Allocated but still waiting for a second player.
    pub fn is_open(&self) -> bool {
        self.game_id != 0 && !self.started
    }

    pub fn is_active(&self) -> bool {
        self.started && !self.over
    }

    pub fn open(&mut self, game_id: i32) {
        *self = GameSession {
            game_id,
            ..GameSession::default()
        };
    }

    pub fn owns(&self, addr: SocketAddr) -> bool {
        self.player1_addr == Some(addr) || self.player2_addr == Some(addr)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = SocketAddr> {
        self.player1_addr.into_iter().chain(self.player2_addr)
    }

    /// Binds `addr` to the first open slot. Filling the second slot starts the
    /// game on a freshly generated board with player 0 to move.
    pub fn bind_player<R: Rng + ?Sized>(
        &mut self,
        addr: SocketAddr,
        rng: &mut R,
        now: Instant,
    ) -> JoinOutcome {
        if self.player1_addr.is_none() {
            self.player1_addr = Some(addr);
            return JoinOutcome::Joined {
                player_id: 0,
                started: false,
            };
        }

        if self.player2_addr.is_none() && self.player1_addr != Some(addr) {
            self.player2_addr = Some(addr);
            self.started = true;
            self.current_turn = 0;
            self.last_activity = [Some(now), Some(now)];
            self.board = Board::generate(rng);
            return JoinOutcome::Joined {
                player_id: 1,
                started: true,
            };
        }

        JoinOutcome::Rejected
    }

    /// Validates and applies one swap.
    ///
    /// The mover's activity stamp is refreshed once the move passes the player
    /// and bounds checks, even if it is then rejected for being out of turn.
    pub fn apply_move<R: Rng + ?Sized>(
        &mut self,
        mv: &PlayerMove,
        rng: &mut R,
        now: Instant,
    ) -> Result<MoveOutcome, MoveRejection> {
        if !self.is_active() {
            return Err(MoveRejection::NotActive);
        }
        if !rules::is_valid_player(mv.player_id) {
            return Err(MoveRejection::InvalidPlayer(mv.player_id));
        }
        if !rules::in_bounds(mv) {
            return Err(MoveRejection::OutOfBounds);
        }

        self.last_activity[mv.player_id as usize] = Some(now);

        if mv.player_id != self.current_turn {
            return Err(MoveRejection::NotYourTurn {
                expected: self.current_turn,
                got: mv.player_id,
            });
        }
        if !rules::is_legal(mv) {
            return Err(MoveRejection::NotAdjacent);
        }

        self.board.swap(mv.from, mv.to);
        debug!("Game {}: tiles swapped\n{}", self.game_id, self.board);

        let resolution = cascade::resolve(&mut self.board, rng);
        if !resolution.matched {
            self.board.swap(mv.from, mv.to);
            debug!("Game {}: no matches found, move reverted", self.game_id);
            return Ok(MoveOutcome::Reverted);
        }

        if mv.player_id == 0 {
            self.player1_score += resolution.score;
        } else {
            self.player2_score += resolution.score;
        }
        self.current_turn = (self.current_turn + 1) % 2;

        info!(
            "Game {}: player {} scored {} points in {} passes",
            self.game_id,
            mv.player_id + 1,
            resolution.score,
            resolution.passes
        );
        Ok(MoveOutcome::Scored(resolution))
    }

    /// First player slot whose idle time exceeds `timeout`, if the game is live.
    pub fn idle_player(&self, now: Instant, timeout: Duration) -> Option<usize> {
        if !self.is_active() {
            return None;
        }
        self.last_activity.iter().position(|stamp| {
            stamp
                .and_then(|at| now.checked_duration_since(at))
                .is_some_and(|idle| idle > timeout)
        })
    }

    pub fn to_packet(&self) -> StatePacket {
        StatePacket {
            game_id: self.game_id,
            board: self.board,
            current_turn: self.current_turn,
            player1_score: self.player1_score,
            player2_score: self.player2_score,
            game_started: self.started,
            game_over: self.over,
        }
    }

    pub fn reset(&mut self) {
        *self = GameSession::default();
    }
}
