//! # Match-3 Game Server Library
//!
//! Authoritative server for a two-player, turn-based tile-matching game played
//! over UDP. The server holds every match's board, validates swaps, resolves
//! cascades and broadcasts the resulting state to both players.
//!
//! ## Module Organization
//!
//! ### Cascade Module (`cascade`)
//! Repeats clear, special-tile spawn, gravity and refill passes until the
//! board holds no match, accumulating ten points per matched tile.
//!
//! ### Rules Module (`rules`)
//! Player id, bounds and adjacency checks, plus the rejection reasons logged
//! when a move is dropped.
//!
//! ### Session Module (`session`)
//! One match: player slots bound to endpoints, turn, scores, lifecycle flags
//! and per-player activity stamps.
//!
//! ### Session Manager Module (`session_manager`)
//! A fixed table of sessions behind one lock. Joins, moves, disconnects and
//! the idle watchdog all go through it.
//!
//! ### Network Module (`network`)
//! Binds the UDP socket, feeds datagrams to the session manager, drains its
//! outbound queue and runs the watchdog once a second.
//!
//! ## Protocol
//!
//! Clients send `CONNECT`, `DISCONNECT`, or a move as five integers
//! `player fromX fromY toX toY`. The server answers a join with
//! `PLAYER_ID:<n>` and otherwise sends fixed-size binary state records.
//! Rejected requests get no reply.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use match3_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new("0.0.0.0:8080").await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod cascade;
pub mod network;
pub mod rules;
pub mod session;
pub mod session_manager;
