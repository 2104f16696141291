//! # Match-3 Bot Client Library
//!
//! A headless client for the match-3 server. It speaks the text command
//! protocol, decodes the binary state broadcasts and plays its turns with a
//! simple search for a swap that scores.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Tracks the assigned player id and the latest state record, and reports
//! turn changes and game over.
//!
//! ### Bot Module (`bot`)
//! Finds the first adjacent swap that completes a run, using the same match
//! engine the server runs.
//!
//! ### Network Module (`network`)
//! Owns the UDP socket: connect, move and disconnect commands, and the loop
//! that waits for our turn and answers it.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use match3_client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:8080", 500, 20).await?;
//!     client.run().await
//! }
//! ```

pub mod bot;
pub mod game;
pub mod network;
