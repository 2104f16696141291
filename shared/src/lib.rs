//! Protocol types and board logic shared by the match-3 server and client.
//!
//! The server owns the authoritative board; the client links the same board
//! and match engine so a bot can look for scoring swaps before sending them.

pub mod board;
pub mod matching;

pub use board::Board;
pub use matching::{find_matches, swap_creates_match, Direction, Match};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
/// Largest datagram the server reads in one receive.
pub const BUFLEN: usize = 512;
pub const BOARD_SIZE: usize = 8;
pub const MIN_MATCH: usize = 3;
pub const POINTS_PER_TILE: i32 = 10;
pub const GAME_TIMEOUT: Duration = Duration::from_secs(30);
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_GAMES: usize = 100;

/// Encoded size of a [`StatePacket`]: id, 64 tile codes, turn, two scores, two flags.
pub const STATE_PACKET_SIZE: usize = 4 + BOARD_SIZE * BOARD_SIZE * 4 + 4 + 4 + 4 + 1 + 1;

pub const CONNECT_COMMAND: &str = "CONNECT";
pub const DISCONNECT_COMMAND: &str = "DISCONNECT";
pub const PLAYER_ID_PREFIX: &str = "PLAYER_ID:";

/// A single board cell. The discriminants are the wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum Tile {
    #[default]
    Empty = 0,
    Red = 1,
    Blue = 2,
    Green = 3,
    Yellow = 4,
    Purple = 5,
    Special = 6,
}

impl Tile {
    /// Tiles drawn when generating or refilling a board.
    pub const COLORS: [Tile; 5] = [Tile::Red, Tile::Blue, Tile::Green, Tile::Yellow, Tile::Purple];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Tile> {
        match code {
            0 => Some(Tile::Empty),
            1 => Some(Tile::Red),
            2 => Some(Tile::Blue),
            3 => Some(Tile::Green),
            4 => Some(Tile::Yellow),
            5 => Some(Tile::Purple),
            6 => Some(Tile::Special),
            _ => None,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Tile::Empty
    }

    /// Single-letter glyph used in board dumps.
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Red => 'R',
            Tile::Blue => 'B',
            Tile::Green => 'G',
            Tile::Yellow => 'Y',
            Tile::Purple => 'P',
            Tile::Special => 'S',
        }
    }
}

/// Column/row coordinate. Signed because move coordinates arrive unchecked off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        (0..BOARD_SIZE as i32).contains(&self.x) && (0..BOARD_SIZE as i32).contains(&self.y)
    }

    /// True when exactly one axis differs, and by exactly one.
    pub fn is_adjacent(&self, other: &Point) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        (dx == 1 && dy == 0) || (dx == 0 && dy == 1)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A swap request as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMove {
    pub player_id: i32,
    pub from: Point,
    pub to: Point,
}

impl PlayerMove {
    pub fn new(player_id: i32, from: Point, to: Point) -> Self {
        Self { player_id, from, to }
    }
}

/// Formats the move in the inbound text grammar: `player fromX fromY toX toY`.
impl fmt::Display for PlayerMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.player_id, self.from.x, self.from.y, self.to.x, self.to.y
        )
    }
}

/// Reasons a datagram could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    NotUtf8,
    MissingField { expected: usize, found: usize },
    InvalidInteger(String),
    InvalidPlayerId(String),
    BadStateLength(usize),
    Decode(String),
    Encode(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::NotUtf8 => write!(f, "payload is not valid UTF-8"),
            ProtocolError::MissingField { expected, found } => {
                write!(f, "expected {} integers, found {}", expected, found)
            }
            ProtocolError::InvalidInteger(token) => write!(f, "invalid integer {:?}", token),
            ProtocolError::InvalidPlayerId(text) => write!(f, "invalid player id reply {:?}", text),
            ProtocolError::BadStateLength(len) => write!(
                f,
                "state packet is {} bytes, expected {}",
                len, STATE_PACKET_SIZE
            ),
            ProtocolError::Decode(e) => write!(f, "failed to decode state: {}", e),
            ProtocolError::Encode(e) => write!(f, "failed to encode state: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Client-to-server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Move(PlayerMove),
}

impl Command {
    pub fn parse(payload: &[u8]) -> Result<Command, ProtocolError> {
        std::str::from_utf8(payload)
            .map_err(|_| ProtocolError::NotUtf8)?
            .parse()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            CONNECT_COMMAND => return Ok(Command::Connect),
            DISCONNECT_COMMAND => return Ok(Command::Disconnect),
            _ => {}
        }

        // Anything past the fifth integer is ignored.
        let mut fields = [0i32; 5];
        let mut tokens = text.split_whitespace();
        for (found, field) in fields.iter_mut().enumerate() {
            let token = tokens
                .next()
                .ok_or(ProtocolError::MissingField { expected: 5, found })?;
            *field = token
                .parse()
                .map_err(|_| ProtocolError::InvalidInteger(token.to_string()))?;
        }

        let [player_id, from_x, from_y, to_x, to_y] = fields;
        Ok(Command::Move(PlayerMove::new(
            player_id,
            Point::new(from_x, from_y),
            Point::new(to_x, to_y),
        )))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect => f.write_str(CONNECT_COMMAND),
            Command::Disconnect => f.write_str(DISCONNECT_COMMAND),
            Command::Move(mv) => write!(f, "{}", mv),
        }
    }
}

/// Fixed-layout snapshot of one session, broadcast to both players.
///
/// Encoded with bincode's default options, which yields the little-endian
/// field-by-field layout clients decode: game id, board cells row-major,
/// current turn, both scores, then the started and over flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePacket {
    pub game_id: i32,
    pub board: Board,
    pub current_turn: i32,
    pub player1_score: i32,
    pub player2_score: i32,
    pub game_started: bool,
    pub game_over: bool,
}

impl StatePacket {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<StatePacket, ProtocolError> {
        if bytes.len() != STATE_PACKET_SIZE {
            return Err(ProtocolError::BadStateLength(bytes.len()));
        }
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    PlayerId(i32),
    State(StatePacket),
}

impl ServerMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            ServerMessage::PlayerId(id) => Ok(format!("{}{}", PLAYER_ID_PREFIX, id).into_bytes()),
            ServerMessage::State(state) => state.encode(),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<ServerMessage, ProtocolError> {
        if let Some(rest) = bytes.strip_prefix(PLAYER_ID_PREFIX.as_bytes()) {
            let text = std::str::from_utf8(rest).map_err(|_| ProtocolError::NotUtf8)?;
            return text
                .trim()
                .parse()
                .map(ServerMessage::PlayerId)
                .map_err(|_| ProtocolError::InvalidPlayerId(text.to_string()));
        }
        StatePacket::decode(bytes).map(ServerMessage::State)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn sample_state() -> StatePacket {
        let mut board = Board::default();
        board.set(Point::new(0, 0), Tile::Red);
        board.set(Point::new(7, 0), Tile::Special);
        board.set(Point::new(0, 1), Tile::Purple);
        StatePacket {
            game_id: 7,
            board,
            current_turn: 1,
            player1_score: 30,
            player2_score: -2,
            game_started: true,
            game_over: false,
        }
    }

    #[test]
    fn test_tile_codes_are_stable() {
        assert_eq!(Tile::Empty.code(), 0);
        assert_eq!(Tile::Red.code(), 1);
        assert_eq!(Tile::Purple.code(), 5);
        assert_eq!(Tile::Special.code(), 6);
        for code in 0..7 {
            assert_eq!(Tile::from_code(code).map(Tile::code), Some(code));
        }
        assert_eq!(Tile::from_code(7), None);
        assert!(!Tile::COLORS.contains(&Tile::Empty));
        assert!(!Tile::COLORS.contains(&Tile::Special));
    }

    #[test]
    fn test_point_adjacency() {
        let p = Point::new(3, 3);
        assert!(p.is_adjacent(&Point::new(4, 3)));
        assert!(p.is_adjacent(&Point::new(3, 2)));
        assert!(!p.is_adjacent(&Point::new(4, 4)));
        assert!(!p.is_adjacent(&Point::new(5, 3)));
        assert!(!p.is_adjacent(&p));
    }

    #[test]
    fn test_point_bounds() {
        assert!(Point::new(0, 0).in_bounds());
        assert!(Point::new(7, 7).in_bounds());
        assert!(!Point::new(8, 0).in_bounds());
        assert!(!Point::new(0, -1).in_bounds());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(assert_ok!(Command::parse(b"CONNECT")), Command::Connect);
        assert_eq!(assert_ok!(Command::parse(b"DISCONNECT")), Command::Disconnect);

        let parsed = assert_ok!(Command::parse(b"1 2 3 2 4"));
        assert_eq!(
            parsed,
            Command::Move(PlayerMove::new(1, Point::new(2, 3), Point::new(2, 4)))
        );
    }

    #[test]
    fn test_parse_move_tolerates_extra_whitespace_and_trailing_tokens() {
        let parsed = assert_ok!("  0\t1 1\n 2 1 trailing".parse::<Command>());
        assert_eq!(
            parsed,
            Command::Move(PlayerMove::new(0, Point::new(1, 1), Point::new(2, 1)))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_moves() {
        assert_eq!(
            assert_err!(Command::parse(b"0 1 2")),
            ProtocolError::MissingField {
                expected: 5,
                found: 3
            }
        );
        assert_eq!(
            assert_err!(Command::parse(b"0 1 x 2 3")),
            ProtocolError::InvalidInteger("x".to_string())
        );
        assert_err!(Command::parse(b"connect"));
        assert_err!(Command::parse(b""));
        assert_eq!(assert_err!(Command::parse(&[0xff, 0xfe])), ProtocolError::NotUtf8);
    }

    #[test]
    fn test_move_text_matches_grammar() {
        let mv = PlayerMove::new(0, Point::new(1, 2), Point::new(1, 3));
        assert_eq!(Command::Move(mv).to_string(), "0 1 2 1 3");
        assert_eq!(Command::Connect.to_bytes(), b"CONNECT".to_vec());
    }

    #[test]
    fn test_state_packet_layout() {
        let state = sample_state();
        let bytes = assert_ok!(state.encode());

        assert_eq!(bytes.len(), STATE_PACKET_SIZE);
        assert_eq!(STATE_PACKET_SIZE, 274);
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        // First cell, last cell of row 0, first cell of row 1.
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
        assert_eq!(&bytes[4 + 7 * 4..4 + 8 * 4], &6i32.to_le_bytes());
        assert_eq!(&bytes[4 + 8 * 4..4 + 9 * 4], &5i32.to_le_bytes());
        let tail = 4 + 64 * 4;
        assert_eq!(&bytes[tail..tail + 4], &1i32.to_le_bytes());
        assert_eq!(&bytes[tail + 4..tail + 8], &30i32.to_le_bytes());
        assert_eq!(&bytes[tail + 8..tail + 12], &(-2i32).to_le_bytes());
        assert_eq!(bytes[tail + 12], 1);
        assert_eq!(bytes[tail + 13], 0);

        assert_eq!(assert_ok!(StatePacket::decode(&bytes)), state);
    }

    #[test]
    fn test_state_packet_rejects_wrong_length() {
        let mut bytes = assert_ok!(sample_state().encode());
        bytes.push(0);
        assert_eq!(
            assert_err!(StatePacket::decode(&bytes)),
            ProtocolError::BadStateLength(STATE_PACKET_SIZE + 1)
        );
    }

    #[test]
    fn test_state_packet_rejects_unknown_tile_code() {
        let mut bytes = assert_ok!(sample_state().encode());
        bytes[4..8].copy_from_slice(&9i32.to_le_bytes());
        assert_err!(StatePacket::decode(&bytes));
    }

    #[test]
    fn test_server_message_player_id() {
        let bytes = assert_ok!(ServerMessage::PlayerId(1).encode());
        assert_eq!(bytes, b"PLAYER_ID:1".to_vec());
        assert_eq!(assert_ok!(ServerMessage::decode(&bytes)), ServerMessage::PlayerId(1));
        assert_err!(ServerMessage::decode(b"PLAYER_ID:x"));
    }

    #[test]
    fn test_server_message_state() {
        let state = sample_state();
        let bytes = assert_ok!(ServerMessage::State(state.clone()).encode());
        assert_eq!(assert_ok!(ServerMessage::decode(&bytes)), ServerMessage::State(state));
    }
}
