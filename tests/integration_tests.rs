//! Integration tests for the match-3 server
//!
//! These tests run a real server on loopback and drive it with plain UDP sockets.

use match3_client::bot::find_matching_swap;
use match3_server::network::Server;
use match3_server::session_manager::SessionManager;
use match3_shared::{
    find_matches, Command, PlayerMove, ServerMessage, StatePacket, BUFLEN, STATE_PACKET_SIZE,
};
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

async fn start_server() -> (SocketAddr, Arc<SessionManager>) {
    let server = Server::new("127.0.0.1:0").await.expect("server binds");
    let addr = server.local_addr().expect("server has an address");
    let sessions = server.sessions();
    tokio::spawn(server.run());
    (addr, sessions)
}

fn player() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("client binds");
    socket
        .set_read_timeout(Some(REPLY_TIMEOUT))
        .expect("read timeout set");
    socket
}

fn send(socket: &UdpSocket, server: SocketAddr, command: Command) {
    socket
        .send_to(&command.to_bytes(), server)
        .expect("datagram sent");
}

fn recv_raw(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = [0u8; BUFLEN];
    let (len, _) = socket.recv_from(&mut buf).expect("reply from server");
    buf[..len].to_vec()
}

fn recv(socket: &UdpSocket) -> ServerMessage {
    ServerMessage::decode(&recv_raw(socket)).expect("decodable reply")
}

fn recv_state(socket: &UdpSocket) -> StatePacket {
    match recv(socket) {
        ServerMessage::State(state) => state,
        other => panic!("expected state broadcast, got {:?}", other),
    }
}

fn assert_silent(socket: &UdpSocket) {
    socket
        .set_read_timeout(Some(SILENCE_WINDOW))
        .expect("read timeout set");
    let mut buf = [0u8; BUFLEN];
    assert!(
        socket.recv_from(&mut buf).is_err(),
        "expected no datagram from the server"
    );
    socket
        .set_read_timeout(Some(REPLY_TIMEOUT))
        .expect("read timeout set");
}

/// Joins two players and consumes the identity replies and the opening broadcast.
fn start_game(server: SocketAddr) -> (UdpSocket, UdpSocket, StatePacket) {
    let a = player();
    let b = player();

    send(&a, server, Command::Connect);
    assert_eq!(recv(&a), ServerMessage::PlayerId(0));
    send(&b, server, Command::Connect);
    assert_eq!(recv(&b), ServerMessage::PlayerId(1));

    let state = recv_state(&a);
    assert_eq!(recv_state(&b), state);
    (a, b, state)
}

/// MATCHMAKING TESTS
mod matchmaking_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn join_sequence_broadcasts_identical_opening_state() {
        let (server, sessions) = start_server().await;
        let a = player();
        let b = player();

        send(&a, server, Command::Connect);
        assert_eq!(recv_raw(&a), b"PLAYER_ID:0".to_vec());

        send(&b, server, Command::Connect);
        assert_eq!(recv_raw(&b), b"PLAYER_ID:1".to_vec());

        let raw_a = recv_raw(&a);
        let raw_b = recv_raw(&b);
        assert_eq!(raw_a.len(), STATE_PACKET_SIZE);
        assert_eq!(raw_a, raw_b);

        let state = StatePacket::decode(&raw_a).expect("valid state");
        assert_eq!(state.game_id, 1);
        assert!(state.game_started);
        assert!(!state.game_over);
        assert_eq!(state.current_turn, 0);
        assert!(!state.board.has_empty());
        assert_eq!(sessions.active_sessions().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn third_player_is_not_bound_into_active_game() {
        let (server, sessions) = start_server().await;
        let (a, b, _) = start_game(server);
        let c = player();

        send(&c, server, Command::Connect);

        assert_eq!(recv(&c), ServerMessage::PlayerId(0));
        assert_silent(&a);
        assert_silent(&b);
        let game = sessions.snapshot(1).await.expect("game 1 still running");
        assert_eq!(game.player1_addr, a.local_addr().ok());
        assert_eq!(game.player2_addr, b.local_addr().ok());
        assert_eq!(sessions.active_sessions().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn repeated_connect_from_player_one_is_dropped() {
        let (server, sessions) = start_server().await;
        let a = player();

        send(&a, server, Command::Connect);
        assert_eq!(recv(&a), ServerMessage::PlayerId(0));
        send(&a, server, Command::Connect);

        assert_silent(&a);
        assert_eq!(sessions.active_sessions().await, 1);
    }
}

/// GAMEPLAY TESTS
mod gameplay_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn scoring_move_flips_turn_and_credits_mover() {
        let (server, _sessions) = start_server().await;
        let (a, b, opening) = start_game(server);

        let (from, to) =
            find_matching_swap(&opening.board).expect("opening board has a scoring swap");
        send(&a, server, Command::Move(PlayerMove::new(0, from, to)));

        let state = recv_state(&a);
        assert_eq!(recv_state(&b), state);
        assert_eq!(state.current_turn, 1);
        assert!(state.player1_score >= 30);
        assert_eq!(state.player1_score % 10, 0);
        assert_eq!(state.player2_score, 0);
        assert!(find_matches(&state.board).is_empty());
        assert!(!state.board.has_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_moves_get_no_reply() {
        let (server, _sessions) = start_server().await;
        let (a, b, _) = start_game(server);

        // Out of turn, not adjacent, out of bounds, malformed.
        b.send_to(b"1 0 0 1 0", server).expect("sent");
        a.send_to(b"0 0 0 2 0", server).expect("sent");
        a.send_to(b"0 7 7 8 7", server).expect("sent");
        a.send_to(b"0 1 two 3 4", server).expect("sent");

        assert_silent(&a);
        assert_silent(&b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn move_from_unknown_endpoint_is_ignored() {
        let (server, _sessions) = start_server().await;
        let (a, b, _) = start_game(server);
        let stranger = player();

        stranger.send_to(b"0 0 0 1 0", server).expect("sent");

        assert_silent(&stranger);
        assert_silent(&a);
        assert_silent(&b);
    }
}

/// LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn disconnect_ends_game_for_both_players() {
        let (server, sessions) = start_server().await;
        let (a, b, opening) = start_game(server);

        send(&b, server, Command::Disconnect);

        let final_a = recv_state(&a);
        let final_b = recv_state(&b);
        assert_eq!(final_a, final_b);
        assert!(final_a.game_over);
        assert_eq!(final_a.game_id, opening.game_id);
        assert_eq!(sessions.active_sessions().await, 0);

        // The freed endpoint can start over under a new id.
        send(&a, server, Command::Connect);
        assert_eq!(recv(&a), ServerMessage::PlayerId(0));
        assert!(sessions.snapshot(2).await.is_some());
    }
}
