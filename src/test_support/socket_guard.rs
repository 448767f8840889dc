//! Mock server startup for tests that need a loopback socket.
//!
//! Shared by unit tests and the `tests/` integration crates. Where loopback
//! binding is unavailable the caller gets `None` and skips, unless
//! `NEWSFEED_REQUIRE_SOCKET_TESTS` is set.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKETS_ENV: &str = "NEWSFEED_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` when loopback sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }

    let test = std::thread::current()
        .name()
        .unwrap_or("unnamed test")
        .to_owned();
    assert!(
        !sockets_required(),
        "{test}: cannot bind a localhost socket and {REQUIRE_SOCKETS_ENV} is set"
    );
    eprintln!("{test}: cannot bind a localhost socket, skipping");
    None
}
