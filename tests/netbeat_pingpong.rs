// tests/netbeat_pingpong.rs

//! End-to-end netbeat exchange over a real loopback socket: ping and pong
//! sides both forward alive-pings into a real heartbeat pipe.

use std::time::Duration;

use procwatch::heartbeat::{HeartbeatChannel, HeartbeatSource, TokenKind};
use procwatch::netbeat::{serve, NetbeatClient};
use procwatch_test_utils::{init_tracing, with_timeout};
use tokio::net::TcpListener;

#[tokio::test]
async fn ping_pong_forwards_alive_tokens_into_the_channel() {
    init_tracing();
    let mut channel = HeartbeatChannel::create().unwrap();
    let beat = channel.sender();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve(listener, Some(beat.clone())));

    let client = NetbeatClient::new(addr, Some(beat))
        .with_interval(Duration::from_millis(10))
        .with_backoff(Duration::from_millis(10));
    let pinger = tokio::spawn(client.run());

    // Both sides run in this process, so every forwarded token carries our
    // own pid.
    let own_pid = std::process::id() as i32;
    with_timeout(async {
        loop {
            match channel.try_recv().unwrap() {
                Some(token) => {
                    assert_eq!(token.kind(), Some(TokenKind::Alive(own_pid)));
                    break;
                }
                None => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
    })
    .await;

    pinger.abort();
    server.abort();
}
