// src/netbeat.rs

//! Experimental loopback-TCP heartbeat carrier: a ping/pong client-server
//! pair exchanging `{pid, unix_secs}` frames on a fixed interval.
//!
//! This demonstrates an alternative carrier for liveness tokens. The
//! supervisor core is transport-agnostic and never depends on this module;
//! each side just forwards an alive-ping for its own pid into a
//! [`HeartbeatSender`] after every successful exchange.

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::heartbeat::HeartbeatSender;

/// `i32` pid + `i64` seconds, both big-endian.
pub const FRAME_WIRE_SIZE: usize = 12;

/// One ping or pong message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub pid: i32,
    pub unix_secs: i64,
}

impl Frame {
    pub fn now(pid: i32) -> Self {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self { pid, unix_secs }
    }

    pub fn to_bytes(self) -> [u8; FRAME_WIRE_SIZE] {
        let mut buf = [0u8; FRAME_WIRE_SIZE];
        buf[..4].copy_from_slice(&self.pid.to_be_bytes());
        buf[4..].copy_from_slice(&self.unix_secs.to_be_bytes());
        buf
    }

    pub fn from_bytes(buf: [u8; FRAME_WIRE_SIZE]) -> Self {
        let mut pid = [0u8; 4];
        let mut secs = [0u8; 8];
        pid.copy_from_slice(&buf[..4]);
        secs.copy_from_slice(&buf[4..]);
        Self {
            pid: i32::from_be_bytes(pid),
            unix_secs: i64::from_be_bytes(secs),
        }
    }
}

async fn read_frame(stream: &mut TcpStream) -> io::Result<Frame> {
    let mut buf = [0u8; FRAME_WIRE_SIZE];
    stream.read_exact(&mut buf).await?;
    Ok(Frame::from_bytes(buf))
}

async fn write_frame(stream: &mut TcpStream, frame: Frame) -> io::Result<()> {
    stream.write_all(&frame.to_bytes()).await
}

/// Accept loop for the pong side. Runs until the listener fails or the task
/// is dropped.
pub async fn serve(listener: TcpListener, beat: Option<HeartbeatSender>) -> io::Result<()> {
    let own_pid = std::process::id() as i32;
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "heartbeat peer connected");
        let beat = beat.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_conn(stream, own_pid, beat).await {
                debug!(error = %err, "peer connection closed");
            }
        });
    }
}

async fn serve_conn(
    mut stream: TcpStream,
    own_pid: i32,
    beat: Option<HeartbeatSender>,
) -> io::Result<()> {
    loop {
        let ping = read_frame(&mut stream).await?;
        debug!(pid = ping.pid, "ping received");
        if let Some(beat) = &beat {
            let _ = beat.alive(own_pid);
        }
        write_frame(&mut stream, Frame::now(own_pid)).await?;
    }
}

/// The ping side: connects to a loopback pong server, exchanges one frame
/// per interval, reconnects with a backoff when the peer goes away.
#[derive(Debug)]
pub struct NetbeatClient {
    addr: SocketAddr,
    interval: Duration,
    reconnect_backoff: Duration,
    beat: Option<HeartbeatSender>,
}

impl NetbeatClient {
    pub fn new(addr: SocketAddr, beat: Option<HeartbeatSender>) -> Self {
        Self {
            addr,
            interval: Duration::from_secs(10),
            reconnect_backoff: Duration::from_secs(2),
            beat,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Ping forever; only returns if the surrounding task is cancelled.
    pub async fn run(self) -> io::Result<()> {
        let pid = std::process::id() as i32;
        loop {
            let mut stream = match TcpStream::connect(self.addr).await {
                Ok(s) => s,
                Err(err) => {
                    debug!(error = %err, "connect failed, retrying");
                    tokio::time::sleep(self.reconnect_backoff).await;
                    continue;
                }
            };
            info!(addr = %self.addr, "connected to heartbeat peer");

            if let Err(err) = self.exchange(&mut stream, pid).await {
                debug!(error = %err, "connection lost, reconnecting");
            }
            tokio::time::sleep(self.reconnect_backoff).await;
        }
    }

    async fn exchange(&self, stream: &mut TcpStream, pid: i32) -> io::Result<()> {
        loop {
            write_frame(stream, Frame::now(pid)).await?;
            let pong = read_frame(stream).await?;
            debug!(peer_pid = pong.pid, "pong received");
            if let Some(beat) = &self.beat {
                let _ = beat.alive(pid);
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_wire_roundtrip() {
        let frame = Frame {
            pid: 4321,
            unix_secs: 1_700_000_000,
        };
        assert_eq!(Frame::from_bytes(frame.to_bytes()), frame);
    }

    #[test]
    fn frame_is_big_endian_on_the_wire() {
        let frame = Frame {
            pid: 1,
            unix_secs: 2,
        };
        let bytes = frame.to_bytes();
        assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..], &[0, 0, 0, 0, 0, 0, 0, 2]);
    }
}
