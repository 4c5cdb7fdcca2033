// src/heartbeat/pipe.rs

//! The pipe-backed heartbeat carrier.
//!
//! The supervisor owns the read end; supervised children inherit the write
//! end across exec and learn its fd number from the `PROCWATCH_HEARTBEAT_FD`
//! environment variable. One token is one `i32` write, which is atomic for
//! sizes up to `PIPE_BUF`, so N writers need no further coordination.
//!
//! The read end is `O_NONBLOCK` (the supervisor polls, never blocks) and
//! `FD_CLOEXEC` (children must not hold the consumer side open).

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Arc;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};

use crate::heartbeat::token::{HeartbeatToken, TOKEN_WIRE_SIZE};
use crate::heartbeat::HeartbeatSource;

/// Environment variable through which children discover the write-end fd.
pub const HEARTBEAT_FD_ENV: &str = "PROCWATCH_HEARTBEAT_FD";

/// Supervisor-side heartbeat channel: one reader, many (child) writers.
#[derive(Debug)]
pub struct HeartbeatChannel {
    reader: OwnedFd,
    writer: Arc<OwnedFd>,
}

impl HeartbeatChannel {
    /// Create the pipe pair and configure both ends.
    pub fn create() -> io::Result<Self> {
        let (reader, writer) = nix::unistd::pipe().map_err(io::Error::from)?;

        // Reader: non-blocking, and never leaked into children.
        fcntl(reader.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
            .map_err(io::Error::from)?;
        fcntl(reader.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(io::Error::from)?;

        Ok(Self {
            reader,
            writer: Arc::new(writer),
        })
    }

    /// In-process handle for writing tokens (used by tests and by the
    /// netbeat demo transport).
    pub fn sender(&self) -> HeartbeatSender {
        HeartbeatSender {
            fd: Arc::clone(&self.writer),
        }
    }

    /// Raw write-end fd, exported to children via [`HEARTBEAT_FD_ENV`].
    pub fn writer_raw_fd(&self) -> RawFd {
        self.writer.as_raw_fd()
    }
}

impl HeartbeatSource for HeartbeatChannel {
    fn try_recv(&mut self) -> io::Result<Option<HeartbeatToken>> {
        let mut buf = [0u8; TOKEN_WIRE_SIZE];
        match nix::unistd::read(self.reader.as_raw_fd(), &mut buf) {
            // A short or empty read means "no token available"; tokens are
            // written atomically so a partial one cannot be completed later.
            Ok(n) if n == TOKEN_WIRE_SIZE => Ok(Some(HeartbeatToken::from_wire(buf))),
            Ok(_) => Ok(None),
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(None),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}

/// Writer-side handle for a heartbeat pipe.
///
/// Clones share the same fd; writes are atomic, so sharing needs no lock.
#[derive(Debug, Clone)]
pub struct HeartbeatSender {
    fd: Arc<OwnedFd>,
}

impl HeartbeatSender {
    /// Open the sender from the fd inherited from the supervisor.
    ///
    /// This is the child-side API: a supervised process calls it once at
    /// startup and then pings periodically with [`alive`](Self::alive).
    pub fn from_env() -> io::Result<Self> {
        let raw: RawFd = std::env::var(HEARTBEAT_FD_ENV)
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{HEARTBEAT_FD_ENV} is not set; not running under procwatch?"),
                )
            })?
            .parse()
            .map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("bad {HEARTBEAT_FD_ENV}: {e}"))
            })?;

        // SAFETY: the supervisor exports exactly one inherited pipe fd under
        // this variable and nothing else in the child claims it.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self { fd: Arc::new(fd) })
    }

    /// Enqueue one token.
    pub fn send(&self, token: HeartbeatToken) -> io::Result<()> {
        let bytes = token.to_wire();
        let n = nix::unistd::write(&*self.fd, &bytes).map_err(io::Error::from)?;
        if n != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "short write on heartbeat pipe",
            ));
        }
        Ok(())
    }

    /// Ping "process `pid` is alive".
    pub fn alive(&self, pid: i32) -> io::Result<()> {
        self.send(HeartbeatToken::alive(pid))
    }

    /// Ask the supervisor to stop observing `pid`.
    pub fn deregister(&self, pid: i32) -> io::Result<()> {
        self.send(HeartbeatToken::deregister(pid))
    }
}
