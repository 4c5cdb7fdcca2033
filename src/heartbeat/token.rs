// src/heartbeat/token.rs

//! Heartbeat token encoding.
//!
//! The wire format is a single native-endian `i32` per token, sized to hold
//! a pid. No framing beyond the fixed width; pipe writes of one token are
//! below `PIPE_BUF` and therefore atomic across concurrent writers.

/// Size of one token on the wire.
pub const TOKEN_WIRE_SIZE: usize = std::mem::size_of::<i32>();

/// A single liveness token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatToken(i32);

/// Decoded meaning of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// "Process `pid` is alive."
    Alive(i32),
    /// "Stop observing process `pid`" (clean shutdown of the child).
    Deregister(i32),
}

impl HeartbeatToken {
    /// Alive-ping for `pid`. `pid` must be positive.
    pub fn alive(pid: i32) -> Self {
        debug_assert!(pid > 0);
        Self(pid)
    }

    /// Deregistration for `pid`. `pid` must be positive.
    pub fn deregister(pid: i32) -> Self {
        debug_assert!(pid > 0);
        Self(-pid)
    }

    /// Decode the token. A zero value carries no meaning and yields `None`.
    pub fn kind(self) -> Option<TokenKind> {
        match self.0 {
            0 => None,
            v if v > 0 => Some(TokenKind::Alive(v)),
            v => Some(TokenKind::Deregister(-v)),
        }
    }

    pub fn from_wire(bytes: [u8; TOKEN_WIRE_SIZE]) -> Self {
        Self(i32::from_ne_bytes(bytes))
    }

    pub fn to_wire(self) -> [u8; TOKEN_WIRE_SIZE] {
        self.0.to_ne_bytes()
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_token_is_alive_ping() {
        assert_eq!(HeartbeatToken::alive(42).kind(), Some(TokenKind::Alive(42)));
    }

    #[test]
    fn negative_token_deregisters_abs_value() {
        let token = HeartbeatToken::deregister(42);
        assert_eq!(token.raw(), -42);
        assert_eq!(token.kind(), Some(TokenKind::Deregister(42)));
    }

    #[test]
    fn zero_token_is_meaningless() {
        assert_eq!(HeartbeatToken::from_wire(0i32.to_ne_bytes()).kind(), None);
    }

    #[test]
    fn wire_encoding_is_one_fixed_width_integer() {
        let token = HeartbeatToken::alive(0x1234_5678);
        assert_eq!(HeartbeatToken::from_wire(token.to_wire()), token);
        assert_eq!(TOKEN_WIRE_SIZE, 4);
    }
}
