//! Request/response state machine over a command pipe and a reply pipe
//!
//! At most one request is outstanding: every command that expects an
//! answer blocks until the reply (or end of stream) arrives.

use std::io::{BufRead, Write};

use super::protocol::{read_reply, Command, EngineMoveResult, EngineReply};
use crate::error::EngineError;
use crate::rules::GameRule;

/// Lifecycle of an engine connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Shut down (terminal)
    Stopped,
    /// Launched, board size not yet acknowledged
    Starting,
    /// Idle, ready for the next request
    Ready,
    /// A request is in flight
    AwaitingReply,
    /// The pipe broke or the engine misbehaved (terminal)
    Failed,
}

impl BridgeState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, BridgeState::Stopped | BridgeState::Failed)
    }
}

pub struct Session<W: Write, R: BufRead> {
    writer: W,
    reader: R,
    state: BridgeState,
}

impl<W: Write, R: BufRead> Session<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            reader,
            state: BridgeState::Starting,
        }
    }

    #[inline]
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Mark the session failed; it accepts no further commands
    pub fn fail(&mut self) {
        if self.state != BridgeState::Stopped {
            self.state = BridgeState::Failed;
        }
    }

    fn send(&mut self, command: &Command) -> Result<(), EngineError> {
        if self.state.is_terminal() {
            return Err(EngineError::InvalidState(self.state, command.to_string()));
        }
        tracing::trace!(%command, "engine <-");
        let written = writeln!(self.writer, "{command}").and_then(|()| self.writer.flush());
        if let Err(err) = written {
            self.state = BridgeState::Failed;
            return Err(err.into());
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<EngineReply, EngineError> {
        match read_reply(&mut self.reader) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                self.state = BridgeState::Failed;
                Err(err.into())
            }
        }
    }

    /// Send a command that expects a move-style reply
    fn request(&mut self, command: Command) -> Result<EngineReply, EngineError> {
        if self.state != BridgeState::Ready {
            return Err(EngineError::InvalidState(self.state, command.to_string()));
        }
        self.send(&command)?;
        self.state = BridgeState::AwaitingReply;

        let reply = self.receive()?;
        self.state = if reply.result == EngineMoveResult::NoResponse {
            BridgeState::Failed
        } else {
            BridgeState::Ready
        };
        Ok(reply)
    }

    /// Announce the time limits; sent once right after launch
    pub fn handshake(&mut self, turn_timeout_ms: u64, match_timeout_ms: u64) -> Result<(), EngineError> {
        self.send(&Command::InfoTimeoutTurn(turn_timeout_ms))?;
        self.send(&Command::InfoTimeoutMatch(match_timeout_ms))
    }

    /// Announce the rule (if any) and the board size, and wait for `OK`.
    ///
    /// Square boards use `START`, others `RECTSTART`. May be repeated from
    /// `Ready` to restart the engine on a new board.
    pub fn start(&mut self, rows: usize, cols: usize, rule: Option<GameRule>) -> Result<(), EngineError> {
        let command = if rows == cols {
            Command::Start(rows)
        } else {
            Command::RectStart {
                width: cols,
                height: rows,
            }
        };
        if !matches!(self.state, BridgeState::Starting | BridgeState::Ready) {
            return Err(EngineError::InvalidState(self.state, command.to_string()));
        }

        if let Some(rule) = rule {
            self.send(&Command::InfoRule(rule.protocol_code()))?;
        }
        self.send(&command)?;
        self.state = BridgeState::AwaitingReply;

        let reply = self.receive()?;
        if reply.result != EngineMoveResult::Ok {
            self.state = BridgeState::Failed;
            return Err(EngineError::UnexpectedReply {
                command: command.to_string(),
                got: format!("{:?}", reply.result),
            });
        }
        self.state = BridgeState::Ready;
        Ok(())
    }

    /// Ask for the opening move
    pub fn begin(&mut self) -> Result<EngineReply, EngineError> {
        self.request(Command::Begin)
    }

    /// Report the opponent's move at column `x`, row `y`
    pub fn turn(&mut self, x: usize, y: usize) -> Result<EngineReply, EngineError> {
        self.request(Command::Turn { x, y })
    }

    /// Send a full position and ask for a move
    pub fn sync_board(&mut self, stones: Vec<(usize, usize, u8)>) -> Result<EngineReply, EngineError> {
        self.request(Command::Board(stones))
    }

    /// Send `END` if the pipe is still usable; the session is stopped either way
    pub fn end(&mut self) -> Result<(), EngineError> {
        let sent = if self.state.is_terminal() {
            Ok(())
        } else {
            self.send(&Command::End)
        };
        self.state = BridgeState::Stopped;
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type TestSession = Session<Vec<u8>, Cursor<Vec<u8>>>;

    fn session(replies: &str) -> TestSession {
        Session::new(Vec::new(), Cursor::new(replies.as_bytes().to_vec()))
    }

    fn sent(session: &TestSession) -> String {
        String::from_utf8(session.writer.clone()).unwrap()
    }

    #[test]
    fn test_handshake_and_square_start() {
        let mut s = session("OK\n");
        s.handshake(5000, 180000).unwrap();
        assert_eq!(s.state(), BridgeState::Starting);
        s.start(15, 15, Some(GameRule::Renju)).unwrap();
        assert_eq!(s.state(), BridgeState::Ready);
        assert_eq!(
            sent(&s),
            "INFO timeout_turn 5000\nINFO timeout_match 180000\nINFO rule 4\nSTART 15\n"
        );
    }

    #[test]
    fn test_rectangular_start() {
        let mut s = session("OK\n");
        s.start(15, 20, None).unwrap();
        assert_eq!(sent(&s), "RECTSTART 20,15\n");
    }

    #[test]
    fn test_start_rejected_fails_session() {
        let mut s = session("ERROR size not supported\n");
        let err = s.start(40, 40, None).unwrap_err();
        assert!(matches!(err, EngineError::UnexpectedReply { .. }));
        assert_eq!(s.state(), BridgeState::Failed);
        assert!(s.begin().is_err());
    }

    #[test]
    fn test_requests_before_start_are_refused() {
        let mut s = session("7,7\n");
        let err = s.begin().unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(BridgeState::Starting, _)));
        assert_eq!(sent(&s), "");
    }

    #[test]
    fn test_turn_round_trip() {
        let mut s = session("OK\nMESSAGE thinking\n8,7\n");
        s.start(15, 15, None).unwrap();
        let reply = s.turn(7, 7).unwrap();
        assert_eq!(reply.result, EngineMoveResult::Move { x: 8, y: 7 });
        assert_eq!(reply.message.as_deref(), Some("thinking"));
        assert_eq!(s.state(), BridgeState::Ready);
        assert!(sent(&s).ends_with("TURN 7,7\n"));
    }

    #[test]
    fn test_forbid_reply_keeps_session_ready() {
        let mut s = session("OK\nFORBID 7,7\n");
        s.start(15, 15, Some(GameRule::Renju)).unwrap();
        let reply = s.turn(7, 7).unwrap();
        assert!(matches!(reply.result, EngineMoveResult::Forbidden { .. }));
        assert_eq!(s.state(), BridgeState::Ready);
    }

    #[test]
    fn test_closed_pipe_fails_session() {
        let mut s = session("OK\n");
        s.start(15, 15, None).unwrap();
        let reply = s.begin().unwrap();
        assert_eq!(reply.result, EngineMoveResult::NoResponse);
        assert_eq!(s.state(), BridgeState::Failed);
    }

    #[test]
    fn test_board_sync() {
        let mut s = session("OK\n9,9\n");
        s.start(15, 15, None).unwrap();
        let reply = s.sync_board(vec![(7, 7, 2), (8, 8, 1)]).unwrap();
        assert_eq!(reply.result, EngineMoveResult::Move { x: 9, y: 9 });
        assert!(sent(&s).ends_with("BOARD\n7,7,2\n8,8,1\nDONE\n"));
    }

    #[test]
    fn test_end_is_sent_once() {
        let mut s = session("OK\n");
        s.start(15, 15, None).unwrap();
        s.end().unwrap();
        s.end().unwrap();
        assert_eq!(s.state(), BridgeState::Stopped);
        assert_eq!(sent(&s).matches("END").count(), 1);
    }

    #[test]
    fn test_failed_session_skips_end() {
        let mut s = session("");
        s.fail();
        s.end().unwrap();
        assert_eq!(s.state(), BridgeState::Stopped);
        assert_eq!(sent(&s), "");
    }
}
