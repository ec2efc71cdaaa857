//! Protocol lines exchanged with an external engine
//!
//! One command or reply per line. Coordinates are `x,y` with x the column
//! and y the row, both zero-based.

use std::fmt;
use std::io::{self, BufRead};

/// Outbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `INFO timeout_turn <ms>`
    InfoTimeoutTurn(u64),
    /// `INFO timeout_match <ms>`
    InfoTimeoutMatch(u64),
    /// `INFO rule <code>`
    InfoRule(u32),
    /// `START <size>` for square boards
    Start(usize),
    /// `RECTSTART <w>,<h>`
    RectStart { width: usize, height: usize },
    /// Ask the engine for the opening move
    Begin,
    /// Report the opponent's move and ask for a reply
    Turn { x: usize, y: usize },
    /// Replace the engine's position: `(x, y, field)` with field 1 for the
    /// engine's own stones and 2 for the opponent's, then `DONE`
    Board(Vec<(usize, usize, u8)>),
    End,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::InfoTimeoutTurn(ms) => write!(f, "INFO timeout_turn {ms}"),
            Command::InfoTimeoutMatch(ms) => write!(f, "INFO timeout_match {ms}"),
            Command::InfoRule(code) => write!(f, "INFO rule {code}"),
            Command::Start(size) => write!(f, "START {size}"),
            Command::RectStart { width, height } => write!(f, "RECTSTART {width},{height}"),
            Command::Begin => f.write_str("BEGIN"),
            Command::Turn { x, y } => write!(f, "TURN {x},{y}"),
            Command::Board(stones) => {
                writeln!(f, "BOARD")?;
                for (x, y, field) in stones {
                    writeln!(f, "{x},{y},{field}")?;
                }
                f.write_str("DONE")
            }
            Command::End => f.write_str("END"),
        }
    }
}

/// Classified substantive reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMoveResult {
    /// `x,y`
    Move { x: usize, y: usize },
    /// `FORBID x,y`: the engine considers the reported move forbidden
    Forbidden { x: Option<usize>, y: Option<usize> },
    /// `ILLEGAL x,y`
    Illegal { x: Option<usize>, y: Option<usize> },
    /// `ERROR ...`
    Error { raw: String },
    /// `OK`, the acknowledgement of `START`/`RECTSTART`
    Ok,
    InvalidResponse { raw: String },
    /// Stream closed before a substantive line arrived
    NoResponse,
}

/// A reply plus the diagnostics that preceded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReply {
    pub result: EngineMoveResult,
    /// Text of the `MESSAGE` lines read before the reply, newline-joined
    pub message: Option<String>,
}

impl EngineReply {
    fn new(result: EngineMoveResult, messages: Vec<String>) -> Self {
        let message = (!messages.is_empty()).then(|| messages.join("\n"));
        Self { result, message }
    }
}

/// `line` is `keyword` alone or `keyword` followed by whitespace
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() {
        Some(rest)
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn parse_pair(text: &str) -> Option<(usize, usize)> {
    let (x, y) = text.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Classify one substantive (non-`MESSAGE`) line
pub fn classify(line: &str) -> EngineMoveResult {
    let line = line.trim();

    if let Some(rest) = strip_keyword(line, "FORBID") {
        let pair = parse_pair(rest);
        return EngineMoveResult::Forbidden {
            x: pair.map(|(x, _)| x),
            y: pair.map(|(_, y)| y),
        };
    }
    if let Some(rest) = strip_keyword(line, "ILLEGAL") {
        let pair = parse_pair(rest);
        return EngineMoveResult::Illegal {
            x: pair.map(|(x, _)| x),
            y: pair.map(|(_, y)| y),
        };
    }
    if strip_keyword(line, "ERROR").is_some() {
        return EngineMoveResult::Error { raw: line.to_string() };
    }
    if line == "OK" {
        return EngineMoveResult::Ok;
    }
    match parse_pair(line) {
        Some((x, y)) => EngineMoveResult::Move { x, y },
        None => EngineMoveResult::InvalidResponse { raw: line.to_string() },
    }
}

/// Read lines until a substantive reply or end of stream.
///
/// `MESSAGE` lines are collected and attached to the reply, `DEBUG` lines
/// are logged and dropped, blank lines are skipped.
pub fn read_reply<R: BufRead>(reader: &mut R) -> io::Result<EngineReply> {
    let mut messages = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(EngineReply::new(EngineMoveResult::NoResponse, messages));
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(text) = strip_keyword(trimmed, "MESSAGE") {
            tracing::debug!(message = text, "engine message");
            messages.push(text.to_string());
            continue;
        }
        if let Some(text) = strip_keyword(trimmed, "DEBUG") {
            tracing::debug!(debug = text, "engine debug output");
            continue;
        }

        tracing::debug!(reply = trimmed, "engine reply");
        return Ok(EngineReply::new(classify(trimmed), messages));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reply(input: &str) -> EngineReply {
        read_reply(&mut Cursor::new(input.as_bytes())).unwrap()
    }

    #[test]
    fn test_command_lines() {
        assert_eq!(Command::InfoTimeoutTurn(5000).to_string(), "INFO timeout_turn 5000");
        assert_eq!(Command::InfoTimeoutMatch(180000).to_string(), "INFO timeout_match 180000");
        assert_eq!(Command::InfoRule(4).to_string(), "INFO rule 4");
        assert_eq!(Command::Start(15).to_string(), "START 15");
        assert_eq!(
            Command::RectStart { width: 20, height: 15 }.to_string(),
            "RECTSTART 20,15"
        );
        assert_eq!(Command::Begin.to_string(), "BEGIN");
        assert_eq!(Command::Turn { x: 3, y: 11 }.to_string(), "TURN 3,11");
        assert_eq!(Command::End.to_string(), "END");
    }

    #[test]
    fn test_board_command_block() {
        let cmd = Command::Board(vec![(7, 7, 2), (8, 7, 1)]);
        assert_eq!(cmd.to_string(), "BOARD\n7,7,2\n8,7,1\nDONE");
    }

    #[test]
    fn test_message_attached_to_move() {
        let r = reply("MESSAGE hello\n5,7\n");
        assert_eq!(r.result, EngineMoveResult::Move { x: 5, y: 7 });
        assert_eq!(r.message.as_deref(), Some("hello"));
    }

    #[test]
    fn test_several_messages_are_joined() {
        let r = reply("MESSAGE depth 4\nDEBUG nodes 1200\nMESSAGE depth 6\n 10 , 2 \n");
        assert_eq!(r.result, EngineMoveResult::Move { x: 10, y: 2 });
        assert_eq!(r.message.as_deref(), Some("depth 4\ndepth 6"));
    }

    #[test]
    fn test_forbid_reply() {
        let r = reply("FORBID 3,3\n");
        assert_eq!(r.result, EngineMoveResult::Forbidden { x: Some(3), y: Some(3) });
        assert_eq!(r.message, None);
    }

    #[test]
    fn test_illegal_without_coordinates() {
        let r = reply("ILLEGAL\n");
        assert_eq!(r.result, EngineMoveResult::Illegal { x: None, y: None });
    }

    #[test]
    fn test_error_reply_keeps_raw_line() {
        let r = reply("ERROR unsupported size\n");
        assert_eq!(
            r.result,
            EngineMoveResult::Error { raw: "ERROR unsupported size".to_string() }
        );
    }

    #[test]
    fn test_ok_reply() {
        assert_eq!(reply("OK\n").result, EngineMoveResult::Ok);
    }

    #[test]
    fn test_closed_stream_is_no_response() {
        assert_eq!(reply("").result, EngineMoveResult::NoResponse);
        let r = reply("MESSAGE bye\n");
        assert_eq!(r.result, EngineMoveResult::NoResponse);
        assert_eq!(r.message.as_deref(), Some("bye"));
    }

    #[test]
    fn test_garbage_is_invalid_response() {
        assert_eq!(
            reply("banana\n").result,
            EngineMoveResult::InvalidResponse { raw: "banana".to_string() }
        );
        assert_eq!(
            reply("5,seven\n").result,
            EngineMoveResult::InvalidResponse { raw: "5,seven".to_string() }
        );
        // A keyword prefix is not the keyword
        assert_eq!(
            reply("MESSAGES 1,1\n").result,
            EngineMoveResult::InvalidResponse { raw: "MESSAGES 1,1".to_string() }
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let r = reply("\n\r\n  \n4,4\r\n");
        assert_eq!(r.result, EngineMoveResult::Move { x: 4, y: 4 });
    }

    #[test]
    fn test_reads_one_reply_at_a_time() {
        let mut input = Cursor::new("1,1\nMESSAGE next\n2,2\n".as_bytes());
        assert_eq!(read_reply(&mut input).unwrap().result, EngineMoveResult::Move { x: 1, y: 1 });
        let second = read_reply(&mut input).unwrap();
        assert_eq!(second.result, EngineMoveResult::Move { x: 2, y: 2 });
        assert_eq!(second.message.as_deref(), Some("next"));
        assert_eq!(read_reply(&mut input).unwrap().result, EngineMoveResult::NoResponse);
    }
}
