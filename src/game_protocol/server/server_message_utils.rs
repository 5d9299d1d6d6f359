use std::io::Read;
use tic_tac_toe::{BoardSnapshot, GameResult};
use crate::common_message_utils::{build_tagged_message, parse_message_data, read_legacy_chunk, read_tagged_message, LEGACY_READ_SIZE};
use crate::enums::{Framing, MessageType, RejectionReason};
use crate::error::ProtocolError;
use crate::shared_data::{BoardStateResponse, ConnectResponse, GameResultResponse, MoveRejected, MoveRequest};

/*
    Helper functions to parse client moves and build server messages in either framing.
 */

pub fn build_connect_response(framing: Framing, session_id: String) -> Result<Vec<u8>, ProtocolError> {
    match framing {
        Framing::Legacy => Err(ProtocolError::NotRepresentable { message_type: MessageType::ConnectResponse, framing }),
        Framing::Tagged => build_tagged_message(MessageType::ConnectResponse, &ConnectResponse { session_id }),
    }
}

// Legacy boards are a verbatim copy of the 9 cell bytes.
pub fn build_board_state(framing: Framing, board: &BoardSnapshot) -> Result<Vec<u8>, ProtocolError> {
    match framing {
        Framing::Legacy => Ok(board.as_bytes().to_vec()),
        Framing::Tagged => build_tagged_message(MessageType::BoardState, &BoardStateResponse { board: *board }),
    }
}

pub fn build_move_rejected(framing: Framing, position: Option<i64>, reason: RejectionReason) -> Result<Vec<u8>, ProtocolError> {
    match framing {
        Framing::Legacy => Err(ProtocolError::NotRepresentable { message_type: MessageType::MoveRejected, framing }),
        Framing::Tagged => build_tagged_message(MessageType::MoveRejected, &MoveRejected { position, reason }),
    }
}

pub fn build_game_result(framing: Framing, result: GameResult) -> Result<Vec<u8>, ProtocolError> {
    let message = result
        .terminal_message()
        .ok_or(ProtocolError::NotRepresentable { message_type: MessageType::GameResult, framing })?;

    match framing {
        Framing::Legacy => Ok(message.as_bytes().to_vec()),
        Framing::Tagged => build_tagged_message(MessageType::GameResult, &GameResultResponse { result, message: message.to_string() }),
    }
}

// Numeric-prefix parse: optional leading whitespace, an optional sign, then digits.
// Anything after the digits is ignored. No digits at all is a malformed move.
pub fn parse_legacy_move(payload: &[u8]) -> Result<i64, ProtocolError> {
    let mut rest = payload.iter().copied().skip_while(u8::is_ascii_whitespace).peekable();

    let negative = match rest.peek() {
        Some(b'-') => { rest.next(); true }
        Some(b'+') => { rest.next(); false }
        _ => false,
    };

    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(byte) = rest.next_if(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(byte - b'0'));
        digits += 1;
    }

    if digits == 0 {
        return Err(ProtocolError::MalformedMove { payload: String::from_utf8_lossy(payload).into_owned() });
    }
    Ok(if negative { -value } else { value })
}

/// Blocks until the peer sends one move and returns the position it named.
/// A payload that does not name a position yields `ProtocolError::MalformedMove`.
pub fn receive_client_move<S: Read>(stream: &mut S, framing: Framing) -> Result<i64, ProtocolError> {
    match framing {
        Framing::Legacy => {
            let mut buffer = [0; LEGACY_READ_SIZE];
            let size = read_legacy_chunk(stream, &mut buffer)?;
            parse_legacy_move(&buffer[..size])
        }
        Framing::Tagged => {
            let (message_type, body) = read_tagged_message(stream)?;
            if message_type != MessageType::MoveRequest {
                return Err(ProtocolError::UnexpectedMessage { message_type });
            }
            parse_message_data::<MoveRequest>(&body)
                .map(|request| request.position)
                .map_err(|_| ProtocolError::MalformedMove { payload: body })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;
    use crate::common_message_utils::build_message_body;

    #[test]
    fn test_legacy_move_numeric_prefix() {
        assert_eq!(parse_legacy_move(b"5").unwrap(), 5);
        assert_eq!(parse_legacy_move(b" 7").unwrap(), 7);
        assert_eq!(parse_legacy_move(b"3\0\0\0").unwrap(), 3);
        assert_eq!(parse_legacy_move(b"12abc").unwrap(), 12);
        assert_eq!(parse_legacy_move(b"-4").unwrap(), -4);
        assert_eq!(parse_legacy_move(b"99999999999999999999999").unwrap(), i64::MAX);
    }

    #[test]
    fn test_legacy_move_without_digits_is_malformed() {
        for payload in [&b"abc"[..], b"", b"-", b" \n", b"\0"] {
            let result = parse_legacy_move(payload);
            assert!(matches!(result, Err(ProtocolError::MalformedMove { .. })), "{payload:?}");
        }
    }

    #[test]
    fn test_legacy_messages_are_raw_bytes() {
        let board = BoardSnapshot::from_bytes(b"X23456789").unwrap();
        assert_eq!(build_board_state(Framing::Legacy, &board).unwrap(), b"X23456789");
        assert_eq!(build_game_result(Framing::Legacy, GameResult::Draw).unwrap(), b"Draw");
        assert_eq!(build_game_result(Framing::Legacy, GameResult::ClientWins).unwrap(), b"Client (O) wins!");
    }

    #[test]
    fn test_legacy_cannot_carry_tagged_only_messages() {
        let result = build_move_rejected(Framing::Legacy, Some(3), RejectionReason::CellOccupied);
        assert!(matches!(result, Err(ProtocolError::NotRepresentable { .. })));
        let result = build_connect_response(Framing::Legacy, "id".to_string());
        assert!(matches!(result, Err(ProtocolError::NotRepresentable { .. })));
        let result = build_game_result(Framing::Tagged, GameResult::InProgress);
        assert!(matches!(result, Err(ProtocolError::NotRepresentable { .. })));
    }

    #[test]
    fn test_tagged_move_with_bad_body_is_malformed() {
        let mut bytes = (MessageType::MoveRequest as u16).to_be_bytes().to_vec();
        bytes.extend_from_slice(&build_message_body(Some(r#"{"position":"five"}"#)).unwrap());

        let result = receive_client_move(&mut Cursor::new(bytes), Framing::Tagged);
        assert!(matches!(result, Err(ProtocolError::MalformedMove { payload }) if payload.contains("five")));
    }

    #[test]
    fn test_tagged_move_of_wrong_type_is_unexpected() {
        let board = BoardSnapshot::initial();
        let bytes = build_board_state(Framing::Tagged, &board).unwrap();

        let result = receive_client_move(&mut Cursor::new(bytes), Framing::Tagged);
        assert!(matches!(result, Err(ProtocolError::UnexpectedMessage { message_type: MessageType::BoardState })));
    }
}
