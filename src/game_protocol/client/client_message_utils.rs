use std::io::Read;
use tracing::warn;
use tic_tac_toe::{BoardSnapshot, GameResult, BOARD_CELLS};
use crate::common_message_utils::{build_tagged_message, parse_message_data, read_legacy_chunk, read_tagged_message, LEGACY_READ_SIZE};
use crate::enums::{Framing, MessageType};
use crate::error::ProtocolError;
use crate::shared_data::{BoardStateResponse, ConnectResponse, GameResultResponse, MoveRejected, MoveRequest};

/*
    Contains helpers for building client moves and parsing server messages in either framing.
 */

// Everything the server can send to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Connect(ConnectResponse),
    Board(BoardSnapshot),
    Rejected(MoveRejected),
    Result(GameResult),
}

// Legacy moves are bare decimal text with no newline.
pub fn build_move_request(framing: Framing, position: i64) -> Result<Vec<u8>, ProtocolError> {
    match framing {
        Framing::Legacy => Ok(position.to_string().into_bytes()),
        Framing::Tagged => build_tagged_message(MessageType::MoveRequest, &MoveRequest { position }),
    }
}

// Terminal literals and boards never share a first byte, so one byte is enough to tell
// which kind of legacy message is arriving.
fn terminal_literal_starting_with(first: u8) -> Option<&'static str> {
    [GameResult::ServerWins, GameResult::ClientWins, GameResult::Draw]
        .into_iter()
        .filter_map(GameResult::terminal_message)
        .find(|message| message.as_bytes().first() == Some(&first))
}

// Keeps reading until a whole board or a whole terminal literal has arrived.
fn receive_legacy_message<S: Read>(stream: &mut S) -> Result<ServerMessage, ProtocolError> {
    let mut buffer = [0; LEGACY_READ_SIZE];
    let mut received = Vec::with_capacity(LEGACY_READ_SIZE);

    loop {
        let size = read_legacy_chunk(stream, &mut buffer)?;
        received.extend_from_slice(&buffer[..size]);

        if let Some(literal) = terminal_literal_starting_with(received[0]) {
            if received.len() >= literal.len() {
                return GameResult::from_terminal_message(&received)
                    .map(ServerMessage::Result)
                    .ok_or_else(|| ProtocolError::UnrecognizedPayload {
                        payload: String::from_utf8_lossy(&received).into_owned(),
                    });
            }
        } else if received.len() >= BOARD_CELLS {
            if received.len() > BOARD_CELLS {
                warn!(extra = received.len() - BOARD_CELLS, "Discarding bytes after board snapshot");
            }
            return Ok(ServerMessage::Board(BoardSnapshot::from_bytes(&received[..BOARD_CELLS])?));
        }
    }
}

fn receive_tagged_message<S: Read>(stream: &mut S) -> Result<ServerMessage, ProtocolError> {
    let (message_type, body) = read_tagged_message(stream)?;
    match message_type {
        MessageType::ConnectResponse => Ok(ServerMessage::Connect(parse_message_data(&body)?)),
        MessageType::BoardState => {
            let response: BoardStateResponse = parse_message_data(&body)?;
            Ok(ServerMessage::Board(response.board))
        }
        MessageType::MoveRejected => Ok(ServerMessage::Rejected(parse_message_data(&body)?)),
        MessageType::GameResult => {
            let response: GameResultResponse = parse_message_data(&body)?;
            if !response.result.is_terminal() {
                return Err(ProtocolError::UnexpectedMessage { message_type });
            }
            Ok(ServerMessage::Result(response.result))
        }
        _ => Err(ProtocolError::UnexpectedMessage { message_type }),
    }
}

/// Blocks until one complete message from the server has arrived.
pub fn receive_server_message<S: Read>(stream: &mut S, framing: Framing) -> Result<ServerMessage, ProtocolError> {
    match framing {
        Framing::Legacy => receive_legacy_message(stream),
        Framing::Tagged => receive_tagged_message(stream),
    }
}
