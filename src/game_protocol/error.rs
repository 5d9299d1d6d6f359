use std::io;
use derive_more::{Display, Error};
use tic_tac_toe::SnapshotError;
use crate::enums::{Framing, MessageType};

// Everything that can end or disturb a session. Only MalformedMove is recoverable:
// the server keeps waiting for another move from the peer.
#[derive(Debug, Display, Error)]
pub enum ProtocolError {
    #[display("Socket error: {_0}")]
    Io(io::Error),
    #[display("Malformed message body: {_0}")]
    Json(serde_json::Error),
    #[display("Invalid board snapshot: {_0}")]
    InvalidBoard(SnapshotError),
    #[display("Connection closed by peer")]
    ConnectionClosed,
    #[display("Console input closed")]
    ConsoleClosed,
    #[display("Checksums do not match.")]
    ChecksumMismatch,
    #[display("Message body of {size} bytes exceeds the 4096 byte limit")]
    BodyTooLarge { size: usize },
    #[display("Unknown message type {code}")]
    UnknownMessageType { code: u16 },
    #[display("Unexpected {message_type:?} message")]
    UnexpectedMessage { message_type: MessageType },
    #[display("Malformed move payload {payload:?}")]
    MalformedMove { payload: String },
    #[display("Unrecognized payload {payload:?}")]
    UnrecognizedPayload { payload: String },
    #[display("{message_type:?} cannot be sent with {framing} framing")]
    NotRepresentable { message_type: MessageType, framing: Framing },
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
            _ => ProtocolError::Io(e),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Json(e)
    }
}

impl From<SnapshotError> for ProtocolError {
    fn from(e: SnapshotError) -> Self {
        ProtocolError::InvalidBoard(e)
    }
}
