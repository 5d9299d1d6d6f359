use std::str::FromStr;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tic_tac_toe::MoveError;

/*
    Creates enums for message types, framing, rejection reasons, and protocol state.
 */

// Message type tags for tagged framing. The discriminant is the u16 sent on the wire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MessageType {
    Unsupported = 0,
    ConnectResponse = 1,
    BoardState = 2,
    MoveRequest = 3,
    MoveRejected = 4,
    GameResult = 5,
}

/// How messages are laid out on the stream. Both ends must agree.
///
/// `Legacy` is byte-compatible with the plain console programs: raw 9-byte boards, decimal
/// moves, and bare result literals, with message boundaries implied by turn order.
/// `Tagged` prefixes every message with its type, body size, and a CRC-32 of a JSON body.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Display)]
pub enum Framing {
    #[default]
    #[display("legacy")]
    Legacy,
    #[display("tagged")]
    Tagged,
}

#[derive(Debug, Clone, Eq, PartialEq, Display, Error)]
#[display("Unknown framing {value:?}, expected \"legacy\" or \"tagged\"")]
pub struct ParseFramingError {
    pub value: String,
}

impl FromStr for Framing {
    type Err = ParseFramingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Framing::Legacy),
            "tagged" => Ok(Framing::Tagged),
            _ => Err(ParseFramingError { value: s.to_string() }),
        }
    }
}

// Why the server refused a peer move. Only ever sent with tagged framing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum RejectionReason {
    #[display("Invalid choice. Try again.")]
    OutOfRange,
    #[display("Position already occupied. Choose another number.")]
    CellOccupied,
    #[display("It is not your turn.")]
    NotYourTurn,
    #[display("Move was not a number.")]
    MalformedMove,
}

impl From<MoveError> for RejectionReason {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::OutOfRange { .. } => RejectionReason::OutOfRange,
            MoveError::CellOccupied { .. } => RejectionReason::CellOccupied,
            MoveError::NotYourTurn { .. } => RejectionReason::NotYourTurn,
        }
    }
}

// For general protocol state. Server: AwaitingConnection -> ServerTurn <-> ClientTurn -> Terminal.
// Client: Connecting -> AwaitTurn <-> PromptMove -> Terminal.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProtocolState {
    Closed,
    AwaitingConnection,
    Connecting,
    ServerTurn,
    ClientTurn,
    AwaitTurn,
    PromptMove,
    Terminal,
}
