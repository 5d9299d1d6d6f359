use serde::{Serialize, Deserialize};
use tic_tac_toe::{BoardSnapshot, GameResult};
use crate::enums::RejectionReason;

/*
    JSON bodies of tagged messages, shared between client and server.
    A series of simple structs as wrappers around message specific data.
 */

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConnectResponse {
    pub session_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BoardStateResponse {
    pub board: BoardSnapshot,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveRequest {
    pub position: i64,
}

// The position is absent when the payload could not be read as a move at all.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveRejected {
    pub position: Option<i64>,
    pub reason: RejectionReason,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GameResultResponse {
    pub result: GameResult,
    pub message: String,
}
