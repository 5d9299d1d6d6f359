pub use client::{ClientSession, GameProtocolClient};
pub use client::client_message_utils::{build_move_request, receive_server_message, ServerMessage};
pub use config::{ProtocolConfig, DEFAULT_ADDRESS};
pub use console::{Console, MoveInput};
pub use error::ProtocolError;
pub use server::{GameProtocolServer, ServerSession};
pub use server::server_message_utils::{build_board_state, build_game_result, build_move_rejected, receive_client_move};
pub mod enums;
pub mod shared_data;
pub mod common_message_utils;

mod client;
mod config;
mod console;
mod error;
mod server;
