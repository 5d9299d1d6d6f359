use std::io::{BufRead, Read, Write};
use std::net::TcpStream;
use tracing::{debug, info};
use tic_tac_toe::{BoardSnapshot, GameResult};
use crate::client::client_message_utils::{build_move_request, receive_server_message, ServerMessage};
use crate::common_message_utils::SocketSend;
use crate::config::ProtocolConfig;
use crate::console::{Console, MoveInput, INVALID_CHOICE_MESSAGE, INVALID_INPUT_MESSAGE};
use crate::enums::{Framing, MessageType, ProtocolState};
use crate::error::ProtocolError;

pub(crate) mod client_message_utils;

const CLIENT_PROMPT: &str = "Your turn (O), choose a number (1-9): ";

pub struct GameProtocolClient {
    config: ProtocolConfig,
    protocol_state: ProtocolState,
}

impl GameProtocolClient {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            protocol_state: ProtocolState::Closed,
        }
    }

    pub fn protocol_state(&self) -> ProtocolState {
        self.protocol_state
    }

    pub fn connect(&mut self) -> Result<TcpStream, ProtocolError> {
        self.protocol_state = ProtocolState::Connecting;
        let stream = TcpStream::connect(self.config.address)?;
        info!(address = %self.config.address, framing = %self.config.framing, "Connected to server");
        Ok(stream)
    }

    /// Connects and plays O until the server announces a result.
    pub fn start<R: BufRead, W: Write>(&mut self, mut console: Console<R, W>) -> Result<GameResult, ProtocolError> {
        let stream = self.connect()?;
        console.say("Connected to server!")?;

        let mut session = ClientSession::new(stream, console, self.config.framing);
        let result = session.run();
        self.protocol_state = session.protocol_state();
        result
    }
}

/// The client's half of a game. Holds nothing but the last board the server sent.
pub struct ClientSession<S, R, W> {
    stream: S,
    console: Console<R, W>,
    framing: Framing,
    protocol_state: ProtocolState,
    board: Option<BoardSnapshot>,
    session_id: Option<String>,
}

impl<S: Read + Write, R: BufRead, W: Write> ClientSession<S, R, W> {
    pub fn new(stream: S, console: Console<R, W>, framing: Framing) -> Self {
        Self {
            stream,
            console,
            framing,
            protocol_state: ProtocolState::AwaitTurn,
            board: None,
            session_id: None,
        }
    }

    pub fn protocol_state(&self) -> ProtocolState {
        self.protocol_state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    // The server is the only judge of the outcome; no win or draw checks happen here.
    pub fn run(&mut self) -> Result<GameResult, ProtocolError> {
        loop {
            self.set_state(ProtocolState::AwaitTurn);
            match receive_server_message(&mut self.stream, self.framing)? {
                ServerMessage::Connect(response) => {
                    info!(session_id = %response.session_id, "Joined session");
                    self.session_id = Some(response.session_id);
                }
                ServerMessage::Board(board) => {
                    self.console.render_board("Server: Here is the board:", &board)?;
                    self.board = Some(board);
                    self.prompt_move(&board)?;
                }
                ServerMessage::Rejected(rejection) => {
                    debug!(?rejection, "Move rejected by server");
                    let board = self.board.ok_or(ProtocolError::UnexpectedMessage { message_type: MessageType::MoveRejected })?;
                    self.console.say(rejection.reason)?;
                    self.prompt_move(&board)?;
                }
                ServerMessage::Result(result) => {
                    if let Some(message) = result.terminal_message() {
                        self.console.say(message)?;
                    }
                    self.set_state(ProtocolState::Terminal);
                    info!(?result, "Game over");
                    return Ok(result);
                }
            }
        }
    }

    fn set_state(&mut self, next: ProtocolState) {
        if self.protocol_state != next {
            debug!(from = ?self.protocol_state, to = ?next, "Protocol state change");
            self.protocol_state = next;
        }
    }

    // Nothing goes on the wire until the operator picks an in-range, unoccupied cell.
    fn prompt_move(&mut self, board: &BoardSnapshot) -> Result<(), ProtocolError> {
        self.set_state(ProtocolState::PromptMove);
        loop {
            let position = match self.console.read_move(CLIENT_PROMPT)? {
                MoveInput::Position(position) => position,
                MoveInput::NotANumber => {
                    self.console.say(INVALID_INPUT_MESSAGE)?;
                    continue;
                }
            };

            if !(1..=9).contains(&position) {
                self.console.say(INVALID_CHOICE_MESSAGE)?;
                continue;
            }
            if board.is_occupied(position) {
                self.console.say("Position already occupied. Choose another number.")?;
                continue;
            }

            self.stream.send_message(&build_move_request(self.framing, position)?)?;
            debug!(position, "Move sent");
            return Ok(());
        }
    }
}
