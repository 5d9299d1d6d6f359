use std::io::{BufRead, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;
use tic_tac_toe::{GameResult, GameState, MoveError, Player};
use crate::common_message_utils::SocketSend;
use crate::config::ProtocolConfig;
use crate::console::{Console, MoveInput, INVALID_CHOICE_MESSAGE, INVALID_INPUT_MESSAGE};
use crate::enums::{Framing, ProtocolState, RejectionReason};
use crate::error::ProtocolError;
use crate::server::server_message_utils::{build_board_state, build_connect_response, build_game_result, build_move_rejected, receive_client_move};

pub(crate) mod server_message_utils;

const SERVER_PROMPT: &str = "Server (X), choose a number (1-9): ";
const BOARD_HEADER: &str = "Current Board:";

/// Listens on the configured address and hosts exactly one game with the first peer to connect.
pub struct GameProtocolServer {
    config: ProtocolConfig,
    listener: Option<TcpListener>,
    protocol_state: ProtocolState,
}

impl GameProtocolServer {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            listener: None,
            protocol_state: ProtocolState::Closed,
        }
    }

    pub fn protocol_state(&self) -> ProtocolState {
        self.protocol_state
    }

    // Binds the listener and returns the address actually bound, which differs from the
    // configured one when port 0 was requested.
    pub fn bind(&mut self) -> Result<SocketAddr, ProtocolError> {
        let listener = TcpListener::bind(self.config.address)?;
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, framing = %self.config.framing, "Server listening");

        self.listener = Some(listener);
        self.protocol_state = ProtocolState::AwaitingConnection;
        Ok(local_addr)
    }

    // Blocks until one peer connects. Binds first if that has not happened yet.
    // The listener stays open until the server is dropped.
    pub fn accept(&mut self) -> Result<TcpStream, ProtocolError> {
        if self.listener.is_none() {
            self.bind()?;
        }

        match self.listener.as_ref() {
            Some(listener) => {
                let (stream, peer) = listener.accept()?;
                info!(%peer, "New connection");
                Ok(stream)
            }
            None => Err(ProtocolError::ConnectionClosed),
        }
    }

    /// Binds, accepts one peer, and plays the whole game, using `console` for the server's moves.
    pub fn start<R: BufRead, W: Write>(&mut self, mut console: Console<R, W>) -> Result<GameResult, ProtocolError> {
        let local_addr = match self.listener.as_ref() {
            Some(listener) => listener.local_addr()?,
            None => self.bind()?,
        };
        console.say(format!("Server is listening on port {}", local_addr.port()))?;

        let stream = self.accept()?;
        let mut session = ServerSession::new(stream, console, self.config.framing);
        self.protocol_state = ProtocolState::ServerTurn;
        let result = session.run();
        self.protocol_state = session.protocol_state();
        result
    }
}

/// One game played over an accepted stream. Owns the only mutable `GameState`.
pub struct ServerSession<S, R, W> {
    stream: S,
    console: Console<R, W>,
    framing: Framing,
    game: GameState,
    protocol_state: ProtocolState,
    session_id: Uuid,
}

impl<S: Read + Write, R: BufRead, W: Write> ServerSession<S, R, W> {
    pub fn new(stream: S, console: Console<R, W>, framing: Framing) -> Self {
        Self {
            stream,
            console,
            framing,
            game: GameState::new(),
            protocol_state: ProtocolState::ServerTurn,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn protocol_state(&self) -> ProtocolState {
        self.protocol_state
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    /// Alternates turns until the game reaches a result, which is sent to the peer before returning.
    /// Any transport or console failure ends the session with an error.
    pub fn run(&mut self) -> Result<GameResult, ProtocolError> {
        let span = info_span!("session", id = %self.session_id);
        let _enter = span.enter();

        if self.framing == Framing::Tagged {
            let response = build_connect_response(self.framing, self.session_id.to_string())?;
            self.stream.send_message(&response)?;
        }
        self.console.render_board(BOARD_HEADER, &self.game.snapshot())?;

        loop {
            let result = match self.game.this_turn() {
                Player::Server => self.server_turn()?,
                Player::Client => self.client_turn()?,
            };

            if result.is_terminal() {
                self.finish(result)?;
                return Ok(result);
            }
        }
    }

    fn set_state(&mut self, next: ProtocolState) {
        debug!(from = ?self.protocol_state, to = ?next, "Protocol state change");
        self.protocol_state = next;
    }

    // Re-prompts on bad input without touching the network. Only a valid move is sent on.
    fn server_turn(&mut self) -> Result<GameResult, ProtocolError> {
        self.set_state(ProtocolState::ServerTurn);
        loop {
            let position = match self.console.read_move(SERVER_PROMPT)? {
                MoveInput::Position(position) => position,
                MoveInput::NotANumber => {
                    self.console.say(INVALID_INPUT_MESSAGE)?;
                    continue;
                }
            };

            match self.game.apply_move(Player::Server, position) {
                Ok(board) => {
                    self.console.render_board(BOARD_HEADER, &board)?;
                    let result = self.game.evaluate();
                    if !result.is_terminal() {
                        self.stream.send_message(&build_board_state(self.framing, &board)?)?;
                    }
                    return Ok(result);
                }
                Err(MoveError::CellOccupied { .. }) => self.console.say("Cell already taken. Choose another.")?,
                Err(_) => self.console.say(INVALID_CHOICE_MESSAGE)?,
            }
        }
    }

    fn client_turn(&mut self) -> Result<GameResult, ProtocolError> {
        self.set_state(ProtocolState::ClientTurn);
        loop {
            let position = match receive_client_move(&mut self.stream, self.framing) {
                Ok(position) => position,
                Err(ProtocolError::MalformedMove { payload }) => {
                    warn!(payload = %payload, "Malformed move from client");
                    self.reject_peer_move(None, RejectionReason::MalformedMove)?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.game.apply_move(Player::Client, position) {
                Ok(board) => {
                    // No board is sent back; the client gets a fresh one after the server's next move.
                    self.console.render_board(BOARD_HEADER, &board)?;
                    return Ok(self.game.evaluate());
                }
                Err(e) => {
                    warn!(position, error = %e, "Invalid move from client");
                    if matches!(e, MoveError::CellOccupied { .. }) {
                        self.console.say("Cell already taken. Client, choose another.")?;
                    }
                    self.reject_peer_move(Some(position), RejectionReason::from(e))?;
                }
            }
        }
    }

    // Legacy peers cannot read a rejection, so the move is dropped and the turn stays with them.
    fn reject_peer_move(&mut self, position: Option<i64>, reason: RejectionReason) -> Result<(), ProtocolError> {
        match self.framing {
            Framing::Legacy => {
                debug!(?position, ?reason, "Ignoring invalid move");
                Ok(())
            }
            Framing::Tagged => {
                let rejection = build_move_rejected(self.framing, position, reason)?;
                self.stream.send_message(&rejection)
            }
        }
    }

    fn finish(&mut self, result: GameResult) -> Result<(), ProtocolError> {
        if let Some(message) = result.terminal_message() {
            self.console.say(message)?;
        }
        self.stream.send_message(&build_game_result(self.framing, result)?)?;
        self.set_state(ProtocolState::Terminal);
        info!(?result, moves = self.game.moves_played(), "Game over");
        Ok(())
    }
}
