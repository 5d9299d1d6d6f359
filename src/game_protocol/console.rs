use std::fmt::Display;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use tic_tac_toe::BoardSnapshot;
use crate::error::ProtocolError;

pub const INVALID_INPUT_MESSAGE: &str = "Invalid input. Please enter a number between 1 and 9.";
pub const INVALID_CHOICE_MESSAGE: &str = "Invalid choice. Try again.";

// What the local operator typed in response to a move prompt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MoveInput {
    Position(i64),
    NotANumber,
}

/// The local operator's side of a session: move prompts in, board renders and messages out.
pub struct Console<R, W> {
    input: R,
    output: W,
    line: String,
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            line: String::new(),
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    // Prompt and read one line. Only the first whitespace-separated token counts;
    // the rest of the line is discarded.
    pub fn read_move(&mut self, prompt: &str) -> Result<MoveInput, ProtocolError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        self.line.clear();
        if self.input.read_line(&mut self.line)? == 0 {
            return Err(ProtocolError::ConsoleClosed);
        }

        let parsed = self.line
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<i64>().ok());
        Ok(match parsed {
            Some(position) => MoveInput::Position(position),
            None => MoveInput::NotANumber,
        })
    }

    pub fn say(&mut self, message: impl Display) -> Result<(), ProtocolError> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    pub fn render_board(&mut self, header: &str, board: &BoardSnapshot) -> Result<(), ProtocolError> {
        writeln!(self.output, "{}", header)?;
        write!(self.output, "{}", board)?;
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_reads_moves_line_by_line() {
        let mut console = console("5\n  7 extra\nabc\n\n-2\n");
        assert_eq!(console.read_move("> ").unwrap(), MoveInput::Position(5));
        assert_eq!(console.read_move("> ").unwrap(), MoveInput::Position(7));
        assert_eq!(console.read_move("> ").unwrap(), MoveInput::NotANumber);
        assert_eq!(console.read_move("> ").unwrap(), MoveInput::NotANumber);
        assert_eq!(console.read_move("> ").unwrap(), MoveInput::Position(-2));
        assert!(matches!(console.read_move("> "), Err(ProtocolError::ConsoleClosed)));

        let output = String::from_utf8(console.output().clone()).unwrap();
        assert_eq!(output, "> > > > > > ");
    }

    #[test]
    fn test_renders_board_as_grid() {
        let mut console = console("");
        let board = BoardSnapshot::from_bytes(b"X23O56789").unwrap();
        console.render_board("Current Board:", &board).unwrap();

        let output = String::from_utf8(console.output().clone()).unwrap();
        assert_eq!(output, "Current Board:\nX 2 3 \nO 5 6 \n7 8 9 \n");
    }
}
