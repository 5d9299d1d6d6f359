use std::io::{Read, Write};
use std::mem::size_of;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use crate::enums::MessageType;
use crate::error::ProtocolError;

/*
    Contains message framing functions common between client and server.
    Tagged messages are laid out as: message type (u16), body size (u32), and, when the size is
    non-zero, a CRC-32 of the body (u32) followed by the JSON body. All integers are big-endian.
 */

pub const MAX_BODY_SIZE: usize = 4096;

// Legacy messages are read with a single buffer of this size.
pub const LEGACY_READ_SIZE: usize = 1024;

// Give any writable stream its own send_message function as a wrapper around write_all.
pub trait SocketSend {
    fn send_message(&mut self, data: &[u8]) -> Result<(), ProtocolError>;
}

impl<T: Write> SocketSend for T {
    fn send_message(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.write_all(data)?;
        self.flush()?;
        Ok(())
    }
}

// Build the body into a byte vector to send.
pub fn build_message_body(body: Option<&str>) -> Result<Vec<u8>, ProtocolError> {
    let mut byte_vec = vec![];

    if let Some(data) = body {
        let data_bytes = data.as_bytes();
        if data_bytes.len() > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge { size: data_bytes.len() });
        }
        byte_vec.extend_from_slice(&(data_bytes.len() as u32).to_be_bytes());
        byte_vec.extend_from_slice(&crc32fast::hash(data_bytes).to_be_bytes()); // Create checksum
        byte_vec.extend_from_slice(data_bytes);
    } else {
        byte_vec.extend_from_slice(&0_u32.to_be_bytes());
    }
    Ok(byte_vec)
}

pub fn build_tagged_message<T: Serialize>(message_type: MessageType, body: &T) -> Result<Vec<u8>, ProtocolError> {
    let serialized = serde_json::to_string(body)?;
    let mut byte_vec = vec![];
    byte_vec.extend_from_slice(&(message_type as u16).to_be_bytes());
    byte_vec.extend_from_slice(&build_message_body(Some(&serialized))?);
    Ok(byte_vec)
}

// Maps integers to the message type enumeration
pub fn parse_message_type(code: u16) -> MessageType {
    match code {
        1 => MessageType::ConnectResponse,
        2 => MessageType::BoardState,
        3 => MessageType::MoveRequest,
        4 => MessageType::MoveRejected,
        5 => MessageType::GameResult,
        _ => MessageType::Unsupported,
    }
}

fn read_u32<S: Read>(stream: &mut S) -> Result<u32, ProtocolError> {
    let mut bytes = [0; size_of::<u32>()];
    stream.read_exact(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

// Read size and body of a message. Throw errors if the body checksum or size
// does not match what the sender described.
pub fn read_message_payload<S: Read>(stream: &mut S) -> Result<String, ProtocolError> {
    let size = read_u32(stream)? as usize;
    if size == 0 {
        return Ok(String::new());
    }
    if size > MAX_BODY_SIZE {
        return Err(ProtocolError::BodyTooLarge { size });
    }

    let remote_checksum = read_u32(stream)?;
    let mut data_bytes = vec![0; size];
    stream.read_exact(&mut data_bytes)?;

    if remote_checksum != crc32fast::hash(&data_bytes) {
        return Err(ProtocolError::ChecksumMismatch);
    }

    String::from_utf8(data_bytes).map_err(|e| ProtocolError::UnrecognizedPayload {
        payload: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Blocks until one complete tagged message has arrived and returns its type and JSON body.
pub fn read_tagged_message<S: Read>(stream: &mut S) -> Result<(MessageType, String), ProtocolError> {
    let mut type_bytes = [0; size_of::<u16>()];
    stream.read_exact(&mut type_bytes)?;
    let code = u16::from_be_bytes(type_bytes);

    let message_type = parse_message_type(code);
    if matches!(message_type, MessageType::Unsupported) {
        return Err(ProtocolError::UnknownMessageType { code });
    }

    let body = read_message_payload(stream)?;
    debug!(?message_type, size = body.len(), "Tagged message received");
    Ok((message_type, body))
}

// Generic function for parsing a JSON body into a data type
pub fn parse_message_data<T: DeserializeOwned>(body: &str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(body)?)
}

/// One blocking read of a legacy message. A zero-length read means the peer hung up.
pub fn read_legacy_chunk<S: Read>(stream: &mut S, buffer: &mut [u8]) -> Result<usize, ProtocolError> {
    match stream.read(buffer)? {
        0 => Err(ProtocolError::ConnectionClosed),
        size => Ok(size),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;
    use crate::shared_data::MoveRequest;

    #[test]
    fn test_tagged_message_layout() {
        let bytes = build_tagged_message(MessageType::MoveRequest, &MoveRequest { position: 7 }).unwrap();
        let body = br#"{"position":7}"#;

        assert_eq!(&bytes[0..2], &3_u16.to_be_bytes());
        assert_eq!(&bytes[2..6], &(body.len() as u32).to_be_bytes());
        assert_eq!(&bytes[6..10], &crc32fast::hash(body).to_be_bytes());
        assert_eq!(&bytes[10..], body);

        let (message_type, read_body) = read_tagged_message(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(message_type, MessageType::MoveRequest);
        let request: MoveRequest = parse_message_data(&read_body).unwrap();
        assert_eq!(request, MoveRequest { position: 7 });
    }

    #[test]
    fn test_corrupted_body_fails_checksum() {
        let mut bytes = build_tagged_message(MessageType::MoveRequest, &MoveRequest { position: 7 }).unwrap();
        let last = bytes.len() - 2;
        bytes[last] = b'8';

        let result = read_tagged_message(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(ProtocolError::ChecksumMismatch)));
    }

    #[test]
    fn test_empty_body() {
        let bytes = build_message_body(None).unwrap();
        assert_eq!(bytes, 0_u32.to_be_bytes());
        assert_eq!(read_message_payload(&mut Cursor::new(bytes)).unwrap(), "");
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let big = "x".repeat(MAX_BODY_SIZE + 1);
        assert!(matches!(build_message_body(Some(&big)), Err(ProtocolError::BodyTooLarge { .. })));

        let mut bytes = 2_u16.to_be_bytes().to_vec();
        bytes.extend_from_slice(&(u32::MAX).to_be_bytes());
        let result = read_tagged_message(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(ProtocolError::BodyTooLarge { size }) if size == u32::MAX as usize));
    }

    #[test]
    fn test_unknown_message_type() {
        let mut bytes = 42_u16.to_be_bytes().to_vec();
        bytes.extend_from_slice(&0_u32.to_be_bytes());
        let result = read_tagged_message(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(ProtocolError::UnknownMessageType { code: 42 })));
    }

    #[test]
    fn test_truncated_message_means_peer_closed() {
        let bytes = build_tagged_message(MessageType::MoveRequest, &MoveRequest { position: 7 }).unwrap();
        let result = read_tagged_message(&mut Cursor::new(&bytes[..8]));
        assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));

        let mut buffer = [0; LEGACY_READ_SIZE];
        let result = read_legacy_chunk(&mut Cursor::new(Vec::new()), &mut buffer);
        assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
    }
}
