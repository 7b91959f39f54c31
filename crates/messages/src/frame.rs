//! Framing of the message bus byte stream.
//!
//! Each frame is laid out as `u16` name length, UTF-8 name, `i32` payload
//! length and the payload. All integers are big-endian.

use thiserror::Error;

/// Frames with a longer payload are rejected.
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// A single named message with an opaque payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    name: String,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Creates a frame with an empty payload.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Serializes the frame into bytes ready to be written to the stream.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut bytes = Vec::with_capacity(6 + self.name.len() + self.data.len());
        write_str(&mut bytes, &self.name)?;

        if self.data.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge(self.data.len()));
        }
        bytes.extend((self.data.len() as i32).to_be_bytes());
        bytes.extend(&self.data);
        Ok(bytes)
    }
}

/// Writes a string prefixed by its `u16` length in bytes.
pub fn write_str(bytes: &mut Vec<u8>, text: &str) -> Result<(), FrameError> {
    let len = u16::try_from(text.len()).map_err(|_| FrameError::NameTooLong(text.len()))?;
    bytes.extend(len.to_be_bytes());
    bytes.extend(text.as_bytes());
    Ok(())
}

/// Incremental decoder of frames from a byte stream.
///
/// Received bytes are appended with [`Self::extend`] in chunks of arbitrary
/// size and complete frames are taken out with [`Self::decode`].
#[derive(Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet decoded into a frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Decodes and removes the next frame from the buffer.
    ///
    /// Returns `Ok(None)` if the buffer does not contain a complete frame
    /// yet. After an error, the stream is corrupted and the decoder should
    /// not be used anymore.
    pub fn decode(&mut self) -> Result<Option<Frame>, FrameError> {
        let Some(name_len) = self.buffer.get(0..2) else {
            return Ok(None);
        };
        let name_len = usize::from(u16::from_be_bytes([name_len[0], name_len[1]]));

        let header_len = 2 + name_len + 4;
        let Some(data_len) = self.buffer.get(2 + name_len..header_len) else {
            return Ok(None);
        };
        let data_len = i32::from_be_bytes([data_len[0], data_len[1], data_len[2], data_len[3]]);
        let data_len = usize::try_from(data_len).map_err(|_| FrameError::NegativeLength(data_len))?;
        if data_len > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge(data_len));
        }

        let frame_len = header_len + data_len;
        if self.buffer.len() < frame_len {
            return Ok(None);
        }

        let name = std::str::from_utf8(&self.buffer[2..2 + name_len])
            .map_err(|_| FrameError::InvalidName)?
            .to_owned();
        let data = self.buffer[header_len..frame_len].to_vec();
        self.buffer.drain(..frame_len);
        Ok(Some(Frame::new(name, data)))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("message name of {0} bytes is too long")]
    NameTooLong(usize),
    #[error("message name is not valid UTF-8")]
    InvalidName,
    #[error("negative payload length {0}")]
    NegativeLength(i32),
    #[error("payload of {0} bytes is too large")]
    PayloadTooLarge(usize),
}
