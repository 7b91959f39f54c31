//! Primitive payload encodings shared by all messages.

use bincode::{
    config::{BigEndian, Configuration, Fixint, Limit},
    de::{read::Reader, BorrowDecoder, Decoder},
    decode_from_slice,
    enc::{write::Writer, Encoder},
    encode_to_vec,
    error::{DecodeError, EncodeError},
    BorrowDecode, Decode, Encode,
};
use glam::DVec2;
use pf_geom::ObjectId;

use crate::frame::MAX_PAYLOAD_SIZE;

/// Payloads are big-endian with fixed width integers so that they are
/// compatible with Java `DataOutputStream` based peers.
const BINCODE_CONF: Configuration<BigEndian, Fixint, Limit<MAX_PAYLOAD_SIZE>> =
    bincode::config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
        .with_limit::<MAX_PAYLOAD_SIZE>();

pub(crate) fn encode_payload<E: Encode>(payload: &E) -> Result<Vec<u8>, EncodeError> {
    encode_to_vec(payload, BINCODE_CONF)
}

/// Decodes a payload. Trailing bytes are ignored.
pub(crate) fn decode_payload<D: Decode>(data: &[u8]) -> Result<D, DecodeError> {
    decode_from_slice(data, BINCODE_CONF).map(|(payload, _)| payload)
}

/// Object ID encoded as its most significant and least significant 64 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ObjectIdNet {
    msb: u64,
    lsb: u64,
}

impl From<ObjectId> for ObjectIdNet {
    fn from(id: ObjectId) -> Self {
        let (msb, lsb) = id.halves();
        Self { msb, lsb }
    }
}

impl From<ObjectIdNet> for ObjectId {
    fn from(id: ObjectIdNet) -> Self {
        Self::from_halves(id.msb, id.lsb)
    }
}

/// A position in metres.
#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct Vec2Net {
    x: f64,
    y: f64,
}

impl From<DVec2> for Vec2Net {
    fn from(vec: DVec2) -> Self {
        Self { x: vec.x, y: vec.y }
    }
}

impl From<Vec2Net> for DVec2 {
    fn from(vec: Vec2Net) -> Self {
        Self::new(vec.x, vec.y)
    }
}

/// UTF-8 string prefixed by its `u16` length in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrNet(String);

impl StrNet {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Encode for StrNet {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        let len = u16::try_from(self.0.len()).map_err(|_| EncodeError::Other("string too long"))?;
        len.encode(encoder)?;
        encoder.writer().write(self.0.as_bytes())
    }
}

impl Decode for StrNet {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        let len = usize::from(u16::decode(decoder)?);
        decoder.claim_bytes_read(len)?;
        let mut bytes = vec![0; len];
        decoder.reader().read(&mut bytes)?;
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|_| DecodeError::Other("string is not valid UTF-8"))
    }
}

impl<'de> BorrowDecode<'de> for StrNet {
    fn borrow_decode<D: BorrowDecoder<'de>>(decoder: &mut D) -> Result<Self, DecodeError> {
        Self::decode(decoder)
    }
}

/// A sequence of items prefixed by its `i32` length.
#[derive(Clone, Debug, PartialEq)]
pub struct SeqNet<T>(Vec<T>);

impl<T> SeqNet<T> {
    pub fn items(&self) -> &[T] {
        self.0.as_slice()
    }

    pub fn into_items(self) -> Vec<T> {
        self.0
    }
}

impl<T> From<Vec<T>> for SeqNet<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for SeqNet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Encode> Encode for SeqNet<T> {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        let len = i32::try_from(self.0.len()).map_err(|_| EncodeError::Other("sequence too long"))?;
        len.encode(encoder)?;
        for item in &self.0 {
            item.encode(encoder)?;
        }
        Ok(())
    }
}

impl<T: Decode> Decode for SeqNet<T> {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        let len = i32::decode(decoder)?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Other("negative sequence length"))?;

        // The length is not trusted, items are read until the input ends.
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(T::decode(decoder)?);
        }
        Ok(Self(items))
    }
}

impl<'de, T: Decode> BorrowDecode<'de> for SeqNet<T> {
    fn borrow_decode<D: BorrowDecoder<'de>>(decoder: &mut D) -> Result<Self, DecodeError> {
        Self::decode(decoder)
    }
}
