//! Binary codec for replication messages.
//!
//! bincode 2 in serde mode with the standard configuration. Snapshots are
//! validated after decoding so a bad enum index never reaches a body.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::snapshot::PacketData;
use crate::update::UpdatePacket;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("invalid value {value} for {field}")]
    InvalidValue { field: &'static str, value: u8 },
}

/// Encode a message to bytes.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(message, bincode::config::standard())?)
}

/// Decode a message from bytes.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let (message, _) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    Ok(message)
}

/// Decode a full snapshot and check its wire indices.
pub fn decode_packet(data: &[u8]) -> Result<PacketData, CodecError> {
    let packet: PacketData = decode(data)?;
    if let Err(err) = packet.validate() {
        log::warn!("snapshot rejected: {}", err);
        return Err(err);
    }
    Ok(packet)
}

/// Decode a delta update and check its wire indices.
pub fn decode_update(data: &[u8]) -> Result<UpdatePacket, CodecError> {
    let packet: UpdatePacket = decode(data)?;
    if let Err(err) = packet.validate() {
        log::warn!("update rejected: {}", err);
        return Err(err);
    }
    Ok(packet)
}
