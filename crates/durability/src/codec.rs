//! Enqueue record codec
//!
//! ## Format
//!
//! ```text
//! [id_len: u32 BE][id: id_len bytes][payload: remaining bytes]
//! ```
//!
//! The payload length is implicit: it is whatever follows the id. Dispatch and
//! Acknowledge records need no codec, their data is the raw id bytes.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use stratq_core::{QueueError, QueueResult};

/// Size of the id length prefix
pub const ID_LEN_PREFIX_SIZE: usize = 4;

/// Encode an Enqueue record payload
///
/// # Errors
///
/// Returns `MalformedRecord` if the id is longer than `u32::MAX` bytes.
pub fn encode_enqueue(id: &str, payload: &str) -> QueueResult<Vec<u8>> {
    let id_len = u32::try_from(id.len())
        .map_err(|_| QueueError::malformed(format!("job id of {} bytes", id.len())))?;

    let mut buf = Vec::with_capacity(ID_LEN_PREFIX_SIZE + id.len() + payload.len());
    buf.write_u32::<BigEndian>(id_len)?;
    buf.extend_from_slice(id.as_bytes());
    buf.extend_from_slice(payload.as_bytes());
    Ok(buf)
}

/// Decode an Enqueue record payload into `(id, payload)`
///
/// # Errors
///
/// Returns `MalformedRecord` if fewer than 4 bytes are available for the
/// length prefix, if the declared id length exceeds the remaining bytes, or
/// if the id or payload is not valid UTF-8.
pub fn decode_enqueue(data: &[u8]) -> QueueResult<(String, String)> {
    if data.len() < ID_LEN_PREFIX_SIZE {
        return Err(QueueError::malformed(format!(
            "enqueue record of {} bytes has no id length prefix",
            data.len()
        )));
    }

    let id_len = BigEndian::read_u32(&data[..ID_LEN_PREFIX_SIZE]) as usize;
    let rest = &data[ID_LEN_PREFIX_SIZE..];
    if id_len > rest.len() {
        return Err(QueueError::malformed(format!(
            "enqueue id length {} exceeds remaining {} bytes",
            id_len,
            rest.len()
        )));
    }

    let (id, payload) = rest.split_at(id_len);
    let id = std::str::from_utf8(id)
        .map_err(|e| QueueError::malformed(format!("enqueue id is not UTF-8: {}", e)))?;
    let payload = std::str::from_utf8(payload)
        .map_err(|e| QueueError::malformed(format!("enqueue payload is not UTF-8: {}", e)))?;

    Ok((id.to_string(), payload.to_string()))
}
