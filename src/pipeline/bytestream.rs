//! The framed bytestream: a flat concatenation of blobs, each prefixed by
//! its little-endian u32 length. There is no magic and no checksum; the
//! external configuration is the sole authority on what the blobs mean.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CodecError, Result};

/// Appends `uint32 lengthLE ‖ payload` to the bytestream.
pub fn append_blob(bytestream: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        CodecError::InvalidConfiguration(format!(
            "blob of {} bytes exceeds the 32-bit frame",
            payload.len()
        ))
    })?;
    let mut prefix = [0u8; 4];
    LittleEndian::write_u32(&mut prefix, length);
    bytestream.extend_from_slice(&prefix);
    bytestream.extend_from_slice(payload);
    Ok(())
}

/// Walks the blobs of a framed bytestream.
pub struct BlobReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BlobReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns the next blob's payload.
    pub fn next_blob(&mut self) -> Result<&'a [u8]> {
        if self.position + 4 > self.data.len() {
            return Err(CodecError::Truncated(format!(
                "blob length prefix at offset {} past end of {}-byte stream",
                self.position,
                self.data.len()
            )));
        }
        let length = LittleEndian::read_u32(&self.data[self.position..]) as usize;
        self.position += 4;
        if self.position + length > self.data.len() {
            return Err(CodecError::Truncated(format!(
                "blob of {} bytes at offset {} past end of {}-byte stream",
                length,
                self.position,
                self.data.len()
            )));
        }
        let payload = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(payload)
    }

    /// True once every byte has been consumed.
    pub fn finished(&self) -> bool {
        self.position >= self.data.len()
    }
}
