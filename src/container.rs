/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The binary delta container.
//!
//! Big-endian, byte-addressed. The header is the 4-byte magic, one
//! flags byte, the version size as a `u32`, and two CRC-64/XZ integrity
//! hashes; command records follow in execution order, closed by a
//! mandatory END record:
//!
//! ```text
//! +0   4  magic = "DLT\x03"
//! +4   1  flags (bit 0 = in-place)
//! +5   4  version_size: u32
//! +9   8  src_hash: u64
//! +17  8  dst_hash: u64
//! ```
//!
//! | type | name | payload                        | size       |
//! |------|------|--------------------------------|------------|
//! | 0    | END  | —                              | 1          |
//! | 1    | COPY | `src: u32, dst: u32, len: u32` | 13         |
//! | 2    | ADD  | `dst: u32, len: u32, data`     | 9 + len    |
//!
//! The decoder rejects a wrong magic, unknown record types, and streams
//! that end mid-record; it returns the hash fields without verifying
//! them, which is the caller's responsibility.

use bitflags::bitflags;

use crate::cmds::PlacedCommand;
use crate::error::{DeltaError, Result};

/// Magic bytes opening every delta container.
pub const MAGIC: [u8; 4] = *b"DLT\x03";

/// Size in bytes of each integrity hash field.
pub const HASH_SIZE: usize = 8;

/// Total header size: magic, flags, version size and two hashes.
pub const HEADER_SIZE: usize = 9 + 2 * HASH_SIZE;

const END: u8 = 0;
const COPY: u8 = 1;
const ADD: u8 = 2;

bitflags! {
    /// The flags byte of the container header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeltaFlags: u8 {
        /// The command stream must be applied in place.
        const IN_PLACE = 1;
    }
}

/// A decoded delta: header fields plus the placed command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub commands: Vec<PlacedCommand>,
    pub in_place: bool,
    pub version_size: u32,
    pub src_hash: u64,
    pub dst_hash: u64,
}

/// Encodes a placed stream into a delta container.
///
/// Fails with [`DeltaError::BadParameter`] if any offset, length or the
/// version size does not fit in a `u32`.
pub fn encode_delta(
    commands: &[PlacedCommand],
    in_place: bool,
    version_size: usize,
    src_hash: u64,
    dst_hash: u64,
) -> Result<Vec<u8>> {
    let payload: usize = commands
        .iter()
        .map(|cmd| match cmd {
            PlacedCommand::Copy { .. } => 13,
            PlacedCommand::Add { data, .. } => 9 + data.len(),
        })
        .sum();
    let mut out = Vec::with_capacity(HEADER_SIZE + payload + 1);
    out.extend_from_slice(&MAGIC);
    let flags = if in_place {
        DeltaFlags::IN_PLACE
    } else {
        DeltaFlags::empty()
    };
    out.push(flags.bits());
    out.extend_from_slice(&field(version_size, "version size")?.to_be_bytes());
    out.extend_from_slice(&src_hash.to_be_bytes());
    out.extend_from_slice(&dst_hash.to_be_bytes());
    for cmd in commands {
        match cmd {
            PlacedCommand::Copy { src, dst, len } => {
                out.push(COPY);
                out.extend_from_slice(&field(*src, "copy source")?.to_be_bytes());
                out.extend_from_slice(&field(*dst, "copy destination")?.to_be_bytes());
                out.extend_from_slice(&field(*len, "copy length")?.to_be_bytes());
            }
            PlacedCommand::Add { dst, data } => {
                out.push(ADD);
                out.extend_from_slice(&field(*dst, "add destination")?.to_be_bytes());
                out.extend_from_slice(&field(data.len(), "add length")?.to_be_bytes());
                out.extend_from_slice(data);
            }
        }
    }
    out.push(END);
    Ok(out)
}

fn field(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| DeltaError::BadParameter(format!("{} {} does not fit in a u32", what, value)))
}

/// Decodes a delta container.
pub fn decode_delta(bytes: &[u8]) -> Result<Delta> {
    let mut reader = Reader { bytes, pos: 0 };
    if reader.take(4, "magic")? != MAGIC {
        return Err(DeltaError::BadFormat("magic mismatch".into()));
    }
    let flags = DeltaFlags::from_bits(reader.take_u8("flags")?)
        .ok_or_else(|| DeltaError::BadFormat("unknown flag bits".into()))?;
    let version_size = reader.take_u32("version size")?;
    let src_hash = reader.take_u64("source hash")?;
    let dst_hash = reader.take_u64("destination hash")?;
    let mut commands = Vec::new();
    loop {
        match reader.take_u8("record type")? {
            END => break,
            COPY => {
                let src = reader.take_u32("copy source")? as usize;
                let dst = reader.take_u32("copy destination")? as usize;
                let len = reader.take_u32("copy length")? as usize;
                commands.push(PlacedCommand::Copy { src, dst, len });
            }
            ADD => {
                let dst = reader.take_u32("add destination")? as usize;
                let len = reader.take_u32("add length")? as usize;
                let data = reader.take(len, "add data")?.to_vec();
                commands.push(PlacedCommand::Add { dst, data });
            }
            unknown => {
                return Err(DeltaError::BadFormat(format!(
                    "unknown record type {} at offset {}",
                    unknown,
                    reader.pos - 1
                )));
            }
        }
    }
    Ok(Delta {
        commands,
        in_place: flags.contains(DeltaFlags::IN_PLACE),
        version_size,
        src_hash,
        dst_hash,
    })
}

/// Probes the header without decoding the command stream.
pub fn is_inplace_delta(bytes: &[u8]) -> bool {
    bytes.len() > 4
        && bytes[..4] == MAGIC
        && DeltaFlags::from_bits_truncate(bytes[4]).contains(DeltaFlags::IN_PLACE)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.pos + len > self.bytes.len() {
            return Err(DeltaError::BadFormat(format!(
                "truncated {} at offset {}",
                what, self.pos
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn take_u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4, what)?.try_into().unwrap()))
    }

    fn take_u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take(8, what)?.try_into().unwrap()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_stream_is_header_plus_end() {
        let delta = encode_delta(&[], false, 0, 0, 0).unwrap();
        assert_eq!(delta.len(), HEADER_SIZE + 1);
        assert_eq!(&delta[..4], &MAGIC);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut delta = encode_delta(&[], false, 0, 0, 0).unwrap();
        delta[0] = b'X';
        assert!(matches!(
            decode_delta(&delta),
            Err(DeltaError::BadFormat(_))
        ));
    }

    #[test]
    fn test_rejects_truncation() {
        let delta = encode_delta(
            &[PlacedCommand::Add {
                dst: 0,
                data: b"payload".to_vec(),
            }],
            false,
            7,
            1,
            2,
        )
        .unwrap();
        for len in 0..delta.len() {
            assert!(
                matches!(decode_delta(&delta[..len]), Err(DeltaError::BadFormat(_))),
                "prefix of {} bytes should be rejected",
                len
            );
        }
    }

    #[test]
    fn test_rejects_unknown_record_type() {
        let mut delta = encode_delta(&[], false, 0, 0, 0).unwrap();
        delta[HEADER_SIZE] = 7;
        delta.push(END);
        assert!(matches!(
            decode_delta(&delta),
            Err(DeltaError::BadFormat(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_field() {
        let result = encode_delta(&[], false, 1 << 33, 0, 0);
        assert!(matches!(result, Err(DeltaError::BadParameter(_))));
    }

    #[test]
    fn test_inplace_probe() {
        let standard = encode_delta(&[], false, 0, 0, 0).unwrap();
        let inplace = encode_delta(&[], true, 0, 0, 0).unwrap();
        assert!(!is_inplace_delta(&standard));
        assert!(is_inplace_delta(&inplace));
        assert!(!is_inplace_delta(b"DLT"));
    }
}
