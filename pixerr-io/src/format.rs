//! Binary layout of `PXER` event files.
//!
//! Header (16 bytes): magic `b"PXER"`, `u32` version, `u64` entry count.
//! Records (12 bytes each, little-endian):
//! `u32 event, u8 chip, u8 col, u8 row, u8 buffer_corruption,
//! u8 invalid_address, u8 invalid_pulse_height, u16 reserved`.

use crate::{Error, Result};
use pixerr_core::HitRecord;

pub(crate) const MAGIC: [u8; 4] = *b"PXER";
pub(crate) const VERSION: u32 = 1;
pub(crate) const HEADER_LEN: usize = 16;
pub(crate) const RECORD_LEN: usize = 12;

pub(crate) fn encode_header(entries: u64) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[0..4].copy_from_slice(&MAGIC);
    out[4..8].copy_from_slice(&VERSION.to_le_bytes());
    out[8..16].copy_from_slice(&entries.to_le_bytes());
    out
}

/// Validates the header and returns the entry count.
pub(crate) fn decode_header(bytes: &[u8]) -> Result<u64> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidFormat(format!(
            "file of {} bytes is shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(Error::InvalidFormat("missing PXER magic".to_string()));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != VERSION {
        return Err(Error::InvalidFormat(format!(
            "unsupported version {version}, expected {VERSION}"
        )));
    }
    let mut entries = [0u8; 8];
    entries.copy_from_slice(&bytes[8..16]);
    Ok(u64::from_le_bytes(entries))
}

pub(crate) fn encode_record(hit: &HitRecord) -> [u8; RECORD_LEN] {
    let mut out = [0u8; RECORD_LEN];
    out[0..4].copy_from_slice(&hit.event.to_le_bytes());
    out[4] = hit.chip;
    out[5] = hit.col;
    out[6] = hit.row;
    out[7] = hit.buffer_corruption;
    out[8] = hit.invalid_address;
    out[9] = hit.invalid_pulse_height;
    out
}

/// Decodes one record. `chunk` must hold at least `RECORD_LEN` bytes.
#[inline]
pub(crate) fn decode_record(chunk: &[u8]) -> HitRecord {
    HitRecord {
        event: u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
        chip: chunk[4],
        col: chunk[5],
        row: chunk[6],
        buffer_corruption: chunk[7],
        invalid_address: chunk[8],
        invalid_pulse_height: chunk[9],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixerr_core::ErrorKind;

    #[test]
    fn test_record_layout() {
        let hit = HitRecord::new(0x0102_0304, 7, 51, 79).with_error(ErrorKind::InvalidPulseHeight, 3);
        let bytes = encode_record(&hit);
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(bytes[9], 3);
        assert_eq!(&bytes[10..12], &[0, 0]);
        assert_eq!(decode_record(&bytes), hit);
    }

    #[test]
    fn test_header_validation() {
        let header = encode_header(1_000_000);
        assert_eq!(decode_header(&header).unwrap(), 1_000_000);

        let mut bad_magic = header;
        bad_magic[0] = b'X';
        assert!(decode_header(&bad_magic).is_err());

        let mut bad_version = header;
        bad_version[4] = 9;
        assert!(decode_header(&bad_version).is_err());

        assert!(decode_header(&header[..8]).is_err());
    }
}
