//! Firmware file loading
//!
//! Application images are supplied as Intel HEX and flattened into one
//! contiguous binary; the optional init packet is sent as-is.

use std::path::Path;

use tracing::debug;

use crate::core::{error::FirmwareError, types::UpdateRequest};

/// Largest address range a single image may span
const MAX_IMAGE_SPAN: u32 = 4 * 1024 * 1024;

/// Filler for gaps between hex records (erased flash)
const GAP_FILL: u8 = 0xFF;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;
const RECORD_EXTENDED_SEGMENT: u8 = 0x02;
const RECORD_START_SEGMENT: u8 = 0x03;
const RECORD_EXTENDED_LINEAR: u8 = 0x04;
const RECORD_START_LINEAR: u8 = 0x05;

/// Firmware ready to be transferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    pub application: Vec<u8>,
    pub init_packet: Option<Vec<u8>>,
}

impl FirmwareImage {
    /// Read the files named by `request`
    pub async fn load(request: &UpdateRequest) -> Result<Self, FirmwareError> {
        let text = read(&request.hex_path).await?;
        let text = String::from_utf8_lossy(&text);
        let application = parse_intel_hex(&text)?;

        let init_packet = match &request.init_path {
            Some(path) => Some(read(path).await?),
            None => None,
        };

        debug!(
            application = application.len(),
            init = init_packet.as_ref().map(Vec::len),
            "Firmware loaded"
        );

        Ok(Self {
            application,
            init_packet,
        })
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, FirmwareError> {
    tokio::fs::read(path).await.map_err(|source| FirmwareError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Flatten Intel HEX text into a binary image starting at its lowest address
pub fn parse_intel_hex(text: &str) -> Result<Vec<u8>, FirmwareError> {
    let mut base: u32 = 0;
    let mut chunks: Vec<(u32, Vec<u8>)> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let invalid = |reason: &str| FirmwareError::InvalidRecord {
            line: line_number,
            reason: reason.to_string(),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let body = line
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing ':' start code"))?;
        let bytes = hex::decode(body).map_err(|e| invalid(&e.to_string()))?;

        if bytes.len() < 5 {
            return Err(invalid("record too short"));
        }
        let count = bytes[0] as usize;
        if bytes.len() != count + 5 {
            return Err(invalid("byte count does not match record length"));
        }
        if bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)) != 0 {
            return Err(invalid("checksum mismatch"));
        }

        let offset = u16::from_be_bytes([bytes[1], bytes[2]]) as u32;
        let data = &bytes[4..4 + count];

        match bytes[3] {
            RECORD_DATA => {
                let address = base + offset;
                if address.checked_add(count as u32).is_none() {
                    return Err(invalid("data runs past the end of the address space"));
                }
                chunks.push((address, data.to_vec()));
            }
            RECORD_EOF => break,
            RECORD_EXTENDED_SEGMENT | RECORD_EXTENDED_LINEAR => {
                if data.len() != 2 {
                    return Err(invalid("extended address record needs 2 data bytes"));
                }
                let value = u16::from_be_bytes([data[0], data[1]]) as u32;
                base = if bytes[3] == RECORD_EXTENDED_SEGMENT {
                    value << 4
                } else {
                    value << 16
                };
            }
            RECORD_START_SEGMENT | RECORD_START_LINEAR => {}
            other => return Err(invalid(&format!("unsupported record type {other:#04x}"))),
        }
    }

    let start = chunks
        .iter()
        .map(|(address, _)| *address)
        .min()
        .ok_or(FirmwareError::Empty)?;
    let end = chunks
        .iter()
        .map(|(address, data)| address + data.len() as u32)
        .max()
        .unwrap_or(start);

    if end - start > MAX_IMAGE_SPAN {
        return Err(FirmwareError::TooLarge(end - start));
    }

    let mut image = vec![GAP_FILL; (end - start) as usize];
    for (address, data) in chunks {
        let from = (address - start) as usize;
        image[from..from + data.len()].copy_from_slice(&data);
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SIMPLE_HEX: &str = "\
:0400000001020304F2
:00000001FF
";

    #[test]
    fn test_parse_single_record() {
        assert_eq!(parse_intel_hex(SIMPLE_HEX).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_fills_gaps() {
        let text = "\
:020000000102FB
:020004000304F3
:00000001FF
";
        assert_eq!(
            parse_intel_hex(text).unwrap(),
            vec![0x01, 0x02, 0xFF, 0xFF, 0x03, 0x04]
        );
    }

    #[test]
    fn test_parse_extended_linear_address() {
        let text = "\
:020000040001F9
:02000000AABB99
:00000001FF
";
        assert_eq!(parse_intel_hex(text).unwrap(), vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_parse_ignores_data_after_eof() {
        let text = format!("{SIMPLE_HEX}:0400000005060708E2\n");
        assert_eq!(parse_intel_hex(&text).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let err = parse_intel_hex(":0400000001020304F3\n").unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_missing_start_code() {
        let err = parse_intel_hex("0400000001020304F2\n").unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_length_mismatch() {
        let err = parse_intel_hex(":0500000001020304F2\n").unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidRecord { .. }));
    }

    #[test]
    fn test_parse_rejects_record_past_address_space() {
        let text = "\
:02000004FFFFFC
:10FFF800000102030405060708090A0B0C0D0E0F81
:00000001FF
";
        let err = parse_intel_hex(text).unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_oversized_span() {
        let text = "\
:0100000000FF
:020000040040BA
:0100000000FF
:00000001FF
";
        assert!(matches!(
            parse_intel_hex(text),
            Err(FirmwareError::TooLarge(0x0040_0001))
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            parse_intel_hex(":00000001FF\n"),
            Err(FirmwareError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_load_image_and_init_packet() {
        let mut hex_file = tempfile::NamedTempFile::new().unwrap();
        hex_file.write_all(SIMPLE_HEX.as_bytes()).unwrap();
        let mut init_file = tempfile::NamedTempFile::new().unwrap();
        init_file.write_all(&[0xDE, 0xAD]).unwrap();

        let request = UpdateRequest {
            peripheral_uuid: "AA".into(),
            hex_path: hex_file.path().to_path_buf(),
            init_path: Some(init_file.path().to_path_buf()),
        };

        let image = FirmwareImage::load(&request).await.unwrap();
        assert_eq!(
            image,
            FirmwareImage {
                application: vec![1, 2, 3, 4],
                init_packet: Some(vec![0xDE, 0xAD]),
            }
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let request = UpdateRequest {
            peripheral_uuid: "AA".into(),
            hex_path: dir.path().join("missing.hex"),
            init_path: None,
        };

        let err = FirmwareImage::load(&request).await.unwrap_err();
        assert!(matches!(err, FirmwareError::Io { .. }));
    }
}
