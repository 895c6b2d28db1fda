//! Image dimension probing for PNG and JPEG files

use std::fs;
use std::path::Path;

/// Read `(width, height)` from a local PNG or JPEG file
pub fn image_dimensions(path: &Path) -> Option<(u32, u32)> {
    let bytes = fs::read(path).ok()?;
    dimensions_from_bytes(&bytes)
}

/// Parse dimensions from raw image bytes
pub fn dimensions_from_bytes(buf: &[u8]) -> Option<(u32, u32)> {
    png_dimensions(buf).or_else(|| jpeg_dimensions(buf))
}

/// 8-byte signature, 4-byte length, `IHDR`, then big-endian width and height
fn png_dimensions(buf: &[u8]) -> Option<(u32, u32)> {
    if buf.len() <= 24 || &buf[1..4] != b"PNG" {
        return None;
    }
    let width = u32::from_be_bytes(buf[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(buf[20..24].try_into().ok()?);
    (width > 0 && height > 0).then_some((width, height))
}

/// Walk the marker segments until a SOF0/SOF1/SOF2 frame header
fn jpeg_dimensions(buf: &[u8]) -> Option<(u32, u32)> {
    if buf.len() < 4 || buf[0] != 0xff || buf[1] != 0xd8 {
        return None;
    }

    let read_u16 = |at: usize| -> Option<u16> {
        let bytes = buf.get(at..at + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    };

    let mut offset = 2;
    while offset + 3 < buf.len() {
        if buf[offset] != 0xff {
            break;
        }
        let marker = buf[offset + 1];
        let len = read_u16(offset + 2)? as usize;

        if matches!(marker, 0xc0..=0xc2) {
            let height = read_u16(offset + 5)? as u32;
            let width = read_u16(offset + 7)? as u32;
            return (width > 0 && height > 0).then_some((width, height));
        }
        offset += 2 + len;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut buf = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        buf.extend_from_slice(&13u32.to_be_bytes());
        buf.extend_from_slice(b"IHDR");
        buf.extend_from_slice(&width.to_be_bytes());
        buf.extend_from_slice(&height.to_be_bytes());
        buf.extend_from_slice(&[8, 6, 0, 0, 0]);
        buf
    }

    fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
        let mut buf = vec![0xff, 0xd8];
        // APP0 segment with a 16-byte payload
        buf.extend_from_slice(&[0xff, 0xe0, 0x00, 0x10]);
        buf.extend_from_slice(&[0u8; 14]);
        // SOF0
        buf.extend_from_slice(&[0xff, 0xc0, 0x00, 0x11, 0x08]);
        buf.extend_from_slice(&height.to_be_bytes());
        buf.extend_from_slice(&width.to_be_bytes());
        buf.extend_from_slice(&[0u8; 10]);
        buf
    }

    #[test]
    fn test_png_dimensions() {
        assert_eq!(dimensions_from_bytes(&png_header(640, 480)), Some((640, 480)));
        assert_eq!(dimensions_from_bytes(&png_header(0, 480)), None);
    }

    #[test]
    fn test_jpeg_dimensions() {
        assert_eq!(
            dimensions_from_bytes(&jpeg_header(1200, 630)),
            Some((1200, 630))
        );
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(dimensions_from_bytes(b"GIF89a............................"), None);
        assert_eq!(dimensions_from_bytes(&[]), None);
    }

    #[test]
    fn test_image_dimensions_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, png_header(32, 16)).unwrap();
        assert_eq!(image_dimensions(&path), Some((32, 16)));
        assert_eq!(image_dimensions(&dir.path().join("missing.png")), None);
    }
}
