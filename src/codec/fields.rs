//! Fixed-position field reading and writing.
//!
//! Text fields are left justified and space padded, numeric fields right
//! justified and zero padded, matching the exchange buffer layouts in the
//! parent module.

use bytes::{BufMut, BytesMut};

use crate::error::{OftpError, Result};

/// Writes fixed-width fields into an exchange buffer.
pub(super) struct FieldWriter<'a> {
    buf: &'a mut BytesMut,
}

impl<'a> FieldWriter<'a> {
    pub(super) fn new(buf: &'a mut BytesMut) -> Self {
        Self { buf }
    }

    /// Write a text field, space padded or truncated to `width`.
    pub(super) fn text(&mut self, value: &str, width: usize) {
        let bytes = value.as_bytes();
        let take = bytes.len().min(width);
        self.buf.put_slice(&bytes[..take]);
        for _ in take..width {
            self.buf.put_u8(b' ');
        }
    }

    /// Write a numeric field, zero padded to `width`.
    ///
    /// Refuses values that do not fit rather than silently truncating.
    pub(super) fn num(&mut self, value: u64, width: usize) -> Result<()> {
        let digits = value.to_string();
        if digits.len() > width {
            return Err(OftpError::Codec(format!(
                "value {value} does not fit a {width}-digit field"
            )));
        }
        for _ in digits.len()..width {
            self.buf.put_u8(b'0');
        }
        self.buf.put_slice(digits.as_bytes());
        Ok(())
    }

    /// Write a single character field.
    pub(super) fn ch(&mut self, c: char) {
        self.buf.put_u8(c as u8);
    }

    /// Write a Y/N flag field.
    pub(super) fn flag(&mut self, value: bool) {
        self.buf.put_u8(if value { b'Y' } else { b'N' });
    }

    /// Write raw bytes without padding.
    pub(super) fn raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }
}

/// Reads fixed-width fields from an exchange buffer body.
pub(super) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(super) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8]> {
        let end = self.pos + width;
        if end > self.buf.len() {
            return Err(OftpError::Codec(format!(
                "exchange buffer truncated: wanted {width} bytes at offset {}, have {}",
                self.pos,
                self.buf.len() - self.pos
            )));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a text field, trimming the space padding.
    pub(super) fn text(&mut self, width: usize) -> Result<String> {
        let slice = self.take(width)?;
        let s = std::str::from_utf8(slice)
            .map_err(|_| OftpError::Codec("non-ASCII bytes in text field".to_string()))?;
        Ok(s.trim_end_matches(' ').to_string())
    }

    /// Read a zero padded numeric field.
    pub(super) fn num(&mut self, width: usize) -> Result<u64> {
        let slice = self.take(width)?;
        let s = std::str::from_utf8(slice)
            .map_err(|_| OftpError::Codec("non-ASCII bytes in numeric field".to_string()))?;
        s.trim_start_matches('0')
            .parse::<u64>()
            .or_else(|e| {
                // An all-zeros field trims to the empty string.
                if s.bytes().all(|b| b == b'0') && !s.is_empty() {
                    Ok(0)
                } else {
                    Err(OftpError::Codec(format!("invalid numeric field '{s}': {e}")))
                }
            })
    }

    /// Read a single character field.
    pub(super) fn ch(&mut self) -> Result<char> {
        Ok(self.take(1)?[0] as char)
    }

    /// Read a Y/N flag field.
    pub(super) fn flag(&mut self) -> Result<bool> {
        match self.take(1)?[0] {
            b'Y' => Ok(true),
            b'N' => Ok(false),
            other => Err(OftpError::Codec(format!(
                "invalid flag byte 0x{other:02X}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_pads_and_trims() {
        let mut buf = BytesMut::new();
        FieldWriter::new(&mut buf).text("ABC", 5);
        assert_eq!(&buf[..], b"ABC  ");

        let mut r = FieldReader::new(&buf);
        assert_eq!(r.text(5).unwrap(), "ABC");
    }

    #[test]
    fn test_num_field_zero_pads() {
        let mut buf = BytesMut::new();
        FieldWriter::new(&mut buf).num(42, 5).unwrap();
        assert_eq!(&buf[..], b"00042");

        let mut r = FieldReader::new(&buf);
        assert_eq!(r.num(5).unwrap(), 42);
    }

    #[test]
    fn test_num_field_all_zeros() {
        let mut r = FieldReader::new(b"000");
        assert_eq!(r.num(3).unwrap(), 0);
    }

    #[test]
    fn test_num_field_overflow_refused() {
        let mut buf = BytesMut::new();
        assert!(FieldWriter::new(&mut buf).num(123_456, 3).is_err());
    }

    #[test]
    fn test_reader_truncation() {
        let mut r = FieldReader::new(b"AB");
        assert!(r.text(5).is_err());
    }

    #[test]
    fn test_flag_roundtrip() {
        let mut buf = BytesMut::new();
        let mut w = FieldWriter::new(&mut buf);
        w.flag(true);
        w.flag(false);

        let mut r = FieldReader::new(&buf);
        assert!(r.flag().unwrap());
        assert!(!r.flag().unwrap());
        let mut bad = FieldReader::new(b"X");
        assert!(bad.flag().is_err());
    }
}
