//! String decoding for BIFF5 and BIFF8 payloads.
//!
//! BIFF5 strings are raw 8-bit bytes in the workbook codepage. BIFF8 strings
//! carry a flag byte selecting compressed (1 byte per char) or wide UTF-16
//! storage, optionally followed by a rich-text run count and a phonetic block
//! size. Inside the shared string table a string may be cut at a record
//! boundary; the unread remainder is tracked as [`ContinuationDebt`] and paid
//! off by the following CONTINUE record.

use crate::record::ByteReader;
use encoding_rs::WINDOWS_1251;
use xls_core::Result;

const FLAG_WIDE: u8 = 0x01;
const FLAG_PHONETIC: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

/// Work left over when a string runs past the end of its record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContinuationDebt {
    /// Characters still to be read.
    pub chars: u16,
    /// Rich-text run count of the unfinished string.
    pub rich_runs: u16,
    /// Phonetic block size of the unfinished string.
    pub phonetic_bytes: u32,
    /// Formatting bytes still to be skipped after the characters.
    pub skip_bytes: u32,
}

impl ContinuationDebt {
    /// No characters and no trailing bytes owed.
    pub fn is_settled(&self) -> bool {
        self.chars == 0 && self.skip_bytes == 0
    }

    pub fn owes_chars(&self) -> bool {
        self.chars > 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Result of decoding a string from one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// All characters were read.
    Complete(String),
    /// The payload ended first; the debt records what is still owed.
    Partial(String),
}

impl Decoded {
    pub fn text(&self) -> &str {
        match self {
            Decoded::Complete(text) | Decoded::Partial(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Decoded::Complete(text) | Decoded::Partial(text) => text,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Decoded::Complete(_))
    }
}

/// Decodes strings in either BIFF5 or BIFF8 layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec {
    legacy: bool,
}

impl StringCodec {
    pub fn new(legacy: bool) -> Self {
        Self { legacy }
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// Decode a string of `chars` characters whose length prefix has already
    /// been read. `debt` must be settled; it is updated if the payload ends
    /// before the string does.
    pub fn decode(
        &self,
        r: &mut ByteReader<'_>,
        chars: u16,
        debt: &mut ContinuationDebt,
    ) -> Result<Decoded> {
        debt.clear();
        self.decode_chars(r, chars, debt)
    }

    /// Continue a string cut short by an earlier payload. In BIFF8 the
    /// continuation starts with a fresh flag byte that may switch width.
    pub fn resume(&self, r: &mut ByteReader<'_>, debt: &mut ContinuationDebt) -> Result<Decoded> {
        let chars = debt.chars;
        self.decode_chars(r, chars, debt)
    }

    /// Skip formatting bytes still owed by a completed string.
    pub fn pay_skip(&self, r: &mut ByteReader<'_>, debt: &mut ContinuationDebt) {
        let skipped = r.take_up_to(debt.skip_bytes as usize).len() as u32;
        debt.skip_bytes -= skipped;
    }

    /// Decode a string outside the shared string table. A string cut short
    /// is kept as far as it was read.
    pub fn read_string(&self, r: &mut ByteReader<'_>, chars: u16) -> Result<String> {
        let mut debt = ContinuationDebt::default();
        let decoded = self.decode(r, chars, &mut debt)?;
        if !decoded.is_complete() {
            log::debug!(
                "String in record 0x{:04X} cut short: {} of {} chars",
                r.record_id(),
                chars - debt.chars,
                chars
            );
        } else if debt.skip_bytes > 0 {
            log::debug!(
                "String in record 0x{:04X} missing {} formatting bytes",
                r.record_id(),
                debt.skip_bytes
            );
        }
        Ok(decoded.into_text())
    }

    /// String with an 8-bit character count.
    pub fn read_short_string(&self, r: &mut ByteReader<'_>) -> Result<String> {
        let chars = r.read_u8()?;
        self.read_string(r, u16::from(chars))
    }

    /// String with a 16-bit character count.
    pub fn read_long_string(&self, r: &mut ByteReader<'_>) -> Result<String> {
        let chars = r.read_u16()?;
        self.read_string(r, chars)
    }

    fn decode_chars(
        &self,
        r: &mut ByteReader<'_>,
        chars: u16,
        debt: &mut ContinuationDebt,
    ) -> Result<Decoded> {
        let wide = if self.legacy {
            false
        } else {
            let flags = r.read_u8()?;
            if flags & FLAG_RICH != 0 {
                debt.rich_runs = r.read_u16()?;
            }
            if flags & FLAG_PHONETIC != 0 {
                debt.phonetic_bytes = r.read_u32()?;
            }
            flags & FLAG_WIDE != 0
        };

        let width = if wide { 2 } else { 1 };
        let available = (r.remaining() / width).min(chars as usize);
        let bytes = r.take_up_to(available * width);
        let text = if self.legacy {
            decode_cp1251(bytes)
        } else if wide {
            decode_utf16le(bytes)
        } else {
            decode_compressed(bytes)
        };

        if available < chars as usize {
            debt.chars = chars - available as u16;
            return Ok(Decoded::Partial(text));
        }

        let run_size = if self.legacy { 2 } else { 4 };
        let trailing = u32::from(debt.rich_runs) * run_size + debt.phonetic_bytes;
        debt.clear();
        let skipped = r.take_up_to(trailing as usize).len() as u32;
        debt.skip_bytes = trailing - skipped;

        Ok(Decoded::Complete(text))
    }
}

/// Codepage 1251 bytes to Unicode.
pub fn decode_cp1251(bytes: &[u8]) -> String {
    WINDOWS_1251.decode_without_bom_handling(bytes).0.into_owned()
}

/// Compressed BIFF8 text: each byte is the low half of a UTF-16 unit.
fn decode_compressed(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_compressed_string() {
        let data = [0x00, b'a', b'b', 0xE9];
        let mut r = ByteReader::new(0x0204, &data);
        let codec = StringCodec::new(false);
        assert_eq!(codec.read_string(&mut r, 3).unwrap(), "abé");
        assert!(r.is_empty());
    }

    #[test]
    fn test_wide_string() {
        let mut data = vec![0x01];
        data.extend(utf16("Ωmega"));
        let mut r = ByteReader::new(0x0204, &data);
        let codec = StringCodec::new(false);
        assert_eq!(codec.read_string(&mut r, 5).unwrap(), "Ωmega");
    }

    #[test]
    fn test_legacy_cp1251_string() {
        let data = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        let mut r = ByteReader::new(0x0204, &data);
        let codec = StringCodec::new(true);
        assert_eq!(codec.read_string(&mut r, 6).unwrap(), "Привет");
    }

    #[test]
    fn test_rich_and_phonetic_blocks_are_skipped() {
        let mut data = vec![FLAG_RICH | FLAG_PHONETIC];
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(b"hi");
        data.extend_from_slice(&[0xAA; 8]);
        data.extend_from_slice(&[0xBB; 3]);
        data.push(0x42);

        let mut r = ByteReader::new(0x00FC, &data);
        let mut debt = ContinuationDebt::default();
        let decoded = StringCodec::new(false).decode(&mut r, 2, &mut debt).unwrap();
        assert_eq!(decoded, Decoded::Complete("hi".to_string()));
        assert!(debt.is_settled());
        assert_eq!(r.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_partial_then_resume_with_width_switch() {
        let codec = StringCodec::new(false);
        let mut debt = ContinuationDebt::default();

        let first = [0x00, b'H', b'e', b'l'];
        let mut r = ByteReader::new(0x00FC, &first);
        let decoded = codec.decode(&mut r, 6, &mut debt).unwrap();
        assert_eq!(decoded, Decoded::Partial("Hel".to_string()));
        assert_eq!(debt.chars, 3);

        let mut second = vec![0x01];
        second.extend(utf16("lö!"));
        let mut r = ByteReader::new(0x003C, &second);
        let decoded = codec.resume(&mut r, &mut debt).unwrap();
        assert_eq!(decoded, Decoded::Complete("lö!".to_string()));
        assert!(debt.is_settled());
    }

    #[test]
    fn test_rich_runs_carry_across_split() {
        let codec = StringCodec::new(false);
        let mut debt = ContinuationDebt::default();

        let mut first = vec![FLAG_RICH];
        first.extend_from_slice(&1u16.to_le_bytes());
        first.push(b'a');
        let mut r = ByteReader::new(0x00FC, &first);
        assert!(!codec.decode(&mut r, 2, &mut debt).unwrap().is_complete());
        assert_eq!(debt.rich_runs, 1);

        // Continuation: flag byte, last char, then 2 of the 4 run bytes.
        let second = [0x00, b'b', 0x01, 0x02];
        let mut r = ByteReader::new(0x003C, &second);
        let decoded = codec.resume(&mut r, &mut debt).unwrap();
        assert_eq!(decoded.text(), "b");
        assert_eq!(debt.skip_bytes, 2);
        assert!(!debt.owes_chars());

        let third = [0x03, 0x04, 0x07];
        let mut r = ByteReader::new(0x003C, &third);
        codec.pay_skip(&mut r, &mut debt);
        assert!(debt.is_settled());
        assert_eq!(r.read_u8().unwrap(), 0x07);
    }

    #[test]
    fn test_phonetic_size_carries_across_split() {
        let codec = StringCodec::new(false);
        let mut debt = ContinuationDebt::default();

        let mut first = vec![FLAG_PHONETIC];
        first.extend_from_slice(&5u32.to_le_bytes());
        first.push(b'x');
        let mut r = ByteReader::new(0x00FC, &first);
        assert!(!codec.decode(&mut r, 2, &mut debt).unwrap().is_complete());
        assert_eq!(debt.phonetic_bytes, 5);

        let second = [0x00, b'y', 0xA1];
        let mut r = ByteReader::new(0x003C, &second);
        assert_eq!(codec.resume(&mut r, &mut debt).unwrap().text(), "y");
        assert_eq!(debt.skip_bytes, 4);

        // The skip runs out mid-record once, then settles.
        let third = [0xA2, 0xA3];
        let mut r = ByteReader::new(0x003C, &third);
        codec.pay_skip(&mut r, &mut debt);
        assert_eq!(debt.skip_bytes, 2);
        assert!(r.is_empty());

        let fourth = [0xA4, 0xA5, 0x07];
        let mut r = ByteReader::new(0x003C, &fourth);
        codec.pay_skip(&mut r, &mut debt);
        assert!(debt.is_settled());
        assert_eq!(r.read_u8().unwrap(), 0x07);
    }

    #[test]
    fn test_short_string_outside_table_keeps_prefix() {
        let data = [0x05, 0x00, b'a', b'b'];
        let mut r = ByteReader::new(0x0031, &data);
        let codec = StringCodec::new(false);
        assert_eq!(codec.read_short_string(&mut r).unwrap(), "ab");
    }

    #[test]
    fn test_empty_string() {
        let data = [0x00, 0x00, 0x00];
        let mut r = ByteReader::new(0x00FC, &data);
        let codec = StringCodec::new(false);
        assert_eq!(codec.read_long_string(&mut r).unwrap(), "");
        assert!(r.is_empty());
    }
}
