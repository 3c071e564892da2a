//! FourCC tags used throughout the RIFF/AVI structure.

use std::fmt;

/// Four-character code, stored as the little-endian u32 that appears in the
/// file. Equality and hashing are on the 32-bit value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(u32);

impl FourCC {
    /// Create from the literal byte sequence as stored in the file.
    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCC(u32::from_le_bytes(bytes))
    }

    /// Create from the 32-bit value (file byte order).
    pub const fn from_u32(value: u32) -> Self {
        FourCC(value)
    }

    /// Create from an ASCII string of 1 to 4 bytes, right-padded with spaces.
    pub fn from_str(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > 4 || !s.is_ascii() {
            return None;
        }
        let mut bytes = *b"    ";
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Some(FourCC::new(bytes))
    }

    /// Get the 32-bit value (file byte order).
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Get the raw bytes as stored in the file.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Get as a 4-character string.
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).to_string()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", self.as_str())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<u32> for FourCC {
    fn from(value: u32) -> Self {
        FourCC(value)
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC::new(bytes)
    }
}

/// Well-known container tags.
pub mod tags {
    use super::FourCC;

    pub const RIFF: FourCC = FourCC::new(*b"RIFF");
    pub const LIST: FourCC = FourCC::new(*b"LIST");
    pub const AVI: FourCC = FourCC::new(*b"AVI ");
    pub const AVIX: FourCC = FourCC::new(*b"AVIX");
    pub const HDRL: FourCC = FourCC::new(*b"hdrl");
    pub const AVIH: FourCC = FourCC::new(*b"avih");
    pub const STRL: FourCC = FourCC::new(*b"strl");
    pub const STRH: FourCC = FourCC::new(*b"strh");
    pub const STRF: FourCC = FourCC::new(*b"strf");
    pub const STRN: FourCC = FourCC::new(*b"strn");
    pub const INDX: FourCC = FourCC::new(*b"indx");
    pub const ODML: FourCC = FourCC::new(*b"odml");
    pub const DMLH: FourCC = FourCC::new(*b"dmlh");
    pub const MOVI: FourCC = FourCC::new(*b"movi");
    pub const IDX1: FourCC = FourCC::new(*b"idx1");
    pub const JUNK: FourCC = FourCC::new(*b"JUNK");
    pub const VIDS: FourCC = FourCC::new(*b"vids");
    pub const AUDS: FourCC = FourCC::new(*b"auds");
}

/// Common video codec FourCCs.
pub mod codecs {
    use super::FourCC;

    /// Uncompressed device-independent bitmap (BI_RGB).
    pub const UNCOMPRESSED: FourCC = FourCC::from_u32(0);
    /// Motion JPEG.
    pub const MJPG: FourCC = FourCC::new(*b"MJPG");
    /// MPEG-4 part 2 variants.
    pub const XVID: FourCC = FourCC::new(*b"XVID");
    pub const DIVX: FourCC = FourCC::new(*b"DIVX");
    pub const DX50: FourCC = FourCC::new(*b"DX50");
    pub const FMP4: FourCC = FourCC::new(*b"FMP4");
    pub const MP4V: FourCC = FourCC::new(*b"MP4V");
    /// H.264.
    pub const H264: FourCC = FourCC::new(*b"H264");
    pub const X264: FourCC = FourCC::new(*b"X264");
    /// Packed YUV.
    pub const YUY2: FourCC = FourCC::new(*b"YUY2");
    pub const UYVY: FourCC = FourCC::new(*b"UYVY");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_roundtrip() {
        let tag = FourCC::new(*b"RIFF");
        assert_eq!(FourCC::from_u32(tag.to_u32()), tag);
        assert_eq!(FourCC::new(tag.to_bytes()), tag);
        assert_eq!(tag.as_str(), "RIFF");
    }

    #[test]
    fn test_fourcc_from_str_pads_with_spaces() {
        assert_eq!(FourCC::from_str("AVI"), Some(FourCC::new(*b"AVI ")));
        assert_eq!(FourCC::from_str("dc"), Some(FourCC::new(*b"dc  ")));
        assert_eq!(FourCC::from_str("avih"), Some(tags::AVIH));
        assert_eq!(FourCC::from_str("avih").map(|t| t.as_str().len()), Some(4));
    }

    #[test]
    fn test_fourcc_from_str_rejects_bad_input() {
        assert_eq!(FourCC::from_str(""), None);
        assert_eq!(FourCC::from_str("toolong"), None);
        assert_eq!(FourCC::from_str("héllo"), None);
    }

    #[test]
    fn test_fourcc_equality_is_on_value() {
        assert_eq!(FourCC::from_u32(0x46464952), tags::RIFF);
        assert_ne!(tags::AVI, tags::AVIX);
    }

    #[test]
    fn test_display() {
        assert_eq!(tags::MOVI.to_string(), "movi");
        assert_eq!(format!("{:?}", tags::JUNK), "FourCC(\"JUNK\")");
    }
}
