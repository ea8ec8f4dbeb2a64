//! JPEG marker type codes.
//!
//! A marker is the byte pair `0xFF <type>`. [`Marker`] wraps the type byte;
//! the named constants cover the codes this crate classifies. Any other code
//! is still a valid, length-prefixed segment, it just has no name.

use std::fmt;

/// First byte of every marker
pub const MARKER_PREFIX: u8 = 0xFF;

/// Type code of a JPEG marker (the byte following `0xFF`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Marker(pub u8);

impl Marker {
    /// Start of image
    pub const SOI: Marker = Marker(0xD8);
    /// Start of frame, baseline DCT
    pub const SOF0: Marker = Marker(0xC0);
    /// Start of frame, extended sequential DCT
    pub const SOF1: Marker = Marker(0xC1);
    /// Start of frame, progressive DCT
    pub const SOF2: Marker = Marker(0xC2);
    /// Define Huffman table
    pub const DHT: Marker = Marker(0xC4);
    /// Define quantization table
    pub const DQT: Marker = Marker(0xDB);
    /// Define restart interval
    pub const DRI: Marker = Marker(0xDD);
    /// Start of scan
    pub const SOS: Marker = Marker(0xDA);
    /// Restart markers
    pub const RST0: Marker = Marker(0xD0);
    #[allow(missing_docs)]
    pub const RST1: Marker = Marker(0xD1);
    #[allow(missing_docs)]
    pub const RST2: Marker = Marker(0xD2);
    #[allow(missing_docs)]
    pub const RST3: Marker = Marker(0xD3);
    #[allow(missing_docs)]
    pub const RST4: Marker = Marker(0xD4);
    #[allow(missing_docs)]
    pub const RST5: Marker = Marker(0xD5);
    #[allow(missing_docs)]
    pub const RST6: Marker = Marker(0xD6);
    #[allow(missing_docs)]
    pub const RST7: Marker = Marker(0xD7);
    /// Application segments (JFIF, EXIF, ICC, XMP, Adobe, ...)
    pub const APP0: Marker = Marker(0xE0);
    #[allow(missing_docs)]
    pub const APP1: Marker = Marker(0xE1);
    #[allow(missing_docs)]
    pub const APP2: Marker = Marker(0xE2);
    #[allow(missing_docs)]
    pub const APP3: Marker = Marker(0xE3);
    #[allow(missing_docs)]
    pub const APP4: Marker = Marker(0xE4);
    #[allow(missing_docs)]
    pub const APP5: Marker = Marker(0xE5);
    #[allow(missing_docs)]
    pub const APP6: Marker = Marker(0xE6);
    #[allow(missing_docs)]
    pub const APP7: Marker = Marker(0xE7);
    #[allow(missing_docs)]
    pub const APP8: Marker = Marker(0xE8);
    #[allow(missing_docs)]
    pub const APP9: Marker = Marker(0xE9);
    #[allow(missing_docs)]
    pub const APP10: Marker = Marker(0xEA);
    #[allow(missing_docs)]
    pub const APP11: Marker = Marker(0xEB);
    #[allow(missing_docs)]
    pub const APP12: Marker = Marker(0xEC);
    #[allow(missing_docs)]
    pub const APP13: Marker = Marker(0xED);
    #[allow(missing_docs)]
    pub const APP14: Marker = Marker(0xEE);
    #[allow(missing_docs)]
    pub const APP15: Marker = Marker(0xEF);
    /// Comment
    pub const COM: Marker = Marker(0xFE);
    /// End of image
    pub const EOI: Marker = Marker(0xD9);

    /// Returns the raw type code
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Returns the conventional name of this marker, or `None` for codes
    /// outside the recognized set
    pub fn name(self) -> Option<&'static str> {
        NAMES[self.0 as usize]
    }

    /// Looks up a marker by name, ignoring ASCII case (`"app2"` -> `APP2`)
    pub fn from_name(name: &str) -> Option<Marker> {
        MARKER_TABLE
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|&(code, _)| Marker(code))
    }

    /// RST0 through RST7
    pub const fn is_restart(self) -> bool {
        matches!(self.0, 0xD0..=0xD7)
    }

    /// Index of a restart marker (0-7)
    pub const fn restart_index(self) -> Option<u8> {
        if self.is_restart() {
            Some(self.0 & 0x0F)
        } else {
            None
        }
    }

    /// APP0 through APP15
    pub const fn is_application(self) -> bool {
        matches!(self.0, 0xE0..=0xEF)
    }

    /// COM
    pub const fn is_comment(self) -> bool {
        self.0 == Self::COM.0
    }

    /// Application segments and comments: the segments a strip removes
    pub const fn is_metadata(self) -> bool {
        self.is_application() || self.is_comment()
    }

    /// Markers that occupy exactly two bytes and carry no length field
    pub const fn is_standalone(self) -> bool {
        self.0 == Self::SOI.0 || self.0 == Self::EOI.0 || self.is_restart()
    }
}

impl From<u8> for Marker {
    fn from(code: u8) -> Self {
        Marker(code)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#04X}", self.0),
        }
    }
}

/// Code/name pairs for every recognized marker
const MARKER_TABLE: [(u8, &str); 34] = [
    (0xD8, "SOI"),
    (0xC0, "SOF0"),
    (0xC1, "SOF1"),
    (0xC2, "SOF2"),
    (0xC4, "DHT"),
    (0xDB, "DQT"),
    (0xDD, "DRI"),
    (0xDA, "SOS"),
    (0xD0, "RST0"),
    (0xD1, "RST1"),
    (0xD2, "RST2"),
    (0xD3, "RST3"),
    (0xD4, "RST4"),
    (0xD5, "RST5"),
    (0xD6, "RST6"),
    (0xD7, "RST7"),
    (0xE0, "APP0"),
    (0xE1, "APP1"),
    (0xE2, "APP2"),
    (0xE3, "APP3"),
    (0xE4, "APP4"),
    (0xE5, "APP5"),
    (0xE6, "APP6"),
    (0xE7, "APP7"),
    (0xE8, "APP8"),
    (0xE9, "APP9"),
    (0xEA, "APP10"),
    (0xEB, "APP11"),
    (0xEC, "APP12"),
    (0xED, "APP13"),
    (0xEE, "APP14"),
    (0xEF, "APP15"),
    (0xFE, "COM"),
    (0xD9, "EOI"),
];

/// Name lookup indexed directly by type code
static NAMES: [Option<&str>; 256] = build_names();

const fn build_names() -> [Option<&'static str>; 256] {
    let mut names = [None; 256];
    let mut i = 0;
    while i < MARKER_TABLE.len() {
        let (code, name) = MARKER_TABLE[i];
        names[code as usize] = Some(name);
        i += 1;
    }
    names
}
