//! Structural units of a decomposed JPEG stream.
//!
//! Every unit holds a [`Bytes`] view into the buffer handed to the parser.
//! Views share that buffer by reference count: they outlive any borrow the
//! caller held, cost nothing to clone, and never modify the source bytes.

use crate::marker::Marker;
use bytes::Bytes;
use std::fmt;

/// A marker segment: `0xFF`, a type code and, unless the marker is
/// standalone, a big-endian length followed by the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    data: Bytes,
}

impl Segment {
    pub(crate) fn new(data: Bytes) -> Self {
        debug_assert!(data.len() >= 2);
        Self { data }
    }

    /// The marker type of this segment
    pub fn marker(&self) -> Marker {
        Marker(self.data[1])
    }

    /// Conventional marker name, if the type code is recognized
    pub fn name(&self) -> Option<&'static str> {
        self.marker().name()
    }

    /// Total length in bytes, including the two-byte marker
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Raw bytes of the whole segment
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The length field as stored in the stream (it counts itself but not
    /// the marker); `None` for standalone markers
    pub fn declared_length(&self) -> Option<u16> {
        if self.data.len() < 4 {
            return None;
        }
        Some(u16::from_be_bytes([self.data[2], self.data[3]]))
    }

    /// Segment body following the length field
    pub fn payload(&self) -> &[u8] {
        self.data.get(4..).unwrap_or_default()
    }

    /// Cheap clone of the underlying view
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }
}

/// Compressed scan data following an SOS segment, byte stuffing and
/// restart markers included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyCodedData {
    data: Bytes,
}

impl EntropyCodedData {
    pub(crate) fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Raw scan bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the scan carried no data before the next marker
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Trailing bytes after EOI that do not start another image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detritus {
    data: Bytes,
}

impl Detritus {
    pub(crate) fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Raw trailing bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for parser output; detritus is only emitted when bytes remain
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Discriminant of a [`Unit`], for listings and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Marker segment
    Segment,
    /// Entropy-coded scan data
    EntropyCodedData,
    /// Trailing bytes after EOI
    Detritus,
}

impl UnitKind {
    /// Short label used in listings
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Segment => "segment",
            UnitKind::EntropyCodedData => "ecd",
            UnitKind::Detritus => "detritus",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One structural unit of a JPEG stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Marker segment
    Segment(Segment),
    /// Entropy-coded scan data
    EntropyCodedData(EntropyCodedData),
    /// Trailing bytes after EOI
    Detritus(Detritus),
}

impl Unit {
    /// Raw backing bytes of this unit
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Unit::Segment(s) => s.as_bytes(),
            Unit::EntropyCodedData(e) => e.as_bytes(),
            Unit::Detritus(d) => d.as_bytes(),
        }
    }

    /// Length of the backing bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True for a zero-length unit (only possible for empty scan data)
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Which variant this is
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Segment(_) => UnitKind::Segment,
            Unit::EntropyCodedData(_) => UnitKind::EntropyCodedData,
            Unit::Detritus(_) => UnitKind::Detritus,
        }
    }

    /// Marker type, for segments
    pub fn marker(&self) -> Option<Marker> {
        self.as_segment().map(Segment::marker)
    }

    /// True if this is a segment of the given type
    pub fn is_marker(&self, marker: Marker) -> bool {
        self.marker() == Some(marker)
    }

    /// Returns the segment if this unit is one
    pub fn as_segment(&self) -> Option<&Segment> {
        match self {
            Unit::Segment(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the scan data if this unit is entropy-coded data
    pub fn as_entropy_coded_data(&self) -> Option<&EntropyCodedData> {
        match self {
            Unit::EntropyCodedData(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the trailing bytes if this unit is detritus
    pub fn as_detritus(&self) -> Option<&Detritus> {
        match self {
            Unit::Detritus(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Segment> for Unit {
    fn from(segment: Segment) -> Self {
        Unit::Segment(segment)
    }
}

impl From<EntropyCodedData> for Unit {
    fn from(data: EntropyCodedData) -> Self {
        Unit::EntropyCodedData(data)
    }
}

impl From<Detritus> for Unit {
    fn from(detritus: Detritus) -> Self {
        Unit::Detritus(detritus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(bytes: &'static [u8]) -> Segment {
        Segment::new(Bytes::from_static(bytes))
    }

    #[test]
    fn test_standalone_segment() {
        let soi = segment(&[0xFF, 0xD8]);
        assert_eq!(soi.marker(), Marker::SOI);
        assert_eq!(soi.name(), Some("SOI"));
        assert_eq!(soi.len(), 2);
        assert_eq!(soi.declared_length(), None);
        assert!(soi.payload().is_empty());
    }

    #[test]
    fn test_length_prefixed_segment() {
        let app0 = segment(&[0xFF, 0xE0, 0x00, 0x05, 0xAB, 0xCD, 0xEF]);
        assert_eq!(app0.marker(), Marker::APP0);
        assert_eq!(app0.len(), 7);
        assert_eq!(app0.declared_length(), Some(5));
        assert_eq!(app0.payload(), &[0xAB, 0xCD, 0xEF]);
        assert_eq!(app0.to_bytes().as_ref(), app0.as_bytes());
    }

    #[test]
    fn test_unit_accessors() {
        let unit = Unit::from(segment(&[0xFF, 0xD9]));
        assert_eq!(unit.kind(), UnitKind::Segment);
        assert!(unit.is_marker(Marker::EOI));
        assert!(unit.as_entropy_coded_data().is_none());

        let ecd = Unit::from(EntropyCodedData::new(Bytes::from_static(&[0x12, 0xFF, 0x00])));
        assert_eq!(ecd.kind(), UnitKind::EntropyCodedData);
        assert_eq!(ecd.marker(), None);
        assert_eq!(ecd.len(), 3);
        assert!(ecd.as_segment().is_none());

        let junk = Unit::from(Detritus::new(Bytes::from_static(b"\n")));
        assert_eq!(junk.kind().to_string(), "detritus");
        assert_eq!(junk.as_detritus().map(Detritus::len), Some(1));
    }
}
