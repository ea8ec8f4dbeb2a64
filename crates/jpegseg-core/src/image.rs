//! Decomposed images, metadata stripping and serialization.
//!
//! An [`Image`] is the ordered unit sequence produced by the parser. It is
//! never modified in place: [`Image::strip`] builds a new image out of the
//! units it keeps.

use crate::error::{Error, Result};
use crate::marker::Marker;
use crate::unit::{Segment, Unit};
use std::io::{self, Write};
use tracing::debug;

/// Decides which segments survive a strip.
///
/// Only segments are offered to the policy. Scan data and detritus before
/// the first EOI are always kept, and nothing after that EOI ever is.
pub trait StripPolicy {
    /// Returns true if a segment of this type should be kept
    fn keep(&self, marker: Marker) -> bool;
}

/// Drops every APPn and COM segment
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataPolicy;

impl StripPolicy for MetadataPolicy {
    fn keep(&self, marker: Marker) -> bool {
        !marker.is_metadata()
    }
}

/// Like [`MetadataPolicy`], but retains the listed metadata markers
/// (for example APP2 to preserve an ICC profile)
#[derive(Debug, Clone, Default)]
pub struct KeepMarkers {
    keep: Vec<Marker>,
}

impl KeepMarkers {
    /// Creates a policy retaining the given markers
    pub fn new(keep: impl IntoIterator<Item = Marker>) -> Self {
        Self {
            keep: keep.into_iter().collect(),
        }
    }
}

impl StripPolicy for KeepMarkers {
    fn keep(&self, marker: Marker) -> bool {
        !marker.is_metadata() || self.keep.contains(&marker)
    }
}

/// An ordered sequence of units making up one JPEG file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    units: Vec<Unit>,
}

impl Image {
    pub(crate) fn from_units(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// All units in stream order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Iterates units in stream order
    pub fn iter(&self) -> std::slice::Iter<'_, Unit> {
        self.units.iter()
    }

    /// Iterates the segments only
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.units.iter().filter_map(Unit::as_segment)
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True if the image has no units
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total size in bytes of all units
    pub fn byte_len(&self) -> usize {
        self.units.iter().map(Unit::len).sum()
    }

    /// Number of SOI segments, i.e. images concatenated in this stream
    pub fn image_count(&self) -> usize {
        self.segments().filter(|s| s.marker() == Marker::SOI).count()
    }

    /// Concatenates every unit's bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for unit in &self.units {
            out.extend_from_slice(unit.as_bytes());
        }
        out
    }

    /// Removes all non-essential metadata segments (APP0-APP15 and COM) and
    /// truncates the image right after its first EOI, similar in effect to
    /// `exiftool -all=`
    pub fn strip(&self) -> Image {
        self.strip_with(&MetadataPolicy)
    }

    /// Strips with a custom policy. Truncation at the first EOI applies
    /// regardless of the policy.
    pub fn strip_with(&self, policy: &impl StripPolicy) -> Image {
        let mut slim = Vec::with_capacity(self.units.len());

        for unit in &self.units {
            if let Some(segment) = unit.as_segment() {
                let marker = segment.marker();
                if marker == Marker::EOI {
                    slim.push(unit.clone());
                    break;
                }
                if !policy.keep(marker) {
                    continue;
                }
            }
            slim.push(unit.clone());
        }

        debug!(
            "Strip kept {} of {} units ({} -> {} bytes)",
            slim.len(),
            self.units.len(),
            self.byte_len(),
            slim.iter().map(Unit::len).sum::<usize>()
        );

        Image::from_units(slim)
    }

    /// Writes every unit in order and returns the total number of bytes
    /// written.
    ///
    /// On failure the error carries the bytes written so far.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize> {
        let mut written = 0;

        for unit in &self.units {
            let mut buf = unit.as_bytes();
            while !buf.is_empty() {
                match writer.write(buf) {
                    Ok(0) => {
                        return Err(Error::write(
                            written,
                            io::Error::new(io::ErrorKind::WriteZero, "failed to write whole unit"),
                        ));
                    }
                    Ok(n) => {
                        written += n;
                        buf = &buf[n..];
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(Error::write(written, e)),
                }
            }
        }

        Ok(written)
    }
}

impl FromIterator<Unit> for Image {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        Self::from_units(iter.into_iter().collect())
    }
}

impl IntoIterator for Image {
    type Item = Unit;
    type IntoIter = std::vec::IntoIter<Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

impl<'a> IntoIterator for &'a Image {
    type Item = &'a Unit;
    type IntoIter = std::slice::Iter<'a, Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}
