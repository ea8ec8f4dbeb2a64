//! Stream decomposition.
//!
//! The parser walks the buffer once, front to back, and splits it into
//! [`Unit`]s:
//!
//! 1. Every unit at the top level starts with the `0xFF` marker prefix
//! 2. SOI and EOI are two-byte segments; RSTn is illegal here
//! 3. Every other marker carries a big-endian length covering itself and
//!    the payload
//! 4. SOS is followed by entropy-coded data whose end is found by scanning
//!    for the next marker that is neither byte stuffing nor a restart
//! 5. After EOI, bytes that look like a second image keep the scan going;
//!    anything else becomes a single trailing [`Detritus`] unit
//!
//! Concatenating the bytes of every unit reproduces the input exactly.

mod entropy;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::marker::{Marker, MARKER_PREFIX};
use crate::unit::{Detritus, EntropyCodedData, Segment, Unit};
use bytes::Bytes;
use tracing::{debug, trace};

pub use entropy::find_entropy_coded_data_length;

/// Marker plus length field
const SEGMENT_HEADER_LEN: usize = 4;

/// Configuration for the parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Continue past EOI when the remaining bytes look like another image
    pub concatenated_images: bool,
    /// Maximum number of units to emit (0 = unlimited)
    pub max_units: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            concatenated_images: true,
            max_units: 0,
        }
    }
}

impl ParserConfig {
    /// Creates a new parser config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether bytes after EOI may start a second image
    pub fn concatenated_images(mut self, enabled: bool) -> Self {
        self.concatenated_images = enabled;
        self
    }

    /// Sets the maximum number of units to emit
    pub fn max_units(mut self, max: usize) -> Self {
        self.max_units = max;
        self
    }
}

/// Decomposes JPEG byte streams into units
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Creates a new parser with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new parser with custom configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Decomposes `data` into an [`Image`].
    ///
    /// The units share `data`'s buffer; nothing is copied. Any defect in
    /// the stream aborts the parse and no partial image is returned.
    pub fn parse(&self, data: impl Into<Bytes>) -> Result<Image> {
        let data: Bytes = data.into();
        let mut units = Vec::with_capacity(16);
        let mut position = 0;

        debug!("Starting parse of {} bytes", data.len());

        while position < data.len() {
            let rest = &data[position..];

            if rest[0] != MARKER_PREFIX {
                return Err(Error::malformed_stream(position, rest[0]));
            }
            if rest.len() < 2 {
                return Err(Error::truncated_stream(position, 2, rest.len()));
            }

            let marker = Marker(rest[1]);
            match marker {
                Marker::SOI => {
                    let segment = Segment::new(data.slice(position..position + 2));
                    self.push(&mut units, segment, position)?;
                    position += 2;
                }
                Marker::EOI => {
                    let segment = Segment::new(data.slice(position..position + 2));
                    self.push(&mut units, segment, position)?;
                    position += 2;

                    if position == data.len() {
                        break;
                    }

                    if !self.config.concatenated_images || !starts_next_image(&data[position..]) {
                        let detritus = Detritus::new(data.slice(position..));
                        self.push(&mut units, detritus, position)?;
                        break;
                    }

                    debug!("Found another image after EOI at offset {}", position);
                }
                m if m.is_restart() => {
                    let index = m.restart_index().unwrap_or_default();
                    return Err(Error::unexpected_restart_marker(position, index));
                }
                _ => {
                    if rest.len() < SEGMENT_HEADER_LEN {
                        return Err(Error::truncated_stream(
                            position,
                            SEGMENT_HEADER_LEN,
                            rest.len(),
                        ));
                    }

                    // A declared length below 2 yields a short segment; the
                    // bytes after it are then checked for a marker prefix.
                    let length = u16::from_be_bytes([rest[2], rest[3]]);
                    let segment_len = 2 + length as usize;
                    if segment_len > rest.len() {
                        return Err(Error::truncated_stream(position, segment_len, rest.len()));
                    }

                    let segment = Segment::new(data.slice(position..position + segment_len));
                    self.push(&mut units, segment, position)?;
                    position += segment_len;

                    if marker == Marker::SOS {
                        let scan_len = find_entropy_coded_data_length(&data[position..])
                            .ok_or_else(|| Error::invalid_entropy_data(position))?;
                        let scan = EntropyCodedData::new(data.slice(position..position + scan_len));
                        self.push(&mut units, scan, position)?;
                        position += scan_len;
                    }
                }
            }
        }

        debug!("Parse complete: {} units", units.len());
        Ok(Image::from_units(units))
    }

    /// Decomposes a borrowed buffer by copying it once into a shared one
    pub fn parse_slice(&self, data: &[u8]) -> Result<Image> {
        self.parse(Bytes::copy_from_slice(data))
    }

    fn push(&self, units: &mut Vec<Unit>, unit: impl Into<Unit>, offset: usize) -> Result<()> {
        if self.config.max_units > 0 && units.len() >= self.config.max_units {
            return Err(Error::UnitLimitExceeded {
                limit: self.config.max_units,
            });
        }

        let unit = unit.into();
        match unit.marker() {
            Some(marker) => trace!("{} segment at {} ({} bytes)", marker, offset, unit.len()),
            None => trace!("{} at {} ({} bytes)", unit.kind(), offset, unit.len()),
        }
        units.push(unit);
        Ok(())
    }
}

/// Lookahead after EOI.
///
/// The remainder is treated as trailing junk only when fewer than two bytes
/// remain, or when *neither* the first byte is the marker prefix *nor* the
/// second byte is SOI. A remainder such as `FF 00` or `00 D8` therefore
/// keeps the scan going and fails (or not) on the next iteration.
fn starts_next_image(rest: &[u8]) -> bool {
    rest.len() >= 2 && (rest[0] == MARKER_PREFIX || rest[1] == Marker::SOI.code())
}

/// Decomposes `data` with the default configuration
pub fn decompose(data: impl Into<Bytes>) -> Result<Image> {
    Parser::new().parse(data)
}

/// Read and decompose a file.
///
/// This is a convenience function that reads the file and parses it.
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Image> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Parser::new().parse(data)
}

/// Read and decompose a file with custom configuration
pub fn parse_file_with_config(
    path: impl AsRef<std::path::Path>,
    config: ParserConfig,
) -> Result<Image> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Parser::with_config(config).parse(data)
}
