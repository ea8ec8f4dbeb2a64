//! # jpegseg-core
//!
//! A library for splitting JPEG files into their structural units without
//! decoding any pixels.
//!
//! This crate provides the core functionality for:
//! - Decomposing a JPEG byte stream into marker segments, entropy-coded scan
//!   data and trailing detritus
//! - Stripping metadata segments (APPn, COM) while keeping image data bit for bit
//! - Writing a decomposed image back out
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`marker`]: Marker type codes and their names
//! - [`unit`]: The closed set of unit variants
//! - [`parser`]: The stream decomposer
//! - [`image`]: Unit sequences, the strip transform and serialization
//! - [`error`]: Error types and handling
//!
//! Units are [`bytes::Bytes`] views that share the parsed buffer, so an
//! [`Image`] is independent of whatever the caller parsed it from.
//!
//! ## Example
//!
//! ```no_run
//! use jpegseg_core::Parser;
//! use std::fs;
//!
//! let data = fs::read("photo.jpg")?;
//! let image = Parser::new().parse(data)?;
//!
//! for segment in image.segments() {
//!     println!("{} ({} bytes)", segment.marker(), segment.len());
//! }
//!
//! let mut out = fs::File::create("photo.stripped.jpg")?;
//! image.strip().write_to(&mut out)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`StripPolicy`]: Choose which segments survive a strip

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod image;
pub mod marker;
pub mod parser;
pub mod unit;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use image::{Image, KeepMarkers, MetadataPolicy, StripPolicy};
pub use marker::{Marker, MARKER_PREFIX};
pub use parser::{decompose, parse_file, Parser, ParserConfig};
pub use unit::{Detritus, EntropyCodedData, Segment, Unit, UnitKind};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
