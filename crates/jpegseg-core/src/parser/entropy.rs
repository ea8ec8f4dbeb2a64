//! Boundary detection for entropy-coded scan data.
//!
//! Scan data carries no length field. Inside it, a literal `0xFF` is
//! followed by a stuffed `0x00`, and `0xFF 0xD0..=0xD7` are restart
//! markers used for resynchronization. Any other `0xFF xx` pair is the
//! next real marker and ends the scan.

use crate::marker::{Marker, MARKER_PREFIX};

/// Byte following `0xFF` for a stuffed literal
const STUFFED_BYTE: u8 = 0x00;

/// Returns the length of the entropy-coded data at the start of `data`,
/// i.e. the index of the `0xFF` that begins the next marker.
///
/// Returns `None` if the buffer ends before such a marker is seen.
pub fn find_entropy_coded_data_length(data: &[u8]) -> Option<usize> {
    data.windows(2)
        .position(|pair| pair[0] == MARKER_PREFIX && !continues_scan(pair[1]))
}

/// True if `0xFF` followed by `byte` belongs to the scan data
fn continues_scan(byte: u8) -> bool {
    byte == STUFFED_BYTE || Marker(byte).is_restart()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scan_data() {
        let data = [0x12, 0x34, 0x56, 0xFF, 0xD9];
        assert_eq!(find_entropy_coded_data_length(&data), Some(3));
    }

    #[test]
    fn test_skips_stuffing_and_restarts() {
        let data = [0x01, 0xFF, 0x00, 0x02, 0xFF, 0xD1, 0x03, 0xFF, 0xD7, 0x04, 0xFF, 0xD9];
        assert_eq!(find_entropy_coded_data_length(&data), Some(10));
    }

    #[test]
    fn test_fill_bytes_end_scan_at_first_prefix() {
        let data = [0x01, 0xFF, 0xFF, 0xD9];
        assert_eq!(find_entropy_coded_data_length(&data), Some(1));
    }

    #[test]
    fn test_marker_at_start() {
        assert_eq!(find_entropy_coded_data_length(&[0xFF, 0xC4]), Some(0));
    }

    #[test]
    fn test_no_terminator() {
        assert_eq!(find_entropy_coded_data_length(&[]), None);
        assert_eq!(find_entropy_coded_data_length(&[0xFF]), None);
        assert_eq!(
            find_entropy_coded_data_length(&[0x01, 0xFF, 0x00, 0xFF, 0xD0, 0x02]),
            None
        );
        // trailing prefix with nothing after it
        assert_eq!(find_entropy_coded_data_length(&[0x01, 0x02, 0xFF]), None);
    }
}
