//! Formatting utilities

use humansize::{DECIMAL, format_size};
use wow_data::primitives::{BoundingBox, C3Vector};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a byte offset the way chunk listings show them
pub fn format_offset(offset: u64) -> String {
    format!("0x{offset:08X}")
}

/// Format a position with two decimals per axis
pub fn format_vec(v: &C3Vector) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// Format a bounding box as its two corners
pub fn format_box(b: &BoundingBox) -> String {
    format!("{} - {}", format_vec(&b.min), format_vec(&b.max))
}

/// Format a yes/no flag
pub fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.02 kB");
        assert_eq!(format_bytes(1048576), "1.05 MB");
    }

    #[test]
    fn test_format_box() {
        let b = BoundingBox {
            min: C3Vector::new(0.0, 0.0, 0.0),
            max: C3Vector::new(1.0, 2.5, 3.0),
        };
        assert_eq!(format_box(&b), "(0.00, 0.00, 0.00) - (1.00, 2.50, 3.00)");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0x40), "0x00000040");
    }
}
