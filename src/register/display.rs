//! Rendering helpers for register values.
//!
//! The signed view only changes how a byte is printed. Stored values and
//! flag computation never depend on it.

use std::fmt;
use serde::{Serialize, Deserialize};

/// How to print the decimal form of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignedView {
    /// 0 to 255
    #[default]
    Unsigned,
    /// -128 to +127, two's complement
    Signed,
}

impl SignedView {
    /// Switch between the two views.
    pub fn toggle(self) -> Self {
        match self {
            SignedView::Unsigned => SignedView::Signed,
            SignedView::Signed => SignedView::Unsigned,
        }
    }

    /// Decimal text for `value` in this view.
    ///
    /// Signed output always carries an explicit sign, e.g. `+5` or `-106`.
    pub fn render_decimal(self, value: u8) -> String {
        match self {
            SignedView::Unsigned => value.to_string(),
            SignedView::Signed => format!("{:+}", value as i8),
        }
    }
}

impl fmt::Display for SignedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignedView::Unsigned => f.write_str("unsigned"),
            SignedView::Signed => f.write_str("signed"),
        }
    }
}

/// Binary digits grouped by nibble: `1010 0101`.
pub fn format_nibbles(value: u8) -> String {
    format!("{:04b} {:04b}", value >> 4, value & 0x0F)
}

/// Upper-case hex with prefix: `0xA5`.
pub fn format_hex(value: u8) -> String {
    format!("0x{:02X}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_decimal() {
        assert_eq!(SignedView::Unsigned.render_decimal(150), "150");
        assert_eq!(SignedView::Signed.render_decimal(150), "-106");
        assert_eq!(SignedView::Signed.render_decimal(5), "+5");
        assert_eq!(SignedView::Signed.render_decimal(0), "+0");
        assert_eq!(SignedView::Signed.render_decimal(128), "-128");
    }

    #[test]
    fn test_toggle() {
        assert_eq!(SignedView::Unsigned.toggle(), SignedView::Signed);
        assert_eq!(SignedView::Signed.toggle().toggle(), SignedView::Signed);
    }

    #[test]
    fn test_nibbles_and_hex() {
        assert_eq!(format_nibbles(0), "0000 0000");
        assert_eq!(format_nibbles(0xA5), "1010 0101");
        assert_eq!(format_hex(0x0A), "0x0A");
        assert_eq!(format_hex(255), "0xFF");
    }
}
