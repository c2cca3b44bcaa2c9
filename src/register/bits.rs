//! Bit-array view of a register.
//!
//! Front ends usually show a register twice: as a number the user can type
//! and as eight toggles. [`BitFieldSync`] keeps the two consistent. Writing
//! one side updates the other through a [`BitFieldView`], and any change
//! event the view fires back while that update is running is ignored.

use std::cell::Cell;
use tracing::warn;
use crate::register::{InputError, Register};

/// Expand a byte into bits, index 0 = LSB.
pub fn to_bits(value: u8) -> [bool; 8] {
    let mut bits = [false; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (value >> i) & 1 == 1;
    }
    bits
}

/// Collapse bits (index 0 = LSB) into a byte.
pub fn from_bits(bits: [bool; 8]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i))
}

/// The widgets showing one register.
///
/// Implementations may call back into the owning [`BitFieldSync`] from
/// these methods (toolkits often fire change events on programmatic
/// writes); such calls are suppressed.
pub trait BitFieldView {
    /// Show new bit toggles.
    fn show_bits(&mut self, bits: [bool; 8]);
    /// Show new numeric text.
    fn show_text(&mut self, text: &str);
}

/// A held propagation latch. Releasing happens on drop, so every exit path
/// (including `?` and unwinding) frees it.
struct LatchGuard<'a> {
    held: &'a Cell<bool>,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.held.set(false);
    }
}

/// Keeps one register's number and bits in step.
///
/// Each register owns its own sync, so a propagation running for the
/// accumulator never blocks one for the operand.
#[derive(Debug)]
pub struct BitFieldSync {
    name: &'static str,
    value: Cell<u8>,
    propagating: Cell<bool>,
}

impl BitFieldSync {
    /// Create a sync for the register called `name` holding `initial`.
    pub fn new(name: &'static str, initial: u8) -> Self {
        Self {
            name,
            value: Cell::new(initial),
            propagating: Cell::new(false),
        }
    }

    /// Register name, used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last value accepted from either side.
    pub fn value(&self) -> u8 {
        self.value.get()
    }

    /// True while an update is being pushed to the view.
    pub fn is_propagating(&self) -> bool {
        self.propagating.get()
    }

    fn acquire(&self) -> Option<LatchGuard<'_>> {
        if self.propagating.replace(true) {
            None
        } else {
            Some(LatchGuard { held: &self.propagating })
        }
    }

    /// The numeric text changed. Pushes the new bits to the view.
    ///
    /// Returns `Ok(None)` when suppressed by a propagation already in
    /// progress. Invalid text is rejected and leaves the value untouched.
    pub fn text_changed<V>(&self, text: &str, view: &mut V) -> Result<Option<u8>, InputError>
    where
        V: BitFieldView + ?Sized,
    {
        let Some(_guard) = self.acquire() else {
            return Ok(None);
        };

        let value = match Register::parse_input(text) {
            Ok(reg) => reg.value(),
            Err(e) => {
                warn!(register = self.name, input = text, "rejected register input: {}", e);
                return Err(e);
            }
        };

        self.value.set(value);
        view.show_bits(to_bits(value));
        Ok(Some(value))
    }

    /// A bit toggle changed. Pushes the new number to the view.
    ///
    /// Returns `None` when suppressed.
    pub fn bits_changed<V>(&self, bits: [bool; 8], view: &mut V) -> Option<u8>
    where
        V: BitFieldView + ?Sized,
    {
        let _guard = self.acquire()?;

        let value = from_bits(bits);
        self.value.set(value);
        view.show_text(&value.to_string());
        Some(value)
    }

    /// The register changed elsewhere (ALU commit, reset). Pushes both
    /// representations to the view.
    ///
    /// Returns `false` when suppressed.
    pub fn load<V>(&self, value: u8, view: &mut V) -> bool
    where
        V: BitFieldView + ?Sized,
    {
        let Some(_guard) = self.acquire() else {
            return false;
        };

        self.value.set(value);
        view.show_text(&value.to_string());
        view.show_bits(to_bits(value));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Default)]
    struct Widgets {
        bits: [bool; 8],
        text: String,
    }

    impl BitFieldView for Widgets {
        fn show_bits(&mut self, bits: [bool; 8]) {
            self.bits = bits;
        }

        fn show_text(&mut self, text: &str) {
            self.text = text.to_string();
        }
    }

    /// Fires change events back into the sync on every programmatic write,
    /// like a toolkit variable trace would.
    struct EchoingWidgets {
        sync: Rc<BitFieldSync>,
        inner: Widgets,
        echoes: Vec<Option<u8>>,
    }

    impl BitFieldView for EchoingWidgets {
        fn show_bits(&mut self, bits: [bool; 8]) {
            self.inner.bits = bits;
            let sync = Rc::clone(&self.sync);
            let echoed = sync.bits_changed(bits, self);
            self.echoes.push(echoed);
        }

        fn show_text(&mut self, text: &str) {
            self.inner.text = text.to_string();
            let sync = Rc::clone(&self.sync);
            let echoed = sync.text_changed(text, self).unwrap();
            self.echoes.push(echoed);
        }
    }

    #[test]
    fn test_bits_lsb_first() {
        let bits = to_bits(0b0000_0101);
        assert_eq!(bits, [true, false, true, false, false, false, false, false]);
        assert_eq!(from_bits(bits), 5);
        assert_eq!(from_bits([true; 8]), 255);
    }

    #[test]
    fn test_bits_roundtrip_all_values() {
        for v in 0..=255u8 {
            assert_eq!(from_bits(to_bits(v)), v);
        }
    }

    #[test]
    fn test_text_to_bits() {
        let sync = BitFieldSync::new("A", 0);
        let mut view = Widgets::default();
        assert_eq!(sync.text_changed("170", &mut view).unwrap(), Some(170));
        assert_eq!(view.bits, to_bits(170));
        assert_eq!(sync.value(), 170);
    }

    #[test]
    fn test_bits_to_text() {
        let sync = BitFieldSync::new("A", 0);
        let mut view = Widgets::default();
        let mut bits = [false; 8];
        bits[7] = true;
        assert_eq!(sync.bits_changed(bits, &mut view), Some(128));
        assert_eq!(view.text, "128");
    }

    #[test]
    fn test_echo_is_suppressed() {
        let sync = Rc::new(BitFieldSync::new("A", 0));
        let mut view = EchoingWidgets {
            sync: Rc::clone(&sync),
            inner: Widgets::default(),
            echoes: Vec::new(),
        };

        assert_eq!(sync.text_changed("42", &mut view).unwrap(), Some(42));
        assert_eq!(view.echoes, vec![None]);
        assert_eq!(view.inner.bits, to_bits(42));

        assert_eq!(sync.bits_changed(to_bits(7), &mut view), Some(7));
        assert_eq!(view.echoes, vec![None, None]);
        assert_eq!(view.inner.text, "7");
        assert!(!sync.is_propagating());
    }

    #[test]
    fn test_latch_released_after_error() {
        let sync = BitFieldSync::new("B", 9);
        let mut view = Widgets::default();
        assert_eq!(sync.text_changed("300", &mut view), Err(InputError::OutOfRange(300)));
        assert!(!sync.is_propagating());
        assert_eq!(sync.value(), 9);
        assert_eq!(sync.text_changed("10", &mut view).unwrap(), Some(10));
    }

    #[test]
    fn test_latch_released_after_panic() {
        struct PanickingView;
        impl BitFieldView for PanickingView {
            fn show_bits(&mut self, _bits: [bool; 8]) {
                panic!("widget destroyed");
            }
            fn show_text(&mut self, _text: &str) {}
        }

        let sync = BitFieldSync::new("A", 0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = sync.text_changed("1", &mut PanickingView);
        }));
        assert!(result.is_err());
        assert!(!sync.is_propagating());
    }

    #[test]
    fn test_registers_do_not_share_latch() {
        struct CrossView<'a> {
            other: &'a BitFieldSync,
            other_view: Widgets,
            forwarded: Option<u8>,
        }
        impl BitFieldView for CrossView<'_> {
            fn show_bits(&mut self, bits: [bool; 8]) {
                self.forwarded = self.other.bits_changed(bits, &mut self.other_view);
            }
            fn show_text(&mut self, _text: &str) {}
        }

        let acc = BitFieldSync::new("A", 0);
        let operand = BitFieldSync::new("B", 0);
        let mut view = CrossView { other: &operand, other_view: Widgets::default(), forwarded: None };

        acc.text_changed("99", &mut view).unwrap();
        assert_eq!(view.forwarded, Some(99));
        assert_eq!(operand.value(), 99);
    }

    #[test]
    fn test_load_pushes_both() {
        let sync = BitFieldSync::new("A", 0);
        let mut view = Widgets::default();
        assert!(sync.load(200, &mut view));
        assert_eq!(view.text, "200");
        assert_eq!(view.bits, to_bits(200));
    }
}
