//! Human-readable size formatting for diagnostics.

use core::fmt;

/// Wraps a byte count and formats it with binary prefixes (KiB, MiB, ...).
///
/// Values print with at most one decimal place, computed in integer
/// arithmetic: the kernel formats sizes long before the FPU is usable.
///
/// # Examples
///
/// ```
/// use pmm::HumanSize;
///
/// assert_eq!(format!("{}", HumanSize::new(0)), "0B");
/// assert_eq!(format!("{}", HumanSize::new(1023)), "1023B");
/// assert_eq!(format!("{}", HumanSize::new(1536)), "1.5KiB");
/// assert_eq!(format!("{}", HumanSize::new(1048576)), "1MiB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HumanSize(pub usize);

impl HumanSize {
    /// Creates a new human-readable size from bytes.
    #[inline]
    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte count.
    #[inline]
    pub const fn bytes(self) -> usize {
        self.0
    }
}

impl From<usize> for HumanSize {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

        let mut size = self.0;
        let mut remainder = 0;
        let mut unit = 0;

        while size >= 1024 && unit < UNITS.len() - 1 {
            remainder = size % 1024;
            size /= 1024;
            unit += 1;
        }

        // One decimal place, from the final division's remainder.
        let tenths = remainder * 10 / 1024;
        if unit == 0 || tenths == 0 {
            write!(f, "{}{}", size, UNITS[unit])
        } else {
            write!(f, "{}.{}{}", size, tenths, UNITS[unit])
        }
    }
}
