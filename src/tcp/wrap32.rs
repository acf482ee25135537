use std::fmt;
use std::ops::{Add, AddAssign};

/// A TCP sequence number: 32-bit, arithmetic modulo 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub const fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Bytes from `earlier` up to `self`, going forward around the ring.
    pub fn distance_from(self, earlier: Wrap32) -> u32 {
        self.value.wrapping_sub(earlier.value)
    }

    /// `self` comes strictly before `other` in sequence space (RFC 793 `<`),
    /// judged over the nearer half of the ring.
    pub fn is_before(self, other: Wrap32) -> bool {
        (self.value.wrapping_sub(other.value) as i32) < 0
    }

    pub fn is_at_or_before(self, other: Wrap32) -> bool {
        self == other || self.is_before(other)
    }
}

impl Add for Wrap32 {
    type Output = Wrap32;

    fn add(self, other: Wrap32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(other.value))
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, n: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(n))
    }
}

impl AddAssign<u32> for Wrap32 {
    fn add_assign(&mut self, n: u32) {
        self.value = self.value.wrapping_add(n);
    }
}

impl From<u32> for Wrap32 {
    fn from(value: u32) -> Self {
        Wrap32::new(value)
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// -- Unit tests --
