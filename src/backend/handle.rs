// GPU handles - opaque driver object identifiers
//
// OpenGL names every object (buffer, texture, shader, program) with a plain
// unsigned integer. Zero is never a valid object name, so it doubles as the
// "invalid" sentinel returned by operations that fail without panicking.

use std::fmt;
use std::num::NonZeroU32;

/// Opaque identifier for a driver-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GpuHandle(u32);

impl GpuHandle {
    /// The sentinel returned when an object could not be created.
    pub const INVALID: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Non-zero form used by `glow`'s native object types.
    pub fn non_zero(self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.0)
    }
}

impl From<NonZeroU32> for GpuHandle {
    fn from(raw: NonZeroU32) -> Self {
        Self(raw.get())
    }
}

impl fmt::Display for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
