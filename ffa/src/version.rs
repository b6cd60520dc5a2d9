/// FF-A version as returned by FFA_VERSION.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    const MAJOR_SHIFT: u32 = 16;
    const MAJOR_MASK: u32 = 0x7fff;
    const MINOR_MASK: u32 = 0xffff;

    /// Bit 31 set in the FFA_VERSION result means the word holds an error code.
    pub const ERROR_BIT: u32 = 1 << 31;

    /// Version implemented by this stack.
    pub const V1_0: Self = Self::new(1, 0);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self {
            major: ((raw >> Self::MAJOR_SHIFT) & Self::MAJOR_MASK) as u16,
            minor: (raw & Self::MINOR_MASK) as u16,
        }
    }

    pub const fn to_raw(self) -> u32 {
        ((self.major as u32 & Self::MAJOR_MASK) << Self::MAJOR_SHIFT) | self.minor as u32
    }
}
