use bitflags::bitflags;

/// SPMC-issued identifier of one in-flight memory transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryHandle(u64);

impl MemoryHandle {
    /// Handle field of a transaction that has not been issued yet.
    pub const UNUSED: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn from_parts(lo: u32, hi: u32) -> Self {
        Self(((hi as u64) << 32) | lo as u64)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn lo(&self) -> u32 {
        self.0 as u32
    }

    pub const fn hi(&self) -> u32 {
        (self.0 >> 32) as u32
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMemoryAttributes {
    NGnRnE = 0,
    NGnRE = 1,
    NGRE = 2,
    GRE = 3,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cacheability {
    NonCacheable = 1,
    WriteBack = 3,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shareability {
    NonShareable = 0,
    OuterShareable = 2,
    InnerShareable = 3,
}

/// Memory type with the attributes that are valid for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryType {
    #[default]
    NotSpecified,
    Device(DeviceMemoryAttributes),
    Normal {
        cacheability: Cacheability,
        shareability: Shareability,
    },
}

impl MemoryType {
    const TYPE_SHIFT: u8 = 4;
    const TYPE_MASK: u8 = 0x03;
    const DEVICE_SHIFT: u8 = 2;
    const CACHEABILITY_SHIFT: u8 = 2;
    const ATTR_MASK: u8 = 0x03;

    const TYPE_NOT_SPECIFIED: u8 = 0;
    const TYPE_DEVICE: u8 = 1;
    const TYPE_NORMAL: u8 = 2;

    /// Pack into the memory region attributes byte of a transaction descriptor.
    pub const fn to_attributes(self) -> u8 {
        match self {
            Self::NotSpecified => Self::TYPE_NOT_SPECIFIED << Self::TYPE_SHIFT,
            Self::Device(attrs) => {
                (Self::TYPE_DEVICE << Self::TYPE_SHIFT) | ((attrs as u8) << Self::DEVICE_SHIFT)
            }
            Self::Normal {
                cacheability,
                shareability,
            } => {
                (Self::TYPE_NORMAL << Self::TYPE_SHIFT)
                    | ((cacheability as u8) << Self::CACHEABILITY_SHIFT)
                    | shareability as u8
            }
        }
    }

    /// Unpack the memory region attributes byte. Reserved encodings give `None`.
    pub const fn from_attributes(attrs: u8) -> Option<Self> {
        let low = (attrs >> Self::DEVICE_SHIFT) & Self::ATTR_MASK;

        match (attrs >> Self::TYPE_SHIFT) & Self::TYPE_MASK {
            Self::TYPE_NOT_SPECIFIED => Some(Self::NotSpecified),
            Self::TYPE_DEVICE => Some(Self::Device(match low {
                0 => DeviceMemoryAttributes::NGnRnE,
                1 => DeviceMemoryAttributes::NGnRE,
                2 => DeviceMemoryAttributes::NGRE,
                _ => DeviceMemoryAttributes::GRE,
            })),
            Self::TYPE_NORMAL => {
                let cacheability = match low {
                    1 => Cacheability::NonCacheable,
                    3 => Cacheability::WriteBack,
                    _ => return None,
                };
                let shareability = match attrs & Self::ATTR_MASK {
                    0 => Shareability::NonShareable,
                    2 => Shareability::OuterShareable,
                    3 => Shareability::InnerShareable,
                    _ => return None,
                };
                Some(Self::Normal {
                    cacheability,
                    shareability,
                })
            }
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataAccess {
    #[default]
    NotSpecified = 0,
    ReadOnly = 1,
    ReadWrite = 2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstructionAccess {
    #[default]
    NotSpecified = 0,
    NotExecutable = 1,
    Executable = 2,
}

/// Access permissions granted to one receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessPermissions {
    pub data: DataAccess,
    pub instruction: InstructionAccess,
}

impl AccessPermissions {
    const DATA_MASK: u8 = 0x03;
    const INSTRUCTION_SHIFT: u8 = 2;
    const INSTRUCTION_MASK: u8 = 0x03;

    pub const fn to_raw(self) -> u8 {
        ((self.instruction as u8) << Self::INSTRUCTION_SHIFT) | self.data as u8
    }

    pub const fn from_raw(raw: u8) -> Option<Self> {
        let data = match raw & Self::DATA_MASK {
            0 => DataAccess::NotSpecified,
            1 => DataAccess::ReadOnly,
            2 => DataAccess::ReadWrite,
            _ => return None,
        };
        let instruction = match (raw >> Self::INSTRUCTION_SHIFT) & Self::INSTRUCTION_MASK {
            0 => InstructionAccess::NotSpecified,
            1 => InstructionAccess::NotExecutable,
            2 => InstructionAccess::Executable,
            _ => return None,
        };
        Some(Self { data, instruction })
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionType {
    #[default]
    Unspecified = 0,
    Share = 1,
    Lend = 2,
    Donate = 3,
}

bitflags! {
    /// Raw layout of the memory transaction flags word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TransactionFlagBits: u32 {
        const ZERO_MEMORY = 1 << 0;
        const OPERATION_TIME_SLICING = 1 << 1;
        const ZERO_MEMORY_AFTER_RELINQUISH = 1 << 2;
        const TYPE = 0b11 << 3;
        const ALIGNMENT_HINT = 0b1111 << 5;
        const ALIGNMENT_HINT_VALID = 1 << 9;
    }
}

/// Memory transaction flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransactionFlags {
    pub zero_memory: bool,
    pub operation_time_slicing: bool,
    pub zero_memory_after_relinquish: bool,
    pub transaction_type: TransactionType,
    /// Boundary alignment hint, at most [`TransactionFlags::MAX_ALIGNMENT_HINT`].
    pub alignment_hint: Option<u8>,
}

impl TransactionFlags {
    const TYPE_SHIFT: u32 = 3;
    const ALIGNMENT_HINT_SHIFT: u32 = 5;

    pub const MAX_ALIGNMENT_HINT: u8 = 0x0f;

    /// Flags with only the transaction type set.
    pub fn of_type(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type,
            ..Self::default()
        }
    }

    /// `None` when the alignment hint does not fit its field.
    pub fn to_raw(&self) -> Option<u32> {
        let mut bits = TransactionFlagBits::empty();
        bits.set(TransactionFlagBits::ZERO_MEMORY, self.zero_memory);
        bits.set(
            TransactionFlagBits::OPERATION_TIME_SLICING,
            self.operation_time_slicing,
        );
        bits.set(
            TransactionFlagBits::ZERO_MEMORY_AFTER_RELINQUISH,
            self.zero_memory_after_relinquish,
        );

        let mut raw = bits.bits() | ((self.transaction_type as u32) << Self::TYPE_SHIFT);

        if let Some(hint) = self.alignment_hint {
            if hint > Self::MAX_ALIGNMENT_HINT {
                return None;
            }
            raw |= TransactionFlagBits::ALIGNMENT_HINT_VALID.bits();
            raw |= (hint as u32) << Self::ALIGNMENT_HINT_SHIFT;
        }

        Some(raw)
    }

    pub fn from_raw(raw: u32) -> Self {
        let bits = TransactionFlagBits::from_bits_truncate(raw);

        let transaction_type = match (bits & TransactionFlagBits::TYPE).bits() >> Self::TYPE_SHIFT
        {
            0 => TransactionType::Unspecified,
            1 => TransactionType::Share,
            2 => TransactionType::Lend,
            _ => TransactionType::Donate,
        };

        let alignment_hint = bits
            .contains(TransactionFlagBits::ALIGNMENT_HINT_VALID)
            .then(|| {
                ((bits & TransactionFlagBits::ALIGNMENT_HINT).bits() >> Self::ALIGNMENT_HINT_SHIFT)
                    as u8
            });

        Self {
            zero_memory: bits.contains(TransactionFlagBits::ZERO_MEMORY),
            operation_time_slicing: bits.contains(TransactionFlagBits::OPERATION_TIME_SLICING),
            zero_memory_after_relinquish: bits
                .contains(TransactionFlagBits::ZERO_MEMORY_AFTER_RELINQUISH),
            transaction_type,
            alignment_hint,
        }
    }
}

/// Data access field of FFA_MEM_PERM_GET / FFA_MEM_PERM_SET.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermDataAccess {
    NoAccess = 0,
    ReadWrite = 1,
    ReadOnly = 3,
}

/// Stage-1 permissions of a partition's own memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryPermissions {
    pub data_access: PermDataAccess,
    pub executable: bool,
}

impl MemoryPermissions {
    const DATA_MASK: u32 = 0x03;
    const NON_EXECUTABLE: u32 = 1 << 2;

    pub const fn to_raw(self) -> u32 {
        let mut raw = self.data_access as u32;
        if !self.executable {
            raw |= Self::NON_EXECUTABLE;
        }
        raw
    }

    pub const fn from_raw(raw: u32) -> Option<Self> {
        let data_access = match raw & Self::DATA_MASK {
            0 => PermDataAccess::NoAccess,
            1 => PermDataAccess::ReadWrite,
            3 => PermDataAccess::ReadOnly,
            _ => return None,
        };
        Some(Self {
            data_access,
            executable: raw & Self::NON_EXECUTABLE == 0,
        })
    }
}
