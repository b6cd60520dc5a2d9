//! Memory transaction descriptors (FF-A v1.0 layout).
//!
//! A transaction is serialized as one header, one access descriptor per
//! receiver and, when regions are given, one composite region descriptor
//! holding every constituent:
//!
//! ```text
//! 0                32            32 + 16 * n             + 16           + 16 * m
//! | header         | access desc | ... | composite header | constituent | ... |
//! ```

use core::fmt;

use ffa::{
    AccessPermissions, DataAccess, InstructionAccess, MemoryHandle, MemoryType, PAGE_SIZE,
    PartitionId, TransactionFlags,
};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[derive(Debug, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct TransactionHeader {
    sender_id: u16,
    region_attributes: u8,
    reserved0: u8,
    flags: u32,
    handle: u64,
    tag: u64,
    reserved1: u32,
    access_count: u32,
}

#[derive(Debug, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct AccessDescriptorRaw {
    endpoint_id: u16,
    permissions: u8,
    flags: u8,
    composite_offset: u32,
    reserved: u64,
}

#[derive(Debug, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct CompositeHeader {
    total_page_count: u32,
    range_count: u32,
    reserved: u64,
}

#[derive(Debug, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct ConstituentRaw {
    address: u64,
    page_count: u32,
    reserved: u32,
}

#[derive(Debug, Default, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RelinquishHeader {
    handle: u64,
    flags: u32,
    endpoint_count: u32,
}

const HEADER_SIZE: usize = size_of::<TransactionHeader>();
const ACCESS_SIZE: usize = size_of::<AccessDescriptorRaw>();
const COMPOSITE_SIZE: usize = size_of::<CompositeHeader>();
const CONSTITUENT_SIZE: usize = size_of::<ConstituentRaw>();
const RELINQUISH_SIZE: usize = size_of::<RelinquishHeader>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    BufferTooSmall,
    Truncated,
    TagMismatch { expected: u64, found: u64 },
    TooManyAccessDescriptors { count: usize, capacity: usize },
    TooManyRegions { count: usize, capacity: usize },
    MissingAccessDescriptor,
    InvalidAttributes(u8),
    InvalidPermissions(u8),
    InvalidFlags,
    PageCountOverflow,
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Truncated => write!(f, "truncated descriptor"),
            Self::TagMismatch { expected, found } => {
                write!(f, "tag mismatch: expected {expected:#x}, found {found:#x}")
            }
            Self::TooManyAccessDescriptors { count, capacity } => {
                write!(f, "{count} access descriptors, room for {capacity}")
            }
            Self::TooManyRegions { count, capacity } => {
                write!(f, "{count} regions, room for {capacity}")
            }
            Self::MissingAccessDescriptor => write!(f, "no access descriptor"),
            Self::InvalidAttributes(raw) => write!(f, "invalid region attributes {raw:#x}"),
            Self::InvalidPermissions(raw) => write!(f, "invalid access permissions {raw:#x}"),
            Self::InvalidFlags => write!(f, "invalid transaction flags"),
            Self::PageCountOverflow => write!(f, "page count overflow"),
        }
    }
}

impl core::error::Error for DescriptorError {}

/// Caller's view of a memory transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryDescriptor {
    pub sender_id: PartitionId,
    pub memory_type: MemoryType,
    pub flags: TransactionFlags,
    pub tag: u64,
}

/// Receiver of a transaction and the access it is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryAccessDescriptor {
    pub receiver_id: PartitionId,
    pub instruction_access: InstructionAccess,
    pub data_access: DataAccess,
}

/// Contiguous range of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryRegion {
    pub address: usize,
    pub page_count: u32,
}

impl MemoryRegion {
    pub fn size(&self) -> usize {
        self.page_count as usize * PAGE_SIZE
    }
}

/// Result of parsing a transaction descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub descriptor: MemoryDescriptor,
    pub handle: MemoryHandle,
    /// Number of access descriptors written to the caller's slice.
    pub access_count: usize,
    /// Number of regions written to the caller's slice.
    pub region_count: usize,
}

/// Byte region holding one serialized descriptor.
#[derive(Debug)]
pub struct TransactionBuffer<'a> {
    buffer: &'a mut [u8],
    used: usize,
}

impl<'a> TransactionBuffer<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, used: 0 }
    }

    pub fn address(&self) -> usize {
        self.buffer.as_ptr() as usize
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn page_count(&self) -> usize {
        self.capacity() / PAGE_SIZE
    }

    /// Dynamic buffers are handed to the SPMC by page.
    pub fn is_page_aligned(&self) -> bool {
        self.capacity() != 0
            && self.address() % PAGE_SIZE == 0
            && self.capacity() % PAGE_SIZE == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.used]
    }

    /// Mark `used` bytes as valid, e.g. after the SPMC wrote a response into the buffer.
    pub fn set_used(&mut self, used: usize) -> Result<(), DescriptorError> {
        if used > self.capacity() {
            return Err(DescriptorError::Truncated);
        }
        self.used = used;
        Ok(())
    }

    /// Serialize a transaction descriptor, replacing the previous content.
    pub fn build_transaction(
        &mut self,
        descriptor: &MemoryDescriptor,
        access: &[MemoryAccessDescriptor],
        regions: &[MemoryRegion],
        handle: MemoryHandle,
    ) -> Result<(), DescriptorError> {
        self.used = build_transaction(self.buffer, descriptor, access, regions, handle)?;
        Ok(())
    }

    pub fn parse_transaction(
        &self,
        expected_tag: u64,
        access: &mut [MemoryAccessDescriptor],
        regions: &mut [MemoryRegion],
    ) -> Result<ParsedTransaction, DescriptorError> {
        parse_transaction(self.as_bytes(), expected_tag, access, regions)
    }

    /// Serialize a relinquish descriptor, replacing the previous content.
    pub fn build_relinquish(
        &mut self,
        handle: MemoryHandle,
        flags: &TransactionFlags,
        endpoints: &[PartitionId],
    ) -> Result<(), DescriptorError> {
        self.used = build_relinquish(self.buffer, handle, flags, endpoints)?;
        Ok(())
    }
}

fn write_at<T: IntoBytes + Immutable>(
    buffer: &mut [u8],
    offset: usize,
    value: &T,
) -> Result<(), DescriptorError> {
    let dst = buffer
        .get_mut(offset..)
        .ok_or(DescriptorError::BufferTooSmall)?;
    value
        .write_to_prefix(dst)
        .map_err(|_| DescriptorError::BufferTooSmall)
}

fn read_at<T: FromBytes>(bytes: &[u8], offset: usize) -> Result<T, DescriptorError> {
    let src = bytes.get(offset..).ok_or(DescriptorError::Truncated)?;
    T::read_from_prefix(src)
        .map(|(value, _)| value)
        .map_err(|_| DescriptorError::Truncated)
}

/// Serialize into `buffer`, returning the number of bytes used.
pub fn build_transaction(
    buffer: &mut [u8],
    descriptor: &MemoryDescriptor,
    access: &[MemoryAccessDescriptor],
    regions: &[MemoryRegion],
    handle: MemoryHandle,
) -> Result<usize, DescriptorError> {
    if access.is_empty() {
        return Err(DescriptorError::MissingAccessDescriptor);
    }

    let composite_offset = HEADER_SIZE + access.len() * ACCESS_SIZE;
    let required = if regions.is_empty() {
        composite_offset
    } else {
        composite_offset + COMPOSITE_SIZE + regions.len() * CONSTITUENT_SIZE
    };

    if required > buffer.len() {
        return Err(DescriptorError::BufferTooSmall);
    }

    let flags = descriptor
        .flags
        .to_raw()
        .ok_or(DescriptorError::InvalidFlags)?;

    let header = TransactionHeader {
        sender_id: descriptor.sender_id,
        region_attributes: descriptor.memory_type.to_attributes(),
        flags,
        handle: handle.as_u64(),
        tag: descriptor.tag,
        access_count: access.len() as u32,
        ..Default::default()
    };
    write_at(buffer, 0, &header)?;

    for (index, acc) in access.iter().enumerate() {
        let raw = AccessDescriptorRaw {
            endpoint_id: acc.receiver_id,
            permissions: AccessPermissions {
                data: acc.data_access,
                instruction: acc.instruction_access,
            }
            .to_raw(),
            // Non-retrieval borrower flag is not supported
            flags: 0,
            composite_offset: if regions.is_empty() {
                0
            } else {
                composite_offset as u32
            },
            reserved: 0,
        };
        write_at(buffer, HEADER_SIZE + index * ACCESS_SIZE, &raw)?;
    }

    if !regions.is_empty() {
        let total_page_count = regions
            .iter()
            .try_fold(0u32, |total, region| total.checked_add(region.page_count))
            .ok_or(DescriptorError::PageCountOverflow)?;

        let composite = CompositeHeader {
            total_page_count,
            range_count: regions.len() as u32,
            reserved: 0,
        };
        write_at(buffer, composite_offset, &composite)?;

        for (index, region) in regions.iter().enumerate() {
            let raw = ConstituentRaw {
                address: region.address as u64,
                page_count: region.page_count,
                reserved: 0,
            };
            write_at(
                buffer,
                composite_offset + COMPOSITE_SIZE + index * CONSTITUENT_SIZE,
                &raw,
            )?;
        }
    }

    Ok(required)
}

/// Parse a transaction descriptor.
///
/// The tag must match the one sent. Access descriptors and regions are
/// written to the caller's slices, which must be large enough for every entry.
pub fn parse_transaction(
    bytes: &[u8],
    expected_tag: u64,
    access: &mut [MemoryAccessDescriptor],
    regions: &mut [MemoryRegion],
) -> Result<ParsedTransaction, DescriptorError> {
    let header: TransactionHeader = read_at(bytes, 0)?;

    if header.tag != expected_tag {
        return Err(DescriptorError::TagMismatch {
            expected: expected_tag,
            found: header.tag,
        });
    }

    let memory_type = MemoryType::from_attributes(header.region_attributes)
        .ok_or(DescriptorError::InvalidAttributes(header.region_attributes))?;

    let access_count = header.access_count as usize;
    if access_count > access.len() {
        return Err(DescriptorError::TooManyAccessDescriptors {
            count: access_count,
            capacity: access.len(),
        });
    }

    let mut composite_offset = 0;
    for (index, acc) in access.iter_mut().take(access_count).enumerate() {
        let raw: AccessDescriptorRaw = read_at(bytes, HEADER_SIZE + index * ACCESS_SIZE)?;
        let permissions = AccessPermissions::from_raw(raw.permissions)
            .ok_or(DescriptorError::InvalidPermissions(raw.permissions))?;

        *acc = MemoryAccessDescriptor {
            receiver_id: raw.endpoint_id,
            instruction_access: permissions.instruction,
            data_access: permissions.data,
        };

        if composite_offset == 0 {
            composite_offset = raw.composite_offset as usize;
        }
    }

    let mut region_count = 0;
    if composite_offset != 0 {
        let composite: CompositeHeader = read_at(bytes, composite_offset)?;

        region_count = composite.range_count as usize;
        if region_count > regions.len() {
            return Err(DescriptorError::TooManyRegions {
                count: region_count,
                capacity: regions.len(),
            });
        }

        for (index, region) in regions.iter_mut().take(region_count).enumerate() {
            let raw: ConstituentRaw = read_at(
                bytes,
                composite_offset + COMPOSITE_SIZE + index * CONSTITUENT_SIZE,
            )?;

            *region = MemoryRegion {
                address: raw.address as usize,
                page_count: raw.page_count,
            };
        }
    }

    Ok(ParsedTransaction {
        descriptor: MemoryDescriptor {
            sender_id: header.sender_id,
            memory_type,
            flags: TransactionFlags::from_raw(header.flags),
            tag: header.tag,
        },
        handle: MemoryHandle::new(header.handle),
        access_count,
        region_count,
    })
}

/// Serialize a relinquish descriptor, returning the number of bytes used.
pub fn build_relinquish(
    buffer: &mut [u8],
    handle: MemoryHandle,
    flags: &TransactionFlags,
    endpoints: &[PartitionId],
) -> Result<usize, DescriptorError> {
    let required = RELINQUISH_SIZE + endpoints.len() * size_of::<PartitionId>();
    if required > buffer.len() {
        return Err(DescriptorError::BufferTooSmall);
    }

    let header = RelinquishHeader {
        handle: handle.as_u64(),
        flags: flags.to_raw().ok_or(DescriptorError::InvalidFlags)?,
        endpoint_count: endpoints.len() as u32,
    };
    write_at(buffer, 0, &header)?;

    for (index, endpoint) in endpoints.iter().enumerate() {
        write_at(
            buffer,
            RELINQUISH_SIZE + index * size_of::<PartitionId>(),
            endpoint,
        )?;
    }

    Ok(required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffa::{Cacheability, DeviceMemoryAttributes, Shareability, TransactionType};
    use proptest::prelude::*;

    fn share_descriptor() -> MemoryDescriptor {
        MemoryDescriptor {
            sender_id: 0x8001,
            memory_type: MemoryType::Normal {
                cacheability: Cacheability::WriteBack,
                shareability: Shareability::InnerShareable,
            },
            flags: TransactionFlags::of_type(TransactionType::Share),
            tag: 0x1122_3344,
        }
    }

    fn rw_access(receiver_id: PartitionId) -> MemoryAccessDescriptor {
        MemoryAccessDescriptor {
            receiver_id,
            instruction_access: InstructionAccess::NotSpecified,
            data_access: DataAccess::ReadWrite,
        }
    }

    #[test]
    fn wire_layout() {
        let mut bytes = [0xffu8; 128];
        let used = build_transaction(
            &mut bytes,
            &share_descriptor(),
            &[rw_access(0x8002)],
            &[MemoryRegion {
                address: 0x4000_0000,
                page_count: 2,
            }],
            MemoryHandle::new(0x55),
        )
        .unwrap();

        assert_eq!(used, 32 + 16 + 16 + 16);
        // header
        assert_eq!(&bytes[0..2], &0x8001u16.to_ne_bytes());
        assert_eq!(bytes[2], 0x2f);
        assert_eq!(bytes[3], 0);
        assert_eq!(&bytes[4..8], &(1u32 << 3).to_ne_bytes());
        assert_eq!(&bytes[8..16], &0x55u64.to_ne_bytes());
        assert_eq!(&bytes[16..24], &0x1122_3344u64.to_ne_bytes());
        assert_eq!(&bytes[28..32], &1u32.to_ne_bytes());
        // access descriptor
        assert_eq!(&bytes[32..34], &0x8002u16.to_ne_bytes());
        assert_eq!(bytes[34], 0x02);
        assert_eq!(&bytes[36..40], &48u32.to_ne_bytes());
        // composite
        assert_eq!(&bytes[48..52], &2u32.to_ne_bytes());
        assert_eq!(&bytes[52..56], &1u32.to_ne_bytes());
        // constituent
        assert_eq!(&bytes[64..72], &0x4000_0000u64.to_ne_bytes());
        assert_eq!(&bytes[72..76], &2u32.to_ne_bytes());
        assert_eq!(&bytes[80..], &[0xffu8; 48]);
    }

    #[test]
    fn retrieve_request_without_regions() {
        let mut bytes = [0u8; 64];
        let used = build_transaction(
            &mut bytes,
            &MemoryDescriptor {
                sender_id: 0x1234,
                flags: TransactionFlags::of_type(TransactionType::Share),
                ..Default::default()
            },
            &[rw_access(0x5678)],
            &[],
            MemoryHandle::new(0xabcd),
        )
        .unwrap();

        assert_eq!(used, 48);
        assert_eq!(&bytes[36..40], &0u32.to_ne_bytes());

        let mut access = [MemoryAccessDescriptor::default()];
        let parsed = parse_transaction(&bytes[..used], 0, &mut access, &mut []).unwrap();
        assert_eq!(parsed.region_count, 0);
        assert_eq!(parsed.handle, MemoryHandle::new(0xabcd));
        assert_eq!(access[0], rw_access(0x5678));
    }

    #[test]
    fn buffer_too_small() {
        let mut bytes = [0u8; 63];
        assert_eq!(
            build_transaction(
                &mut bytes,
                &share_descriptor(),
                &[rw_access(1)],
                &[MemoryRegion {
                    address: 0,
                    page_count: 1
                }],
                MemoryHandle::UNUSED,
            ),
            Err(DescriptorError::BufferTooSmall)
        );
    }

    #[test]
    fn missing_access_descriptor() {
        let mut bytes = [0u8; 64];
        assert_eq!(
            build_transaction(
                &mut bytes,
                &share_descriptor(),
                &[],
                &[],
                MemoryHandle::UNUSED
            ),
            Err(DescriptorError::MissingAccessDescriptor)
        );
    }

    #[test]
    fn page_count_overflow() {
        let mut bytes = [0u8; 128];
        let region = MemoryRegion {
            address: 0,
            page_count: u32::MAX,
        };
        assert_eq!(
            build_transaction(
                &mut bytes,
                &share_descriptor(),
                &[rw_access(1)],
                &[region, region],
                MemoryHandle::UNUSED,
            ),
            Err(DescriptorError::PageCountOverflow)
        );
    }

    #[test]
    fn tag_mismatch() {
        let mut bytes = [0u8; 64];
        let used = build_transaction(
            &mut bytes,
            &share_descriptor(),
            &[rw_access(1)],
            &[],
            MemoryHandle::UNUSED,
        )
        .unwrap();

        let mut access = [MemoryAccessDescriptor::default()];
        assert_eq!(
            parse_transaction(&bytes[..used], 7, &mut access, &mut []),
            Err(DescriptorError::TagMismatch {
                expected: 7,
                found: 0x1122_3344
            })
        );
    }

    #[test]
    fn capacity_exceeded() {
        let mut bytes = [0u8; 256];
        let regions = [MemoryRegion {
            address: 0x1000,
            page_count: 1,
        }; 3];
        let used = build_transaction(
            &mut bytes,
            &share_descriptor(),
            &[rw_access(1), rw_access(2)],
            &regions,
            MemoryHandle::UNUSED,
        )
        .unwrap();

        let mut one_access = [MemoryAccessDescriptor::default()];
        let mut regions_out = [MemoryRegion::default(); 3];
        assert_eq!(
            parse_transaction(&bytes[..used], 0x1122_3344, &mut one_access, &mut regions_out),
            Err(DescriptorError::TooManyAccessDescriptors {
                count: 2,
                capacity: 1
            })
        );

        let mut two_access = [MemoryAccessDescriptor::default(); 2];
        let mut two_regions = [MemoryRegion::default(); 2];
        assert_eq!(
            parse_transaction(&bytes[..used], 0x1122_3344, &mut two_access, &mut two_regions),
            Err(DescriptorError::TooManyRegions {
                count: 3,
                capacity: 2
            })
        );
    }

    #[test]
    fn truncated_input() {
        let mut bytes = [0u8; 128];
        let used = build_transaction(
            &mut bytes,
            &share_descriptor(),
            &[rw_access(1)],
            &[MemoryRegion {
                address: 0,
                page_count: 1,
            }],
            MemoryHandle::UNUSED,
        )
        .unwrap();

        let mut access = [MemoryAccessDescriptor::default()];
        let mut regions = [MemoryRegion::default()];
        assert_eq!(
            parse_transaction(&bytes[..used - 1], 0x1122_3344, &mut access, &mut regions),
            Err(DescriptorError::Truncated)
        );
        assert_eq!(
            parse_transaction(&bytes[..16], 0x1122_3344, &mut access, &mut regions),
            Err(DescriptorError::Truncated)
        );
    }

    #[test]
    fn reserved_attributes() {
        let mut bytes = [0u8; 64];
        let used = build_transaction(
            &mut bytes,
            &share_descriptor(),
            &[rw_access(1)],
            &[],
            MemoryHandle::UNUSED,
        )
        .unwrap();
        bytes[2] = 0x30;

        let mut access = [MemoryAccessDescriptor::default()];
        assert_eq!(
            parse_transaction(&bytes[..used], 0x1122_3344, &mut access, &mut []),
            Err(DescriptorError::InvalidAttributes(0x30))
        );
    }

    #[test]
    fn relinquish_layout() {
        let mut bytes = [0u8; 32];
        let used = build_relinquish(
            &mut bytes,
            MemoryHandle::new(0xabcd_ef01_2345_6789),
            &TransactionFlags {
                zero_memory: true,
                ..Default::default()
            },
            &[0x5678, 0x9abc],
        )
        .unwrap();

        assert_eq!(used, 20);
        assert_eq!(&bytes[0..8], &0xabcd_ef01_2345_6789u64.to_ne_bytes());
        assert_eq!(&bytes[8..12], &1u32.to_ne_bytes());
        assert_eq!(&bytes[12..16], &2u32.to_ne_bytes());
        assert_eq!(&bytes[16..18], &0x5678u16.to_ne_bytes());
        assert_eq!(&bytes[18..20], &0x9abcu16.to_ne_bytes());

        assert_eq!(
            build_relinquish(&mut bytes[..17], MemoryHandle::UNUSED, &Default::default(), &[1]),
            Err(DescriptorError::BufferTooSmall)
        );
    }

    #[test]
    fn transaction_buffer_tracks_usage() {
        let mut bytes = [0u8; 256];
        let mut buffer = TransactionBuffer::new(&mut bytes);
        assert_eq!(buffer.used(), 0);

        buffer
            .build_transaction(
                &share_descriptor(),
                &[rw_access(1)],
                &[],
                MemoryHandle::UNUSED,
            )
            .unwrap();
        assert_eq!(buffer.used(), 48);
        assert_eq!(buffer.as_bytes().len(), 48);

        assert_eq!(buffer.set_used(257), Err(DescriptorError::Truncated));
        assert_eq!(buffer.used(), 48);

        let mut access = [MemoryAccessDescriptor::default()];
        let parsed = buffer
            .parse_transaction(0x1122_3344, &mut access, &mut [])
            .unwrap();
        assert_eq!(parsed.descriptor, share_descriptor());
    }

    fn memory_type() -> impl Strategy<Value = MemoryType> {
        prop_oneof![
            Just(MemoryType::NotSpecified),
            prop_oneof![
                Just(DeviceMemoryAttributes::NGnRnE),
                Just(DeviceMemoryAttributes::NGnRE),
                Just(DeviceMemoryAttributes::NGRE),
                Just(DeviceMemoryAttributes::GRE),
            ]
            .prop_map(MemoryType::Device),
            (
                prop_oneof![
                    Just(Cacheability::NonCacheable),
                    Just(Cacheability::WriteBack)
                ],
                prop_oneof![
                    Just(Shareability::NonShareable),
                    Just(Shareability::OuterShareable),
                    Just(Shareability::InnerShareable),
                ],
            )
                .prop_map(|(cacheability, shareability)| MemoryType::Normal {
                    cacheability,
                    shareability
                }),
        ]
    }

    fn flags() -> impl Strategy<Value = TransactionFlags> {
        (
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            prop_oneof![
                Just(TransactionType::Unspecified),
                Just(TransactionType::Share),
                Just(TransactionType::Lend),
                Just(TransactionType::Donate),
            ],
            proptest::option::of(0u8..=TransactionFlags::MAX_ALIGNMENT_HINT),
        )
            .prop_map(
                |(
                    zero_memory,
                    operation_time_slicing,
                    zero_memory_after_relinquish,
                    transaction_type,
                    alignment_hint,
                )| {
                    TransactionFlags {
                        zero_memory,
                        operation_time_slicing,
                        zero_memory_after_relinquish,
                        transaction_type,
                        alignment_hint,
                    }
                },
            )
    }

    fn access_descriptor() -> impl Strategy<Value = MemoryAccessDescriptor> {
        (
            any::<u16>(),
            prop_oneof![
                Just(InstructionAccess::NotSpecified),
                Just(InstructionAccess::NotExecutable),
                Just(InstructionAccess::Executable),
            ],
            prop_oneof![
                Just(DataAccess::NotSpecified),
                Just(DataAccess::ReadOnly),
                Just(DataAccess::ReadWrite),
            ],
        )
            .prop_map(|(receiver_id, instruction_access, data_access)| {
                MemoryAccessDescriptor {
                    receiver_id,
                    instruction_access,
                    data_access,
                }
            })
    }

    fn region() -> impl Strategy<Value = MemoryRegion> {
        (any::<u32>(), 0u32..0x1000).prop_map(|(page, page_count)| MemoryRegion {
            address: page as usize * PAGE_SIZE,
            page_count,
        })
    }

    proptest! {
        #[test]
        fn build_then_parse_is_identity(
            sender_id in any::<u16>(),
            memory_type in memory_type(),
            flags in flags(),
            tag in any::<u64>(),
            handle in any::<u64>(),
            access in proptest::collection::vec(access_descriptor(), 1..4),
            regions in proptest::collection::vec(region(), 0..6),
        ) {
            let descriptor = MemoryDescriptor { sender_id, memory_type, flags, tag };
            let mut bytes = [0u8; 512];
            let used = build_transaction(
                &mut bytes,
                &descriptor,
                &access,
                &regions,
                MemoryHandle::new(handle),
            ).unwrap();

            let mut access_out = [MemoryAccessDescriptor::default(); 4];
            let mut regions_out = [MemoryRegion::default(); 6];
            let parsed =
                parse_transaction(&bytes[..used], tag, &mut access_out, &mut regions_out).unwrap();

            prop_assert_eq!(parsed.descriptor, descriptor);
            prop_assert_eq!(parsed.handle, MemoryHandle::new(handle));
            prop_assert_eq!(&access_out[..parsed.access_count], &access[..]);
            prop_assert_eq!(&regions_out[..parsed.region_count], &regions[..]);
        }
    }
}
