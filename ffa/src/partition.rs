use bitflags::bitflags;
pub use uuid::Uuid;

use super::PartitionId;

bitflags! {
    /// Partition properties reported by FFA_PARTITION_INFO_GET.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PartitionProperties: u32 {
        const SUPPORTS_DIRECT_REQUESTS = 1 << 0;
        const CAN_SEND_DIRECT_REQUESTS = 1 << 1;
        const SUPPORTS_INDIRECT_REQUESTS = 1 << 2;
    }
}

/// One partition information record as written in the RX buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PartitionInformation {
    pub partition_id: PartitionId,
    pub execution_context_count: u16,
    pub properties: PartitionProperties,
}

impl PartitionInformation {
    pub const SIZE: usize = 8;

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            partition_id: u16::from_le_bytes([bytes[0], bytes[1]]),
            execution_context_count: u16::from_le_bytes([bytes[2], bytes[3]]),
            properties: PartitionProperties::from_bits_retain(u32::from_le_bytes([
                bytes[4], bytes[5], bytes[6], bytes[7],
            ])),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.partition_id.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.execution_context_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.properties.bits().to_le_bytes());
        bytes
    }
}

/// UUID argument layout of FFA_PARTITION_INFO_GET: four little-endian words.
pub fn uuid_to_words(uuid: &Uuid) -> [u32; 4] {
    let bytes = uuid.as_bytes();
    core::array::from_fn(|i| {
        u32::from_le_bytes([
            bytes[i * 4],
            bytes[i * 4 + 1],
            bytes[i * 4 + 2],
            bytes[i * 4 + 3],
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_words_are_little_endian() {
        let uuid = Uuid::from_bytes([
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
            0x0f, 0x10,
        ]);
        assert_eq!(
            uuid_to_words(&uuid),
            [0x0403_0201, 0x0807_0605, 0x0c0b_0a09, 0x100f_0e0d]
        );
    }

    #[test]
    fn partition_information_record() {
        let bytes = [0x34, 0x12, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
        let info = PartitionInformation::from_bytes(&bytes);
        assert_eq!(info.partition_id, 0x1234);
        assert_eq!(info.execution_context_count, 2);
        assert_eq!(
            info.properties,
            PartitionProperties::SUPPORTS_DIRECT_REQUESTS
                | PartitionProperties::CAN_SEND_DIRECT_REQUESTS
        );
        assert_eq!(info.to_bytes(), bytes);
    }
}
