//! GATT UUIDs of the legacy Nordic DFU service

use uuid::Uuid;

/// DFU service UUID
pub const DFU_SERVICE_UUID: Uuid = Uuid::from_u128(0x00001530_1212_efde_1523_785feabcd123);

/// Control point characteristic (write with response, notify)
pub const DFU_CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0x00001531_1212_efde_1523_785feabcd123);

/// Packet characteristic (write without response)
pub const DFU_PACKET_UUID: Uuid = Uuid::from_u128(0x00001532_1212_efde_1523_785feabcd123);
