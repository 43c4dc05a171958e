//! Modbus constants used by the CLICK driver
//!
//! Frame sizes and per-request limits follow the Modbus application protocol
//! specification. CLICK CPUs accept the full specification limits.

// ============================================================================
// Frame Size Constants
// ============================================================================

/// MBAP header length up to and including the length field:
/// Transaction ID(2) + Protocol ID(2) + Length(2).
/// The unit id is counted by the length field.
pub const MBAP_HEADER_LEN: usize = 6;

/// Protocol identifier carried in every MBAP header (always 0 for Modbus).
pub const MBAP_PROTOCOL_ID: u16 = 0;

/// Maximum PDU size: RS485 ADU (256) - address (1) - CRC (2).
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum MBAP length field value (unit id + PDU).
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

/// Modbus TCP port CLICK units listen on.
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default Modbus unit id. CLICK CPUs answer on any unit id.
pub const DEFAULT_UNIT_ID: u8 = 1;

// ============================================================================
// Request Limits
// ============================================================================

/// FC03: 1 + 1 + 2N ≤ 253 → N ≤ 125.
pub const MAX_READ_REGISTERS: usize = 125;

/// FC16: 1 + 2 + 2 + 1 + 2N ≤ 253 → N ≤ 123.
pub const MAX_WRITE_REGISTERS: usize = 123;

/// FC01/02: specification cap.
pub const MAX_READ_COILS: usize = 2000;

/// FC15: specification cap (0x7B0).
pub const MAX_WRITE_COILS: usize = 1968;

// ============================================================================
// Function Codes
// ============================================================================

pub const FC_READ_COILS: u8 = 0x01;
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Bit set on the function code of an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;

// ============================================================================
// Exception Codes
// ============================================================================

pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;
pub const EXCEPTION_SERVER_DEVICE_FAILURE: u8 = 0x04;
pub const EXCEPTION_ACKNOWLEDGE: u8 = 0x05;
pub const EXCEPTION_SERVER_DEVICE_BUSY: u8 = 0x06;
pub const EXCEPTION_MEMORY_PARITY_ERROR: u8 = 0x08;
pub const EXCEPTION_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;
pub const EXCEPTION_GATEWAY_TARGET_FAILED: u8 = 0x0B;
