//! # Request Limits
//!
//! Per-request quantity caps for a CLICK unit. Reads larger than a cap are
//! split into several requests; writes larger than a cap are refused, since a
//! `set` must reach the PLC as a single request.
//!
//! ## Modbus Limits
//!
//! - **Read Holding Registers (FC03)**: max 125 registers
//! - **Read Coils (FC01)**: max 2000 coils
//! - **Write Multiple Registers (FC16)**: max 123 registers
//! - **Write Multiple Coils (FC15)**: max 1968 coils

use serde::{Deserialize, Serialize};

use crate::category::ModbusSpace;
use crate::constants::{MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS};
use crate::error::{PlcError, PlcResult};

/// Default maximum registers per read operation.
pub const DEFAULT_MAX_READ_REGISTERS: u16 = MAX_READ_REGISTERS as u16;

/// Default maximum registers per write operation.
pub const DEFAULT_MAX_WRITE_REGISTERS: u16 = MAX_WRITE_REGISTERS as u16;

/// Default maximum coils per read operation.
pub const DEFAULT_MAX_READ_COILS: u16 = MAX_READ_COILS as u16;

/// Default maximum coils per write operation.
pub const DEFAULT_MAX_WRITE_COILS: u16 = MAX_WRITE_COILS as u16;

/// Smallest usable register read: one DF value spans two registers.
pub const MIN_READ_REGISTERS: u16 = 2;

/// Default inter-request delay in milliseconds.
pub const DEFAULT_INTER_REQUEST_DELAY_MS: u64 = 0;

/// Per-request limits used when talking to a PLC.
///
/// # Example
///
/// ```rust
/// use clickplc::DeviceLimits;
///
/// let limits = DeviceLimits::new()
///     .with_max_read_registers(50)
///     .with_inter_request_delay_ms(10);
///
/// assert_eq!(limits.max_read_registers, 50);
/// assert_eq!(limits.read_request_count(120), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceLimits {
    /// Maximum registers per read request.
    pub max_read_registers: u16,
    /// Maximum registers per write request.
    pub max_write_registers: u16,
    /// Maximum coils per read request.
    pub max_read_coils: u16,
    /// Maximum coils per write request.
    pub max_write_coils: u16,
    /// Minimum delay between the requests of a split read (milliseconds).
    pub inter_request_delay_ms: u64,
}

impl DeviceLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits for a slow link: 50 registers, 500 coils, 10ms between requests.
    pub fn conservative() -> Self {
        Self {
            max_read_registers: 50,
            max_write_registers: 50,
            max_read_coils: 500,
            max_write_coils: 500,
            inter_request_delay_ms: 10,
        }
    }

    pub fn with_max_read_registers(mut self, count: u16) -> Self {
        self.max_read_registers = count;
        self
    }

    pub fn with_max_write_registers(mut self, count: u16) -> Self {
        self.max_write_registers = count;
        self
    }

    pub fn with_max_read_coils(mut self, count: u16) -> Self {
        self.max_read_coils = count;
        self
    }

    pub fn with_max_write_coils(mut self, count: u16) -> Self {
        self.max_write_coils = count;
        self
    }

    pub fn with_inter_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_request_delay_ms = delay_ms;
        self
    }

    /// Number of read requests needed for `total_registers`.
    pub fn read_request_count(&self, total_registers: u16) -> u16 {
        if total_registers == 0 {
            return 0;
        }
        total_registers.div_ceil(self.max_read_registers)
    }

    /// Largest single write allowed in `space`.
    pub fn max_write(&self, space: ModbusSpace) -> u16 {
        match space {
            ModbusSpace::Coil => self.max_write_coils,
            ModbusSpace::HoldingRegister => self.max_write_registers,
        }
    }

    /// Refuse a write of `count` units that would not fit one request.
    pub fn check_write(&self, space: ModbusSpace, count: u16) -> PlcResult<()> {
        let max = self.max_write(space);
        if count > max {
            let unit = match space {
                ModbusSpace::Coil => "coils",
                ModbusSpace::HoldingRegister => "registers",
            };
            return Err(PlcError::value(format!(
                "Write of {} {} exceeds the per-request limit of {}.",
                count, unit, max
            )));
        }
        Ok(())
    }

    /// Reject limits that would make requests impossible.
    pub fn validate(&self) -> PlcResult<()> {
        let checks = [
            (
                "max_read_registers",
                self.max_read_registers,
                MIN_READ_REGISTERS,
                DEFAULT_MAX_READ_REGISTERS,
            ),
            (
                "max_write_registers",
                self.max_write_registers,
                1,
                DEFAULT_MAX_WRITE_REGISTERS,
            ),
            ("max_read_coils", self.max_read_coils, 1, DEFAULT_MAX_READ_COILS),
            ("max_write_coils", self.max_write_coils, 1, DEFAULT_MAX_WRITE_COILS),
        ];
        for (name, value, min, max) in checks {
            if value < min || value > max {
                return Err(PlcError::configuration(format!(
                    "{} must be in [{}, {}], got {}",
                    name, min, max, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_read_registers: DEFAULT_MAX_READ_REGISTERS,
            max_write_registers: DEFAULT_MAX_WRITE_REGISTERS,
            max_read_coils: DEFAULT_MAX_READ_COILS,
            max_write_coils: DEFAULT_MAX_WRITE_COILS,
            inter_request_delay_ms: DEFAULT_INTER_REQUEST_DELAY_MS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
