//! # clickplc - Async Driver for AutomationDirect CLICK PLCs
//!
//! Read and write the memory of a Koyo / AutomationDirect CLICK PLC over
//! Modbus TCP, using either raw addresses (`c12`, `df3`, `x1-x5`) or the tag
//! names exported by the CLICK programming software.
//!
//! ## Supported Memory
//!
//! | Category | Addresses | Type | Modbus |
//! |----------|-----------|------|--------|
//! | X | x001-x816 (slots 01-16 per block) | bool | coils from 0 |
//! | Y | y001-y816 (slots 01-16 per block) | bool | coils from 8192 |
//! | C | c1-c2000 | bool | coils from 16384 |
//! | DS | ds1-ds4500 | int16 | holding registers from 0 |
//! | DF | df1-df500 | float32 | holding registers from 28672, 2 each |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clickplc::{ClickPlc, DriverConfig, PlcResult};
//!
//! #[tokio::main]
//! async fn main() -> PlcResult<()> {
//!     let config = DriverConfig::new("192.168.1.10").with_tag_file("plc_tags.csv");
//!     let mut plc = ClickPlc::connect(&config).await?;
//!
//!     // Read a range of control relays
//!     let relays = plc.get("c1-c10").await?;
//!     println!("{:?}", relays);
//!
//!     // Write two floats starting at DF3
//!     plc.set("df3", [1.5f32, 2.5]).await?;
//!
//!     // Read every tag in the table
//!     let state = plc.get_all().await?;
//!     println!("{}", serde_json::to_string_pretty(&state).unwrap_or_default());
//!
//!     plc.close().await?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Error types and result alias
pub mod error;

/// Modbus protocol constants
pub mod constants;

/// Modbus request and response types
pub mod protocol;

/// Modbus TCP transport
pub mod transport;

/// Modbus client trait and implementations
pub mod client;

/// Per-request limits
pub mod device_limits;

// ============================================================================
// CLICK address model
// ============================================================================

/// Typed PLC values
pub mod value;

/// Memory categories and the CLICK Modbus map
pub mod category;

/// Validated address ranges
pub mod range;

/// Address spec parsing
pub mod address;

/// Write payload type checking
pub mod coerce;

/// Register and coil encoding
pub mod codec;

/// Tag tables
pub mod tags;

// ============================================================================
// Driver
// ============================================================================

/// Read results
pub mod readings;

/// Driver configuration
pub mod config;

/// The CLICK driver
pub mod driver;

/// In-memory PLC for tests
pub mod mock;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime ===
pub use tokio;

// === Driver API ===
pub use config::DriverConfig;
pub use driver::ClickPlc;
pub use readings::Readings;

// === Error handling ===
pub use error::{PlcError, PlcResult};

// === Address model ===
pub use address::parse_spec;
pub use category::{Category, ModbusSpace};
pub use range::AddressRange;
pub use tags::{TagEntry, TagInfo, TagTable};
pub use value::{PlcValue, ValueType, WriteData};

// === Modbus plumbing ===
pub use client::{GenericModbusClient, ModbusClient, ModbusTcpClient};
pub use device_limits::DeviceLimits;
pub use mock::{MockCall, MockClient};
pub use protocol::{ModbusFunction, ModbusRequest, ModbusResponse, UnitId};
pub use transport::{ModbusTransport, TcpTransport, TransportStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
