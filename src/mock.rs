//! In-memory PLC for tests
//!
//! [`MockClient`] implements [`ModbusClient`] over a sparse coil and register
//! map. Unwritten addresses read as `false` / `0`. Every call is recorded so
//! tests can assert exactly which requests a driver operation produced.
//!
//! ```rust
//! use clickplc::{ClickPlc, MockCall, MockClient};
//!
//! # tokio_test::block_on(async {
//! let mut plc = ClickPlc::new(MockClient::new());
//! plc.set("c1", true).await.unwrap();
//! assert_eq!(plc.client().calls(), [MockCall::WriteCoil { address: 16384, value: true }]);
//! # });
//! ```

use std::collections::HashMap;

use crate::client::ModbusClient;
use crate::constants::{MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS};
use crate::error::{PlcError, PlcResult};
use crate::protocol::UnitId;
use crate::transport::TransportStats;

/// A request seen by [`MockClient`]. Addresses are zero-based Modbus offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ReadCoils { address: u16, quantity: u16 },
    ReadRegisters { address: u16, quantity: u16 },
    WriteCoil { address: u16, value: bool },
    WriteRegister { address: u16, value: u16 },
    WriteCoils { address: u16, values: Vec<bool> },
    WriteRegisters { address: u16, values: Vec<u16> },
}

/// Modbus client backed by memory.
#[derive(Debug)]
pub struct MockClient {
    coils: HashMap<u16, bool>,
    registers: HashMap<u16, u16>,
    calls: Vec<MockCall>,
    fail_next: Option<String>,
    connected: bool,
    stats: TransportStats,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            coils: HashMap::new(),
            registers: HashMap::new(),
            calls: Vec::new(),
            fail_next: None,
            connected: true,
            stats: TransportStats::default(),
        }
    }

    pub fn coil(&self, address: u16) -> bool {
        self.coils.get(&address).copied().unwrap_or(false)
    }

    pub fn register(&self, address: u16) -> u16 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    pub fn set_coil(&mut self, address: u16, value: bool) {
        self.coils.insert(address, value);
    }

    pub fn set_register(&mut self, address: u16, value: u16) {
        self.registers.insert(address, value);
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Make the next request fail with a connection error.
    pub fn fail_next_request(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    fn record(&mut self, call: MockCall) -> PlcResult<()> {
        if !self.connected {
            return Err(PlcError::connection("Not connected"));
        }
        self.calls.push(call);
        self.stats.requests_sent += 1;
        if let Some(message) = self.fail_next.take() {
            self.stats.errors += 1;
            return Err(PlcError::connection(message));
        }
        self.stats.responses_received += 1;
        Ok(())
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

fn check_quantity(quantity: usize, max: usize) -> PlcResult<()> {
    if quantity == 0 || quantity > max {
        return Err(PlcError::invalid_data(format!(
            "Invalid quantity {} (must be 1-{})",
            quantity, max
        )));
    }
    Ok(())
}

fn offsets(address: u16, count: usize) -> impl Iterator<Item = u16> {
    (0..count).map(move |i| address.wrapping_add(i as u16))
}

impl ModbusClient for MockClient {
    async fn read_01(&mut self, _unit_id: UnitId, address: u16, quantity: u16) -> PlcResult<Vec<bool>> {
        check_quantity(usize::from(quantity), MAX_READ_COILS)?;
        self.record(MockCall::ReadCoils { address, quantity })?;
        Ok(offsets(address, usize::from(quantity))
            .map(|at| self.coil(at))
            .collect())
    }

    async fn read_03(&mut self, _unit_id: UnitId, address: u16, quantity: u16) -> PlcResult<Vec<u16>> {
        check_quantity(usize::from(quantity), MAX_READ_REGISTERS)?;
        self.record(MockCall::ReadRegisters { address, quantity })?;
        Ok(offsets(address, usize::from(quantity))
            .map(|at| self.register(at))
            .collect())
    }

    async fn write_05(&mut self, _unit_id: UnitId, address: u16, value: bool) -> PlcResult<()> {
        self.record(MockCall::WriteCoil { address, value })?;
        self.set_coil(address, value);
        Ok(())
    }

    async fn write_06(&mut self, _unit_id: UnitId, address: u16, value: u16) -> PlcResult<()> {
        self.record(MockCall::WriteRegister { address, value })?;
        self.set_register(address, value);
        Ok(())
    }

    async fn write_0f(&mut self, _unit_id: UnitId, address: u16, values: &[bool]) -> PlcResult<()> {
        check_quantity(values.len(), MAX_WRITE_COILS)?;
        self.record(MockCall::WriteCoils {
            address,
            values: values.to_vec(),
        })?;
        for (at, &value) in offsets(address, values.len()).zip(values) {
            self.set_coil(at, value);
        }
        Ok(())
    }

    async fn write_10(&mut self, _unit_id: UnitId, address: u16, values: &[u16]) -> PlcResult<()> {
        check_quantity(values.len(), MAX_WRITE_REGISTERS)?;
        self.record(MockCall::WriteRegisters {
            address,
            values: values.to_vec(),
        })?;
        for (at, &value) in offsets(address, values.len()).zip(values) {
            self.set_register(at, value);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn close(&mut self) -> PlcResult<()> {
        self.connected = false;
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats
    }
}
