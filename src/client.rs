//! Modbus client
//!
//! [`ModbusClient`] is the seam between the CLICK driver and the wire. The
//! driver only needs the coil and holding-register function codes:
//!
//! | Function Code | Method |
//! |---------------|--------|
//! | 0x01 | `read_01()` |
//! | 0x03 | `read_03()` |
//! | 0x05 | `write_05()` |
//! | 0x06 | `write_06()` |
//! | 0x0F | `write_0f()` |
//! | 0x10 | `write_10()` |
//!
//! [`GenericModbusClient`] builds requests and hands them to any
//! [`ModbusTransport`]; [`ModbusTcpClient`] is that client over TCP.
//! [`MockClient`](crate::MockClient) implements the trait in memory.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, trace};

use crate::constants::{MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS};
use crate::device_limits::DeviceLimits;
use crate::error::{PlcError, PlcResult};
use crate::protocol::{ModbusFunction, ModbusRequest, ModbusResponse, UnitId};
use crate::transport::{ModbusTransport, TcpTransport, TransportStats};

/// Async Modbus operations used by the driver.
///
/// # Protocol Limits
///
/// | Operation | Limit |
/// |-----------|-------|
/// | Read Coils (0x01) | 2000 coils |
/// | Read Holding Registers (0x03) | 125 registers |
/// | Write Multiple Coils (0x0F) | 1968 coils |
/// | Write Multiple Registers (0x10) | 123 registers |
pub trait ModbusClient: Send + Sync {
    /// Read coils (function code 0x01).
    fn read_01(
        &mut self,
        unit_id: UnitId,
        address: u16,
        quantity: u16,
    ) -> impl std::future::Future<Output = PlcResult<Vec<bool>>> + Send;

    /// Read holding registers (function code 0x03).
    fn read_03(
        &mut self,
        unit_id: UnitId,
        address: u16,
        quantity: u16,
    ) -> impl std::future::Future<Output = PlcResult<Vec<u16>>> + Send;

    /// Write single coil (function code 0x05).
    fn write_05(
        &mut self,
        unit_id: UnitId,
        address: u16,
        value: bool,
    ) -> impl std::future::Future<Output = PlcResult<()>> + Send;

    /// Write single register (function code 0x06).
    fn write_06(
        &mut self,
        unit_id: UnitId,
        address: u16,
        value: u16,
    ) -> impl std::future::Future<Output = PlcResult<()>> + Send;

    /// Write multiple coils (function code 0x0F).
    fn write_0f(
        &mut self,
        unit_id: UnitId,
        address: u16,
        values: &[bool],
    ) -> impl std::future::Future<Output = PlcResult<()>> + Send;

    /// Write multiple registers (function code 0x10).
    fn write_10(
        &mut self,
        unit_id: UnitId,
        address: u16,
        values: &[u16],
    ) -> impl std::future::Future<Output = PlcResult<()>> + Send;

    /// Read `quantity` coils, split into requests of at most
    /// `limits.max_read_coils`.
    fn read_01_batch(
        &mut self,
        unit_id: UnitId,
        address: u16,
        quantity: u16,
        limits: &DeviceLimits,
    ) -> impl std::future::Future<Output = PlcResult<Vec<bool>>> + Send
    where
        Self: Sized,
    {
        let max_read_coils = limits.max_read_coils;
        let inter_request_delay_ms = limits.inter_request_delay_ms;
        async move {
            if quantity == 0 {
                return Ok(Vec::new());
            }

            let mut result = Vec::with_capacity(quantity as usize);
            let mut current_address = address;
            let mut remaining = quantity;

            while remaining > 0 {
                let count = remaining.min(max_read_coils);
                let chunk = self.read_01(unit_id, current_address, count).await?;
                result.extend_from_slice(&chunk);

                current_address = current_address.saturating_add(count);
                remaining -= count;

                if inter_request_delay_ms > 0 && remaining > 0 {
                    tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
                }
            }

            Ok(result)
        }
    }

    /// Read `quantity` holding registers, split into requests of at most
    /// `limits.max_read_registers`.
    ///
    /// A request boundary never falls between the two words of a float when
    /// `align` is 2 and the range starts on a float.
    fn read_03_batch(
        &mut self,
        unit_id: UnitId,
        address: u16,
        quantity: u16,
        align: u16,
        limits: &DeviceLimits,
    ) -> impl std::future::Future<Output = PlcResult<Vec<u16>>> + Send
    where
        Self: Sized,
    {
        let align = align.max(1);
        let configured = limits.max_read_registers;
        let max_read_registers = (configured / align) * align;
        let inter_request_delay_ms = limits.inter_request_delay_ms;
        async move {
            if quantity == 0 {
                return Ok(Vec::new());
            }
            if max_read_registers == 0 {
                return Err(PlcError::invalid_data(format!(
                    "max_read_registers {} is below the alignment of {}",
                    configured, align
                )));
            }

            let mut result = Vec::with_capacity(quantity as usize);
            let mut current_address = address;
            let mut remaining = quantity;

            while remaining > 0 {
                let count = remaining.min(max_read_registers);
                let chunk = self.read_03(unit_id, current_address, count).await?;
                result.extend_from_slice(&chunk);

                current_address = current_address.saturating_add(count);
                remaining -= count;

                if inter_request_delay_ms > 0 && remaining > 0 {
                    tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
                }
            }

            Ok(result)
        }
    }

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> impl std::future::Future<Output = PlcResult<()>> + Send;

    fn get_stats(&self) -> TransportStats;
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

/// Modbus client over any [`ModbusTransport`].
pub struct GenericModbusClient<T: ModbusTransport> {
    transport: T,
}

impl<T: ModbusTransport> GenericModbusClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Execute a raw request.
    pub async fn execute_request(&mut self, request: ModbusRequest) -> PlcResult<ModbusResponse> {
        trace!(
            unit = request.unit_id,
            function = request.function.name(),
            address = request.address,
            quantity = request.quantity,
            "request"
        );
        let response = self.transport.request(&request).await?;
        trace!(
            unit = response.unit_id,
            bytes = response.data().len(),
            "response"
        );
        Ok(response)
    }
}

impl<T: ModbusTransport + Send + Sync> ModbusClient for GenericModbusClient<T> {
    async fn read_01(&mut self, unit_id: UnitId, address: u16, quantity: u16) -> PlcResult<Vec<bool>> {
        check_quantity(usize::from(quantity), MAX_READ_COILS)?;
        let request = ModbusRequest::read(unit_id, ModbusFunction::ReadCoils, address, quantity);
        let response = self.execute_request(request).await?;
        response.parse_bits(quantity)
    }

    async fn read_03(&mut self, unit_id: UnitId, address: u16, quantity: u16) -> PlcResult<Vec<u16>> {
        check_quantity(usize::from(quantity), MAX_READ_REGISTERS)?;
        let request =
            ModbusRequest::read(unit_id, ModbusFunction::ReadHoldingRegisters, address, quantity);
        let response = self.execute_request(request).await?;
        let registers = response.parse_registers()?;
        if registers.len() != usize::from(quantity) {
            return Err(PlcError::protocol(format!(
                "Expected {} registers, got {}",
                quantity,
                registers.len()
            )));
        }
        Ok(registers)
    }

    async fn write_05(&mut self, unit_id: UnitId, address: u16, value: bool) -> PlcResult<()> {
        let request = ModbusRequest::write_single_coil(unit_id, address, value);
        self.execute_request(request).await?;
        Ok(())
    }

    async fn write_06(&mut self, unit_id: UnitId, address: u16, value: u16) -> PlcResult<()> {
        let request = ModbusRequest::write_single_register(unit_id, address, value);
        self.execute_request(request).await?;
        Ok(())
    }

    async fn write_0f(&mut self, unit_id: UnitId, address: u16, values: &[bool]) -> PlcResult<()> {
        check_quantity(values.len(), MAX_WRITE_COILS)?;
        let request = ModbusRequest::write_multiple_coils(unit_id, address, values);
        self.execute_request(request).await?;
        Ok(())
    }

    async fn write_10(&mut self, unit_id: UnitId, address: u16, values: &[u16]) -> PlcResult<()> {
        check_quantity(values.len(), MAX_WRITE_REGISTERS)?;
        let request = ModbusRequest::write_multiple_registers(unit_id, address, values);
        self.execute_request(request).await?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    async fn close(&mut self) -> PlcResult<()> {
        self.transport.close().await
    }

    fn get_stats(&self) -> TransportStats {
        self.transport.get_stats()
    }
}

/// Modbus TCP client.
pub type ModbusTcpClient = GenericModbusClient<TcpTransport>;

impl GenericModbusClient<TcpTransport> {
    /// Open a TCP connection to `address`.
    pub async fn connect(address: SocketAddr, timeout: Duration) -> PlcResult<Self> {
        let transport = TcpTransport::new(address, timeout).await?;
        debug!("Modbus TCP client ready: {}", address);
        Ok(Self::new(transport))
    }

    pub fn server_address(&self) -> SocketAddr {
        self.transport.address()
    }
}
