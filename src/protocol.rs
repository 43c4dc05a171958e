//! Modbus application-layer types
//!
//! Requests are encoded to PDUs here; framing (MBAP for TCP) belongs to the
//! transport.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::*;
use crate::error::{PlcError, PlcResult};

/// Modbus unit identifier.
pub type UnitId = u8;

/// Function codes the CLICK driver issues. X and Y are read as coils, so
/// discrete inputs and input registers are never needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModbusFunction {
    ReadCoils,
    ReadHoldingRegisters,
    WriteSingleCoil,
    WriteSingleRegister,
    WriteMultipleCoils,
    WriteMultipleRegisters,
}

impl ModbusFunction {
    pub fn to_u8(self) -> u8 {
        match self {
            ModbusFunction::ReadCoils => FC_READ_COILS,
            ModbusFunction::ReadHoldingRegisters => FC_READ_HOLDING_REGISTERS,
            ModbusFunction::WriteSingleCoil => FC_WRITE_SINGLE_COIL,
            ModbusFunction::WriteSingleRegister => FC_WRITE_SINGLE_REGISTER,
            ModbusFunction::WriteMultipleCoils => FC_WRITE_MULTIPLE_COILS,
            ModbusFunction::WriteMultipleRegisters => FC_WRITE_MULTIPLE_REGISTERS,
        }
    }

    pub fn from_u8(code: u8) -> PlcResult<Self> {
        match code {
            FC_READ_COILS => Ok(ModbusFunction::ReadCoils),
            FC_READ_HOLDING_REGISTERS => Ok(ModbusFunction::ReadHoldingRegisters),
            FC_WRITE_SINGLE_COIL => Ok(ModbusFunction::WriteSingleCoil),
            FC_WRITE_SINGLE_REGISTER => Ok(ModbusFunction::WriteSingleRegister),
            FC_WRITE_MULTIPLE_COILS => Ok(ModbusFunction::WriteMultipleCoils),
            FC_WRITE_MULTIPLE_REGISTERS => Ok(ModbusFunction::WriteMultipleRegisters),
            other => Err(PlcError::protocol(format!(
                "Unsupported function code: {:#04x}",
                other
            ))),
        }
    }

    #[inline]
    pub fn is_read(self) -> bool {
        matches!(
            self,
            ModbusFunction::ReadCoils | ModbusFunction::ReadHoldingRegisters
        )
    }

    /// Name for logs.
    pub fn name(self) -> &'static str {
        match self {
            ModbusFunction::ReadCoils => "Read Coils",
            ModbusFunction::ReadHoldingRegisters => "Read Holding Registers",
            ModbusFunction::WriteSingleCoil => "Write Single Coil",
            ModbusFunction::WriteSingleRegister => "Write Single Register",
            ModbusFunction::WriteMultipleCoils => "Write Multiple Coils",
            ModbusFunction::WriteMultipleRegisters => "Write Multiple Registers",
        }
    }
}

/// A Modbus request.
///
/// `data` holds the payload after address/quantity: the coil or register value
/// for single writes, the packed coils or big-endian registers for multiple
/// writes, and nothing for reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusRequest {
    pub unit_id: UnitId,
    pub function: ModbusFunction,
    pub address: u16,
    pub quantity: u16,
    pub data: Vec<u8>,
}

impl ModbusRequest {
    pub fn read(unit_id: UnitId, function: ModbusFunction, address: u16, quantity: u16) -> Self {
        Self {
            unit_id,
            function,
            address,
            quantity,
            data: Vec::new(),
        }
    }

    pub fn write_single_coil(unit_id: UnitId, address: u16, value: bool) -> Self {
        Self {
            unit_id,
            function: ModbusFunction::WriteSingleCoil,
            address,
            quantity: 1,
            data: if value { vec![0xFF, 0x00] } else { vec![0x00, 0x00] },
        }
    }

    pub fn write_single_register(unit_id: UnitId, address: u16, value: u16) -> Self {
        Self {
            unit_id,
            function: ModbusFunction::WriteSingleRegister,
            address,
            quantity: 1,
            data: value.to_be_bytes().to_vec(),
        }
    }

    pub fn write_multiple_coils(unit_id: UnitId, address: u16, values: &[bool]) -> Self {
        let data = values
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (i, &on)| if on { byte | (1 << i) } else { byte })
            })
            .collect();
        Self {
            unit_id,
            function: ModbusFunction::WriteMultipleCoils,
            address,
            quantity: values.len() as u16,
            data,
        }
    }

    pub fn write_multiple_registers(unit_id: UnitId, address: u16, values: &[u16]) -> Self {
        Self {
            unit_id,
            function: ModbusFunction::WriteMultipleRegisters,
            address,
            quantity: values.len() as u16,
            data: values.iter().flat_map(|v| v.to_be_bytes()).collect(),
        }
    }

    /// Encode the request PDU (function code onward).
    pub fn encode_pdu(&self) -> PlcResult<Bytes> {
        let mut pdu = BytesMut::with_capacity(6 + self.data.len());
        pdu.put_u8(self.function.to_u8());
        pdu.put_u16(self.address);

        match self.function {
            ModbusFunction::ReadCoils | ModbusFunction::ReadHoldingRegisters => {
                pdu.put_u16(self.quantity)
            }
            ModbusFunction::WriteSingleCoil | ModbusFunction::WriteSingleRegister => {
                if self.data.len() != 2 {
                    return Err(PlcError::invalid_data(format!(
                        "{} expects 2 data bytes, got {}",
                        self.function.name(),
                        self.data.len()
                    )));
                }
                pdu.put_slice(&self.data);
            }
            ModbusFunction::WriteMultipleCoils | ModbusFunction::WriteMultipleRegisters => {
                pdu.put_u16(self.quantity);
                pdu.put_u8(self.data.len() as u8);
                pdu.put_slice(&self.data);
            }
        }

        if pdu.len() > MAX_PDU_SIZE {
            return Err(PlcError::invalid_data(format!(
                "PDU too large: {} bytes (max {})",
                pdu.len(),
                MAX_PDU_SIZE
            )));
        }
        Ok(pdu.freeze())
    }
}

/// A successful Modbus response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusResponse {
    pub unit_id: UnitId,
    pub function: ModbusFunction,
    /// PDU bytes after the function code.
    data: Bytes,
}

impl ModbusResponse {
    /// Parse a response PDU for `request`.
    ///
    /// Exception responses become [`PlcError::Exception`].
    pub fn from_pdu(request: &ModbusRequest, unit_id: UnitId, pdu: &[u8]) -> PlcResult<Self> {
        let (&code, body) = pdu
            .split_first()
            .ok_or_else(|| PlcError::protocol("Empty response PDU"))?;

        if code & EXCEPTION_FLAG != 0 {
            let exception = body.first().copied().unwrap_or(0);
            return Err(PlcError::exception(code & !EXCEPTION_FLAG, exception));
        }

        let expected = request.function.to_u8();
        if code != expected {
            return Err(PlcError::protocol(format!(
                "Function code mismatch: expected {:#04x}, got {:#04x}",
                expected, code
            )));
        }

        let response = Self {
            unit_id,
            function: request.function,
            data: Bytes::copy_from_slice(body),
        };
        response.validate(request)?;
        Ok(response)
    }

    /// PDU bytes after the function code.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Coil/input states from a FC01/FC02 response, `quantity` bits long.
    pub fn parse_bits(&self, quantity: u16) -> PlcResult<Vec<bool>> {
        let payload = self.read_payload()?;
        let bits: Vec<bool> = payload
            .iter()
            .flat_map(|byte| (0..8).map(move |i| byte & (1 << i) != 0))
            .take(usize::from(quantity))
            .collect();
        if bits.len() < usize::from(quantity) {
            return Err(PlcError::protocol(format!(
                "Expected {} bits, got {}",
                quantity,
                bits.len()
            )));
        }
        Ok(bits)
    }

    /// Register values from a FC03/FC04 response.
    pub fn parse_registers(&self) -> PlcResult<Vec<u16>> {
        let payload = self.read_payload()?;
        if payload.len() % 2 != 0 {
            return Err(PlcError::protocol("Odd register byte count"));
        }
        Ok(payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }

    fn read_payload(&self) -> PlcResult<&[u8]> {
        let (&byte_count, payload) = self
            .data
            .split_first()
            .ok_or_else(|| PlcError::protocol("Missing byte count"))?;
        if payload.len() != usize::from(byte_count) {
            return Err(PlcError::protocol(format!(
                "Byte count {} does not match payload length {}",
                byte_count,
                payload.len()
            )));
        }
        Ok(payload)
    }

    fn validate(&self, request: &ModbusRequest) -> PlcResult<()> {
        if request.function.is_read() {
            return Ok(());
        }
        // Write responses echo the address and the value (single) or quantity (multiple).
        if self.data.len() != 4 {
            return Err(PlcError::protocol(format!(
                "Write response must be 4 bytes, got {}",
                self.data.len()
            )));
        }
        let address = u16::from_be_bytes([self.data[0], self.data[1]]);
        if address != request.address {
            return Err(PlcError::protocol(format!(
                "Write response address {} does not match request {}",
                address, request.address
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_code_round_trip() {
        for code in [0x01, 0x03, 0x05, 0x06, 0x0F, 0x10] {
            assert_eq!(ModbusFunction::from_u8(code).unwrap().to_u8(), code);
        }
        for code in [0x02, 0x04, 0x2B] {
            assert!(ModbusFunction::from_u8(code).is_err());
        }
    }

    #[test]
    fn test_encode_read() {
        let request = ModbusRequest::read(1, ModbusFunction::ReadCoils, 16384, 5);
        assert_eq!(request.encode_pdu().unwrap().as_ref(), &[0x01, 0x40, 0x00, 0x00, 0x05]);
    }

    #[test]
    fn test_encode_single_coil() {
        let request = ModbusRequest::write_single_coil(1, 0x0100, true);
        assert_eq!(request.encode_pdu().unwrap().as_ref(), &[0x05, 0x01, 0x00, 0xFF, 0x00]);
    }

    #[test]
    fn test_encode_multiple_coils() {
        let request = ModbusRequest::write_multiple_coils(1, 0x0100, &[true, false, true]);
        assert_eq!(
            request.encode_pdu().unwrap().as_ref(),
            &[0x0F, 0x01, 0x00, 0x00, 0x03, 0x01, 0b0000_0101]
        );
    }

    #[test]
    fn test_encode_multiple_registers() {
        let request = ModbusRequest::write_multiple_registers(1, 0x0100, &[0x1234, 0x5678]);
        assert_eq!(
            request.encode_pdu().unwrap().as_ref(),
            &[0x10, 0x01, 0x00, 0x00, 0x02, 0x04, 0x12, 0x34, 0x56, 0x78]
        );
    }

    #[test]
    fn test_parse_bits() {
        let request = ModbusRequest::read(1, ModbusFunction::ReadCoils, 0, 10);
        let response = ModbusResponse::from_pdu(&request, 1, &[0x01, 0x02, 0b1000_0001, 0b10]).unwrap();
        let bits = response.parse_bits(10).unwrap();
        assert_eq!(bits.len(), 10);
        assert!(bits[0] && bits[7] && bits[9]);
        assert!(!bits[1] && !bits[8]);
    }

    #[test]
    fn test_parse_registers() {
        let request = ModbusRequest::read(1, ModbusFunction::ReadHoldingRegisters, 0, 2);
        let response =
            ModbusResponse::from_pdu(&request, 1, &[0x03, 0x04, 0x12, 0x34, 0xFF, 0xFF]).unwrap();
        assert_eq!(response.parse_registers().unwrap(), vec![0x1234, 0xFFFF]);
    }

    #[test]
    fn test_exception_response() {
        let request = ModbusRequest::read(1, ModbusFunction::ReadHoldingRegisters, 0, 2);
        let err = ModbusResponse::from_pdu(&request, 1, &[0x83, 0x02]).unwrap_err();
        assert!(matches!(err, PlcError::Exception { function: 0x03, code: 0x02, .. }));
    }

    #[test]
    fn test_function_mismatch() {
        let request = ModbusRequest::read(1, ModbusFunction::ReadCoils, 0, 1);
        assert!(ModbusResponse::from_pdu(&request, 1, &[0x03, 0x00]).is_err());
    }

    #[test]
    fn test_write_echo_checked() {
        let request = ModbusRequest::write_single_register(1, 10, 7);
        assert!(ModbusResponse::from_pdu(&request, 1, &[0x06, 0x00, 0x0A, 0x00, 0x07]).is_ok());
        assert!(ModbusResponse::from_pdu(&request, 1, &[0x06, 0x00, 0x0B, 0x00, 0x07]).is_err());
    }
}
