#![no_main]

use arbitrary::Arbitrary;
use clickplc::{ModbusFunction, ModbusRequest, ModbusResponse};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    function: u8,
    address: u16,
    quantity: u16,
    pdu: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let Ok(function) = ModbusFunction::from_u8(input.function) else {
        return;
    };
    let request = ModbusRequest::read(1, function, input.address, input.quantity);
    if let Ok(response) = ModbusResponse::from_pdu(&request, 1, &input.pdu) {
        if let Ok(bits) = response.parse_bits(input.quantity) {
            assert_eq!(bits.len(), usize::from(input.quantity));
        }
        let _ = response.parse_registers();
    }
});
