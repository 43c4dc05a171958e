//! Modbus TCP transport
//!
//! Frames request PDUs in an MBAP header, sends them and reads back the
//! matching response. One request is in flight at a time.
//!
//! ```text
//! [Transaction ID(2)][Protocol ID(2)][Length(2)][Unit ID(1)][PDU(N)]
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::constants::{MBAP_HEADER_LEN, MBAP_PROTOCOL_ID, MAX_MBAP_LENGTH};
use crate::error::{PlcError, PlcResult};
use crate::protocol::{ModbusRequest, ModbusResponse};

/// Counters kept by a transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Sends one request and returns its response.
pub trait ModbusTransport: Send + Sync {
    fn request(
        &mut self,
        request: &ModbusRequest,
    ) -> impl std::future::Future<Output = PlcResult<ModbusResponse>> + Send;

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> impl std::future::Future<Output = PlcResult<()>> + Send;

    fn get_stats(&self) -> TransportStats;
}

/// Modbus TCP transport over a single socket.
///
/// The socket is dropped after any I/O error or timeout; later requests fail
/// with a connection error until a new transport is created.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    address: SocketAddr,
    timeout: Duration,
    transaction_id: u16,
    stats: TransportStats,
}

impl TcpTransport {
    /// Connect to `address`, giving up after `timeout`.
    pub async fn new(address: SocketAddr, timeout_duration: Duration) -> PlcResult<Self> {
        debug!("TCP connecting: {}", address);

        let stream = match timeout(timeout_duration, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("TCP err: {} - {}", address, e);
                return Err(PlcError::connection(format!(
                    "Failed to connect to {}: {}",
                    address, e
                )));
            }
            Err(_) => {
                warn!("TCP timeout: {}", address);
                return Err(PlcError::timeout(
                    format!("connect to {}", address),
                    timeout_duration.as_millis() as u64,
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("TCP_NODELAY: {}", e);
        }
        info!("TCP connected: {}", address);

        Ok(Self {
            stream: Some(stream),
            address,
            timeout: timeout_duration,
            transaction_id: 0,
            stats: TransportStats::default(),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn next_transaction_id(&mut self) -> u16 {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }

    fn encode_frame(&self, transaction_id: u16, request: &ModbusRequest) -> PlcResult<BytesMut> {
        let pdu = request.encode_pdu()?;
        let mut frame = BytesMut::with_capacity(MBAP_HEADER_LEN + 1 + pdu.len());
        frame.put_u16(transaction_id);
        frame.put_u16(MBAP_PROTOCOL_ID);
        frame.put_u16((pdu.len() + 1) as u16);
        frame.put_u8(request.unit_id);
        frame.put_slice(&pdu);
        Ok(frame)
    }

    async fn exchange(&mut self, request: &ModbusRequest) -> PlcResult<ModbusResponse> {
        let transaction_id = self.next_transaction_id();
        let frame = self.encode_frame(transaction_id, request)?;
        let timeout_duration = self.timeout;
        let timeout_ms = timeout_duration.as_millis() as u64;

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| PlcError::connection("Not connected"))?;

        match timeout(timeout_duration, stream.write_all(&frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(PlcError::timeout("send request", timeout_ms)),
        }
        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        debug!(
            "TCP TX: tid={} fc={:#04x} addr={} qty={} {}B",
            transaction_id,
            request.function.to_u8(),
            request.address,
            request.quantity,
            frame.len()
        );

        let mut header = [0u8; MBAP_HEADER_LEN + 1];
        match timeout(timeout_duration, stream.read_exact(&mut header)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(PlcError::timeout("read response header", timeout_ms)),
        }

        let response_tid = u16::from_be_bytes([header[0], header[1]]);
        let protocol_id = u16::from_be_bytes([header[2], header[3]]);
        let length = usize::from(u16::from_be_bytes([header[4], header[5]]));
        let unit_id = header[6];

        if protocol_id != MBAP_PROTOCOL_ID {
            return Err(PlcError::protocol(format!(
                "Invalid protocol id: {}",
                protocol_id
            )));
        }
        if length < 2 || length > MAX_MBAP_LENGTH {
            return Err(PlcError::protocol(format!(
                "Invalid TCP frame length: {}",
                length
            )));
        }

        let mut pdu = vec![0u8; length - 1];
        match timeout(timeout_duration, stream.read_exact(&mut pdu)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(PlcError::timeout("read response PDU", timeout_ms)),
        }
        self.stats.bytes_received += (header.len() + pdu.len()) as u64;
        debug!("TCP RX: tid={} {}B", response_tid, header.len() + pdu.len());

        if response_tid != transaction_id {
            return Err(PlcError::protocol(format!(
                "Transaction id mismatch: expected {}, got {}",
                transaction_id, response_tid
            )));
        }

        let response = ModbusResponse::from_pdu(request, unit_id, &pdu)?;
        self.stats.responses_received += 1;
        Ok(response)
    }
}

impl ModbusTransport for TcpTransport {
    async fn request(&mut self, request: &ModbusRequest) -> PlcResult<ModbusResponse> {
        match self.exchange(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.stats.errors += 1;
                match &e {
                    PlcError::Timeout { .. } => {
                        self.stats.timeouts += 1;
                        warn!("TCP timeout: {} - {}", self.address, e);
                        self.stream = None;
                    }
                    PlcError::Io(_) | PlcError::Protocol { .. } => {
                        error!("TCP err: {} - {}", self.address, e);
                        self.stream = None;
                    }
                    // The PLC answered; the socket is still in step.
                    _ => debug!("Request failed: {}", e),
                }
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> PlcResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
            info!("TCP closed: {}", self.address);
        }
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats
    }
}
