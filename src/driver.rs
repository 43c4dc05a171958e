//! # CLICK Driver
//!
//! [`ClickPlc`] turns address specs and tag names into Modbus requests.
//!
//! - `get` reads one validated range and returns its values keyed by address
//!   label (`c1`, `x001`) or by tag name.
//! - `get_all` reads every tag in the table, one request plan per category.
//! - `set` type-checks the payload and sends exactly one write request.
//!
//! Address, bounds and type errors are raised before any request is sent.
//! Transport errors are returned as the client produced them; nothing is
//! retried.
//!
//! ```rust
//! use clickplc::{ClickPlc, MockClient, PlcValue};
//!
//! # tokio_test::block_on(async {
//! let mut plc = ClickPlc::new(MockClient::new());
//! plc.set("df2", 2.5f32).await.unwrap();
//! plc.set("ds1", [3i16, 4]).await.unwrap();
//!
//! let values = plc.get("df1-df2").await.unwrap();
//! assert_eq!(values.get("df2"), Some(&PlcValue::Float(2.5)));
//! assert_eq!(plc.get("ds2").await.unwrap().get("ds2"), Some(&PlcValue::Int(4)));
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::category::{Category, ModbusSpace};
use crate::client::{ModbusClient, ModbusTcpClient};
use crate::codec::{decode_bits, decode_registers, encode_bits, encode_registers};
use crate::coerce::coerce;
use crate::config::DriverConfig;
use crate::constants::DEFAULT_UNIT_ID;
use crate::device_limits::DeviceLimits;
use crate::error::{PlcError, PlcResult};
use crate::protocol::UnitId;
use crate::range::AddressRange;
use crate::readings::Readings;
use crate::tags::{TagInfo, TagTable};
use crate::transport::TransportStats;
use crate::value::{PlcValue, WriteData};

/// Driver for one CLICK PLC.
///
/// Operations take `&mut self`, so a driver has at most one request in
/// flight. Share it between tasks behind a `tokio::sync::Mutex`.
#[derive(Debug)]
pub struct ClickPlc<C: ModbusClient = ModbusTcpClient> {
    client: C,
    tags: TagTable,
    limits: DeviceLimits,
    unit_id: UnitId,
}

impl ClickPlc<ModbusTcpClient> {
    /// Connect over Modbus TCP and load the configured tag file.
    ///
    /// The tag file is loaded before connecting, so a bad table fails
    /// without touching the network.
    pub async fn connect(config: &DriverConfig) -> PlcResult<Self> {
        config.validate()?;
        let tags = match &config.tag_file {
            Some(path) => TagTable::from_path(path)?,
            None => TagTable::new(),
        };

        let address = config.resolve_addr().await?;
        let client = ModbusTcpClient::connect(address, config.timeout()).await?;
        info!("CLICK PLC connected: {} ({} tags)", address, tags.len());

        Ok(Self::from_client(client, tags)
            .with_limits(config.limits)?
            .with_unit_id(config.unit_id))
    }
}

impl<C: ModbusClient> ClickPlc<C> {
    /// Driver over `client` with no tags.
    pub fn new(client: C) -> Self {
        Self::from_client(client, TagTable::new())
    }

    pub fn from_client(client: C, tags: TagTable) -> Self {
        Self {
            client,
            tags,
            limits: DeviceLimits::default(),
            unit_id: DEFAULT_UNIT_ID,
        }
    }

    pub fn with_tags(mut self, tags: TagTable) -> Self {
        self.tags = tags;
        self
    }

    /// Replace the request limits. Fails if `limits` does not validate.
    pub fn with_limits(mut self, limits: DeviceLimits) -> PlcResult<Self> {
        limits.validate()?;
        self.limits = limits;
        Ok(self)
    }

    pub fn with_unit_id(mut self, unit_id: UnitId) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    /// Tag name to `{address: {start}, id, type, comment?}`.
    pub fn get_tags(&self) -> BTreeMap<String, TagInfo> {
        self.tags.to_map()
    }

    pub fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn stats(&self) -> TransportStats {
        self.client.get_stats()
    }

    /// Release the connection.
    pub async fn close(&mut self) -> PlcResult<()> {
        self.client.close().await
    }

    /// Read a tag, an address, or an address range.
    ///
    /// Keys are the tag name for a tag, otherwise the address labels in
    /// address order.
    pub async fn get(&mut self, spec: &str) -> PlcResult<Readings> {
        let resolved = self.tags.resolve(spec)?;
        debug!("get {} -> {}", spec, resolved.range);
        let values = self.read_range(&resolved.range).await?;

        let readings = match resolved.tag {
            Some(name) => Readings::from_unique(std::iter::once(name).zip(values).collect()),
            None => Readings::from_unique(resolved.range.labels().zip(values).collect()),
        };
        Ok(readings)
    }

    /// Read every tag, keyed by tag name in table order.
    pub async fn get_all(&mut self) -> PlcResult<Readings> {
        if self.tags.is_empty() {
            return Err(PlcError::address(
                "An address must be supplied to get if tags were not provided when driver initialized.",
            ));
        }

        let mut values: HashMap<(Category, u16), PlcValue> = HashMap::new();
        for span in self.tags.spans() {
            debug!("get_all span {}", span);
            let read = self.read_range(&span).await?;
            values.extend(span.indices().map(|index| (span.category(), index)).zip(read));
        }

        let entries = self
            .tags
            .iter()
            .map(|entry| {
                values
                    .get(&(entry.category(), entry.index()))
                    .map(|value| (entry.name().to_string(), *value))
                    .ok_or_else(|| {
                        PlcError::protocol(format!("No value read for tag '{}'", entry.name()))
                    })
            })
            .collect::<PlcResult<Vec<_>>>()?;
        Ok(Readings::from_unique(entries))
    }

    /// Write `data` starting at a tag or address.
    ///
    /// A bare address or tag may be followed by as many values as there are
    /// addresses up to the end of its category; an explicit `a-b` range caps
    /// the write at `b`. A list shorter than the target writes only its own
    /// length.
    pub async fn set(&mut self, spec: &str, data: impl Into<WriteData>) -> PlcResult<()> {
        let data = data.into();
        let resolved = self.tags.resolve(spec)?;
        let target = if resolved.explicit_range {
            resolved.range
        } else {
            resolved.range.to_category_end()
        };
        let category = target.category();

        let values = coerce(category, spec.trim(), &data, target.len())?;
        let target = target.truncated(values.len());
        let address = target.modbus_offset();
        debug!("set {} -> {} ({} values)", spec, target, values.len());

        match category.space() {
            ModbusSpace::Coil => {
                let bits = encode_bits(&target, &values)?;
                match (data.is_list(), bits.as_slice()) {
                    (false, [bit]) => self.client.write_05(self.unit_id, address, *bit).await,
                    _ => {
                        self.limits
                            .check_write(ModbusSpace::Coil, write_count(bits.len()))?;
                        self.client.write_0f(self.unit_id, address, &bits).await
                    }
                }
            }
            ModbusSpace::HoldingRegister => {
                let registers = encode_registers(category, &values)?;
                match (category, data.is_list(), registers.as_slice()) {
                    (Category::DS, false, [register]) => {
                        self.client.write_06(self.unit_id, address, *register).await
                    }
                    _ => {
                        self.limits.check_write(
                            ModbusSpace::HoldingRegister,
                            write_count(registers.len()),
                        )?;
                        self.client.write_10(self.unit_id, address, &registers).await
                    }
                }
            }
        }
    }

    async fn read_range(&mut self, range: &AddressRange) -> PlcResult<Vec<PlcValue>> {
        let category = range.category();
        match category.space() {
            ModbusSpace::Coil => {
                let bits = self
                    .client
                    .read_01_batch(
                        self.unit_id,
                        range.modbus_offset(),
                        range.modbus_count(),
                        &self.limits,
                    )
                    .await?;
                decode_bits(range, &bits)
            }
            ModbusSpace::HoldingRegister => {
                let registers = self
                    .client
                    .read_03_batch(
                        self.unit_id,
                        range.modbus_offset(),
                        range.modbus_count(),
                        category.address_step(),
                        &self.limits,
                    )
                    .await?;
                decode_registers(range, &registers)
            }
        }
    }
}

fn write_count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}
