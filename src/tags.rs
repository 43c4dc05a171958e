//! # Tag Table
//!
//! Symbolic names for PLC addresses, loaded from the nickname CSV that the
//! CLICK programming software exports:
//!
//! ```text
//! ## Address,Data Type,Modbus Address,Function Code,Nickname,Initial Value,Retentive,Address Comment
//! C1,BIT,16385,"FC=01,05,15",P_101_auto,0,No,
//! DF1,FLOAT,428673,"FC=03,06,16",TI_101,0,Yes,
//! ```
//!
//! Only `Address` and `Nickname` are required. Rows with an empty nickname or
//! a `_`-prefixed one (system nicknames) are skipped. The table is ordered by
//! Modbus address.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::address::{is_range_spec, parse_spec, scan};
use crate::category::Category;
use crate::error::{PlcError, PlcResult};
use crate::range::AddressRange;
use crate::value::ValueType;

/// One tagged address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    name: String,
    range: AddressRange,
    comment: Option<String>,
}

impl TagEntry {
    /// Validate `category`/`index` and build an entry.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        index: u16,
        comment: Option<String>,
    ) -> PlcResult<Self> {
        Ok(Self {
            name: name.into(),
            range: AddressRange::single(category, u32::from(index))?,
            comment: comment.filter(|c| !c.is_empty()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.range.category()
    }

    pub fn index(&self) -> u16 {
        self.range.start()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The tag's single-address range.
    pub fn range(&self) -> AddressRange {
        self.range
    }

    /// Address as the CLICK software writes it (`C13`, `Y301`, `DF1`).
    pub fn id(&self) -> String {
        format!("{}{}", self.category().name(), self.index())
    }

    pub fn value_type(&self) -> ValueType {
        self.category().value_type()
    }

    /// 1-based Modbus address (`4xxxxx` for registers).
    pub fn modbus_address(&self) -> u32 {
        self.category().modbus_address(self.index())
    }

    pub fn info(&self) -> TagInfo {
        TagInfo {
            address: TagAddress {
                start: self.modbus_address(),
            },
            id: self.id(),
            value_type: self.value_type(),
            comment: self.comment.clone(),
        }
    }
}

/// Modbus location of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagAddress {
    pub start: u32,
}

/// Public description of a tag, as returned by `get_tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub address: TagAddress,
    pub id: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// The outcome of resolving a spec string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub range: AddressRange,
    /// Tag name, when the lookup matched a tag.
    pub tag: Option<String>,
    /// True for an explicit `start-end` spec.
    pub explicit_range: bool,
}

/// CSV row. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Nickname", default)]
    nickname: String,
    #[serde(rename = "Data Type", default)]
    data_type: Option<String>,
    #[serde(rename = "Modbus Address", default)]
    modbus_address: Option<String>,
    #[serde(rename = "Address Comment", default)]
    comment: Option<String>,
}

/// Read-only map of tag names to addresses, in Modbus address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTable {
    entries: Vec<TagEntry>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a nickname CSV export from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> PlcResult<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| {
            PlcError::tag_table(format!("Cannot open tag file {}: {}", path.display(), e))
        })?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} tags from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load a nickname CSV export from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> PlcResult<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| PlcError::tag_table(format!("Cannot read tag file: {}", e)))?;

        // The CLICK export comments out its header line.
        let content = content.trim_start_matches('\u{feff}');
        let content = content.trim_start_matches(['#', ' ']);

        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut entries = Vec::new();
        for (line, row) in csv.deserialize::<TagRow>().enumerate() {
            let row = row.map_err(|e| {
                PlcError::tag_table(format!("Malformed tag row {}: {}", line + 2, e))
            })?;
            if row.nickname.is_empty() || row.nickname.starts_with('_') {
                continue;
            }
            entries.push(entry_from_row(row)?);
        }

        Self::from_entries(entries)
    }

    /// Build a table from entries. Names must be unique.
    pub fn from_entries(mut entries: Vec<TagEntry>) -> PlcResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(PlcError::tag_table(format!(
                    "Duplicate tag name '{}'",
                    entry.name
                )));
            }
        }
        entries.sort_by_key(TagEntry::modbus_address);
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&TagEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagEntry> {
        self.entries.iter()
    }

    /// Resolve a tag name or address spec. Tag names win over addresses.
    pub fn resolve(&self, spec: &str) -> PlcResult<Resolved> {
        if let Some(entry) = self.get(spec) {
            return Ok(Resolved {
                range: entry.range(),
                tag: Some(entry.name.clone()),
                explicit_range: false,
            });
        }
        Ok(Resolved {
            range: parse_spec(spec)?,
            tag: None,
            explicit_range: is_range_spec(spec),
        })
    }

    /// Per category, the smallest range covering all of its tags, in category order.
    pub fn spans(&self) -> Vec<AddressRange> {
        let mut bounds: BTreeMap<Category, (u16, u16)> = BTreeMap::new();
        for entry in &self.entries {
            let index = entry.index();
            bounds
                .entry(entry.category())
                .and_modify(|(lo, hi)| {
                    *lo = (*lo).min(index);
                    *hi = (*hi).max(index);
                })
                .or_insert((index, index));
        }
        bounds
            .into_iter()
            .filter_map(|(category, (lo, hi))| {
                AddressRange::new(category, u32::from(lo), Some(u32::from(hi))).ok()
            })
            .collect()
    }

    /// Name to description map.
    pub fn to_map(&self) -> BTreeMap<String, TagInfo> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.info()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a TagTable {
    type Item = &'a TagEntry;
    type IntoIter = std::slice::Iter<'a, TagEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn entry_from_row(row: TagRow) -> PlcResult<TagEntry> {
    let unsupported = || {
        PlcError::tag_table(format!(
            "{} is an unsupported data type.",
            row.address
        ))
    };

    let token = scan(&row.address).map_err(|_| unsupported())?;
    let category = Category::from_prefix(token.prefix).map_err(|_| unsupported())?;
    let index = u16::try_from(token.number).map_err(|_| unsupported())?;
    let entry = TagEntry::new(row.nickname.clone(), category, index, row.comment.clone())
        .map_err(|e| PlcError::tag_table(format!("Tag '{}': {}", row.nickname, e)))?;

    if let Some(listed) = row.modbus_address.as_deref().filter(|s| !s.is_empty()) {
        if listed.parse::<u32>().ok() != Some(entry.modbus_address()) {
            warn!(
                "Tag '{}' lists Modbus address {} but {} maps to {}",
                entry.name,
                listed,
                entry.id(),
                entry.modbus_address()
            );
        }
    }
    if let Some(data_type) = row.data_type.as_deref() {
        debug!("Tag '{}': {} ({})", entry.name, entry.id(), data_type);
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
## Address,Data Type,Modbus Address,Function Code,Nickname,Initial Value,Retentive,Address Comment
X001,BIT,100001,FC=02,,0,No,
Y301,BIT,8289,\"FC=01,05,15\",P_101,0,No,
C1,BIT,16385,\"FC=01,05,15\",P_101_auto,0,No,
C2,BIT,16386,\"FC=01,05,15\",_SystemBit,0,No,
DS100,INT,400100,\"FC=03,06,16\",TIC101_PID_ErrorCode,0,Yes,PID Error Code
DF1,FLOAT,428673,\"FC=03,06,16\",TI_101,0,Yes,
";

    #[test]
    fn test_load_export() {
        let table = TagTable::from_reader(EXPORT.as_bytes()).unwrap();
        let names: Vec<_> = table.iter().map(TagEntry::name).collect();
        assert_eq!(names, ["P_101", "P_101_auto", "TIC101_PID_ErrorCode", "TI_101"]);

        let pid = table.get("TIC101_PID_ErrorCode").unwrap();
        assert_eq!(pid.category(), Category::DS);
        assert_eq!(pid.index(), 100);
        assert_eq!(pid.comment(), Some("PID Error Code"));
        assert!(table.get("_SystemBit").is_none());
    }

    #[test]
    fn test_header_comment_variants() {
        let body = "Address,Nickname\nC1,Pump\n";
        for header in ["", "## ", "##", "# "] {
            let table = TagTable::from_reader(format!("{}{}", header, body).as_bytes()).unwrap();
            assert_eq!(table.get("Pump").map(TagEntry::id), Some("C1".to_string()));
        }
    }

    #[test]
    fn test_info_shape() {
        let table = TagTable::from_reader(EXPORT.as_bytes()).unwrap();
        let json = serde_json::to_value(table.to_map()).unwrap();
        assert_eq!(
            json["TIC101_PID_ErrorCode"],
            serde_json::json!({
                "address": {"start": 400100},
                "id": "DS100",
                "type": "int16",
                "comment": "PID Error Code"
            })
        );
        assert_eq!(
            json["P_101"],
            serde_json::json!({"address": {"start": 8289}, "id": "Y301", "type": "bool"})
        );
    }

    #[test]
    fn test_unsupported_category() {
        let csv = "Address,Nickname\nT1,Timer_1\n";
        let err = TagTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unsupported data type"));
        assert!(matches!(err, PlcError::TagTable { .. }));
    }

    #[test]
    fn test_out_of_bounds_address() {
        let csv = "Address,Nickname\nC2001,Too_Far\n";
        assert!(matches!(
            TagTable::from_reader(csv.as_bytes()),
            Err(PlcError::TagTable { .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let csv = "Address,Nickname\nC1,Pump\nC2,Pump\n";
        let err = TagTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_resolve() {
        let table = TagTable::from_reader(EXPORT.as_bytes()).unwrap();

        let resolved = table.resolve("TI_101").unwrap();
        assert_eq!(resolved.range, AddressRange::single(Category::DF, 1).unwrap());
        assert_eq!(resolved.tag.as_deref(), Some("TI_101"));

        let resolved = table.resolve("c1-c3").unwrap();
        assert!(resolved.tag.is_none());
        assert!(resolved.explicit_range);
        assert_eq!(resolved.range.len(), 3);

        assert!(table.resolve("ti_101").is_err());
    }

    #[test]
    fn test_spans() {
        let entries = vec![
            TagEntry::new("a", Category::C, 10, None).unwrap(),
            TagEntry::new("b", Category::C, 2, None).unwrap(),
            TagEntry::new("c", Category::DF, 7, None).unwrap(),
            TagEntry::new("d", Category::Y, 301, None).unwrap(),
        ];
        let table = TagTable::from_entries(entries).unwrap();
        let spans: Vec<String> = table.spans().iter().map(|r| r.to_string()).collect();
        assert_eq!(spans, ["y301", "c2-c10", "df7"]);
    }
}
