//! Driver behaviour against the in-memory PLC.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clickplc::{
    ClickPlc, DriverConfig, MockCall, MockClient, PlcError, PlcValue, TagTable, WriteData,
};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn plc_driver() -> ClickPlc<MockClient> {
    ClickPlc::new(MockClient::new())
}

fn tagged_driver() -> ClickPlc<MockClient> {
    let tags = TagTable::from_path(fixture("plc_tags.csv")).unwrap();
    ClickPlc::from_client(MockClient::new(), tags)
}

fn expected_tags() -> serde_json::Value {
    json!({
        "IO2_24V_OK": {"address": {"start": 16397}, "id": "C13", "type": "bool"},
        "IO2_Module_OK": {"address": {"start": 16396}, "id": "C12", "type": "bool"},
        "LI_101": {"address": {"start": 428683}, "id": "DF6", "type": "float"},
        "LI_102": {"address": {"start": 428681}, "id": "DF5", "type": "float"},
        "P_101": {"address": {"start": 8289}, "id": "Y301", "type": "bool"},
        "P_101_auto": {"address": {"start": 16385}, "id": "C1", "type": "bool"},
        "P_102_auto": {"address": {"start": 16386}, "id": "C2", "type": "bool"},
        "P_103": {"address": {"start": 8290}, "id": "Y302", "type": "bool"},
        "TIC101_PID_ErrorCode": {
            "address": {"start": 400100},
            "comment": "PID Error Code",
            "id": "DS100",
            "type": "int16"
        },
        "TI_101": {"address": {"start": 428673}, "id": "DF1", "type": "float"},
        "VAHH_101_OK": {"address": {"start": 16395}, "id": "C11", "type": "bool"},
        "VAH_101_OK": {"address": {"start": 16394}, "id": "C10", "type": "bool"},
        "VI_101": {"address": {"start": 428685}, "id": "DF7", "type": "float"}
    })
}

async fn error_message<T, F>(result: F) -> String
where
    F: std::future::Future<Output = Result<T, PlcError>>,
{
    match result.await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.to_string(),
    }
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn test_get_tags() {
    let plc = tagged_driver();
    assert_eq!(serde_json::to_value(plc.get_tags()).unwrap(), expected_tags());
}

#[test]
fn test_tags_sorted_by_modbus_address() {
    let plc = tagged_driver();
    let addresses: Vec<u32> = plc.tags().iter().map(|t| t.modbus_address()).collect();
    let mut sorted = addresses.clone();
    sorted.sort_unstable();
    assert_eq!(addresses, sorted);
    assert_eq!(plc.tags().iter().next().map(|t| t.name()), Some("P_101"));
}

#[test]
fn test_unsupported_tags() {
    let err = TagTable::from_path(fixture("bad_tags.csv")).unwrap_err();
    assert!(matches!(err, PlcError::TagTable { .. }));
    assert!(err.to_string().contains("unsupported data type"));
}

#[tokio::test]
async fn test_tagged_driver() {
    let mut plc = tagged_driver();
    plc.set("VAH_101_OK", true).await.unwrap();

    let state = plc.get_all().await.unwrap();
    assert_eq!(state.get("VAH_101_OK"), Some(&PlcValue::Bool(true)));
    assert_eq!(state.get("VAHH_101_OK"), Some(&PlcValue::Bool(false)));

    let keys: BTreeSet<&str> = state.keys().collect();
    let expected = expected_tags();
    let expected_keys: BTreeSet<&str> = expected
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, expected_keys);
}

#[tokio::test]
async fn test_tag_write_targets_to_category_end() {
    let mut plc = tagged_driver();
    plc.set("LI_102", [5.0f32, 6.0]).await.unwrap();

    let state = plc.get_all().await.unwrap();
    assert_eq!(state.get("LI_102"), Some(&PlcValue::Float(5.0)));
    assert_eq!(state.get("LI_101"), Some(&PlcValue::Float(6.0)));
}

#[tokio::test]
async fn test_get_all_without_tags() {
    let mut plc = plc_driver();
    assert_eq!(
        error_message(plc.get_all()).await,
        "An address must be supplied to get if tags were not provided when driver initialized."
    );
}

// ============================================================================
// Round trips
// ============================================================================

#[tokio::test]
async fn test_bool_roundtrip() {
    for prefix in ["x", "y"] {
        let mut plc = plc_driver();
        plc.set(&format!("{prefix}2"), true).await.unwrap();
        plc.set(&format!("{prefix}3"), [false, true]).await.unwrap();

        let values = plc.get(&format!("{prefix}1-{prefix}5")).await.unwrap();
        let expected: Vec<(String, PlcValue)> = [false, true, false, true, false]
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("{prefix}{:03}", i + 1), PlcValue::Bool(v)))
            .collect();
        assert_eq!(values.into_iter().collect::<Vec<_>>(), expected);
    }
}

#[tokio::test]
async fn test_c_roundtrip() {
    let mut plc = plc_driver();
    plc.set("c2", true).await.unwrap();
    plc.set("c3", [false, true]).await.unwrap();

    let values = plc.get("c1-c5").await.unwrap();
    assert_eq!(
        serde_json::to_value(&values).unwrap(),
        json!({"c1": false, "c2": true, "c3": false, "c4": true, "c5": false})
    );
}

#[tokio::test]
async fn test_df_roundtrip() {
    let mut plc = plc_driver();
    plc.set("df2", 2.0f32).await.unwrap();
    plc.set("df3", [3.0f32, 4.0]).await.unwrap();

    let values = plc.get("df1-df5").await.unwrap();
    assert_eq!(
        serde_json::to_value(&values).unwrap(),
        json!({"df1": 0.0, "df2": 2.0, "df3": 3.0, "df4": 4.0, "df5": 0.0})
    );
}

#[tokio::test]
async fn test_ds_roundtrip() {
    let mut plc = plc_driver();
    plc.set("ds2", 2i16).await.unwrap();
    plc.set("ds3", [3i16, 4]).await.unwrap();

    let values = plc.get("ds1-ds5").await.unwrap();
    assert_eq!(
        serde_json::to_value(&values).unwrap(),
        json!({"ds1": 0, "ds2": 2, "ds3": 3, "ds4": 4, "ds5": 0})
    );
}

#[tokio::test]
async fn test_df_words_low_first_on_the_wire() {
    let mut plc = plc_driver();
    plc.set("df1", 25.0f32).await.unwrap();
    assert_eq!(
        plc.client().calls(),
        [MockCall::WriteRegisters { address: 28672, values: vec![0x0000, 0x41C8] }]
    );
}

#[tokio::test]
async fn test_single_address_get() {
    let mut plc = plc_driver();
    plc.set("x101", true).await.unwrap();
    let values = plc.get("x101").await.unwrap();
    assert_eq!(values.keys().collect::<Vec<_>>(), ["x101"]);
    assert_eq!(values.get("x101"), Some(&PlcValue::Bool(true)));
    assert!(plc.client().coil(32));
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test]
async fn test_get_error_handling() {
    let mut plc = plc_driver();
    assert_eq!(error_message(plc.get("")).await, "An address must be supplied.");
    assert_eq!(
        error_message(plc.get("c3-c1")).await,
        "End address must be greater than start address."
    );
    assert_eq!(error_message(plc.get("foo1")).await, "foo currently unsupported.");
    assert_eq!(
        error_message(plc.get("c1-x3")).await,
        "Inter-category ranges are unsupported."
    );
    assert!(plc.client().calls().is_empty());
}

#[tokio::test]
async fn test_set_error_handling() {
    let mut plc = plc_driver();
    assert_eq!(error_message(plc.set("foo1", 1i16)).await, "foo currently unsupported.");
}

#[tokio::test]
async fn test_xy_error_handling() {
    for prefix in ["x", "y"] {
        let upper = prefix.to_uppercase();
        let mut plc = plc_driver();
        assert_eq!(
            error_message(plc.get(&format!("{prefix}17"))).await,
            format!("{upper} start address must be *01-*16.")
        );
        assert_eq!(
            error_message(plc.get(&format!("{prefix}1001"))).await,
            format!("{upper} start address must be in [001, 816].")
        );
        assert_eq!(
            error_message(plc.get(&format!("{prefix}1-{prefix}17"))).await,
            format!("{upper} end address must be *01-*16.")
        );
        assert_eq!(
            error_message(plc.get(&format!("{prefix}1-{prefix}1001"))).await,
            format!("{upper} end address must be in [001, 816].")
        );
        assert_eq!(
            error_message(plc.set(&format!("{prefix}17"), true)).await,
            format!("{upper} start address must be *01-*16.")
        );
        assert_eq!(
            error_message(plc.set(&format!("{prefix}1001"), true)).await,
            format!("{upper} start address must be in [001, 816].")
        );
        assert_eq!(
            error_message(plc.set(&format!("{prefix}816"), [true, true])).await,
            "Data list longer than available addresses."
        );
        assert!(plc.client().calls().is_empty());
    }
}

#[tokio::test]
async fn test_c_error_handling() {
    let mut plc = plc_driver();
    assert_eq!(error_message(plc.get("c2001")).await, "C start address must be 1-2000.");
    assert_eq!(
        error_message(plc.get("c1-c2001")).await,
        "C end address must be >start and <2000."
    );
    assert_eq!(
        error_message(plc.set("c2001", true)).await,
        "C start address must be 1-2000."
    );
    assert_eq!(
        error_message(plc.set("c2000", [true, true])).await,
        "Data list longer than available addresses."
    );
}

#[tokio::test]
async fn test_df_error_handling() {
    let mut plc = plc_driver();
    assert_eq!(error_message(plc.get("df501")).await, "DF must be in [1, 500]");
    assert_eq!(error_message(plc.get("df1-df501")).await, "DF end must be in [1, 500]");
    assert_eq!(error_message(plc.set("df501", 1.0f32)).await, "DF must be in [1, 500]");
    assert_eq!(
        error_message(plc.set("df500", [1.0f32, 2.0])).await,
        "Data list longer than available addresses."
    );
}

#[tokio::test]
async fn test_ds_error_handling() {
    let mut plc = plc_driver();
    assert_eq!(error_message(plc.get("ds4501")).await, "DS must be in [1, 4500]");
    assert_eq!(error_message(plc.get("ds1-ds4501")).await, "DS end must be in [1, 4500]");
    assert_eq!(error_message(plc.set("ds4501", 1i16)).await, "DS must be in [1, 4500]");
    assert_eq!(
        error_message(plc.set("ds4500", [1i16, 2])).await,
        "Data list longer than available addresses."
    );
}

// ============================================================================
// Type checking
// ============================================================================

#[tokio::test]
async fn test_bool_typechecking() {
    for prefix in ["x", "y", "c"] {
        let mut plc = plc_driver();
        let spec = format!("{prefix}1");
        assert_eq!(
            error_message(plc.set(&spec, 1i16)).await,
            format!("Expected {spec} as a bool.")
        );
        let mixed = WriteData::List(vec![PlcValue::Float(1.0), PlcValue::Int(1)]);
        assert_eq!(
            error_message(plc.set(&spec, mixed)).await,
            format!("Expected {spec} as a bool.")
        );
        assert!(plc.client().calls().is_empty());
    }
}

#[tokio::test]
async fn test_df_typechecking() {
    let mut plc = plc_driver();
    plc.set("df1", 1i16).await.unwrap();
    assert_eq!(plc.get("df1").await.unwrap().get("df1"), Some(&PlcValue::Float(1.0)));

    assert_eq!(error_message(plc.set("df1", true)).await, "Expected df1 as a float.");
    assert_eq!(
        error_message(plc.set("df1", [true, true])).await,
        "Expected df1 as a float."
    );
}

#[tokio::test]
async fn test_ds_typechecking() {
    let mut plc = plc_driver();
    assert_eq!(error_message(plc.set("ds1", 1.0f32)).await, "Expected ds1 as a int.");
    assert_eq!(error_message(plc.set("ds1", true)).await, "Expected ds1 as a int.");
    assert_eq!(
        error_message(plc.set("ds1", [true, true])).await,
        "Expected ds1 as a int."
    );
    assert!(plc.client().calls().is_empty());
}

#[tokio::test]
async fn test_driver_usable_after_validation_error() {
    let mut plc = plc_driver();
    assert!(plc.set("ds1", true).await.is_err());
    plc.set("ds1", 9i16).await.unwrap();
    assert_eq!(plc.get("ds1").await.unwrap().get("ds1"), Some(&PlcValue::Int(9)));
}

// ============================================================================
// Connect
// ============================================================================

#[tokio::test]
async fn test_connect_with_bad_tag_file_fails_before_network() {
    let config = DriverConfig::new("127.0.0.1:1").with_tag_file(fixture("bad_tags.csv"));
    match ClickPlc::connect(&config).await {
        Err(PlcError::TagTable { .. }) => {}
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("expected a tag table error"),
    }
}
