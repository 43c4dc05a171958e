#![no_main]

use clickplc::parse_spec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|spec: &str| {
    if let Ok(range) = parse_spec(spec) {
        let category = range.category();
        assert!(range.start() >= category.min_index());
        assert!(range.end() <= category.max_index());
        assert!(range.start() <= range.end());
        assert_eq!(range.indices().count(), range.len());
        assert!(usize::from(range.modbus_count()) >= range.len());
    }
});
