#![no_main]

use clickplc::TagTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = TagTable::from_reader(data) {
        for span in table.spans() {
            assert!(table
                .iter()
                .filter(|tag| tag.category() == span.category())
                .all(|tag| span.contains(tag.category(), tag.index())));
        }
    }
});
