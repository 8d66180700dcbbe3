//! Fuzz target: subscribe body → records → normalisation
//!
//! Feeds arbitrary bytes through the same path a gateway reply takes and
//! verifies:
//! - No panics on any JSON shape
//! - Every returned record normalises against every remote test
//! - A completed verdict always carries a status
//!
//! cargo fuzz run fuzz_record_normalize

#![no_main]

use libfuzzer_sys::fuzz_target;
use podcert::catalog::{TestDefinition, TestId};
use podcert::record::{normalize, records_from_body};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    for record in records_from_body(body) {
        for id in TestId::ALL {
            let TestDefinition::Remote(def) = id.definition() else {
                continue;
            };
            let extracted = normalize(&record, &def.fields);
            if extracted.is_completed() {
                assert!(extracted.has_status());
            }
        }
    }
});
