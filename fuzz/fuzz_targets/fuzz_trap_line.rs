//! Fuzz target: NDJSON trap line decoding and classification
//!
//! Feeds arbitrary bytes through `TrapLine::parse` and the classifier.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every produced event carries a well-formed dotted-decimal OID
//! - A known alarm always reports its canonical OID
//!
//! cargo fuzz run fuzz_trap_line

#![no_main]

use ats_panel::adapters::trap_feed::TrapLine;
use ats_panel::alarms::classifier::is_well_formed;
use ats_panel::alarms::{Classification, Classifier};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(line) = TrapLine::parse(text) else {
        return;
    };

    let classifier = Classifier::default();
    if let Some(event) = classifier.classify(&line.oid, line.var_binds(), line.source) {
        assert!(is_well_formed(&event.oid), "event OID {:?}", event.oid);
        if let Classification::Known(def) = event.classification {
            assert_eq!(event.oid, def.oid());
        }
    }
});
