//! Fuzz target: remote document → reconciliation
//!
//! Parses arbitrary bytes as a fetched control document and runs one
//! reconciliation against every input idle.  Asserts that interpretation
//! never panics, the written `Shutdown` is always 0/1, and reconciling the
//! device's own write-back is a fixed point.
//!
//! cargo fuzz run fuzz_remote_document

#![no_main]

use evstation::app::document::{LocalReading, RemoteControlDocument};
use evstation::app::reconcile::reconcile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let local = LocalReading::default();
    let first = reconcile(&RemoteControlDocument::from_document(&doc), &local);
    assert!(first.output.shutdown <= 1, "Shutdown must be normalized");
    assert_eq!(first.commands.relay_energized, first.output.shutdown == 0);

    let written = first.output.to_document();
    let second = reconcile(&RemoteControlDocument::from_document(&written), &local);
    assert_eq!(first.commands, second.commands);
    assert_eq!(written, second.output.to_document());
});
