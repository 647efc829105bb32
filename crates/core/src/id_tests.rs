// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

crate::define_id! {
    /// Id type used only by these tests.
    pub struct SampleId("smp-");
}

#[test]
fn new_ids_carry_prefix_and_differ() {
    let a = SampleId::new();
    let b = SampleId::new();
    assert!(a.as_str().starts_with("smp-"));
    assert_eq!(a.as_str().len(), 4 + 19);
    assert_ne!(a, b);
}

#[test]
fn suffix_strips_prefix() {
    let id = SampleId::from_string("smp-abc123");
    assert_eq!(id.suffix(), "abc123");
    assert_eq!(id.short(3), "abc");
    assert_eq!(id.short(50), "abc123");
}

#[test]
fn suffix_without_prefix_is_whole_id() {
    let id = SampleId::from("legacy");
    assert_eq!(id.suffix(), "legacy");
}

#[test]
fn borrow_allows_str_lookup() {
    let mut map = HashMap::new();
    map.insert(SampleId::from("smp-k"), 7);
    assert_eq!(map.get("smp-k"), Some(&7));
}

#[test]
fn serializes_transparently() {
    let id = SampleId::from("smp-x");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"smp-x\"");
    let back: SampleId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, "smp-x");
}
