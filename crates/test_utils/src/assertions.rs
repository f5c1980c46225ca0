//! Custom Test Assertions
//!
//! Assertion helpers with messages that show the offending input.

use core_kernel::PartnerId;
use domain_partner::tax_id::classify_and_validate;
use domain_partner::{BusinessPartnerRecord, TaxIdFailure, TaxIdKind};

/// Asserts that `raw` validates as `kind`
pub fn assert_tax_id_valid(raw: &str, kind: TaxIdKind) {
    let result = classify_and_validate(raw);
    assert!(
        result.valid,
        "Expected {:?} to be a valid {}, got: {}",
        raw, kind, result.message
    );
    assert_eq!(result.kind, Some(kind), "Wrong kind for {:?}", raw);
}

/// Asserts that `raw` is rejected with `failure`
pub fn assert_tax_id_rejected(raw: &str, failure: TaxIdFailure) {
    let result = classify_and_validate(raw);
    assert!(!result.valid, "Expected {:?} to be rejected", raw);
    assert_eq!(
        result.failure,
        Some(failure),
        "Wrong failure for {:?}: {}",
        raw,
        result.message
    );
}

/// Asserts that records carry distinct identifiers forming `start, start+1, ...`
pub fn assert_contiguous_ids(records: &[BusinessPartnerRecord], start: i32) {
    let mut ids: Vec<PartnerId> = records.iter().map(|r| r.id).collect();
    ids.sort();
    let expected: Vec<PartnerId> = (0..ids.len() as i32)
        .map(|offset| PartnerId::new(start + offset))
        .collect();
    assert_eq!(ids, expected, "Identifiers are not contiguous from {}", start);
}
