//! Property tests for tax identifier classification

use domain_partner::tax_id::{
    cedula_check_digit, classify_and_validate, entity_ruc_check_digit, TaxIdFailure, TaxIdKind,
};
use domain_partner::IdRange;
use domain_partner::SequentialIdAllocator;
use core_kernel::PartnerId;
use proptest::prelude::*;

fn render(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Nine leading digits with a valid region and a natural-person third digit
fn cedula_prefix() -> impl Strategy<Value = [u8; 9]> {
    (1u8..=24, 0u8..=5, proptest::array::uniform6(0u8..=9)).prop_map(|(region, third, rest)| {
        let mut prefix = [0u8; 9];
        prefix[0] = region / 10;
        prefix[1] = region % 10;
        prefix[2] = third;
        prefix[3..].copy_from_slice(&rest);
        prefix
    })
}

fn valid_cedula() -> impl Strategy<Value = String> {
    cedula_prefix().prop_map(|prefix| {
        let mut digits = prefix.to_vec();
        digits.push(cedula_check_digit(&prefix));
        render(&digits)
    })
}

proptest! {
    #[test]
    fn generated_cedulas_validate(cedula in valid_cedula()) {
        let result = classify_and_validate(&cedula);
        prop_assert!(result.valid, "{}: {}", cedula, result.message);
        prop_assert_eq!(result.kind, Some(TaxIdKind::Cedula));
    }

    #[test]
    fn natural_person_ruc_is_cedula_plus_001(cedula in valid_cedula()) {
        let ruc = format!("{}001", cedula);
        prop_assert_eq!(classify_and_validate(&ruc).kind, Some(TaxIdKind::Ruc));

        let other_suffix = format!("{}002", cedula);
        prop_assert_eq!(
            classify_and_validate(&other_suffix).failure,
            Some(TaxIdFailure::BadEstablishmentSuffix)
        );
    }

    #[test]
    fn altered_check_digit_is_rejected(prefix in cedula_prefix(), delta in 1u8..=9) {
        let mut digits = prefix.to_vec();
        digits.push((cedula_check_digit(&prefix) + delta) % 10);

        let result = classify_and_validate(&render(&digits));
        prop_assert!(!result.valid);
        prop_assert_eq!(result.failure, Some(TaxIdFailure::ChecksumMismatch));
    }

    #[test]
    fn entity_ruc_with_computed_digit_validates(
        region in 1u8..=24,
        third in prop_oneof![Just(6u8), Just(9u8)],
        rest in proptest::array::uniform5(0u8..=9),
        branch in proptest::array::uniform4(0u8..=9),
    ) {
        let mut first_eight = [0u8; 8];
        first_eight[0] = region / 10;
        first_eight[1] = region % 10;
        first_eight[2] = third;
        first_eight[3..].copy_from_slice(&rest);
        let check = entity_ruc_check_digit(&first_eight);
        prop_assume!(check < 10);

        let mut digits = first_eight.to_vec();
        digits.push(check);
        digits.extend_from_slice(&branch);

        let result = classify_and_validate(&render(&digits));
        prop_assert!(result.valid, "{}", result.message);
        prop_assert_eq!(result.kind, Some(TaxIdKind::Ruc));
    }

    #[test]
    fn wrong_length_never_validates(raw in "[0-9]{0,20}") {
        prop_assume!(raw.len() != 10 && raw.len() != 13);
        let result = classify_and_validate(&raw);
        prop_assert!(!result.valid);
        prop_assert!(result.kind.is_none());
    }

    #[test]
    fn non_digits_are_rejected(head in "[0-9]{9}", tail in "[A-Za-z]") {
        let result = classify_and_validate(&format!("{}{}", head, tail));
        prop_assert_eq!(result.failure, Some(TaxIdFailure::NonDigit));
    }

    #[test]
    fn allocation_stays_in_range(previous in proptest::option::of(-10_000i32..10_000)) {
        let allocator = SequentialIdAllocator::new(IdRange::DEFAULT);
        match allocator.next_after(previous.map(PartnerId::new)) {
            Ok(id) => {
                prop_assert!(IdRange::DEFAULT.contains(id));
                if let Some(prev) = previous.filter(|p| *p >= 1000) {
                    prop_assert_eq!(id.value(), prev + 1);
                }
            }
            Err(_) => prop_assert!(previous.is_some_and(|p| p >= 5000)),
        }
    }

    #[test]
    fn classification_is_repeatable(
        raw in prop_oneof![
            ".{0,20}",
            "[0-9]{10}|[0-9]{13}",
            valid_cedula(),
            valid_cedula().prop_map(|c| format!("{}001", c)),
        ]
    ) {
        let first = classify_and_validate(&raw);
        let second = classify_and_validate(&raw);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.valid, first.kind.is_some());
    }
}
