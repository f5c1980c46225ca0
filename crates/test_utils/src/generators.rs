//! Property-Based Test Generators
//!
//! proptest strategies that produce tax identifiers satisfying (or
//! deliberately breaking) the check-digit rules, plus `fake`-backed names.

use core_kernel::GroupId;
use domain_partner::tax_id::{cedula_check_digit, entity_ruc_check_digit};
use domain_partner::BusinessPartnerDraft;
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;

fn render(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Two leading digits of a valid region code, 01 through 24
pub fn region_strategy() -> impl Strategy<Value = [u8; 2]> {
    (1u8..=24).prop_map(|region| [region / 10, region % 10])
}

/// First nine digits of a natural-person CEDULA
pub fn cedula_prefix_strategy() -> impl Strategy<Value = [u8; 9]> {
    (region_strategy(), 0u8..=5, proptest::array::uniform6(0u8..=9)).prop_map(
        |(region, third, rest)| {
            let mut prefix = [0u8; 9];
            prefix[..2].copy_from_slice(&region);
            prefix[2] = third;
            prefix[3..].copy_from_slice(&rest);
            prefix
        },
    )
}

/// A CEDULA whose check digit is correct
pub fn valid_cedula_strategy() -> impl Strategy<Value = String> {
    cedula_prefix_strategy().prop_map(|prefix| {
        let mut digits = prefix.to_vec();
        digits.push(cedula_check_digit(&prefix));
        render(&digits)
    })
}

/// A CEDULA with any check digit but the correct one
pub fn wrong_check_digit_cedula_strategy() -> impl Strategy<Value = String> {
    (cedula_prefix_strategy(), 1u8..=9).prop_map(|(prefix, delta)| {
        let mut digits = prefix.to_vec();
        digits.push((cedula_check_digit(&prefix) + delta) % 10);
        render(&digits)
    })
}

/// Natural-person RUC: a valid CEDULA followed by `001`
pub fn natural_ruc_strategy() -> impl Strategy<Value = String> {
    valid_cedula_strategy().prop_map(|cedula| format!("{}001", cedula))
}

/// Public (6) or private (9) entity RUC with a correct check digit
pub fn entity_ruc_strategy() -> impl Strategy<Value = String> {
    (
        region_strategy(),
        prop_oneof![Just(6u8), Just(9u8)],
        proptest::array::uniform5(0u8..=9),
        proptest::array::uniform4(0u8..=9),
    )
        .prop_filter_map("check digit 10 has no encoding", |(region, third, rest, branch)| {
            let mut first_eight = [0u8; 8];
            first_eight[..2].copy_from_slice(&region);
            first_eight[2] = third;
            first_eight[3..].copy_from_slice(&rest);
            let check = entity_ruc_check_digit(&first_eight);
            if check > 9 {
                return None;
            }
            let mut digits = first_eight.to_vec();
            digits.push(check);
            digits.extend_from_slice(&branch);
            Some(render(&digits))
        })
}

/// Any tax identifier the validator must accept
pub fn valid_tax_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        valid_cedula_strategy(),
        natural_ruc_strategy(),
        entity_ruc_strategy(),
    ]
}

/// Digit strings whose length is neither 10 nor 13
pub fn wrong_length_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,20}".prop_filter("length must be invalid", |s| s.len() != 10 && s.len() != 13)
}

/// Partner codes like `CLIE042`
pub fn partner_code_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{3,4}[0-9]{3}"
}

/// A random person name
pub fn fake_person_name() -> String {
    Name().fake()
}

/// A random company name
pub fn fake_company_name() -> String {
    CompanyName().fake()
}

/// A complete draft with a generated name and the given code and tax id
pub fn fake_draft(code: impl Into<String>, tax_id: impl Into<String>, group_id: GroupId) -> BusinessPartnerDraft {
    BusinessPartnerDraft::new(code, fake_person_name(), tax_id, group_id)
}
