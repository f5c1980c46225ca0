//! National tax identifier validation
//!
//! Two identifier families are accepted, selected by length after trimming:
//!
//! ## CEDULA (10 digits, natural person)
//! - First two digits are a region code in `01..=24`
//! - Digits 0-8 are weighted by `[2,1,2,1,2,1,2,1,2]`; products of 10 or more
//!   have 9 subtracted before summing
//! - The check digit at position 9 is `(10 - sum % 10) % 10`
//!
//! ## RUC (13 digits, taxpayer registry)
//! The third digit selects the rule:
//! - `0..=5`: natural person. The first ten digits must be a valid CEDULA and
//!   the establishment suffix must be `001`
//! - `6` or `9`: public or private entity. Digits 0-7 are weighted by
//!   `[3,2,7,6,5,4,3,2]` and the check digit at position 8 is
//!   `(11 - sum % 11) % 11`
//! - `7` or `8`: no rule is known, so the identifier is rejected as an
//!   unsupported taxpayer type without attempting a checksum
//!
//! All functions here are pure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of a CEDULA
pub const CEDULA_LENGTH: usize = 10;
/// Length of a RUC
pub const RUC_LENGTH: usize = 13;

const CEDULA_COEFFICIENTS: [u32; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 2];
const ENTITY_RUC_COEFFICIENTS: [u32; 8] = [3, 2, 7, 6, 5, 4, 3, 2];
const REGION_RANGE: std::ops::RangeInclusive<u32> = 1..=24;
const NATURAL_PERSON_SUFFIX: &str = "001";

pub(crate) const LENGTH_MESSAGE: &str =
    "must be 10 (natural-person ID) or 13 (enterprise ID) digits.";

/// Classified kind of a valid tax identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxIdKind {
    Cedula,
    Ruc,
}

impl fmt::Display for TaxIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxIdKind::Cedula => f.write_str("CEDULA"),
            TaxIdKind::Ruc => f.write_str("RUC"),
        }
    }
}

/// Reason a tax identifier was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxIdFailure {
    /// Nothing left after trimming
    Missing,
    /// Neither 10 nor 13 characters
    InvalidLength,
    /// Contains a character other than `0-9`
    NonDigit,
    /// CEDULA region code outside `01..=24`
    RegionOutOfRange,
    /// Weighted sum does not produce the stored check digit
    ChecksumMismatch,
    /// Natural-person RUC not ending in `001`
    BadEstablishmentSuffix,
    /// RUC third digit is 7 or 8
    UnsupportedTaxpayerType,
}

/// Outcome of [`classify_and_validate`]
///
/// `kind` is only set on success; `attempted` records which family the length
/// selected, so failures still report what was being checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxIdValidation {
    pub valid: bool,
    pub kind: Option<TaxIdKind>,
    pub attempted: Option<TaxIdKind>,
    pub failure: Option<TaxIdFailure>,
    pub message: String,
}

impl TaxIdValidation {
    fn valid(kind: TaxIdKind) -> Self {
        Self {
            valid: true,
            kind: Some(kind),
            attempted: Some(kind),
            failure: None,
            message: format!("valid {}", kind),
        }
    }

    fn invalid(attempted: Option<TaxIdKind>, failure: TaxIdFailure, message: String) -> Self {
        Self {
            valid: false,
            kind: None,
            attempted,
            failure: Some(failure),
            message,
        }
    }

    /// The classified kind, or the reason the identifier was rejected
    pub fn outcome(&self) -> Result<TaxIdKind, TaxIdFailure> {
        match (self.kind, self.failure) {
            (Some(kind), None) => Ok(kind),
            (_, Some(failure)) => Err(failure),
            (None, None) => Err(TaxIdFailure::Missing),
        }
    }
}

/// A trimmed tax identifier as submitted by a caller
///
/// Holds the raw characters; validity is computed on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxIdentifier(String);

impl TaxIdentifier {
    /// Trims and wraps a raw identifier
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Family selected by length alone, `None` when the length is neither 10
    /// nor 13
    pub fn length_kind(&self) -> Option<TaxIdKind> {
        match self.0.chars().count() {
            CEDULA_LENGTH => Some(TaxIdKind::Cedula),
            RUC_LENGTH => Some(TaxIdKind::Ruc),
            _ => None,
        }
    }

    pub fn validate(&self) -> TaxIdValidation {
        classify_and_validate(&self.0)
    }
}

impl fmt::Display for TaxIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaxIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classifies a raw tax identifier and verifies its check digit
///
/// # Examples
///
/// ```rust
/// use domain_partner::tax_id::{classify_and_validate, TaxIdKind};
///
/// let result = classify_and_validate(" 1710034065 ");
/// assert!(result.valid);
/// assert_eq!(result.kind, Some(TaxIdKind::Cedula));
///
/// assert!(!classify_and_validate("123").valid);
/// ```
pub fn classify_and_validate(raw: &str) -> TaxIdValidation {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return TaxIdValidation::invalid(
            None,
            TaxIdFailure::Missing,
            "tax identifier was not provided".to_string(),
        );
    }

    let kind = match cleaned.chars().count() {
        CEDULA_LENGTH => TaxIdKind::Cedula,
        RUC_LENGTH => TaxIdKind::Ruc,
        _ => {
            return TaxIdValidation::invalid(
                None,
                TaxIdFailure::InvalidLength,
                format!("Tax identifier {}", LENGTH_MESSAGE),
            )
        }
    };

    let Some(digits) = parse_digits(cleaned) else {
        return TaxIdValidation::invalid(
            Some(kind),
            TaxIdFailure::NonDigit,
            format!("{} must contain only digits", kind),
        );
    };

    let outcome = match kind {
        TaxIdKind::Cedula => check_cedula(&digits),
        TaxIdKind::Ruc => check_ruc(&digits),
    };

    match outcome {
        Ok(()) => TaxIdValidation::valid(kind),
        Err((failure, message)) => TaxIdValidation::invalid(Some(kind), failure, message),
    }
}

/// Computes the CEDULA check digit for the first nine digits
///
/// Each element must be in `0..=9`.
pub fn cedula_check_digit(first_nine: &[u8; 9]) -> u8 {
    let sum: u32 = first_nine
        .iter()
        .zip(CEDULA_COEFFICIENTS)
        .map(|(&digit, coefficient)| {
            let product = u32::from(digit) * coefficient;
            if product >= 10 {
                product - 9
            } else {
                product
            }
        })
        .sum();

    ((10 - sum % 10) % 10) as u8
}

/// Computes the entity RUC check digit for the first eight digits
///
/// Each element must be in `0..=9`. The result is 10 when `sum % 11 == 1`,
/// which no single stored digit can match.
pub fn entity_ruc_check_digit(first_eight: &[u8; 8]) -> u8 {
    let sum: u32 = first_eight
        .iter()
        .zip(ENTITY_RUC_COEFFICIENTS)
        .map(|(&digit, coefficient)| u32::from(digit) * coefficient)
        .sum();

    ((11 - sum % 11) % 11) as u8
}

fn parse_digits(value: &str) -> Option<Vec<u8>> {
    value
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect()
}

type CheckResult = Result<(), (TaxIdFailure, String)>;

fn check_cedula(digits: &[u8]) -> CheckResult {
    let region = u32::from(digits[0]) * 10 + u32::from(digits[1]);
    if !REGION_RANGE.contains(&region) {
        return Err((
            TaxIdFailure::RegionOutOfRange,
            format!("CEDULA region code {:02} is outside 01-24", region),
        ));
    }

    let mut first_nine = [0u8; 9];
    first_nine.copy_from_slice(&digits[..9]);
    let expected = cedula_check_digit(&first_nine);
    if digits[9] != expected {
        return Err((
            TaxIdFailure::ChecksumMismatch,
            format!(
                "CEDULA failed checksum: expected check digit {}, found {}",
                expected, digits[9]
            ),
        ));
    }

    Ok(())
}

fn check_ruc(digits: &[u8]) -> CheckResult {
    match digits[2] {
        0..=5 => {
            check_cedula(&digits[..CEDULA_LENGTH]).map_err(|(failure, message)| {
                (failure, format!("RUC embeds an invalid CEDULA: {}", message))
            })?;

            let suffix: String = digits[CEDULA_LENGTH..]
                .iter()
                .map(|d| char::from(b'0' + d))
                .collect();
            if suffix != NATURAL_PERSON_SUFFIX {
                return Err((
                    TaxIdFailure::BadEstablishmentSuffix,
                    format!(
                        "RUC establishment suffix must be {}, found {}",
                        NATURAL_PERSON_SUFFIX, suffix
                    ),
                ));
            }
            Ok(())
        }
        6 | 9 => {
            let mut first_eight = [0u8; 8];
            first_eight.copy_from_slice(&digits[..8]);
            let expected = entity_ruc_check_digit(&first_eight);
            if digits[8] != expected {
                return Err((
                    TaxIdFailure::ChecksumMismatch,
                    format!(
                        "RUC failed checksum: expected check digit {}, found {}",
                        expected, digits[8]
                    ),
                ));
            }
            Ok(())
        }
        other => Err((
            TaxIdFailure::UnsupportedTaxpayerType,
            format!("RUC third digit {} is not a supported taxpayer type", other),
        )),
    }
}
