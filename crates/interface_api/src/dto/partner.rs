//! Business partner DTOs
//!
//! Field names follow the public JSON contract (`value`, `taxId`, `groupId`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use core_kernel::GroupId;
use domain_partner::{BusinessPartnerDraft, CreatedPartner, Group, PartnerSummary, TaxIdKind};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartnerRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 40))]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 120))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 20))]
    pub tax_id: Option<String>,
    /// Accepted as a number or a numeric string; `0` counts as absent
    #[serde(default, deserialize_with = "group_id_lenient")]
    pub group_id: Option<i32>,
}

impl CreatePartnerRequest {
    /// Absent fields become blank and are reported by the domain check
    pub fn into_draft(self) -> BusinessPartnerDraft {
        BusinessPartnerDraft {
            code: self.value.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            tax_id: self.tax_id.unwrap_or_default(),
            group_id: self.group_id.map(GroupId::new),
        }
    }
}

/// Length limits apply to the value that gets stored
fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}

fn group_id_lenient<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(i32),
        Text(String),
    }

    let id = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => None,
        Some(NumberOrText::Text(text)) => Some(text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("groupId '{}' is not a number", text))
        })?),
    };
    Ok(id.filter(|&n| n != 0))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPartnersParams {
    pub search: Option<String>,
}

/// `{success, count, data}` envelope of the listing endpoints
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSummaryResponse {
    pub id: i32,
    pub value: String,
    pub name: String,
    pub tax_id: String,
    pub group_name: Option<String>,
}

impl From<PartnerSummary> for PartnerSummaryResponse {
    fn from(summary: PartnerSummary) -> Self {
        Self {
            id: summary.id.value(),
            value: summary.code,
            name: summary.name,
            tax_id: summary.tax_id,
            group_name: summary.group_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id.value(),
            name: group.name,
            description: group.description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerResponse {
    pub id: i32,
    pub value: String,
    pub name: String,
    pub tax_id: String,
    pub group_id: i32,
    pub client_id: i32,
    pub org_id: i32,
    pub is_active: bool,
    pub is_customer: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxIdValidationResponse {
    pub tax_id_type: TaxIdKind,
    pub tax_id_message: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePartnerResponse {
    pub success: bool,
    pub message: String,
    pub data: PartnerResponse,
    pub validation: TaxIdValidationResponse,
}

impl From<CreatedPartner> for CreatePartnerResponse {
    fn from(created: CreatedPartner) -> Self {
        let record = created.record;
        Self {
            success: true,
            message: "Business partner created".to_string(),
            data: PartnerResponse {
                id: record.id.value(),
                value: record.code,
                name: record.name,
                tax_id: record.tax_id.to_string(),
                group_id: record.group_id.value(),
                client_id: record.client_id.value(),
                org_id: record.org_id.value(),
                is_active: record.flags.is_active,
                is_customer: record.flags.is_customer,
                created_at: record.created_at,
            },
            validation: TaxIdValidationResponse {
                tax_id_type: created.tax_id_kind,
                tax_id_message: created.tax_id_message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_accepts_number_or_numeric_text() {
        let numeric: CreatePartnerRequest = serde_json::from_str(r#"{"groupId": 103}"#).unwrap();
        let text: CreatePartnerRequest = serde_json::from_str(r#"{"groupId": " 103 "}"#).unwrap();
        assert_eq!(numeric.group_id, Some(103));
        assert_eq!(text.group_id, Some(103));
    }

    #[test]
    fn test_blank_or_absent_group_id_is_none() {
        let blank: CreatePartnerRequest = serde_json::from_str(r#"{"groupId": ""}"#).unwrap();
        let absent: CreatePartnerRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(blank.group_id, None);
        assert_eq!(absent.group_id, None);
    }

    #[test]
    fn test_zero_group_id_counts_as_missing() {
        let numeric: CreatePartnerRequest = serde_json::from_str(r#"{"groupId": 0}"#).unwrap();
        let text: CreatePartnerRequest = serde_json::from_str(r#"{"groupId": "0"}"#).unwrap();
        assert_eq!(numeric.group_id, None);
        assert_eq!(text.group_id, None);
        assert_eq!(numeric.into_draft().missing_fields(), vec!["code", "name", "tax_id", "group_id"]);
    }

    #[test]
    fn test_length_limits_apply_after_trimming() {
        let padded = format!(r#"{{"value": "  {}  ", "taxId": " 1710034065001 "}}"#, "C".repeat(40));
        let request: CreatePartnerRequest = serde_json::from_str(&padded).unwrap();
        assert_eq!(request.value.as_deref().map(str::len), Some(40));
        assert_eq!(request.tax_id.as_deref(), Some("1710034065001"));
        assert!(request.validate().is_ok());

        let overlong = format!(r#"{{"value": "{}"}}"#, "C".repeat(41));
        let request: CreatePartnerRequest = serde_json::from_str(&overlong).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_non_numeric_group_id_is_rejected() {
        let result = serde_json::from_str::<CreatePartnerRequest>(r#"{"groupId": "abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_overlong_name_fails_validation() {
        let request = CreatePartnerRequest {
            name: Some("x".repeat(121)),
            ..CreatePartnerRequest::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_absent_fields_become_blank_draft_fields() {
        let draft = CreatePartnerRequest::default().into_draft();
        assert_eq!(draft.missing_fields(), vec!["code", "name", "tax_id", "group_id"]);
    }
}
