//! Company entity and the wire payload used to create or patch it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validator::known_company_type;

/// The closed set of legal forms a company may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyType {
    #[serde(rename = "Corporation")]
    Corporation,
    #[serde(rename = "Non-Profit")]
    NonProfit,
    #[serde(rename = "Cooperative")]
    Cooperative,
    #[serde(rename = "Sole Proprietorship")]
    SoleProprietorship,
}

impl CompanyType {
    pub const ALL: [CompanyType; 4] = [
        CompanyType::Corporation,
        CompanyType::NonProfit,
        CompanyType::Cooperative,
        CompanyType::SoleProprietorship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompanyType::Corporation => "Corporation",
            CompanyType::NonProfit => "Non-Profit",
            CompanyType::Cooperative => "Cooperative",
            CompanyType::SoleProprietorship => "Sole Proprietorship",
        }
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown company type: {0:?}")]
pub struct UnknownCompanyType(pub String);

impl FromStr for CompanyType {
    type Err = UnknownCompanyType;

    /// Matching is exact: case and punctuation must agree with [`CompanyType::as_str`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompanyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownCompanyType(s.to_string()))
    }
}

/// A persisted company.
///
/// Timestamps are managed by the service and never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub amount_of_employees: i64,
    pub registered: bool,
    #[serde(rename = "type")]
    pub company_type: CompanyType,
    #[serde(skip, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(skip, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied company fields for create and patch requests.
///
/// Every field is optional: `None` means "not present in the JSON body".
/// An `id` in the body is accepted but never used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_of_employees: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
}

/// Unvalidated company fields, produced by merging a payload onto either an
/// empty record (create) or an existing one (update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CompanyDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 3000, message = "description must be at most 3000 characters"))]
    pub description: String,
    #[validate(range(min = 1, message = "amountOfEmployees must be a positive integer"))]
    pub amount_of_employees: i64,
    pub registered: bool,
    #[validate(custom(function = "known_company_type"))]
    pub company_type: String,
}

impl CompanyDraft {
    /// Overwrites every field present in `payload`; absent fields are kept.
    ///
    /// Present-but-empty strings do overwrite, so a patch can clear a field
    /// (and then fail validation if that field is required).
    pub fn merge(&mut self, payload: CompanyPayload) {
        if let Some(name) = payload.name {
            self.name = name;
        }
        if let Some(description) = payload.description {
            self.description = description;
        }
        if let Some(amount) = payload.amount_of_employees {
            self.amount_of_employees = amount;
        }
        if let Some(registered) = payload.registered {
            self.registered = registered;
        }
        if let Some(company_type) = payload.company_type {
            self.company_type = company_type;
        }
    }
}

impl From<&Company> for CompanyDraft {
    fn from(company: &Company) -> Self {
        Self {
            name: company.name.clone(),
            description: company.description.clone(),
            amount_of_employees: company.amount_of_employees,
            registered: company.registered,
            company_type: company.company_type.as_str().to_string(),
        }
    }
}

impl From<CompanyPayload> for CompanyDraft {
    fn from(payload: CompanyPayload) -> Self {
        let mut draft = CompanyDraft::default();
        draft.merge(payload);
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Company {
        let now = Utc::now();
        Company {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            description: "d".to_string(),
            amount_of_employees: 10,
            registered: true,
            company_type: CompanyType::Corporation,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn company_type_parses_exact_names_only() {
        for t in CompanyType::ALL {
            assert_eq!(t.as_str().parse::<CompanyType>(), Ok(t));
        }
        assert!("corporation".parse::<CompanyType>().is_err());
        assert!("Non Profit".parse::<CompanyType>().is_err());
        assert!("Corporations".parse::<CompanyType>().is_err());
        assert!("".parse::<CompanyType>().is_err());
    }

    #[test]
    fn company_serializes_camel_case_without_timestamps() {
        let company = sample();
        let value = serde_json::to_value(&company).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["name"], "A");
        assert_eq!(obj["amountOfEmployees"], 10);
        assert_eq!(obj["registered"], true);
        assert_eq!(obj["type"], "Corporation");
        assert_eq!(obj["id"], company.id.to_string());
        assert!(!obj.contains_key("createdAt"));
        assert!(!obj.contains_key("updatedAt"));
        assert!(!obj.contains_key("created_at"));
    }

    #[test]
    fn registered_false_is_still_serialized() {
        let mut company = sample();
        company.registered = false;
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["registered"], false);
    }

    #[test]
    fn payload_distinguishes_absent_from_empty() {
        let payload: CompanyPayload =
            serde_json::from_str(r#"{"name": "B", "description": ""}"#).unwrap();
        assert_eq!(payload.name.as_deref(), Some("B"));
        assert_eq!(payload.description.as_deref(), Some(""));
        assert_eq!(payload.amount_of_employees, None);
        assert_eq!(payload.company_type, None);
    }

    #[test]
    fn merge_with_name_only_keeps_other_fields() {
        let company = sample();
        let mut draft = CompanyDraft::from(&company);
        draft.merge(CompanyPayload {
            name: Some("B".to_string()),
            ..Default::default()
        });
        assert_eq!(
            draft,
            CompanyDraft {
                name: "B".to_string(),
                description: "d".to_string(),
                amount_of_employees: 10,
                registered: true,
                company_type: "Corporation".to_string(),
            }
        );
    }

    #[test]
    fn merge_with_empty_string_clears_field() {
        let mut draft = CompanyDraft::from(&sample());
        draft.merge(CompanyPayload {
            description: Some(String::new()),
            registered: Some(false),
            ..Default::default()
        });
        assert_eq!(draft.description, "");
        assert!(!draft.registered);
        assert_eq!(draft.name, "A");
    }

    #[test]
    fn draft_from_payload_defaults_missing_fields() {
        let draft = CompanyDraft::from(CompanyPayload {
            name: Some("X".to_string()),
            ..Default::default()
        });
        assert_eq!(draft.name, "X");
        assert_eq!(draft.amount_of_employees, 0);
        assert!(!draft.registered);
        assert_eq!(draft.company_type, "");
    }
}
