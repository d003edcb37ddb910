//! Structural validation of company drafts.
//!
//! Field rules are declared with `validator` attributes on
//! [`CompanyDraft`]; [`validate`] runs them and, on success, converts the
//! draft into [`ValidCompany`] with a parsed [`CompanyType`].

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::model::{CompanyDraft, CompanyType};

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All violations found in one draft, ordered by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&violation.message)?;
        }
        Ok(())
    }
}

/// Draft fields after every rule passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCompany {
    pub name: String,
    pub description: String,
    pub amount_of_employees: i64,
    pub registered: bool,
    pub company_type: CompanyType,
}

pub(crate) fn known_company_type(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("type is required"));
        return Err(err);
    }
    if value.parse::<CompanyType>().is_err() {
        let mut err = ValidationError::new("company_type");
        err.message = Some(Cow::Owned(format!(
            "type must be one of: {}",
            CompanyType::ALL.map(CompanyType::as_str).join(", ")
        )));
        return Err(err);
    }
    Ok(())
}

/// Checks `draft` against the company rules.
///
/// The same rules apply to a fresh create payload and to the merged record of
/// an update.
pub fn validate(draft: CompanyDraft) -> Result<ValidCompany, Violations> {
    draft.validate().map_err(collect_violations)?;

    let company_type = draft.company_type.parse::<CompanyType>().map_err(|e| {
        Violations::from(vec![Violation::new("type", e.to_string())])
    })?;

    Ok(ValidCompany {
        name: draft.name,
        description: draft.description,
        amount_of_employees: draft.amount_of_employees,
        registered: draft.registered,
        company_type,
    })
}

/// Wire name of a draft field, as clients see it.
fn wire_field(field: &str) -> &str {
    match field {
        "amount_of_employees" => "amountOfEmployees",
        "company_type" => "type",
        other => other,
    }
}

const FIELD_ORDER: [&str; 4] = ["name", "description", "amountOfEmployees", "type"];

fn collect_violations(errors: ValidationErrors) -> Violations {
    let mut violations: Vec<Violation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = wire_field(&field).to_string();
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid ({})", err.code));
                Violation::new(field.clone(), message)
            })
        })
        .collect();

    violations.sort_by_key(|v| {
        FIELD_ORDER
            .iter()
            .position(|f| *f == v.field)
            .unwrap_or(FIELD_ORDER.len())
    });
    Violations(violations)
}
