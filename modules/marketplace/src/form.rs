//! Form state with field-keyed updates and build-time validation.
//!
//! Each form mirrors one submission surface: raw text goes in through a
//! single `set` keyed by a field enum, `validate_and_build` either returns
//! the typed request body or a [`FieldErrors`] with one message per
//! offending field. Nothing is sent anywhere until validation passes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clientkit::validate;

use crate::model::{
    CleanType, HouseType, NewCommission, PartnerPatch, PartnerType, PasswordChange,
};

/// Validation outcome keyed by field name. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    by_field: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    /// Record `error` under `field` if there is one.
    pub fn note(&mut self, field: &'static str, error: Option<String>) {
        if let Some(message) = error {
            self.by_field.insert(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.by_field.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.by_field.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.by_field.values() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Accept either a bare date (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_desired_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

/// Text fields of the commission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionField {
    Size,
    AddressId,
    Image,
    DesiredDate,
    Significant,
}

/// Draft of a new cleaning request.
///
/// Size is genuinely optional: an empty field builds to `None` rather than
/// failing validation.
#[derive(Debug, Clone, Default)]
pub struct CommissionForm {
    size: String,
    address_id: String,
    image: String,
    desired_date: String,
    significant: String,
    house_type: Option<HouseType>,
    clean_type: Option<CleanType>,
}

impl CommissionForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update one text field; the latest value wins.
    pub fn set(&mut self, field: CommissionField, raw: impl Into<String>) {
        let raw = raw.into();
        match field {
            CommissionField::Size => self.size = raw,
            CommissionField::AddressId => self.address_id = raw,
            CommissionField::Image => self.image = raw,
            CommissionField::DesiredDate => self.desired_date = raw,
            CommissionField::Significant => self.significant = raw,
        }
    }

    pub fn set_house_type(&mut self, house_type: HouseType) {
        self.house_type = Some(house_type);
    }

    pub fn set_clean_type(&mut self, clean_type: CleanType) {
        self.clean_type = Some(clean_type);
    }

    /// Validate every field and build the request body. All problems are
    /// reported at once, not just the first.
    pub fn validate_and_build(&self) -> Result<NewCommission, FieldErrors> {
        let mut errors = FieldErrors::default();

        let size = if self.size.is_empty() {
            None
        } else {
            match validate::positive_number("size", &self.size) {
                None => self.size.parse::<f64>().ok(),
                problem => {
                    errors.note("size", problem);
                    None
                }
            }
        };

        let address_id = match validate::required("address", &self.address_id) {
            Some(problem) => {
                errors.note("address_id", Some(problem));
                None
            }
            None => match self.address_id.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.note("address_id", Some("address must be a numeric id".into()));
                    None
                }
            },
        };

        let desired_date = match validate::required("desired date", &self.desired_date) {
            Some(problem) => {
                errors.note("desired_date", Some(problem));
                None
            }
            None => match parse_desired_date(&self.desired_date) {
                Some(dt) => Some(dt),
                None => {
                    errors.note(
                        "desired_date",
                        Some(
                            "desired date must be a date (2024-03-14) or an RFC 3339 timestamp"
                                .into(),
                        ),
                    );
                    None
                }
            },
        };

        if self.house_type.is_none() {
            errors.note("house_type", Some("house type is required".into()));
        }
        if self.clean_type.is_none() {
            errors.note("clean_type", Some("clean type is required".into()));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        let (Some(address_id), Some(desired_date), Some(house_type), Some(clean_type)) =
            (address_id, desired_date, self.house_type, self.clean_type)
        else {
            return Err(errors);
        };

        Ok(NewCommission {
            size,
            house_type,
            clean_type,
            address_id,
            image: non_empty(&self.image),
            desired_date,
            significant: non_empty(&self.significant),
        })
    }
}

/// Fields of the password change form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordField {
    Password,
    Confirm,
}

/// Draft of a password change: new password typed twice.
#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    password: String,
    confirm: String,
}

impl PasswordChangeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: PasswordField, raw: impl Into<String>) {
        let raw = raw.into();
        match field {
            PasswordField::Password => self.password = raw,
            PasswordField::Confirm => self.confirm = raw,
        }
    }

    pub fn validate_and_build(&self) -> Result<PasswordChange, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.note("password", validate::required("password", &self.password));
        errors.note(
            "confirm",
            validate::password_match(&self.password, &self.confirm),
        );

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(PasswordChange {
            password: self.password.clone(),
        })
    }
}

/// Text fields of the partner profile form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerField {
    PhoneNumber,
    ManagerName,
    CompanyName,
    BusinessType,
}

/// Draft of a partner profile update. Every field is optional; empty
/// fields are left out of the patch so the server keeps their current
/// values.
#[derive(Debug, Clone, Default)]
pub struct PartnerProfileForm {
    phone_number: String,
    manager_name: String,
    company_name: String,
    business_type: String,
    partner_type: Option<PartnerType>,
}

impl PartnerProfileForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: PartnerField, raw: impl Into<String>) {
        let raw = raw.into();
        match field {
            PartnerField::PhoneNumber => self.phone_number = raw,
            PartnerField::ManagerName => self.manager_name = raw,
            PartnerField::CompanyName => self.company_name = raw,
            PartnerField::BusinessType => self.business_type = raw,
        }
    }

    pub fn set_partner_type(&mut self, partner_type: PartnerType) {
        self.partner_type = Some(partner_type);
    }

    pub fn validate_and_build(&self) -> Result<PartnerPatch, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.note("phone_number", validate::phone(&self.phone_number));

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(PartnerPatch {
            phone_number: non_empty(&self.phone_number),
            manager_name: non_empty(&self.manager_name),
            company_name: non_empty(&self.company_name),
            business_type: non_empty(&self.business_type),
            partner_type: self.partner_type,
        })
    }
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
