//! Wire models for the marketplace API.
//!
//! Field names follow the server's camelCase JSON; enum values travel as
//! SCREAMING_SNAKE_CASE strings. Patch types serialize only the fields
//! that are set, so a PATCH body carries exactly the intended changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use clientkit::token::TokenPair;

/// Kind of dwelling a commission refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HouseType {
    Apartment,
    Villa,
    House,
    Officetel,
}

/// Kind of cleaning requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CleanType {
    MoveIn,
    Residence,
    Interior,
}

/// Legal form of a partner business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerType {
    Individual,
    Corporation,
    PublicInstitution,
}

impl fmt::Display for HouseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Apartment => "APARTMENT",
            Self::Villa => "VILLA",
            Self::House => "HOUSE",
            Self::Officetel => "OFFICETEL",
        })
    }
}

impl FromStr for HouseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "APARTMENT" => Ok(Self::Apartment),
            "VILLA" => Ok(Self::Villa),
            "HOUSE" => Ok(Self::House),
            "OFFICETEL" => Ok(Self::Officetel),
            other => Err(format!("unknown house type: {other}")),
        }
    }
}

impl fmt::Display for CleanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MoveIn => "MOVE_IN",
            Self::Residence => "RESIDENCE",
            Self::Interior => "INTERIOR",
        })
    }
}

impl FromStr for CleanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "MOVE_IN" => Ok(Self::MoveIn),
            "RESIDENCE" => Ok(Self::Residence),
            "INTERIOR" => Ok(Self::Interior),
            other => Err(format!("unknown clean type: {other}")),
        }
    }
}

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Individual => "INDIVIDUAL",
            Self::Corporation => "CORPORATION",
            Self::PublicInstitution => "PUBLIC_INSTITUTION",
        })
    }
}

impl FromStr for PartnerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "INDIVIDUAL" => Ok(Self::Individual),
            "CORPORATION" => Ok(Self::Corporation),
            "PUBLIC_INSTITUTION" => Ok(Self::PublicInstitution),
            other => Err(format!("unknown partner type: {other}")),
        }
    }
}

/// A cleaning request as the server returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub commission_id: i64,
    pub member_nick: String,
    /// Floor area in pyeong; the member may leave it unspecified.
    pub size: Option<f64>,
    pub house_type: HouseType,
    pub clean_type: CleanType,
    pub address_id: i64,
    pub image: Option<String>,
    pub desired_date: DateTime<Utc>,
    pub significant: Option<String>,
}

/// Data for creating a new commission. The member identity comes from the
/// bearer token, not the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommission {
    pub size: Option<f64>,
    pub house_type: HouseType,
    pub clean_type: CleanType,
    pub address_id: i64,
    pub image: Option<String>,
    pub desired_date: DateTime<Utc>,
    pub significant: Option<String>,
}

/// Partial update for a commission; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_type: Option<HouseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_type: Option<CleanType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant: Option<String>,
}

/// A partner's price quote for one commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: i64,
    pub commission_id: i64,
    /// Provisional price before the final visit.
    pub tmp_price: i64,
    pub statement: String,
    pub fixed_date: DateTime<Utc>,
}

/// Data for submitting a new estimate against a commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEstimate {
    pub commission_id: i64,
    pub tmp_price: i64,
    pub statement: String,
    pub fixed_date: DateTime<Utc>,
}

/// Partial update for an estimate; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmp_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_date: Option<DateTime<Utc>>,
}

/// Profile of the logged-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub member_nick: String,
    pub email: String,
    pub phone_number: String,
}

/// Partial update for a member profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_nick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Profile of the logged-in partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerProfile {
    pub email: String,
    pub phone_number: String,
    pub manager_name: String,
    pub company_name: String,
    pub business_type: String,
    pub partner_type: PartnerType,
}

/// Partial update for a partner profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_type: Option<PartnerType>,
}

/// Credentials for a login call, identical on both hosts.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for the password change endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn commission_uses_camel_case_wire_names() {
        let new = NewCommission {
            size: Some(24.0),
            house_type: HouseType::Apartment,
            clean_type: CleanType::MoveIn,
            address_id: 3,
            image: None,
            desired_date: sample_date(),
            significant: Some("pets at home".into()),
        };
        let json = serde_json::to_value(&new).unwrap();

        assert_eq!(json["houseType"], "APARTMENT");
        assert_eq!(json["cleanType"], "MOVE_IN");
        assert_eq!(json["addressId"], 3);
        assert_eq!(json["desiredDate"], "2024-03-14T10:00:00Z");
        assert_eq!(json["significant"], "pets at home");
    }

    #[test]
    fn commission_parses_server_shape() {
        let raw = serde_json::json!({
            "commissionId": 42,
            "memberNick": "mina",
            "size": null,
            "houseType": "OFFICETEL",
            "cleanType": "RESIDENCE",
            "addressId": 7,
            "image": null,
            "desiredDate": "2024-03-14T10:00:00Z",
            "significant": null
        });
        let commission: Commission = serde_json::from_value(raw).unwrap();

        assert_eq!(commission.commission_id, 42);
        assert_eq!(commission.member_nick, "mina");
        assert_eq!(commission.size, None);
        assert_eq!(commission.house_type, HouseType::Officetel);
        assert_eq!(commission.clean_type, CleanType::Residence);
    }

    #[test]
    fn unset_optional_fields_serialize_as_null() {
        let new = NewCommission {
            size: None,
            house_type: HouseType::Villa,
            clean_type: CleanType::Interior,
            address_id: 5,
            image: None,
            desired_date: sample_date(),
            significant: None,
        };
        let json = serde_json::to_value(&new).unwrap();
        let obj = json.as_object().unwrap();

        // The keys travel with explicit nulls rather than disappearing.
        assert!(obj.contains_key("size") && json["size"].is_null());
        assert!(obj.contains_key("image") && json["image"].is_null());
        assert!(obj.contains_key("significant") && json["significant"].is_null());
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = CommissionPatch {
            size: Some(30.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 1);
        assert_eq!(obj["size"], 30.5);
    }

    #[test]
    fn estimate_wire_shape() {
        let estimate: Estimate = serde_json::from_value(serde_json::json!({
            "id": 9,
            "commissionId": 42,
            "tmpPrice": 150000,
            "statement": "two cleaners, half a day",
            "fixedDate": "2024-03-20T09:00:00Z"
        }))
        .unwrap();

        assert_eq!(estimate.commission_id, 42);
        assert_eq!(estimate.tmp_price, 150_000);
    }

    #[test]
    fn enum_round_trips_match_wire_spelling() {
        for (value, expected) in [
            (
                serde_json::to_value(PartnerType::PublicInstitution).unwrap(),
                "PUBLIC_INSTITUTION",
            ),
            (serde_json::to_value(CleanType::MoveIn).unwrap(), "MOVE_IN"),
            (serde_json::to_value(HouseType::Villa).unwrap(), "VILLA"),
        ] {
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn enums_parse_from_relaxed_cli_spellings() {
        assert_eq!("move-in".parse::<CleanType>().unwrap(), CleanType::MoveIn);
        assert_eq!("apartment".parse::<HouseType>().unwrap(), HouseType::Apartment);
        assert_eq!(
            "public_institution".parse::<PartnerType>().unwrap(),
            PartnerType::PublicInstitution
        );
        assert!("castle".parse::<HouseType>().is_err());
    }
}
