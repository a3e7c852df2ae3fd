//! Form validation
//!
//! Shallow checks run before any request is issued: required fields are
//! present and a few formats (mobile, OTP, IFSC, pincode) have the right
//! shape. Nothing here touches the network.

use std::collections::BTreeMap;

use crate::types::{BankDetails, LandDetails, UserProfile};

/// Messages per form field, keyed by the field's wire name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for messages in self.fields.values() {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                f.write_str(message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    all_digits(mobile, 10)
}

pub fn is_valid_otp(otp: &str) -> bool {
    all_digits(otp, 6)
}

pub fn validate_mobile(mobile: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !is_valid_mobile(mobile.trim()) {
        errors.add("mobile", "Mobile number must be exactly 10 digits");
    }
    errors.into_result()
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !is_valid_otp(otp.trim()) {
        errors.add("otp", "OTP must be exactly 6 digits");
    }
    errors.into_result()
}

/// IFSC: four letters, a zero, six letters or digits (e.g. `SBIN0001234`)
pub fn is_valid_ifsc(ifsc: &str) -> bool {
    let bytes = ifsc.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(u8::is_ascii_alphabetic)
        && bytes[4] == b'0'
        && bytes[5..].iter().all(u8::is_ascii_alphanumeric)
}

pub fn validate_land_details(details: &LandDetails) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let required = [
        ("ownershipType", &details.ownership_type, "Ownership type is required"),
        ("irrigationType", &details.irrigation_type, "Irrigation type is required"),
        ("soilType", &details.soil_type, "Soil type is required"),
        ("surveyNumber", &details.survey_number, "Survey number is required"),
        ("stateId", &details.state_id, "State is required"),
        ("districtId", &details.district_id, "District is required"),
        ("talukId", &details.taluk_id, "Taluk is required"),
        ("villageId", &details.village_id, "Village is required"),
    ];
    for (field, value, message) in required {
        if is_blank(value) {
            errors.add(field, message);
        }
    }

    match details.land_area {
        None => errors.add("landArea", "Land area is required"),
        Some(area) if area <= 0.0 => errors.add("landArea", "Land area must be greater than zero"),
        Some(_) => {}
    }
    if let Some(lat) = details.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            errors.add("latitude", "Latitude must be between -90 and 90");
        }
    }
    if let Some(lon) = details.longitude {
        if !(-180.0..=180.0).contains(&lon) {
            errors.add("longitude", "Longitude must be between -180 and 180");
        }
    }

    if details.coconut_farming {
        match details.number_of_trees {
            None => errors.add("numberOfTrees", "Number of trees is required"),
            Some(0) => errors.add("numberOfTrees", "Number of trees must be greater than zero"),
            Some(_) => {}
        }
        if details.tree_age_years.is_none() {
            errors.add("treeAgeYears", "Tree age is required");
        }
        if is_blank(&details.coconut_variety) {
            errors.add("coconutVariety", "Coconut variety is required");
        }
        if is_blank(&details.harvest_frequency) {
            errors.add("harvestFrequency", "Harvest frequency is required");
        }
    }

    errors.into_result()
}

/// `confirm_account_number` is the second entry of the account number
pub fn validate_bank_details(
    details: &BankDetails,
    confirm_account_number: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if is_blank(&details.account_holder_name) {
        errors.add("accountHolderName", "Account holder name is required");
    }
    match details.account_number.as_deref().map(str::trim) {
        None | Some("") => errors.add("accountNumber", "Account number is required"),
        Some(number) => {
            if !number.bytes().all(|b| b.is_ascii_digit()) || !(9..=18).contains(&number.len()) {
                errors.add("accountNumber", "Account number must be 9 to 18 digits");
            }
            if number != confirm_account_number.trim() {
                errors.add("confirmAccountNumber", "Account numbers do not match");
            }
        }
    }
    match details.ifsc_code.as_deref().map(str::trim) {
        None | Some("") => errors.add("ifscCode", "IFSC code is required"),
        Some(ifsc) if !is_valid_ifsc(&ifsc.to_uppercase()) => {
            errors.add("ifscCode", "IFSC code must look like SBIN0001234")
        }
        Some(_) => {}
    }
    if is_blank(&details.bank_name) {
        errors.add("bankName", "Bank name is required");
    }

    errors.into_result()
}

pub fn validate_profile_patch(patch: &UserProfile) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if is_blank(&patch.name) {
        errors.add("name", "Name is required");
    }
    if let Some(email) = patch.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        let shaped = email
            .split_once('@')
            .map_or(false, |(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            });
        if !shaped {
            errors.add("email", "Email address is not valid");
        }
    }
    if let Some(pincode) = patch.pincode.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        if !all_digits(pincode, 6) {
            errors.add("pincode", "Pincode must be 6 digits");
        }
    }
    if let Some(mobile) = patch.mobile.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        if !is_valid_mobile(mobile) {
            errors.add("mobile", "Mobile number must be exactly 10 digits");
        }
    }

    errors.into_result()
}
