//! Field checks for the onboarding forms. Each returns the first problem found.

use super::types::{LocationsForm, OrganizationForm};
use regex::Regex;

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

// ASCII digits only; `\d` would also match other scripts.

/// INN: 10 digits for legal entities, 12 for sole proprietors.
fn valid_inn(inn: &str) -> bool {
    Regex::new(r"^[0-9]{10}([0-9]{2})?$").is_ok_and(|re| re.is_match(inn))
}

fn valid_kpp(kpp: &str) -> bool {
    Regex::new(r"^[0-9]{9}$").is_ok_and(|re| re.is_match(kpp))
}

#[must_use]
pub fn validate_organization(form: &OrganizationForm) -> Option<&'static str> {
    if blank(&form.draft_id) {
        return Some("draftId is required");
    }
    if blank(&form.name) {
        return Some("Enter the organization name");
    }
    if blank(&form.inn) {
        return Some("Enter the INN");
    }
    if !valid_inn(&form.inn) {
        return Some("INN must contain 10 or 12 digits");
    }
    if blank(&form.kpp) {
        return Some("Enter the KPP");
    }
    if !valid_kpp(&form.kpp) {
        return Some("KPP must contain 9 digits");
    }
    if blank(&form.director) {
        return Some("Enter the director's full name");
    }
    if blank(&form.phone_number) {
        return Some("Enter a phone number");
    }
    if blank(&form.plan) {
        return Some("Select a plan");
    }
    None
}

#[must_use]
pub fn validate_locations(form: &LocationsForm) -> Option<&'static str> {
    if blank(&form.draft_id) {
        return Some("draftId is required");
    }
    if form.locations.is_empty() {
        return Some("Add at least one location");
    }
    for location in &form.locations {
        if blank(&location.name) {
            return Some("Enter the location name");
        }
        if blank(&location.address) {
            return Some("Enter the location address");
        }
        if location.active_places < 1 || i32::try_from(location.active_places).is_err() {
            return Some("Specify the number of places");
        }
    }
    None
}
