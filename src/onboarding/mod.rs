//! Onboarding drafts.
//!
//! A new account registers its organization in three steps:
//!
//! 1. account (the draft exists),
//! 2. organization details saved,
//! 3. locations saved.
//!
//! Each user has at most one open draft (`IN_PROGRESS`, or `SUBMITTING` while
//! the main API is being called), enforced by a partial unique index.
//! Submitting a complete draft claims it as `SUBMITTING`, registers the
//! organization with the main API and marks the draft `COMPLETED` (or
//! `FAILED` when the main API refuses it). Once a user has a
//! completed draft it is returned instead of starting a new one.

mod service;
mod storage;
mod types;
mod validation;

#[cfg(test)]
pub(crate) mod memory;

pub use service::{OnboardingError, OnboardingService};
pub use storage::{DraftStore, PgDraftStore};
pub use types::{
    DraftLocation, DraftOrganization, DraftStatus, LocationItem, LocationsForm, OrganizationForm,
    RegistrationDraft, STEP_ACCOUNT, STEP_LOCATIONS, STEP_ORGANIZATION,
};
pub use validation::{validate_locations, validate_organization};
