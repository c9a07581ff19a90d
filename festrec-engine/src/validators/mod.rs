//! Validators for festival date candidates

pub mod plausibility_validator;

pub use plausibility_validator::{PlausibilityValidator, Validation};
