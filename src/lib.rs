//! Cowork Onboarding — client onboarding-stage resolution for the
//! coworking-space admin console.

pub mod client_service;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
