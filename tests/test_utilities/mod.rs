//! Shared helpers for the integration and end-to-end tests
#![allow(dead_code)]

pub mod layout;
pub mod mocks;
