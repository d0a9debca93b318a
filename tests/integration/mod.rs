//! Integration tests for the credential layer.

pub mod attribute_mode;
pub mod collaborators;
pub mod configuration;
pub mod entries;
pub mod extended_mode;
pub mod lockout;
