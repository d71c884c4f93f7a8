//! CLI command implementations.

pub mod add;
pub mod addresses;
pub mod countries;
pub mod panic;
pub mod refresh;
pub mod remove;
pub mod rules;
