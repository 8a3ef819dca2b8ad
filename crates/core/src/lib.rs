//! Domain types for the mailfold role model.
//!
//! This crate has no internal dependencies so it can be used by the
//! repository layer and any future worker or CLI tooling.

pub mod error;
pub mod roles;
pub mod types;
