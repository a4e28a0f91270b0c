//! Shared utilities: configuration, errors, paths and string helpers.

pub mod config;
pub mod errors;
pub mod paths;
pub mod string_utils;
