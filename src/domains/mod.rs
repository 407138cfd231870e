//! Domain list handling
//!
//! This module handles:
//! - Normalizing domains into the identity key used by every record
//! - Reading the newline-delimited input list
//! - Mapping domains to filesystem-safe record names

mod domain;
mod list;

pub use domain::{sanitize_filename, Domain};
pub use list::{parse_domain_list, read_domains};
