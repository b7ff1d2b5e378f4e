//! Parsing of source documents into scanline's domain records.
//!
//! [`normalize`] turns raw strings into canonical values, [`rules`] locates
//! fields in markup that drifts over time, and [`sites`] holds one record
//! builder per supported site. Extraction never performs I/O: callers hand in
//! the fetched document and get records (or an [`error::ErrorKind`]) back.

#[macro_use]
mod consts;
pub mod error;
pub mod labels;
pub mod models;
pub mod normalize;
pub mod pages;
pub mod rules;
pub mod sites;

pub use crate::labels::Labels;
pub use crate::rules::{Candidates, Field};
