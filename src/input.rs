//! Inputs handed to the extraction pipeline.

pub mod source;
