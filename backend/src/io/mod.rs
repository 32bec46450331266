//! # IO Module
//!
//! The call boundary between the desktop shell and the store. Every call
//! answers with an [`shared::Envelope`]; store errors never escape as HTTP
//! failures.

pub mod rest;
