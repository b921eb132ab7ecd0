//! # IO Module
//!
//! The boundary between HTTP callers and the domain: axum handlers, DTO
//! mapping and error translation.

pub mod rest;
