#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for Apple Pay on the Web gateway integrations.
//!
//! This crate provides the wire types shared by the gateway client and the
//! command line tool. It performs no I/O.
//!
//! # Modules
//!
//! - [`config`] - Gateway configuration and environment variable resolution
//! - [`proto`] - Payment requests, line items, contacts, status codes and tokenized payloads
//! - [`util`] - Helper types (base64)
//!
//! # Wire Format
//!
//! Apple Pay structures serialize with camelCase field names, exactly as the
//! native `ApplePaySession` expects them. Gateway envelopes follow the same
//! convention.

pub mod config;
pub mod proto;
pub mod util;
