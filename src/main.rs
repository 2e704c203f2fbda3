//! Apple Pay on the Web command line entrypoint.
//!
//! Talks to a payment gateway's client API the way a web checkout would:
//!
//! - `payment-request <partial.json>` – merge a payment request with the merchant defaults
//! - `validate --validation-url <url>` – obtain a merchant session
//! - `tokenize <token.json>` – exchange an Apple Pay payment token for a nonce
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at the JSON configuration file (default `config.json`)
//! - `RUST_LOG` filters the logs written to stderr
//! - `OTEL_*` variables enable trace export to systems like Honeycomb

mod config;
mod run;
mod telemetry;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
