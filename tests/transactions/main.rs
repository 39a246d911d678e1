//! Transaction coordinator integration tests.
//!
//! Trades and transfers against a store that can be told to fail specific
//! writes:
//! - numeric trade and transfer scenarios
//! - retries after injected conflicts land the same state as a clean run
//! - failures that leave the store in an unknown state surface as ambiguous

mod support;
mod faults;
mod trade;
mod transfer;
