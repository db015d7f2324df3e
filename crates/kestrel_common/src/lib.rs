//! Shared foundational types used across the kestrel crates.
//!
//! The [`ContentHash`] fingerprint detects when a configuration document
//! changed and names fetched-document cache files. [`panic_message`] turns
//! the payload of a caught panic into text for build and scan failures.

#![warn(missing_docs)]

pub mod hash;
pub mod panic;

pub use hash::ContentHash;
pub use panic::panic_message;
