//! Pairing of two connections through a shared short code.

mod code;
mod registry;
mod service;

pub use code::{CODE_ALPHABET, CODE_LENGTH, CodeGenerator, RandomCodeGenerator, is_well_formed};
pub use registry::{Claim, ConnectionRegistry};
pub use service::{DEFAULT_MAX_ISSUE_ATTEMPTS, PairingService};

#[cfg(test)]
pub(crate) use code::testing;
