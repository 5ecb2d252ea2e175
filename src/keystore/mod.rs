//! EIP-2335 keystore management
//!
//! The document model with structural validation, and the on-disk store
//! the HTTP handlers operate on. Keystore content is validated
//! structurally only; nothing here ever decrypts key material.

mod store;
mod types;

#[cfg(test)]
mod tests;

pub use store::{KeystoreStore, ValidatorInfo};
pub use types::{Crypto, CryptoModule, Keystore};
