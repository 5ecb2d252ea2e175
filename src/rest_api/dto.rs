//! Request/response bodies for the REST API

use serde::{Deserialize, Serialize};

use crate::keystore::Keystore;

/// Payload for creating or updating a validator keystore.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ValidatorRequest {
    /// Unique identifier for the validator
    #[serde(default)]
    pub name: String,
    /// The validator's keystore in EIP-2335 format. Defaults to an empty
    /// document when absent, which validation then rejects field by field.
    #[serde(default)]
    pub keystore: Keystore,
}

/// Payload for deleting a validator definition.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteValidatorRequest {
    #[serde(default)]
    pub name: String,
}

/// Optional `name` query parameter of GET /validator.
#[derive(Clone, Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

/// Form body of POST /start.
#[derive(Clone, Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub fee_recipient: String,
    /// `true`/`1` launch nothing and log the would-be command instead
    #[serde(default)]
    pub dry_run: Option<String>,
}

/// Body of GET /status.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub status: String,
}
