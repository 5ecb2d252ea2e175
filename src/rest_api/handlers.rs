//! HTTP handlers for the launcher control plane
//!
//! Each handler parses the child flags at request time, so a
//! misconfigured argument vector surfaces as a 400 on the operation that
//! needed it rather than at startup.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, FromRequest, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::error::{Error, Result};
use crate::flags::ChildFlags;
use crate::keystore::{Keystore, KeystoreStore};
use crate::state::ValidatorStatus;
use crate::LauncherState;

use super::dto::{
    DeleteValidatorRequest, NameQuery, StartRequest, StatusResponse, ValidatorRequest,
};

/// GET /healthz: the launcher process itself is alive.
pub async fn liveness() -> &'static str {
    "alive"
}

/// GET /readyz: gated on the consensus readiness flag.
pub async fn readiness(State(state): State<Arc<LauncherState>>) -> Response {
    if state.readiness.is_ready() {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

/// GET /status: current validator process status.
pub async fn status(State(state): State<Arc<LauncherState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.supervisor.status().as_str().to_string(),
    })
}

/// GET /validator: one entry when `name` is given, the listing otherwise.
pub async fn get_validators(
    State(state): State<Arc<LauncherState>>,
    Query(query): Query<NameQuery>,
) -> Result<Response> {
    let store = store_for(&state)?;
    match query.name.filter(|name| !name.is_empty()) {
        Some(name) => Ok(Json(store.get(&name).await?).into_response()),
        None => Ok(Json(store.list().await?).into_response()),
    }
}

/// POST /validator: create a keystore for a new validator name.
pub async fn create_validator(
    State(state): State<Arc<LauncherState>>,
    ValidatedJson(req): ValidatedJson<ValidatorRequest>,
) -> Result<Response> {
    let store = store_for(&state)?;
    let keystore = keystore_bytes(&req.keystore)?;
    store.create(&req.name, &keystore).await?;
    Ok((StatusCode::CREATED, "Validator keystore created").into_response())
}

/// PUT /validator: overwrite an existing validator's keystore.
pub async fn update_validator(
    State(state): State<Arc<LauncherState>>,
    ValidatedJson(req): ValidatedJson<ValidatorRequest>,
) -> Result<Response> {
    let store = store_for(&state)?;
    let keystore = keystore_bytes(&req.keystore)?;
    store.update(&req.name, &keystore).await?;
    Ok((StatusCode::OK, "Validator keystore updated").into_response())
}

/// DELETE /validator: remove a validator definition directory.
pub async fn delete_validator(
    State(state): State<Arc<LauncherState>>,
    ValidatedJson(req): ValidatedJson<DeleteValidatorRequest>,
) -> Result<Response> {
    let store = store_for(&state)?;
    store.delete(&req.name).await?;
    Ok((StatusCode::OK, "Validator definition deleted").into_response())
}

/// POST /start: launch the validator child with the captured argument
/// vector plus the suggested fee recipient.
pub async fn start_validator(
    State(state): State<Arc<LauncherState>>,
    Form(req): Form<StartRequest>,
) -> Result<Response> {
    if state.supervisor.status() == ValidatorStatus::Running {
        return Err(Error::AlreadyRunning);
    }
    if req.fee_recipient.is_empty() {
        return Err(Error::BadRequest(
            "Missing required parameter: fee_recipient".to_string(),
        ));
    }
    let dry_run = parse_dry_run(req.dry_run.as_deref())?;

    let flags = ChildFlags::parse(&state.lighthouse_args)?;
    info!(
        "Extra flags: datadir={} network={} secrets-dir={:?}",
        flags.datadir.display(),
        flags.network,
        flags.secrets_dir
    );

    let mut final_args = state.lighthouse_args.clone();
    final_args.push(format!("--suggested-fee-recipient={}", req.fee_recipient));

    if dry_run {
        info!(
            "[dry_run] Would execute: lighthouse validator with args {:?}",
            final_args
        );
        return Ok((
            StatusCode::OK,
            "Dry run executed: would launch Lighthouse validator",
        )
            .into_response());
    }

    state.supervisor.launch(&flags.datadir, final_args).await?;
    Ok((StatusCode::OK, "Lighthouse validator launched successfully").into_response())
}

/// GET /: send browsers to the API docs with a 302.
pub async fn root_redirect() -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/swagger/index.html")],
    )
        .into_response()
}

/// GET /swagger: the canonical docs location, a 301.
pub async fn swagger_redirect() -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/swagger/index.html")],
    )
        .into_response()
}

/// `Json` that reports every extraction failure as a 400 through the
/// central error type, instead of axum's split 415/422 rejections. A
/// request body is either usable or a bad request; there is no third
/// answer on this surface.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::BadRequest(format!("Invalid request: {rejection}")))?;
        Ok(ValidatedJson(value))
    }
}

fn store_for(state: &LauncherState) -> Result<KeystoreStore> {
    let flags = ChildFlags::parse(&state.lighthouse_args)?;
    Ok(KeystoreStore::new(flags.datadir, flags.network))
}

/// Serialize the request keystore and run it back through structural
/// validation, so the bytes written to disk are exactly the bytes that
/// were validated.
fn keystore_bytes(keystore: &Keystore) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(keystore)?;
    Keystore::from_json(&bytes)?;
    Ok(bytes)
}

fn parse_dry_run(raw: Option<&str>) -> Result<bool> {
    match raw.unwrap_or("") {
        "true" | "1" => Ok(true),
        "" | "false" | "0" => Ok(false),
        other => Err(Error::BadRequest(format!(
            "unparsable dry_run value: {other:?}"
        ))),
    }
}
