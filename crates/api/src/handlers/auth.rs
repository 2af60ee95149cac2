//! Handlers for the `/auth` resource (messaging-channel login handshake).
//!
//! The handshake has three legs:
//!
//! 1. `POST /auth/login` -- the web client names an account by phone; the
//!    bot service is asked to prompt that account's messaging identity.
//! 2. `POST /auth/confirm` -- the bot service (authenticated with the shared
//!    internal token) reports a confirmed prompt; a session credential is
//!    minted and parked in the ephemeral store.
//! 3. `POST /auth/claim` -- the web client polls; once the credential is
//!    there, exactly one poll walks away with it.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use slotbook_core::error::CoreError;
use slotbook_db::models::user::User;
use slotbook_db::repositories::UserRepo;

use crate::auth::jwt::generate_credential;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the shared secret on bot-originated calls.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login` and `POST /auth/claim`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
}

/// Request body for `POST /auth/confirm` (bot-originated).
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub messenger_id: i64,
}

/// Handshake progress reported to the polling client.
#[derive(Debug, Serialize)]
pub struct HandshakeStatus {
    pub status: &'static str,
}

/// Response body for `GET /auth/pending/{messenger_id}`.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub pending: bool,
}

/// Successful claim: the session credential plus the account it belongs to.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub token: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Reject bot-originated calls that do not carry the shared internal token.
fn require_internal_token(headers: &HeaderMap, state: &AppState) -> Result<(), AppError> {
    if state.config.internal_token.is_empty() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Internal endpoints are disabled".into(),
        )));
    }

    let presented = headers
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented != state.config.internal_token {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid internal token".into(),
        )));
    }
    Ok(())
}

/// Resolve a login request to an account with a linked messaging identity.
async fn resolve_linked_account(state: &AppState, phone: &str) -> AppResult<(User, i64)> {
    let user = UserRepo::find_by_phone(&state.pool, phone)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("User", phone)))?;

    let messenger_id = user.messenger_id.ok_or_else(|| {
        AppError::Core(CoreError::Forbidden(
            "Account has no linked messaging channel".into(),
        ))
    })?;

    Ok((user, messenger_id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Start the handshake: ask the bot to prompt the account's messaging
/// identity. Always answers 202; the prompt delivery itself is best-effort
/// and a lost prompt just means the user retries.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<HandshakeStatus>>)> {
    let (user, messenger_id) = resolve_linked_account(&state, &input.phone).await?;

    if let Err(err) = state.messenger.send_login_prompt(messenger_id).await {
        tracing::warn!(user_id = %user.id, error = %err, "Login prompt delivery failed");
    } else {
        tracing::info!(user_id = %user.id, "Login prompt sent");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: HandshakeStatus { status: "pending" },
        }),
    ))
}

/// POST /api/v1/auth/confirm
///
/// Bot-originated: the user approved the prompt. Mint a session credential
/// and park it for the polling client. Overwrites any earlier unclaimed
/// credential for the same identity.
pub async fn confirm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ConfirmRequest>,
) -> AppResult<StatusCode> {
    require_internal_token(&headers, &state)?;

    let user = UserRepo::find_by_messenger_id(&state.pool, input.messenger_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("User", input.messenger_id)))?;

    let credential = generate_credential(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Credential generation failed: {e}")))?;

    state.login_tokens.store(input.messenger_id, credential);
    tracing::info!(user_id = %user.id, "Login confirmed from messaging channel");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/pending/{messenger_id}
///
/// Non-destructive peek: is a credential waiting? Lets the client poll
/// cheaply without consuming the single-use claim.
pub async fn pending(
    State(state): State<AppState>,
    axum::extract::Path(messenger_id): axum::extract::Path<i64>,
) -> Json<DataResponse<PendingResponse>> {
    Json(DataResponse {
        data: PendingResponse {
            pending: state.login_tokens.is_pending(messenger_id),
        },
    })
}

/// POST /api/v1/auth/claim
///
/// Poll for the minted credential. 200 with the credential exactly once;
/// 202 while it is not there (not yet confirmed, already claimed, expired,
/// or an identity this server has never seen -- the client cannot tell
/// these apart and just keeps polling until its own deadline).
pub async fn claim(
    State(state): State<AppState>,
    Json(input): Json<ConfirmRequest>,
) -> AppResult<axum::response::Response> {
    use axum::response::IntoResponse;

    let Some(token) = state.login_tokens.claim(input.messenger_id) else {
        return Ok((
            StatusCode::ACCEPTED,
            Json(DataResponse {
                data: HandshakeStatus {
                    status: "not_ready",
                },
            }),
        )
            .into_response());
    };

    // The confirm leg already resolved this identity before minting, so a
    // miss here means the account vanished mid-handshake.
    let user = UserRepo::find_by_messenger_id(&state.pool, input.messenger_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("User", input.messenger_id)))?;

    tracing::info!(user_id = %user.id, "Session credential claimed");
    Ok(Json(DataResponse {
        data: ClaimResponse { token, user },
    })
    .into_response())
}
