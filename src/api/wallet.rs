//! Protected wallet routes: every handler runs behind the [`Authorized`]
//! extractor and forwards the verified access token to the wallet
//! service as the bearer credential.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::Authorized;
use crate::db::User;
use crate::wallet::{Transaction, Wallet, WalletEnvelope};

#[derive(Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    account: String,
}

#[derive(Deserialize)]
pub struct TopupForm {
    accountno: String,
    amount: String,
}

#[derive(Deserialize)]
pub struct TransferForm {
    from: String,
    to: String,
    /// Free-form destination used when `to` is the "-" placeholder
    #[serde(default)]
    other: String,
    amount: String,
}

/// User fields safe to show back to the client.
#[derive(Serialize)]
struct UserProfile {
    iin: String,
    username: String,
    created_at: String,
    is_admin: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            iin: user.iin,
            username: user.username,
            created_at: user.created_at,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Serialize)]
struct InfoResponse {
    user: UserProfile,
    wallets: Vec<Wallet>,
}

/// Account overview: the stored user record plus wallet balances.
pub async fn info(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .get_by_username(&principal.username)
        .await
        .store_err("Failed to load user record")?
        .ok_or_else(|| ApiError::internal("something went wrong, try again later"))?;

    let wallets = state
        .wallet
        .wallets(&principal.iin, &principal.access_token)
        .await
        .wallet_err("Failed to fetch wallets")?;

    Ok(Json(InfoResponse {
        user: UserProfile::from(user),
        wallets,
    })
    .into_response())
}

#[derive(Serialize)]
struct TransactionsResponse {
    account: String,
    transactions: Vec<Transaction>,
}

/// Ledger entries for one account.
pub async fn transactions(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, ApiError> {
    if query.account.is_empty() {
        return Err(ApiError::bad_request("account number required"));
    }
    if !valid_account(&query.account) {
        return Err(ApiError::bad_request("invalid account(s)"));
    }

    let transactions = state
        .wallet
        .transactions(&principal.access_token, &query.account)
        .await
        .wallet_err("Failed to fetch transactions")?;

    Ok(Json(TransactionsResponse {
        account: query.account,
        transactions,
    })
    .into_response())
}

/// List the caller's account numbers.
pub async fn list_wallets(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
) -> Result<Response, ApiError> {
    let wallets = state
        .wallet
        .wallet_list(&principal.access_token)
        .await
        .wallet_err("Failed to fetch wallet list")?;

    Ok(Json(serde_json::json!({ "wallets": wallets })).into_response())
}

/// Open a new account for the caller.
pub async fn add_wallet(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
) -> Result<Response, ApiError> {
    let account = state
        .wallet
        .add_wallet(&principal.access_token)
        .await
        .wallet_err("Failed to add wallet")?;

    info!(iin = %principal.iin, account = %account, "wallet created");
    Ok(Json(serde_json::json!({
        "message": format!("Created new account under {account}")
    }))
    .into_response())
}

/// Credit an account. The wallet service's own 400s pass through with
/// their message; anything else collapses to an internal error.
pub async fn top_up(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Form(form): Form<TopupForm>,
) -> Result<Response, ApiError> {
    if !valid_account(&form.accountno) || !valid_amount(&form.amount) {
        return Err(ApiError::bad_request("invalid account or amount"));
    }

    let (status, envelope) = state
        .wallet
        .top_up(
            &principal.iin,
            &form.accountno,
            &form.amount,
            &principal.access_token,
        )
        .await
        .wallet_err("Top-up request failed")?;

    if envelope.ok {
        let message = format!(
            "Topped up successfully, current balance is ₸{}",
            envelope.message
        );
        return Ok(Json(serde_json::json!({ "message": message })).into_response());
    }
    Err(upstream_rejection(status, envelope))
}

/// Move money between accounts.
pub async fn transfer(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Form(form): Form<TransferForm>,
) -> Result<Response, ApiError> {
    let to = if form.to == "-" { &form.other } else { &form.to };

    if !valid_amount(&form.amount) {
        return Err(ApiError::bad_request("invalid amount"));
    }
    if !valid_account(&form.from) || !valid_account(to) {
        return Err(ApiError::bad_request("invalid account(s)"));
    }
    if form.from == *to {
        return Err(ApiError::bad_request(
            "transfer between same account not allowed",
        ));
    }

    let (status, envelope) = state
        .wallet
        .transfer(
            &principal.iin,
            &form.from,
            to,
            &form.amount,
            &principal.access_token,
        )
        .await
        .wallet_err("Transfer request failed")?;

    if envelope.ok {
        return Ok(Json(serde_json::json!({ "message": envelope.message })).into_response());
    }
    Err(upstream_rejection(status, envelope))
}

/// A wallet-service 400 is a user error worth relaying; other upstream
/// failures stay opaque.
fn upstream_rejection(status: u16, envelope: WalletEnvelope) -> ApiError {
    if status == StatusCode::BAD_REQUEST.as_u16() {
        ApiError::bad_request(envelope.message)
    } else {
        ApiError::internal("something went wrong, try again later")
    }
}

/// Account numbers are "KZT" followed by ten digits.
fn valid_account(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 13 && s.starts_with("KZT") && bytes[3..].iter().all(u8::is_ascii_digit)
}

/// Amounts are positive integers.
fn valid_amount(s: &str) -> bool {
    s.parse::<i64>().map(|n| n > 0).unwrap_or(false)
}
