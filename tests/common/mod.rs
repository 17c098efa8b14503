#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use tengegate::db::Database;
use tengegate::iin::BasicIinValidator;
use tengegate::jwt::{JwtCodec, TokenConfig, unix_now};
use tengegate::wallet::{Transaction, Wallet, WalletApi, WalletEnvelope, WalletError};
use tengegate::{ServerConfig, create_app};

pub const ACCESS_SECRET: &str = "access-secret-for-testing";
pub const REFRESH_SECRET: &str = "refresh-secret-for-testing";
pub const TEST_IIN: &str = "910815450350";
pub const TEST_ACCOUNT: &str = "KZT0000000001";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub codec: JwtCodec,
}

pub async fn test_app() -> TestApp {
    test_app_with_wallet(Arc::new(StubWallet::default())).await
}

pub async fn test_app_with_wallet(wallet: Arc<dyn WalletApi>) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let tokens = TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET);
    let codec = JwtCodec::new(&tokens);
    let config = ServerConfig {
        tokens,
        users: Arc::new(db.users()),
        refresh_tokens: Arc::new(db.refresh_tokens()),
        wallet,
        iin_check: Arc::new(BasicIinValidator),
        secure_cookies: false,
    };
    TestApp {
        app: create_app(&config),
        db,
        codec,
    }
}

/// Canned wallet service. `reject` makes top-up/transfer come back with
/// the given upstream status and message.
#[derive(Default)]
pub struct StubWallet {
    pub reject: Option<(u16, &'static str)>,
}

fn mutation_result(reject: &Option<(u16, &'static str)>, ok_message: &str) -> (u16, WalletEnvelope) {
    match reject {
        Some((status, message)) => (
            *status,
            WalletEnvelope {
                ok: false,
                message: (*message).to_string(),
                ..Default::default()
            },
        ),
        None => (
            200,
            WalletEnvelope {
                ok: true,
                message: ok_message.to_string(),
                ..Default::default()
            },
        ),
    }
}

#[async_trait]
impl WalletApi for StubWallet {
    async fn wallets(&self, iin: &str, _token: &str) -> Result<Vec<Wallet>, WalletError> {
        Ok(vec![Wallet {
            id: 1,
            ts: "2024-01-01 00:00:00".to_string(),
            updated_at: "2024-02-01 00:00:00".to_string(),
            account_no: TEST_ACCOUNT.to_string(),
            iin: iin.to_string(),
            amount: 1500,
        }])
    }

    async fn wallet_list(&self, _token: &str) -> Result<Vec<String>, WalletError> {
        Ok(vec![TEST_ACCOUNT.to_string(), "KZT0000000002".to_string()])
    }

    async fn transactions(
        &self,
        _token: &str,
        account: &str,
    ) -> Result<Vec<Transaction>, WalletError> {
        Ok(vec![Transaction {
            id: 7,
            ts: "2024-03-01 10:00:00".to_string(),
            from_account: account.to_string(),
            to_account: "KZT0000000002".to_string(),
            amount: 250,
        }])
    }

    async fn top_up(
        &self,
        _iin: &str,
        _account: &str,
        _amount: &str,
        _token: &str,
    ) -> Result<(u16, WalletEnvelope), WalletError> {
        Ok(mutation_result(&self.reject, "1500"))
    }

    async fn transfer(
        &self,
        _iin: &str,
        _from: &str,
        _to: &str,
        _amount: &str,
        _token: &str,
    ) -> Result<(u16, WalletEnvelope), WalletError> {
        Ok(mutation_result(&self.reject, "transferred"))
    }

    async fn add_wallet(&self, _token: &str) -> Result<String, WalletError> {
        Ok("KZT0000000009".to_string())
    }
}

pub async fn get(app: &Router, path: &str, cookies: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, path: &str, form: &str, cookies: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    app.clone()
        .oneshot(builder.body(Body::from(form.to_string())).unwrap())
        .await
        .unwrap()
}

/// All Set-Cookie header values on a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The value of a named cookie among Set-Cookie headers, if present.
pub fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    cookies.iter().find_map(|cookie| {
        let (pair, _) = cookie.split_once(';')?;
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// The full Set-Cookie attribute string for a named cookie.
pub fn cookie_attributes<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    cookies
        .iter()
        .map(String::as_str)
        .find(|cookie| cookie.starts_with(&format!("{name}=")))
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn register_user(app: &Router, iin: &str, username: &str, password: &str) {
    let form = format!("iin={iin}&login={username}&password={password}");
    let response = post_form(app, "/signup", &form, None).await;
    assert_eq!(response.status(), StatusCode::OK, "signup should succeed");
}

/// Log in and return the Set-Cookie values.
pub async fn login_user(app: &Router, username: &str, password: &str) -> Vec<String> {
    let form = format!("login={username}&password={password}");
    let response = post_form(app, "/login", &form, None).await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    set_cookies(&response)
}

/// Register the default test user and log in; returns the cookies.
pub async fn authenticated_session(app: &Router) -> Vec<String> {
    register_user(app, TEST_IIN, "aigerim", "pa$sword").await;
    login_user(app, "aigerim", "pa$sword").await
}

fn encode_token(secret: &str, claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// A correctly signed access token that expired 50 seconds ago.
pub fn expired_access_token(iin: &str, username: &str) -> String {
    encode_token(
        ACCESS_SECRET,
        serde_json::json!({
            "iin": iin,
            "username": username,
            "createdAt": "2024-01-01 00:00:00",
            "admin": false,
            "exp": unix_now().unwrap() - 50,
        }),
    )
}

/// A correctly signed refresh token that expired 50 seconds ago.
pub fn expired_refresh_token(iin: &str, username: &str) -> String {
    encode_token(
        REFRESH_SECRET,
        serde_json::json!({
            "iin": iin,
            "username": username,
            "createdAt": "2024-01-01 00:00:00",
            "admin": false,
            "exp": unix_now().unwrap() - 50,
        }),
    )
}

/// A valid-until-later access token signed with the wrong secret.
pub fn stale_secret_access_token(iin: &str, username: &str) -> String {
    encode_token(
        "rotated-stale-secret",
        serde_json::json!({
            "iin": iin,
            "username": username,
            "createdAt": "2024-01-01 00:00:00",
            "admin": false,
            "exp": unix_now().unwrap() + 60,
        }),
    )
}

/// A correctly signed access token missing one required claim.
pub fn access_token_missing_claim(iin: &str, missing: &str) -> String {
    let mut claims = serde_json::json!({
        "iin": iin,
        "username": "aigerim",
        "createdAt": "2024-01-01 00:00:00",
        "admin": false,
        "exp": unix_now().unwrap() + 60,
    });
    claims.as_object_mut().unwrap().remove(missing);
    encode_token(ACCESS_SECRET, claims)
}
