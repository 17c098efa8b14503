//! Signup and login behavior: credential validation, cookie issuance,
//! and the failure status codes.

mod common;

use axum::http::StatusCode;

use common::{
    TEST_IIN, cookie_attributes, cookie_value, post_form, register_user, set_cookies, test_app,
};
use tengegate::jwt::{ACCESS_TOKEN_TTL_SECS, unix_now};

#[tokio::test]
async fn test_login_sets_token_cookies() {
    let t = test_app().await;
    register_user(&t.app, TEST_IIN, "aigerim", "pa$sword").await;

    let response = post_form(&t.app, "/login", "login=aigerim&password=pa$sword", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);

    // The access token decodes to the subject it was issued for.
    let access = cookie_value(&cookies, "access").expect("access cookie");
    let verified = t.codec.verify_access(&access).unwrap();
    assert_eq!(verified.iin, TEST_IIN);
    assert!(!verified.admin);

    let claims = t.codec.peek(&access).unwrap();
    let now = unix_now().unwrap();
    assert!(claims.exp > now && claims.exp <= now + ACCESS_TOKEN_TTL_SECS);

    // The refresh token verifies under the refresh secret.
    let refresh = cookie_value(&cookies, "refresh").expect("refresh cookie");
    assert_eq!(t.codec.verify_refresh(&refresh).unwrap().iin, TEST_IIN);

    // Token cookies are HTTP-only; the IIN echo cookie is not.
    assert!(cookie_attributes(&cookies, "access").unwrap().contains("HttpOnly"));
    assert!(cookie_attributes(&cookies, "refresh").unwrap().contains("HttpOnly"));
    let iin_cookie = cookie_attributes(&cookies, "iin").expect("iin cookie");
    assert!(!iin_cookie.contains("HttpOnly"));
    assert_eq!(cookie_value(&cookies, "iin").as_deref(), Some(TEST_IIN));
}

#[tokio::test]
async fn test_login_records_refresh_token_in_store() {
    let t = test_app().await;
    register_user(&t.app, TEST_IIN, "aigerim", "pa$sword").await;

    let cookies = common::login_user(&t.app, "aigerim", "pa$sword").await;
    let refresh = cookie_value(&cookies, "refresh").unwrap();

    use tengegate::db::RefreshTokenStore;
    let stored = t.db.refresh_tokens().get(TEST_IIN).await.unwrap();
    assert_eq!(stored.as_deref(), Some(refresh.as_str()));
}

#[tokio::test]
async fn test_second_login_supersedes_stored_refresh_token() {
    let t = test_app().await;
    register_user(&t.app, TEST_IIN, "aigerim", "pa$sword").await;

    let first = common::login_user(&t.app, "aigerim", "pa$sword").await;
    let second = common::login_user(&t.app, "aigerim", "pa$sword").await;

    let first_refresh = cookie_value(&first, "refresh").unwrap();
    let second_refresh = cookie_value(&second, "refresh").unwrap();

    use tengegate::db::RefreshTokenStore;
    let stored = t.db.refresh_tokens().get(TEST_IIN).await.unwrap().unwrap();
    assert_eq!(stored, second_refresh);
    assert_ne!(stored, first_refresh);
}

#[tokio::test]
async fn test_login_unknown_user() {
    let t = test_app().await;

    let response = post_form(&t.app, "/login", "login=nobody&password=pa$sword", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let t = test_app().await;
    register_user(&t.app, TEST_IIN, "aigerim", "pa$sword").await;

    let response = post_form(&t.app, "/login", "login=aigerim&password=wrong", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_signup_rejects_malformed_iin() {
    let t = test_app().await;

    for iin in [
        "91081545035",   // too short
        "9108154503501", // too long
        "91081545o350",  // non-digit
        "910815050350",  // unassigned century digit
    ] {
        let form = format!("iin={iin}&login=aigerim&password=pa$sword");
        let response = post_form(&t.app, "/signup", &form, None).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "IIN {iin} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_signup_rejects_weak_or_unprintable_credentials() {
    let t = test_app().await;

    // No special character in the password.
    let response = post_form(
        &t.app,
        "/signup",
        &format!("iin={TEST_IIN}&login=aigerim&password=password1"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-Latin username.
    let response = post_form(
        &t.app,
        "/signup",
        &format!("iin={TEST_IIN}&login=%D0%B6%D0%B0%D0%BD%D0%BD%D0%B0&password=pa$sword"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_duplicate_rejected() {
    let t = test_app().await;
    register_user(&t.app, TEST_IIN, "aigerim", "pa$sword").await;

    // Same username, different IIN.
    let response = post_form(
        &t.app,
        "/signup",
        "iin=020101300123&login=aigerim&password=pa$sword",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Same IIN, different username.
    let response = post_form(
        &t.app,
        "/signup",
        &format!("iin={TEST_IIN}&login=botagoz&password=pa$sword"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_then_login_round_trip() {
    let t = test_app().await;
    register_user(&t.app, "020101300123", "botagoz", "s3cret!").await;

    let cookies = common::login_user(&t.app, "botagoz", "s3cret!").await;
    let access = cookie_value(&cookies, "access").unwrap();
    assert_eq!(t.codec.verify_access(&access).unwrap().iin, "020101300123");
}
