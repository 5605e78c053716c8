use common::{EMAIL, PASSWORD, RefreshMode, StubServer};
use reqwest::StatusCode;
use std::sync::atomic::Ordering;
use std::time::Duration;
use stockroom::api::schemas::auth::Credentials;

mod common;

fn credentials() -> Credentials {
    Credentials::new(EMAIL, PASSWORD)
}

#[tokio::test]
async fn test_stale_token_refreshes_once_and_retries_once() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();

    let page = client.products().list(None, None).await.expect("request should succeed after refresh");

    assert_eq!(page.page, 1);
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(stub.state.protected_calls(), 2, "original attempt plus exactly one retry");
    assert_eq!(client.session().access_token().as_deref(), Some("fresh-1"));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_valid_token_does_not_refresh() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    let me = client.auth().me().await.unwrap();

    assert_eq!(me.id, 1);
    assert_eq!(stub.state.refresh_calls(), 0);
    assert_eq!(stub.state.protected_calls(), 1);
}

#[tokio::test]
async fn test_second_401_is_not_retried_again() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.reject_all.store(true, Ordering::SeqCst);

    let err = client.products().list(None, None).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(stub.state.protected_calls(), 2, "no third attempt");
}

#[tokio::test]
async fn test_unreachable_refresh_clears_session_without_logout() {
    let stub = StubServer::spawn().await;
    let client = stub.client_with_timeout(Duration::from_millis(500));
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Hang);

    let err = client.products().list(None, None).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED), "the original 401 propagates");
    let session = client.session().snapshot();
    assert_eq!(session.user, None);
    assert_eq!(session.access_token, None);
    assert!(!session.is_authenticated);
    assert_eq!(stub.state.logout_calls(), 0);
}

#[tokio::test]
async fn test_rejected_refresh_logs_out() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);

    let err = client.products().list(None, None).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(stub.state.logout_calls(), 1);
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().access_token(), None);
}

#[tokio::test]
async fn test_rejected_refresh_clears_session_even_if_logout_fails() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);
    stub.state.fail_logout.store(true, Ordering::SeqCst);

    let err = client.products().list(None, None).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(stub.state.logout_calls(), 1);
    assert_eq!(client.session().snapshot().user, None);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_server_error_on_refresh_logs_out() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::ServerError);

    let err = client.auth().me().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(stub.state.logout_calls(), 1);
    assert!(!client.session().is_authenticated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_share_one_refresh() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_delay(Duration::from_millis(200));

    let calls = (0..8).map(|_| {
        let client = client.clone();
        async move { client.products().list(None, None).await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok), "every request succeeds: {results:?}");
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(client.session().access_token().as_deref(), Some("fresh-1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_share_one_failure() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);
    stub.state.set_refresh_delay(Duration::from_millis(200));

    let calls = (0..4).map(|_| {
        let client = client.clone();
        async move { client.auth().me().await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.as_ref().is_err_and(stockroom::client::ClientError::is_unauthorized)));
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(stub.state.logout_calls(), 1);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_non_401_errors_pass_through() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    let err = client.products().get(999).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.user_message(), "Not found");
    assert_eq!(stub.state.refresh_calls(), 0);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_refreshed_cookie_is_rotated_and_reused() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    client.products().list(None, None).await.unwrap();
    stub.state.expire_access_tokens();
    client.products().list(None, None).await.unwrap();

    assert_eq!(stub.state.refresh_calls(), 2);
    assert_eq!(client.session().access_token().as_deref(), Some("fresh-2"));
}

#[tokio::test]
async fn test_rejected_refresh_keeps_server_message() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);

    let err = client.products().list(None, None).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Unauthorized", "only the login form talks about credentials");
}

#[tokio::test]
async fn test_login_during_failing_refresh_survives() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);
    stub.state.set_refresh_delay(Duration::from_millis(300));

    let background = {
        let client = client.clone();
        tokio::spawn(async move { client.products().list(None, None).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.auth().login(&credentials()).await.unwrap();

    let page = background.await.unwrap().expect("retried with the token from the new login");

    assert_eq!(page.page, 1);
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(stub.state.logout_calls(), 0, "the stale refresh must not log the new session out");
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().access_token().as_deref(), Some("t1"));
}

#[tokio::test]
async fn test_request_joining_startup_refresh_gets_logout_on_failure() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);
    stub.state.set_refresh_delay(Duration::from_millis(300));

    let (session, me) = tokio::join!(client.auth().init(), client.auth().me());

    assert!(!session.is_authenticated);
    assert!(me.unwrap_err().is_unauthorized());
    assert_eq!(stub.state.refresh_calls(), 1, "the 401 joined the startup refresh");
    assert_eq!(stub.state.logout_calls(), 1);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_late_401_after_failed_refresh_does_not_refresh_again() {
    let stub = StubServer::spawn().await;
    let client = stub.client();
    client.auth().login(&credentials()).await.unwrap();

    stub.state.expire_access_tokens();
    stub.state.set_refresh_mode(RefreshMode::Reject);
    stub.state.set_me_delay(Duration::from_millis(300));

    let (list, me) = tokio::join!(client.products().list(None, None), client.auth().me());

    assert!(list.unwrap_err().is_unauthorized());
    assert!(me.unwrap_err().is_unauthorized());
    assert_eq!(stub.state.refresh_calls(), 1);
    assert_eq!(stub.state.logout_calls(), 1);
    assert!(!client.session().is_authenticated());
}
