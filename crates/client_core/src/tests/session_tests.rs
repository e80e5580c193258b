use super::*;
use crate::{
    navigation::NavigationShell,
    test_support::{admin_user, spawn_mock_backend, MockBackend, RecordingNavigator, SESSION_COOKIE},
};

async fn store_against(backend: &MockBackend) -> (SessionStore, Arc<RecordingNavigator>) {
    let base_url = spawn_mock_backend(backend.clone()).await;
    let navigator = Arc::new(RecordingNavigator::default());
    let transport = HttpTransport::new(&base_url).expect("transport");
    (SessionStore::new(transport, navigator.clone()), navigator)
}

#[tokio::test]
async fn login_sets_session_and_cookie_rides_along_on_later_calls() {
    let backend = MockBackend::default();
    let (mut store, _) = store_against(&backend).await;

    let user = store.login("admin", "secret").await.expect("login");
    assert_eq!(user, admin_user());
    assert!(store.is_authenticated());

    let checked = store.check_session().await.expect("check");
    assert_eq!(checked, Some(admin_user()));

    let data = backend.data.lock().await;
    assert_eq!(data.me_cookies.len(), 1);
    let cookie = data.me_cookies[0].as_deref().expect("cookie header");
    assert!(cookie.contains(SESSION_COOKIE));
}

#[tokio::test]
async fn failed_login_is_auth_failure_and_keeps_previous_state() {
    let backend = MockBackend::default();
    let (mut store, _) = store_against(&backend).await;

    let err = store.login("admin", "nope").await.expect_err("must fail");
    assert!(matches!(err, ClientError::AuthFailure));
    assert!(store.user().is_none());

    store.login("admin", "secret").await.expect("login");
    let err = store.login("admin", "nope").await.expect_err("must fail");
    assert!(matches!(err, ClientError::AuthFailure));
    assert_eq!(store.user(), Some(&admin_user()));
}

#[tokio::test]
async fn check_session_without_cookie_resolves_to_no_session() {
    let backend = MockBackend::default();
    let (mut store, _) = store_against(&backend).await;

    assert_eq!(store.check_session().await.expect("check"), None);
    assert!(!store.is_authenticated());
    assert!(matches!(store.require_user(), Err(ClientError::SessionAbsent)));
}

#[tokio::test]
async fn check_session_against_unreachable_server_is_not_an_error() {
    let navigator = Arc::new(RecordingNavigator::default());
    // Port 9 (discard) on loopback is expected to refuse connections.
    let transport = HttpTransport::new("http://127.0.0.1:9").expect("transport");
    let mut store = SessionStore::new(transport, navigator);

    assert_eq!(store.check_session().await.expect("check"), None);
}

#[tokio::test]
async fn logout_clears_session_then_redirects_to_login() {
    let backend = MockBackend::default();
    let (mut store, navigator) = store_against(&backend).await;
    store.login("admin", "secret").await.expect("login");

    store.logout().await;

    assert!(!store.is_authenticated());
    assert_eq!(*navigator.redirects.lock().unwrap(), vec![Route::Login]);
    assert_eq!(backend.data.lock().await.logout_calls, 1);

    // Server expired the cookie, so the session is gone remotely too.
    assert_eq!(store.check_session().await.expect("check"), None);
}

#[tokio::test]
async fn logout_still_signs_out_locally_when_server_fails() {
    let backend = MockBackend::default();
    backend.data.lock().await.fail_logout = true;
    let (mut store, navigator) = store_against(&backend).await;
    store.login("admin", "secret").await.expect("login");

    store.logout().await;

    assert!(store.user().is_none());
    assert_eq!(*navigator.redirects.lock().unwrap(), vec![Route::Login]);
}

#[tokio::test]
async fn logout_redirect_lands_navigation_shell_on_login() {
    let backend = MockBackend::default();
    let base_url = spawn_mock_backend(backend.clone()).await;
    let shell = Arc::new(NavigationShell::new());
    let transport = HttpTransport::new(&base_url).expect("transport");
    let mut store = SessionStore::new(transport, shell.clone());

    store.login("admin", "secret").await.expect("login");
    assert_eq!(shell.navigate("/people", &store), Route::People);

    store.logout().await;
    assert_eq!(shell.current(), Route::Login);
    assert_eq!(shell.navigate("/people", &store), Route::Login);
}

#[tokio::test]
async fn clear_drops_identity_without_network() {
    let navigator = Arc::new(RecordingNavigator::default());
    let transport = HttpTransport::new("http://127.0.0.1:9").expect("transport");
    let mut store = SessionStore::new(transport, navigator.clone());
    store.user = Some(admin_user());

    store.clear();

    assert!(!store.is_authenticated());
    assert!(navigator.redirects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_session_check_denies_dashboard() {
    let backend = MockBackend::default();
    let (mut store, _) = store_against(&backend).await;
    store.user = Some(admin_user());

    assert_eq!(store.check_session().await.expect("check"), None);

    let shell = NavigationShell::new();
    assert_eq!(shell.navigate("/dashboard", &store), Route::Login);
}
