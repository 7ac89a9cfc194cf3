//! End-to-end credential lifecycle: authorize (store), go stale, refresh
//! on demand, upload a batch, log out — all against an on-disk store and
//! in-process fakes for the two remote seams.

use posterflow::auth::{
    AuthError, AuthorizationServer, CodeGrant, Credentials, RefreshedToken, TokenStatus,
    UserProfile, resolve_credentials,
};
use posterflow::store::{CredentialStore, Identity};
use posterflow::upload::{DriveUploader, TransportError, UploadRequest, UploadTransport};
use std::sync::Mutex;

/// Scripted authorization server: a fixed verdict and a call log.
struct ScriptedServer {
    verdict: TokenStatus,
    refreshed: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedServer {
    fn new(verdict: TokenStatus, refreshed: Option<&str>) -> Self {
        Self {
            verdict,
            refreshed: refreshed.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AuthorizationServer for ScriptedServer {
    fn token_status(&self, _access_token: &str) -> Result<TokenStatus, AuthError> {
        self.calls.lock().unwrap().push("status".to_string());
        Ok(self.verdict)
    }

    fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken, AuthError> {
        self.calls.lock().unwrap().push("refresh".to_string());
        match &self.refreshed {
            Some(token) => Ok(RefreshedToken {
                access_token: token.clone(),
            }),
            None => Err(AuthError::RefreshFailed("invalid_grant".to_string())),
        }
    }

    fn exchange_code(&self, _code: &str) -> Result<CodeGrant, AuthError> {
        unreachable!("code exchange is not part of this flow")
    }

    fn user_profile(&self, _access_token: &str) -> Result<UserProfile, AuthError> {
        unreachable!("profile fetch is not part of this flow")
    }
}

/// Transport that records the token each request was sent with.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
}

impl UploadTransport for RecordingTransport {
    fn send(&self, request: &UploadRequest, access_token: &str) -> Result<String, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((request.name.clone(), access_token.to_string()));
        Ok(format!("id-{}", request.name))
    }
}

fn open_store(dir: &tempfile::TempDir) -> CredentialStore {
    CredentialStore::open(&dir.path().join("users.db")).unwrap()
}

#[test]
fn stale_token_is_refreshed_once_and_survives_reopen() {
    let tmp = tempfile::TempDir::new().unwrap();
    let identity = Identity::from("ada@example.com");
    {
        let store = open_store(&tmp);
        store
            .upsert(&identity, "tok-stale", Some("refresh-1"), Some("Ada"), None)
            .unwrap();

        let server = ScriptedServer::new(TokenStatus::Expired, Some("tok-fresh"));
        let credentials = resolve_credentials(&store, &server, &identity).unwrap();
        assert_eq!(credentials.access_token, "tok-fresh");
        assert_eq!(server.calls(), vec!["status", "refresh"]);
    }

    // The refreshed token is on disk, not just in the resolved value
    let store = open_store(&tmp);
    let record = store.get(&identity).unwrap().unwrap();
    assert_eq!(record.access_token, "tok-fresh");
    assert_eq!(record.refresh_token.as_deref(), Some("refresh-1"));
}

#[test]
fn upload_batch_uses_the_refreshed_token_for_every_item() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp);
    let identity = Identity::from("ada@example.com");
    store
        .upsert(&identity, "tok-stale", Some("refresh-1"), None, None)
        .unwrap();

    let server = ScriptedServer::new(TokenStatus::Expired, Some("tok-fresh"));
    let transport = RecordingTransport::default();
    let uploader = DriveUploader::new(&store, &server, &transport, "folder-1");

    let items = vec![
        ("a.jpg".to_string(), b"a".to_vec()),
        ("b.jpg".to_string(), b"b".to_vec()),
    ];
    let report = uploader.upload_batch(&identity, &items);
    assert_eq!(report.succeeded(), 2);

    let sent = transport.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    for (_, token) in &sent {
        assert_eq!(token, "tok-fresh");
    }
}

#[test]
fn rejected_refresh_requires_reauthentication() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp);
    let identity = Identity::from("ada@example.com");
    store
        .upsert(&identity, "tok-stale", Some("refresh-dead"), None, None)
        .unwrap();

    let server = ScriptedServer::new(TokenStatus::Expired, None);
    let result = resolve_credentials(&store, &server, &identity);
    let err = result.unwrap_err();
    assert!(matches!(err, AuthError::RefreshFailed(_)));
    // The message tells the user what to do next
    assert!(err.to_string().contains("re-authenticate"));
}

#[test]
fn logout_then_resolve_fails_cleanly() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp);
    let identity = Identity::from("ada@example.com");
    store
        .upsert(&identity, "tok-1", Some("refresh-1"), None, None)
        .unwrap();
    store.delete(&identity).unwrap();

    let server = ScriptedServer::new(TokenStatus::Valid, None);
    let result: Result<Credentials, _> = resolve_credentials(&store, &server, &identity);
    assert!(matches!(result, Err(AuthError::NoCredentials(_))));
    assert_eq!(store.current_identity().unwrap(), None);
}
