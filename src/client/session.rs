use crate::api::schemas::auth::UserSummary;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// In-memory authentication state. Never persisted; the refresh token lives
/// only in the HTTP client's cookie jar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<UserSummary>,
}

impl Session {
    /// State at construction, before `init()` has settled.
    #[must_use]
    pub fn loading() -> Self {
        Self { is_loading: true, ..Self::default() }
    }
}

/// Shared handle to the [`Session`].
///
/// Readers take snapshots or subscribe to changes; only the auth flows and the
/// refresh interceptor inside this crate can write.
///
/// Every write bumps a generation counter under the channel's write lock, so a
/// long-running flow can apply its result only if nothing else happened meanwhile.
#[derive(Clone, Debug)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
    generation: Arc<AtomicU64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::loading());
        Self { tx: Arc::new(tx), generation: Arc::new(AtomicU64::new(0)) }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().access_token.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated
    }

    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        self.tx.borrow().user.clone()
    }

    /// Receiver that observes every session transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn authenticate(&self, access_token: String, user: UserSummary) {
        self.replace(authenticated(access_token, user));
    }

    pub(crate) fn clear(&self) {
        self.replace(Session::default());
    }

    /// Like [`Self::authenticate`], unless the session changed since `generation`.
    pub(crate) fn authenticate_if(&self, generation: u64, access_token: String, user: UserSummary) -> bool {
        self.replace_if(generation, authenticated(access_token, user))
    }

    /// Like [`Self::clear`], unless the session changed since `generation`.
    pub(crate) fn clear_if(&self, generation: u64) -> bool {
        self.replace_if(generation, Session::default())
    }

    fn replace(&self, next: Session) {
        self.tx.send_modify(|session| {
            *session = next;
            self.generation.fetch_add(1, Ordering::SeqCst);
        });
    }

    fn replace_if(&self, generation: u64, next: Session) -> bool {
        self.tx.send_if_modified(|session| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *session = next;
            self.generation.fetch_add(1, Ordering::SeqCst);
            true
        })
    }
}

fn authenticated(access_token: String, user: UserSummary) -> Session {
    Session { access_token: Some(access_token), is_authenticated: true, is_loading: false, user: Some(user) }
}
