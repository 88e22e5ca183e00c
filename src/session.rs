//! Cookie-keyed sessions.
//!
//! Storage sits behind [`SessionStore`], so values can live in memory (the
//! bundled [`MemoryStore`]) or in an external key-value service. The router
//! side is two pieces of middleware installed by
//! [`App::enable_session`](crate::App::enable_session):
//!
//! 1. a root middleware that loads the session named by the cookie, or
//!    issues a fresh id and cookie when the cookie is missing or unknown;
//! 2. a tail middleware that re-issues (or expires) the cookie when the id
//!    changed, and writes changed values back to the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::context::Context;
use crate::response::Cookie;

/// Values held by one session.
pub type SessionValues = HashMap<String, Value>;

/// Persistence for session values, keyed by session id.
///
/// Ids end up in a cookie, so they must be valid cookie values.
pub trait SessionStore: Send + Sync + 'static {
    /// Creates an empty session under a new, unused id.
    fn new_session(&self) -> String;
    fn destroy(&self, id: &str);
    /// Moves the values of `old` under a new id and returns that id.
    fn reset(&self, old: &str) -> String;
    fn has(&self, id: &str) -> bool;
    fn read(&self, id: &str) -> SessionValues;
    /// Merges `changes` into the stored values of `id`.
    fn write(&self, id: &str, changes: SessionValues);
}

/// In-process [`SessionStore`]. Sessions are lost on restart.
///
/// Every request without a known cookie creates a session, unmatched ones
/// included. Built with [`new`](Self::new) the store never forgets one, so
/// long-running servers should use
/// [`with_idle_timeout`](Self::with_idle_timeout).
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, Entry>>,
    idle_timeout: Option<Duration>,
}

struct Entry {
    values: SessionValues,
    touched: Instant,
}

impl Entry {
    fn new(values: SessionValues) -> Self {
        Self { values, touched: Instant::now() }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that drops sessions unused for `timeout`. Expired sessions
    /// are swept whenever a session is created.
    pub fn with_idle_timeout(timeout: Duration) -> Self {
        Self { idle_timeout: Some(timeout), ..Self::default() }
    }

    fn expired(&self, entry: &Entry) -> bool {
        self.idle_timeout
            .is_some_and(|timeout| entry.touched.elapsed() >= timeout)
    }

    fn sweep(&self, sessions: &mut HashMap<String, Entry>) {
        if self.idle_timeout.is_none() {
            return;
        }
        let before = sessions.len();
        sessions.retain(|_, entry| !self.expired(entry));
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept, "expired idle sessions");
        }
    }

    fn fresh_id(sessions: &HashMap<String, Entry>) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            if !sessions.contains_key(&id) {
                return id;
            }
        }
    }
}

impl SessionStore for MemoryStore {
    fn new_session(&self) -> String {
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions);
        let id = Self::fresh_id(&sessions);
        sessions.insert(id.clone(), Entry::new(SessionValues::new()));
        id
    }

    fn destroy(&self, id: &str) {
        self.sessions.lock().remove(id);
    }

    fn reset(&self, old: &str) -> String {
        let mut sessions = self.sessions.lock();
        let values = sessions.remove(old).map(|entry| entry.values).unwrap_or_default();
        let id = Self::fresh_id(&sessions);
        sessions.insert(id.clone(), Entry::new(values));
        id
    }

    fn has(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock();
        let expired = match sessions.get(id) {
            Some(entry) => self.expired(entry),
            None => return false,
        };
        if expired {
            sessions.remove(id);
        }
        !expired
    }

    fn read(&self, id: &str) -> SessionValues {
        match self.sessions.lock().get_mut(id) {
            Some(entry) => {
                entry.touched = Instant::now();
                entry.values.clone()
            }
            None => SessionValues::new(),
        }
    }

    fn write(&self, id: &str, changes: SessionValues) {
        let mut sessions = self.sessions.lock();
        let entry = sessions
            .entry(id.to_owned())
            .or_insert_with(|| Entry::new(SessionValues::new()));
        entry.touched = Instant::now();
        entry.values.extend(changes);
    }
}

/// The session of the current request, reached through
/// [`Context::session`].
pub struct Session {
    store: Arc<dyn SessionStore>,
    id: String,
    id_changed: bool,
    values: SessionValues,
    changed: Vec<String>,
}

impl Session {
    fn new(store: Arc<dyn SessionStore>, id: String, values: SessionValues) -> Self {
        Self { store, id, id_changed: false, values, changed: Vec::new() }
    }

    /// The session id; empty after [`destroy`](Self::destroy).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets a value. It is written back to the store when the response is
    /// finalised.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.values.insert(name.clone(), value.into());
        self.changed.push(name);
    }

    /// Moves the session to a new id and re-issues the cookie.
    pub fn reset(&mut self) {
        self.id = self.store.reset(&self.id);
        self.id_changed = true;
    }

    /// Drops the session from the store and expires the cookie.
    pub fn destroy(&mut self) {
        self.store.destroy(&self.id);
        self.id.clear();
        self.id_changed = true;
    }
}

fn session_cookie(name: &str, id: &str) -> Cookie {
    Cookie { path: Some("/".to_owned()), ..Cookie::new(name, id).http_only() }
}

/// Root middleware body: attach the request's session to the context.
pub(crate) fn load(store: &Arc<dyn SessionStore>, cookie_name: &str, ctx: &mut Context) {
    let known = ctx
        .request
        .cookie(cookie_name)
        .filter(|id| store.has(id))
        .map(str::to_owned);

    let session = match known {
        Some(id) => {
            let values = store.read(&id);
            Session::new(Arc::clone(store), id, values)
        }
        None => {
            let id = store.new_session();
            debug!(session = %id, "issuing new session");
            ctx.response.cookie(&session_cookie(cookie_name, &id));
            Session::new(Arc::clone(store), id, SessionValues::new())
        }
    };
    ctx.session = Some(session);
}

/// Tail middleware body: sync the cookie and the store with the session.
pub(crate) fn save(cookie_name: &str, ctx: &mut Context) {
    let Some(session) = ctx.session.as_mut() else {
        return;
    };

    if session.id_changed {
        let cookie = if session.id.is_empty() {
            Cookie { path: Some("/".to_owned()), ..Cookie::expired(cookie_name) }
        } else {
            session_cookie(cookie_name, &session.id)
        };
        ctx.response.cookie(&cookie);
    }

    if session.id.is_empty() || session.changed.is_empty() {
        return;
    }
    let changes = session
        .changed
        .drain(..)
        .filter_map(|name| {
            let value = session.values.get(&name)?.clone();
            Some((name, value))
        })
        .collect();
    session.store.write(&session.id, changes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryStore::new();
        let id = store.new_session();
        assert!(store.has(&id));
        assert!(store.read(&id).is_empty());

        store.write(&id, SessionValues::from([("a".to_owned(), Value::from(1))]));
        store.write(&id, SessionValues::from([("b".to_owned(), Value::from(2))]));
        assert_eq!(store.read(&id).len(), 2);

        let moved = store.reset(&id);
        assert_ne!(moved, id);
        assert!(!store.has(&id));
        assert_eq!(store.read(&moved)["a"], 1);

        store.destroy(&moved);
        assert!(!store.has(&moved));
    }

    #[test]
    fn idle_sessions_expire() {
        let store = MemoryStore::with_idle_timeout(Duration::ZERO);
        let first = store.new_session();
        assert!(!store.has(&first));

        store.new_session();
        store.new_session();
        assert_eq!(store.sessions.lock().len(), 1);
    }

    #[test]
    fn sessions_without_timeout_are_kept() {
        let store = MemoryStore::new();
        let ids: Vec<_> = (0..3).map(|_| store.new_session()).collect();
        assert!(ids.iter().all(|id| store.has(id)));
        assert_eq!(store.sessions.lock().len(), 3);
    }

    #[test]
    fn ids_are_cookie_safe() {
        let id = MemoryStore::new().new_session();
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
