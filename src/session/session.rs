use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::bag::{AttributeBag, SessionBagDescriptor};
use crate::error::SessionError;

/// Session cookie name used when the surrounding framework configures none.
pub const DEFAULT_COOKIE_NAME: &str = "session";

#[derive(Debug)]
struct SessionState {
    id: Option<Uuid>,
    started: bool,
    cookie_name: String,
    bags: HashMap<String, AttributeBag>,
}

/// Handle to the session of the current request.
///
/// The handle is cheap to clone and travels in request extensions; all
/// clones share the same state. The surrounding framework owns the session
/// lifecycle, this crate only registers bags on it and reads its cookie
/// name.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id: None,
                started: false,
                cookie_name: cookie_name.into(),
                bags: HashMap::new(),
            })),
        }
    }

    /// Whether the session has been started, lazily or explicitly.
    pub async fn is_started(&self) -> bool {
        self.state.lock().await.started
    }

    /// Start the session and assign its id.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        state.started = true;
        if state.id.is_none() {
            state.id = Some(Uuid::new_v4());
        }
    }

    pub async fn id(&self) -> Option<Uuid> {
        self.state.lock().await.id
    }

    pub async fn cookie_name(&self) -> String {
        self.state.lock().await.cookie_name.clone()
    }

    pub async fn set_cookie_name(&self, name: impl Into<String>) {
        self.state.lock().await.cookie_name = name.into();
    }

    /// Register a bag under its public name.
    ///
    /// Registration is only valid on a fresh session; a bag registered
    /// under an existing name replaces the previous one.
    pub async fn register_bag(&self, descriptor: SessionBagDescriptor) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.started {
            return Err(SessionError::AlreadyStarted {
                bag: descriptor.name().to_string(),
            });
        }

        state
            .bags
            .insert(descriptor.name().to_string(), AttributeBag::new(descriptor));
        Ok(())
    }

    pub async fn has_bag(&self, name: &str) -> bool {
        self.state.lock().await.bags.contains_key(name)
    }

    pub async fn bag_names(&self) -> Vec<String> {
        self.state.lock().await.bags.keys().cloned().collect()
    }

    pub async fn bag_storage_keys(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .bags
            .values()
            .map(|bag| bag.storage_key().to_string())
            .collect()
    }

    /// Snapshot of a registered bag.
    pub async fn bag(&self, name: &str) -> Option<AttributeBag> {
        self.state.lock().await.bags.get(name).cloned()
    }

    /// Write an attribute into a registered bag.
    ///
    /// The first write starts the session, matching a framework that
    /// initializes session storage on first use.
    pub async fn put(
        &self,
        bag: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        match state.bags.get_mut(bag) {
            Some(entry) => entry.set(key, value),
            None => {
                return Err(SessionError::UnknownBag {
                    bag: bag.to_string(),
                })
            }
        }

        if !state.started {
            state.started = true;
            if state.id.is_none() {
                state.id = Some(Uuid::new_v4());
            }
        }
        Ok(())
    }

    /// Read an attribute from a registered bag.
    pub async fn get(&self, bag: &str, key: &str) -> Option<Value> {
        self.state
            .lock()
            .await
            .bags
            .get(bag)
            .and_then(|entry| entry.get(key))
            .cloned()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}
