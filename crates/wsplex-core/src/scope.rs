//! Per-connection scope.
//!
//! Built once by the transport (and its middleware) before a consumer runs.
//! Keys are only ever added: every setter refuses to overwrite.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WsPlexError};

const RESERVED_KEYS: [&str; 6] = ["type", "path", "query", "headers", "session", "user"];

/// Server-side session attached by the session middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: Map::new(),
        }
    }
}

/// Identity resolved from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum User {
    Anonymous,
    Authenticated { id: String },
}

impl User {
    pub fn id(&self) -> Option<&str> {
        match self {
            User::Anonymous => None,
            User::Authenticated { id } => Some(id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, User::Authenticated { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    kind: String,
    path: String,
    query: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    session: Option<Session>,
    user: Option<User>,
    extensions: BTreeMap<String, Value>,
}

impl Scope {
    /// Scope for a WebSocket connection.
    ///
    /// `query` holds already-decoded pairs; the transport's extractor does the
    /// percent-decoding. Header names are lowercased.
    pub fn websocket(
        path: impl Into<String>,
        query: impl IntoIterator<Item = (String, String)>,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            kind: "websocket".into(),
            path: path.into(),
            query: query.into_iter().collect(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            session: None,
            user: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// First header value with this (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn set_session(&mut self, session: Session) -> Result<()> {
        if self.session.is_some() {
            return Err(WsPlexError::InvalidArgument("scope already has a session".into()));
        }
        self.session = Some(session);
        Ok(())
    }

    pub fn set_user(&mut self, user: User) -> Result<()> {
        if self.user.is_some() {
            return Err(WsPlexError::InvalidArgument("scope already has a user".into()));
        }
        self.user = Some(user);
        Ok(())
    }

    /// Add an extension key. Reserved and existing keys are rejected.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(WsPlexError::InvalidArgument(format!("scope key {key} is reserved")));
        }
        if self.extensions.contains_key(&key) {
            return Err(WsPlexError::InvalidArgument(format!("scope key {key} already set")));
        }
        self.extensions.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}
