use crate::message::UserId;
use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

/// A live bidirectional channel to one client. The transport actor owns the
/// receiving half; everything here holds cloneable sending handles. Dropping
/// the last clone closes the channel, which the transport observes as a
/// disconnect.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: UnboundedSender<Message>,
}

impl ConnectionHandle {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queues a raw frame for the writer task. Returns false when the
    /// connection is already gone; callers treat that as a missed
    /// best-effort delivery, not an error.
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }

    /// Asks the peer to close by queueing a Close frame. Used when a newer
    /// authentication supersedes this connection.
    pub fn close(&self) {
        let _ = self.sender.send(Message::Close(None));
    }
}

#[derive(Default)]
struct RegistryInner {
    by_user: HashMap<UserId, ConnectionHandle>,
    by_connection: HashMap<ConnectionId, UserId>,
}

/// Bidirectional mapping between user identity and live connection.
///
/// At most one live connection per user: a later `register` for the same
/// user overwrites the earlier mapping and returns the displaced handle so
/// the caller can decide what to do with it. Both directions are updated
/// under one lock, so no caller ever observes a torn mapping.
///
/// Entries appear only on explicit authentication and disappear only on
/// disconnect; an unauthenticated connection is simply absent here.
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Binds `user_id` to `handle` in both directions. Returns the handle
    /// this registration displaced: a previous connection of the same user,
    /// unless it is this very connection re-authenticating.
    pub fn register(&self, user_id: UserId, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let mut inner = self.inner.lock().expect("connection registry lock poisoned");

        // A connection may re-authenticate as a different user; its old
        // forward mapping must not linger.
        if let Some(previous_user) = inner.by_connection.get(handle.id()).copied() {
            if previous_user != user_id {
                inner.by_user.remove(&previous_user);
            }
        }

        let displaced = inner.by_user.insert(user_id, handle.clone());
        if let Some(previous) = &displaced {
            inner.by_connection.remove(previous.id());
        }
        inner.by_connection.insert(handle.id().clone(), user_id);

        displaced.filter(|previous| previous.id() != handle.id())
    }

    /// Removes the mapping for this connection in both directions. A no-op
    /// for unknown connections: disconnects of never-authenticated sockets
    /// land here too.
    pub fn unregister_by_connection(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let mut inner = self.inner.lock().expect("connection registry lock poisoned");

        let user_id = inner.by_connection.remove(connection_id)?;

        // Only drop the forward mapping while it still points at this
        // connection; a newer registration may already own it.
        let still_current = inner
            .by_user
            .get(&user_id)
            .map(|handle| handle.id() == connection_id)
            .unwrap_or(false);
        if still_current {
            inner.by_user.remove(&user_id);
        }

        Some(user_id)
    }

    /// The live connection for a user, if any. Absence means "deliver
    /// nothing", never an error.
    pub fn connection_for_user(&self, user_id: UserId) -> Option<ConnectionHandle> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_user.get(&user_id).cloned()
    }

    /// The user a connection authenticated as, if it has.
    pub fn user_for_connection(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_connection.get(connection_id).copied()
    }

    pub fn count(&self) -> usize {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_user.len()
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_user.keys().copied().collect()
    }

    pub fn connections(&self) -> Vec<ConnectionHandle> {
        let inner = self.inner.lock().expect("connection registry lock poisoned");
        inner.by_user.values().cloned().collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
