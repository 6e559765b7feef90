//! One-shot reply channel for the remote read workaround
//!
//! The remote's read path cannot be consumed as an ordinary response
//! body; replies are delivered out-of-band against a caller-supplied
//! token. [`CallbackRegistry`] is the "subscribe once, deliver once,
//! timeout-bounded" primitive behind that: every subscription gets a
//! fresh token, and its registry entry is removed exactly once —
//! whether the reply arrives, the transport errors out, or the wait
//! times out.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

type Pending = Arc<DashMap<String, oneshot::Sender<serde_json::Value>>>;

/// Registry of in-flight read callbacks, keyed by one-time token
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    pending: Pending,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh one-time callback and hand back its subscription
    pub fn subscribe(&self) -> Subscription {
        let token = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(token.clone(), tx);
        Subscription {
            token,
            pending: Arc::clone(&self.pending),
            rx,
        }
    }

    /// Deliver a reply to the subscription holding `token`.
    ///
    /// Returns `false` when the token is unknown — already delivered,
    /// failed, or timed out.
    pub fn deliver(&self, token: &str, value: serde_json::Value) -> bool {
        match self.pending.remove(token) {
            Some((_, tx)) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Abort the subscription holding `token` without a reply; its
    /// waiter resolves immediately instead of running out the clock
    pub fn fail(&self, token: &str) -> bool {
        self.pending.remove(token).is_some()
    }

    /// Number of callbacks currently awaiting delivery
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

/// A single pending read reply.
///
/// Dropping the subscription deregisters it; [`Subscription::wait`]
/// consumes it, so cleanup happens exactly once on every path.
pub struct Subscription {
    token: String,
    pending: Pending,
    rx: oneshot::Receiver<serde_json::Value>,
}

impl Subscription {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Wait for the reply, bounded by `timeout`.
    ///
    /// Resolves `None` on timeout or when the subscription was failed;
    /// it never leaves the caller permanently pending.
    pub async fn wait(mut self, timeout: Duration) -> Option<serde_json::Value> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(_)) => None,
            Err(_) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pending.remove(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let registry = CallbackRegistry::new();
        let a = registry.subscribe();
        let b = registry.subscribe();
        assert_ne!(a.token(), b.token());
        assert_eq!(registry.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_deliver_resolves_waiter() {
        let registry = CallbackRegistry::new();
        let sub = registry.subscribe();
        let token = sub.token().to_string();

        assert!(registry.deliver(&token, serde_json::json!({"success": true})));
        let value = sub.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(value["success"], true);

        // Token is gone after delivery
        assert_eq!(registry.in_flight(), 0);
        assert!(!registry.deliver(&token, serde_json::Value::Null));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_resolves_and_deregisters() {
        let registry = CallbackRegistry::new();
        let sub = registry.subscribe();
        let token = sub.token().to_string();

        let result = sub.wait(Duration::from_secs(10)).await;
        assert!(result.is_none());
        assert_eq!(registry.in_flight(), 0);

        // Late delivery finds nothing
        assert!(!registry.deliver(&token, serde_json::Value::Null));
    }

    #[tokio::test]
    async fn test_fail_resolves_waiter_early() {
        let registry = CallbackRegistry::new();
        let sub = registry.subscribe();
        let token = sub.token().to_string();

        assert!(registry.fail(&token));
        // A generous bound: the failed waiter must resolve well before it
        let result = sub.wait(Duration::from_secs(60)).await;
        assert!(result.is_none());
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_drop_deregisters() {
        let registry = CallbackRegistry::new();
        {
            let _sub = registry.subscribe();
            assert_eq!(registry.in_flight(), 1);
        }
        assert_eq!(registry.in_flight(), 0);
    }
}
