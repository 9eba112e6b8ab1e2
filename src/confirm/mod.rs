//! Confirmation gate for dangerous operations.
//!
//! A dangerous call suspends as a pending entry keyed by confirmation id.
//! The waiting side holds a oneshot receiver raced against the expiry
//! timer; the signal side resumes it through `resolve`. No lock is held
//! across either wait. One Awaiting entry per origin: a newer dangerous
//! request from the same origin supersedes the old one so a stale approval
//! can never fire against the wrong call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::resolver::{CallRequest, OriginId};

pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// External confirmation signal. Anything that is not a recognized
/// affirmative is treated as a denial by the boundary before it gets here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Affirm,
    Deny,
}

impl Signal {
    /// Interpret a raw reply or reaction. Only recognized affirmative
    /// tokens count as Affirm; everything else is Deny.
    pub fn from_text(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "yes" | "y" | "confirm" | "approve" | "ok" | "✅" => Signal::Affirm,
            _ => Signal::Deny,
        }
    }
}

/// Terminal state of one pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Approved,
    Rejected,
    Expired,
    Superseded,
}

/// The prompt-facing view of a pending confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationRequest {
    pub id: String,
    pub origin: OriginId,
    pub action: String,
    pub summary: String,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Debug)]
struct PendingEntry {
    request: ConfirmationRequest,
    /// Expiry anchor, fixed when the entry is registered. `wait` measures
    /// its timeout against this, so the reported `expires_at` and the real
    /// deadline cannot drift apart.
    deadline: Instant,
    responder: oneshot::Sender<ConfirmationOutcome>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    #[error("confirmation not found: {0}")]
    NotFound(String),
    #[error("confirmation already expired: {0}")]
    Expired(String),
}

pub struct ConfirmationGate {
    pending: Mutex<HashMap<String, PendingEntry>>,
    timeout: Duration,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_TIMEOUT)
    }
}

impl ConfirmationGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a pending confirmation for a dangerous call.
    ///
    /// Atomic with respect to concurrent signals: any still-open entry for
    /// the same origin is superseded (its waiter resumes with `Superseded`)
    /// before the new entry becomes signalable.
    pub fn begin(&self, call: &CallRequest) -> (ConfirmationRequest, oneshot::Receiver<ConfirmationOutcome>) {
        let now = Utc::now();
        let request = ConfirmationRequest {
            id: Uuid::new_v4().to_string(),
            origin: call.origin,
            action: call.spec.name.to_string(),
            summary: describe_call(call),
            created_at: now.to_rfc3339(),
            expires_at: (now + chrono::Duration::from_std(self.timeout).unwrap_or_default())
                .to_rfc3339(),
        };

        let (tx, rx) = oneshot::channel();
        let mut guard = self.pending.lock().expect("confirmation gate mutex poisoned");

        let superseded: Vec<String> = guard
            .iter()
            .filter(|(_, entry)| entry.request.origin == call.origin)
            .map(|(id, _)| id.clone())
            .collect();
        for id in superseded {
            if let Some(entry) = guard.remove(&id) {
                tracing::info!(
                    confirmation = %id,
                    origin = %call.origin,
                    "superseding stale confirmation"
                );
                let _ = entry.responder.send(ConfirmationOutcome::Superseded);
            }
        }

        guard.insert(
            request.id.clone(),
            PendingEntry {
                request: request.clone(),
                deadline: Instant::now() + self.timeout,
                responder: tx,
            },
        );
        (request, rx)
    }

    /// Apply an external signal to a pending confirmation. Unknown or stale
    /// ids (already resolved, superseded, or expired) are a no-op error.
    pub fn resolve(
        &self,
        confirmation_id: &str,
        signal: Signal,
    ) -> Result<ConfirmationRequest, ConfirmError> {
        let entry = {
            let mut guard = self.pending.lock().expect("confirmation gate mutex poisoned");
            guard
                .remove(confirmation_id)
                .ok_or_else(|| ConfirmError::NotFound(confirmation_id.to_string()))?
        };

        let outcome = match signal {
            Signal::Affirm => ConfirmationOutcome::Approved,
            Signal::Deny => ConfirmationOutcome::Rejected,
        };
        if entry.responder.send(outcome).is_err() {
            // Waiter already timed out; the signal lost the race.
            return Err(ConfirmError::Expired(confirmation_id.to_string()));
        }
        Ok(entry.request)
    }

    /// Suspend until the confirmation is signalled or its deadline passes.
    /// The deadline was fixed in `begin`, so time spent between the two
    /// calls counts against the confirmation window.
    pub async fn wait(
        &self,
        confirmation_id: &str,
        rx: oneshot::Receiver<ConfirmationOutcome>,
    ) -> ConfirmationOutcome {
        let remaining = {
            let guard = self.pending.lock().expect("confirmation gate mutex poisoned");
            guard
                .get(confirmation_id)
                .map(|entry| entry.deadline.saturating_duration_since(Instant::now()))
        };
        let Some(remaining) = remaining else {
            // Already resolved or superseded; the channel holds the outcome.
            return match rx.await {
                Ok(outcome) => outcome,
                Err(_) => ConfirmationOutcome::Rejected,
            };
        };

        match tokio::time::timeout(remaining, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Gate dropped while waiting; treat as a denial.
            Ok(Err(_)) => ConfirmationOutcome::Rejected,
            Err(_) => {
                self.remove(confirmation_id);
                tracing::info!(confirmation = %confirmation_id, "confirmation expired");
                ConfirmationOutcome::Expired
            }
        }
    }

    /// Pending confirmations, oldest first, optionally for one origin.
    pub fn list_pending(&self, origin: Option<OriginId>) -> Vec<ConfirmationRequest> {
        let guard = self.pending.lock().expect("confirmation gate mutex poisoned");
        let mut values: Vec<ConfirmationRequest> = guard
            .values()
            .map(|entry| entry.request.clone())
            .filter(|entry| origin.map_or(true, |o| entry.origin == o))
            .collect();
        values.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        values
    }

    fn remove(&self, confirmation_id: &str) {
        let mut guard = self.pending.lock().expect("confirmation gate mutex poisoned");
        guard.remove(confirmation_id);
    }
}

/// Human-readable one-liner shown in the confirmation prompt.
pub fn describe_call(call: &CallRequest) -> String {
    if call.arguments.is_empty() {
        return call.spec.name.to_string();
    }
    let args = call
        .arguments
        .0
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ({args})", call.spec.name)
}
