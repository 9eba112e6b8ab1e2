//! Test doubles and helpers shared across integration tests.

mod providers;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::catalog::ValidatedArguments;
use crate::confirm::{ConfirmationGate, ConfirmationRequest};
use crate::model::{
    GenerateRequest, ModelBackend, ModelError, ModelResponse, ProviderGateway, ProviderId,
    StructuredCall,
};
use crate::orchestrator::{
    ActionExecutor, ExecutionError, ExecutionResult, Notifier, Orchestrator, Outcome,
};
use crate::resolver::OriginId;

pub fn origin(user_id: u64) -> OriginId {
    OriginId {
        guild_id: 100,
        channel_id: 200,
        user_id,
    }
}

/// One scripted backend response.
#[derive(Debug, Clone)]
pub enum Script {
    Text(&'static str),
    Call(&'static str, serde_json::Value),
    Transient,
    RateLimited(Option<Duration>),
    AuthFailure,
}

/// Backend that replays a scripted sequence and counts invocations.
pub struct ScriptedBackend {
    id: ProviderId,
    script: Mutex<VecDeque<Script>>,
    invocations: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(id: ProviderId, script: Vec<Script>) -> (Box<Self>, Arc<AtomicUsize>) {
        let invocations = Arc::new(AtomicUsize::new(0));
        let backend = Box::new(Self {
            id,
            script: Mutex::new(script.into()),
            invocations: invocations.clone(),
        });
        (backend, invocations)
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model_id(&self) -> String {
        format!("scripted-{}", self.id)
    }

    async fn invoke(&self, _req: &GenerateRequest) -> Result<ModelResponse, ModelError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Transient);
        match step {
            Script::Text(text) => Ok(ModelResponse {
                content: text.to_string(),
                call: None,
            }),
            Script::Call(name, args) => Ok(ModelResponse {
                content: String::new(),
                call: Some(StructuredCall {
                    name: name.to_string(),
                    arguments: args.as_object().cloned().unwrap_or_default(),
                }),
            }),
            Script::Transient => Err(ModelError::Network("connection reset".to_string())),
            Script::RateLimited(retry_after) => Err(ModelError::RateLimited { retry_after }),
            Script::AuthFailure => Err(ModelError::Auth("bad key".to_string())),
        }
    }
}

/// Executor that records every call and replays scripted failures.
#[derive(Default)]
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<(String, ValidatedArguments)>>,
    failures: Mutex<VecDeque<ExecutionError>>,
}

impl RecordingExecutor {
    pub fn failing_with(failures: Vec<ExecutionError>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(failures.into()),
        }
    }

    pub fn executed_actions(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(
        &self,
        _origin: OriginId,
        action: &str,
        arguments: &ValidatedArguments,
    ) -> Result<ExecutionResult, ExecutionError> {
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }
        self.calls
            .lock()
            .unwrap()
            .push((action.to_string(), arguments.clone()));
        Ok(ExecutionResult {
            message: format!("{action} done"),
            data: serde_json::json!({ "action": action }),
        })
    }
}

/// Notifier that records prompts and forwards async outcomes to the test.
pub struct ChannelNotifier {
    pub prompts: Mutex<Vec<ConfirmationRequest>>,
    outcomes: mpsc::UnboundedSender<(OriginId, Outcome)>,
}

impl ChannelNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(OriginId, Outcome)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                outcomes: tx,
            }),
            rx,
        )
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn confirmation_prompt(&self, request: &ConfirmationRequest) {
        self.prompts.lock().unwrap().push(request.clone());
    }

    async fn outcome(&self, origin: OriginId, outcome: &Outcome) {
        let _ = self.outcomes.send((origin, outcome.clone()));
    }
}

/// Everything a test needs to drive the orchestrator.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub executor: Arc<RecordingExecutor>,
    pub notifier: Arc<ChannelNotifier>,
    pub outcomes: mpsc::UnboundedReceiver<(OriginId, Outcome)>,
}

pub fn harness(backends: Vec<Box<dyn ModelBackend>>) -> Harness {
    harness_with(backends, RecordingExecutor::default(), None)
}

pub fn harness_with(
    backends: Vec<Box<dyn ModelBackend>>,
    executor: RecordingExecutor,
    confirm_timeout: Option<Duration>,
) -> Harness {
    let gateway = Arc::new(
        ProviderGateway::new(backends).with_retry_policy(1, Duration::ZERO),
    );
    let gate = Arc::new(match confirm_timeout {
        Some(timeout) => ConfirmationGate::new(timeout),
        None => ConfirmationGate::default(),
    });
    let executor = Arc::new(executor);
    let (notifier, outcomes) = ChannelNotifier::new();
    let orchestrator = Orchestrator::new(gateway, gate, executor.clone(), notifier.clone());
    Harness {
        orchestrator,
        executor,
        notifier,
        outcomes,
    }
}
