//! Scripted in-process provider adapter for orchestrator tests.
#![allow(dead_code)]

use async_trait::async_trait;
use explain_levels::error::ProviderError;
use explain_levels::providers::ProviderAdapter;
use explain_levels::stream::FragmentStream;
use explain_levels::types::SamplingParams;
use futures::{StreamExt, stream};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a model does every time it is called.
#[derive(Debug, Clone)]
pub enum Script {
    /// Accept the call and emit these fragments.
    Fragments(Vec<String>),
    /// Reject the call with an HTTP status.
    Reject {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },
    /// Emit some fragments, then fail mid-stream.
    BreakAfter(Vec<String>, String),
    /// Accept the call and emit one fragment every `interval`.
    Trickle(Vec<String>, Duration),
    /// Never answer the call.
    Hang,
}

impl Script {
    pub fn text(fragments: &[&str]) -> Self {
        Self::Fragments(fragments.iter().map(|f| f.to_string()).collect())
    }

    pub fn reject(status: u16, message: &str) -> Self {
        Self::Reject {
            status,
            message: message.to_string(),
            retry_after: None,
        }
    }

    pub fn rate_limited(message: &str, retry_after: Option<Duration>) -> Self {
        Self::Reject {
            status: 429,
            message: message.to_string(),
            retry_after,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Adapter whose models follow fixed scripts and which records every call.
pub struct ScriptedAdapter {
    id: &'static str,
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedAdapter {
    pub fn new(id: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn script(self: &Arc<Self>, model: &str, script: Script) -> Arc<Self> {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), script);
        self.clone()
    }

    /// Models called so far, in call order.
    pub fn called_models(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.model.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn provider_id(&self) -> &str {
        self.id
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<FragmentStream, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        });
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(model)
            .cloned()
            .unwrap_or_else(|| Script::reject(404, "model not scripted"));

        match script {
            Script::Fragments(fragments) => {
                Ok(Box::pin(stream::iter(
                    fragments.into_iter().map(Ok::<String, ProviderError>),
                )))
            }
            Script::Reject {
                status,
                message,
                retry_after,
            } => Err(ProviderError::http(
                self.id,
                Some(model),
                status,
                message,
                retry_after,
            )),
            Script::BreakAfter(fragments, message) => {
                let failure = ProviderError::transport(self.id, Some(model), message);
                let items = fragments
                    .into_iter()
                    .map(Ok::<String, ProviderError>)
                    .chain(std::iter::once(Err(failure)));
                Ok(Box::pin(stream::iter(items)))
            }
            Script::Trickle(fragments, interval) => {
                let slow = stream::iter(fragments).then(move |fragment| async move {
                    tokio::time::sleep(interval).await;
                    Ok::<String, ProviderError>(fragment)
                });
                Ok(Box::pin(slow))
            }
            Script::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
