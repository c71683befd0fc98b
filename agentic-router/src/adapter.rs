//! Object-safe `ask`-shaped boundary layered on top of [`neuron_turn::Provider`].

use crate::error::RouterError;
use crate::metrics::ProviderDescriptor;
use async_trait::async_trait;
use neuron_turn::{ContentPart, Provider, ProviderMessage, ProviderRequest, Role};

/// A model a provider can serve, as surfaced to callers of `list_models`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model identifier, as passed to `ask`'s `model` override.
    pub name: String,
    /// Capability tags this model advertises.
    pub capabilities: Vec<String>,
}

/// Object-safe capability set every router-managed provider exposes.
///
/// Layered on top of the workspace's existing [`Provider::complete`]
/// boundary: `ask` packs `prompt`/`history`/`system` into a
/// [`ProviderRequest`] and extracts text out of the [`neuron_turn::ProviderResponse`],
/// so concrete providers gain this surface without touching their HTTP
/// plumbing.
#[async_trait]
pub trait AskCapable: Send + Sync {
    /// Router-facing name this provider is registered under.
    fn name(&self) -> &str;

    /// Send `prompt` (with `history` preceding it) to the backend and
    /// return its text completion.
    async fn ask(
        &self,
        prompt: &str,
        history: &[ProviderMessage],
        system: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, RouterError>;

    /// Whether this provider currently has what it needs to serve requests
    /// (e.g. an API key is configured). Cheap, synchronous, best-effort.
    fn is_available(&self) -> bool;

    /// Models this provider can serve.
    fn list_models(&self) -> Vec<ModelDescriptor>;

    /// This provider's system prompt, if it has a fixed one independent of
    /// the caller-supplied `system` override.
    fn system_prompt(&self) -> Option<String>;

    /// Static descriptor (priority, capability tags) used by routing rules.
    fn descriptor(&self) -> &ProviderDescriptor;
}

/// Adapts any `P: Provider` into the object-safe [`AskCapable`] boundary.
pub struct ProviderAdapter<P: Provider> {
    inner: P,
    descriptor: ProviderDescriptor,
    system_prompt: Option<String>,
}

impl<P: Provider> ProviderAdapter<P> {
    /// Wrap `provider` with the given static descriptor.
    pub fn new(provider: P, descriptor: ProviderDescriptor) -> Self {
        Self {
            inner: provider,
            descriptor,
            system_prompt: None,
        }
    }

    /// Attach a fixed system prompt returned by [`AskCapable::system_prompt`].
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl<P: Provider> AskCapable for ProviderAdapter<P> {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    async fn ask(
        &self,
        prompt: &str,
        history: &[ProviderMessage],
        system: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, RouterError> {
        if !self.is_available() {
            return Err(RouterError::ProviderUnavailable(self.descriptor.name.clone()));
        }

        let mut messages: Vec<ProviderMessage> = history.to_vec();
        messages.push(ProviderMessage {
            role: Role::User,
            content: vec![ContentPart::Text {
                text: prompt.to_string(),
            }],
        });

        let request = ProviderRequest {
            model: model.map(|m| m.to_string()),
            messages,
            tools: Vec::new(),
            max_tokens: Some(2048),
            temperature: Some(0.5),
            system: system.map(|s| s.to_string()).or_else(|| self.system_prompt.clone()),
            extra: serde_json::Value::Null,
        };

        let response = self.inner.complete(request).await?;

        let text = response
            .content
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(RouterError::BackendMalformed(
                "response contained no text content".into(),
            ));
        }

        Ok(text)
    }

    fn is_available(&self) -> bool {
        self.descriptor.enabled
    }

    fn list_models(&self) -> Vec<ModelDescriptor> {
        self.descriptor
            .models
            .iter()
            .map(|name| ModelDescriptor {
                name: name.clone(),
                capabilities: self
                    .descriptor
                    .model_capabilities
                    .get(name)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn system_prompt(&self) -> Option<String> {
        self.system_prompt.clone()
    }

    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuron_turn::{ProviderError, ProviderResponse, StopReason, TokenUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn ask_capable_is_object_safe() {
        _assert_send_sync::<Arc<dyn AskCapable>>();
    }

    struct StubProvider {
        calls: AtomicUsize,
    }

    impl Provider for StubProvider {
        fn complete(
            &self,
            request: ProviderRequest,
        ) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let last_text = request
                .messages
                .last()
                .and_then(|m| m.content.first())
                .map(|c| match c {
                    ContentPart::Text { text } => text.clone(),
                    _ => String::new(),
                })
                .unwrap_or_default();
            async move {
                Ok(ProviderResponse {
                    content: vec![ContentPart::Text {
                        text: format!("echo: {last_text}"),
                    }],
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                    model: "stub".into(),
                    cost: None,
                    truncated: None,
                })
            }
        }
    }

    fn adapter() -> ProviderAdapter<StubProvider> {
        ProviderAdapter::new(
            StubProvider {
                calls: AtomicUsize::new(0),
            },
            ProviderDescriptor::new("stub", 1).with_model("stub-1", &["code"]),
        )
    }

    #[tokio::test]
    async fn ask_roundtrips_through_complete() {
        let a = adapter();
        let text = a.ask("hello", &[], None, None).await.unwrap();
        assert_eq!(text, "echo: hello");
    }

    #[tokio::test]
    async fn ask_fails_when_disabled() {
        let mut descriptor = ProviderDescriptor::new("stub", 1);
        descriptor.enabled = false;
        let a = ProviderAdapter::new(
            StubProvider {
                calls: AtomicUsize::new(0),
            },
            descriptor,
        );
        let err = a.ask("hi", &[], None, None).await.unwrap_err();
        assert!(matches!(err, RouterError::ProviderUnavailable(_)));
    }

    #[test]
    fn list_models_reflects_descriptor() {
        let a = adapter();
        let models = a.list_models();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "stub-1");
        assert_eq!(models[0].capabilities, vec!["code".to_string()]);
    }
}
