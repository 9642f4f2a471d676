use async_trait::async_trait;

use crate::{ChatRequest, ChatResponse};
use squeeze_types::Result;

// ---------------------------------------------------------------------------
// ChatProvider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
    fn name(&self) -> &str;
    fn default_model(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DynProvider
// ---------------------------------------------------------------------------

pub struct DynProvider(Box<dyn ChatProvider>);

impl DynProvider {
    pub fn new(provider: impl ChatProvider + 'static) -> Self {
        Self(Box::new(provider))
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.0.complete(request).await
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn default_model(&self) -> &str {
        self.0.default_model()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    struct MockProvider;

    #[async_trait]
    impl ChatProvider for MockProvider {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse {
                text: format!("echo: {}", request.messages[0].content),
                model: "mock-model".into(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn default_model(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn dyn_provider_complete() {
        let provider = DynProvider::new(MockProvider);
        let req = ChatRequest::new("mock-model", vec![Message::user("hi")]);
        let resp = provider.complete(&req).await.unwrap();
        assert_eq!(resp.text, "echo: hi");
        assert_eq!(resp.model, "mock-model");
    }

    #[test]
    fn dyn_provider_metadata() {
        let provider = DynProvider::new(MockProvider);
        assert_eq!(provider.name(), "mock");
        assert_eq!(provider.default_model(), "mock-model");
    }
}
