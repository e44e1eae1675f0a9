//! Mock AI Provider for testing.
//!
//! Configurable mock implementation of the AIProvider port, allowing tests
//! to run without calling a real completion API.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_reply("Hello, I'm the assistant!", 30);
//!
//! let response = provider.complete(request).await?;
//! assert_eq!(response.content, "Hello, I'm the assistant!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{AIError, AIProvider, ChatCompletion, ChatRequest};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return a successful completion.
    Success { content: String, total_tokens: u32 },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate a missing credential.
    Configuration,
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::Configuration => AIError::configuration("mock: no credential"),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::RateLimited { retry_after_secs } => {
                AIError::RateLimited { retry_after_secs }
            }
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

/// Mock AI provider for testing.
///
/// Queued replies are consumed in order; an exhausted queue repeats the
/// default reply. Received requests are recorded for verification.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    model: String,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            model: "mock-model-1".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sets the model name the mock reports.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Queues a successful reply.
    pub fn with_reply(self, content: impl Into<String>, total_tokens: u32) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Success {
            content: content.into(),
            total_tokens,
        });
        self
    }

    /// Queues an error reply.
    pub fn with_error(self, error: MockError) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Error(error));
        self
    }

    /// Returns all requests received so far.
    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, AIError> {
        self.calls.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Success {
                content,
                total_tokens,
            }) => Ok(ChatCompletion {
                content,
                total_tokens,
                model: self.model.clone(),
            }),
            Some(MockReply::Error(err)) => Err(err.into()),
            None => Ok(ChatCompletion {
                content: "mock reply".to_string(),
                total_tokens: 10,
                model: self.model.clone(),
            }),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
