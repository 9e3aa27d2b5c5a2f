//! Shared mock collaborators for pipeline and context tests.

use async_trait::async_trait;
use banter_core::error::{LookupError, ProviderError};
use banter_core::lookup::Lookup;
use banter_core::provider::{CompletionRequest, CompletionResponse, Provider};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A provider that always answers with the same text and counts its calls.
pub struct StaticProvider {
    reply: String,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl StaticProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn name(&self) -> &str {
        "static_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        *self.last_request.lock().unwrap() = Some(request);
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model,
            usage: None,
        })
    }
}

/// A provider that always fails with a timeout fault.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::Timeout("mock timeout".into()))
    }
}

/// A provider that hangs for a fixed delay before answering.
pub struct SlowProvider {
    delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(CompletionResponse {
            content: "too late".into(),
            model: request.model,
            usage: None,
        })
    }
}

/// A lookup that always answers with the same fragment and counts calls.
pub struct StaticLookup {
    fragment: String,
    calls: AtomicUsize,
}

impl StaticLookup {
    pub fn new(fragment: &str) -> Self {
        Self {
            fragment: fragment.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Lookup for StaticLookup {
    fn name(&self) -> &str {
        "static_mock"
    }

    async fn lookup(&self, _query: &str) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fragment.clone())
    }
}

/// A lookup that always fails.
pub struct FailingLookup;

#[async_trait]
impl Lookup for FailingLookup {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn lookup(&self, _query: &str) -> Result<String, LookupError> {
        Err(LookupError::Network("mock network failure".into()))
    }
}

/// A lookup that hangs for a fixed delay before answering.
pub struct SlowLookup {
    delay: Duration,
}

impl SlowLookup {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Lookup for SlowLookup {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn lookup(&self, _query: &str) -> Result<String, LookupError> {
        tokio::time::sleep(self.delay).await;
        Ok("too late".into())
    }
}
