use crate::client::{EthRpc, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = Box<dyn Fn(&Bytes) -> Result<String, TransportError> + Send + Sync>;

/// In-memory endpoint answering every call through a closure.
pub(crate) struct MockRpc {
    respond: Responder,
    calls: AtomicUsize,
}

impl MockRpc {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&Bytes) -> Result<String, TransportError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| Ok(body.clone()))
    }

    pub fn unreachable() -> Self {
        Self::new(|_| Err(TransportError("connection refused".into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EthRpc for MockRpc {
    async fn call(&self, body: Bytes) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        (self.respond)(&body)
    }
}
