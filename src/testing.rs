//! In-memory port fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::BananaError;
use crate::ports::generation::ProviderFuture;
use crate::ports::sleeper::SleepFuture;
use crate::ports::upload_host::UploadFuture;
use crate::ports::{GenerationProvider, ProviderRequest, Sleeper, UploadHost};

/// A status response body with the given status and optional image URL.
pub(crate) fn status(code: i64, image_url: Option<&str>) -> Value {
    match image_url {
        Some(url) => json!({"code": 200, "data": {"status": code, "image_url": url}}),
        None => json!({"code": 200, "data": {"status": code}}),
    }
}

/// Provider that replays scripted responses and records what it was sent.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    submits: Mutex<VecDeque<Result<Value, BananaError>>>,
    polls: Mutex<VecDeque<Result<Value, BananaError>>>,
    submitted: Mutex<Vec<ProviderRequest>>,
    queries: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_submit(self, response: Result<Value, BananaError>) -> Self {
        self.submits.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn on_poll(self, response: Result<Value, BananaError>) -> Self {
        self.polls.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<ProviderRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

impl GenerationProvider for ScriptedProvider {
    fn submit(&self, request: &ProviderRequest) -> ProviderFuture<'_> {
        self.submitted.lock().unwrap().push(request.clone());
        let next = self.submits.lock().unwrap().pop_front();
        Box::pin(async move { next.expect("no scripted submit response left") })
    }

    fn query_task(&self, _task_id: &str) -> ProviderFuture<'_> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        Box::pin(async move { next.expect("no scripted status response left") })
    }
}

/// Sleeper that returns immediately and counts how often it was asked.
#[derive(Default)]
pub(crate) struct CountingSleeper {
    sleeps: AtomicUsize,
    total: Mutex<Duration>,
}

impl CountingSleeper {
    pub(crate) fn count(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }

    pub(crate) fn total(&self) -> Duration {
        *self.total.lock().unwrap()
    }
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        *self.total.lock().unwrap() += duration;
        Box::pin(async {})
    }
}

/// Sleeper that never wakes up.
pub(crate) struct PendingSleeper;

impl Sleeper for PendingSleeper {
    fn sleep(&self, _duration: Duration) -> SleepFuture<'_> {
        Box::pin(std::future::pending())
    }
}

/// Image host whose answer depends on the payload.
///
/// Payloads containing `"bad"` fail, payloads containing `"hang"` never
/// complete, and everything fails when the host is built with
/// [`ScriptedHost::failing`].
pub(crate) struct ScriptedHost {
    name: String,
    always_fail: bool,
    calls: AtomicUsize,
}

impl ScriptedHost {
    pub(crate) fn ok(name: &str) -> Self {
        Self { name: name.into(), always_fail: false, calls: AtomicUsize::new(0) }
    }

    pub(crate) fn failing(name: &str) -> Self {
        Self { name: name.into(), always_fail: true, calls: AtomicUsize::new(0) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UploadHost for ScriptedHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn upload(&self, base64: &str) -> UploadFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = base64.to_string();
        Box::pin(async move {
            if payload.contains("hang") {
                std::future::pending::<()>().await;
            }
            if self.always_fail || payload.contains("bad") {
                return Err(BananaError::Api {
                    status: 503,
                    message: format!("{} is down", self.name),
                });
            }
            Ok(format!("https://{}.example/{payload}", self.name))
        })
    }
}

/// Lets a test keep a handle on a host after boxing it into a relay.
pub(crate) struct SharedHost(pub(crate) Arc<ScriptedHost>);

impl UploadHost for SharedHost {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn upload(&self, base64: &str) -> UploadFuture<'_> {
        self.0.upload(base64)
    }
}

/// Lets a test inspect a provider after boxing it into a generator.
pub(crate) struct SharedProvider(pub(crate) Arc<ScriptedProvider>);

impl GenerationProvider for SharedProvider {
    fn submit(&self, request: &ProviderRequest) -> ProviderFuture<'_> {
        self.0.submit(request)
    }

    fn query_task(&self, task_id: &str) -> ProviderFuture<'_> {
        self.0.query_task(task_id)
    }
}
