use std::future::Future;

use serde::Serialize;

use crate::api_errors::ApiError;

/// How a failed remote call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Endpoint missing or unreachable: the local cache may stand in.
    Recoverable,
    /// The remote saw the request and rejected it: surface to the user.
    Fatal,
}

/// Explicit result of a remote attempt.
#[derive(Debug)]
pub enum RemoteOutcome<T> {
    Success(T),
    Recoverable(ApiError),
    Fatal(ApiError),
}

/// Strategy deciding which remote failures are substituted by local storage.
pub trait FallbackPolicy: Send + Sync {
    fn classify(&self, err: &ApiError) -> FailureClass;
}

/// Falls back on 404, 405, status 0 and failures without any status.
/// Everything else is fatal: 5xx unless enabled, and a 2xx whose body could
/// not be read, since the write may already have landed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFallbackPolicy {
    pub fallback_on_server_error: bool,
}

impl StatusFallbackPolicy {
    pub fn new(fallback_on_server_error: bool) -> Self {
        StatusFallbackPolicy { fallback_on_server_error }
    }
}

impl FallbackPolicy for StatusFallbackPolicy {
    fn classify(&self, err: &ApiError) -> FailureClass {
        match err.status() {
            None | Some(0) | Some(404) | Some(405) => FailureClass::Recoverable,
            Some(s) if self.fallback_on_server_error && (500..600).contains(&s) => {
                FailureClass::Recoverable
            }
            Some(_) => FailureClass::Fatal,
        }
    }
}

/// Value produced through the adapter, tagged with the store that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persisted<T> {
    pub data: T,
    pub used_local: bool,
}

/// Runs a remote operation and substitutes a local one on recoverable failures.
#[derive(Debug, Clone, Default)]
pub struct FallbackAdapter<P = StatusFallbackPolicy> {
    policy: P,
}

impl<P: FallbackPolicy> FallbackAdapter<P> {
    pub fn new(policy: P) -> Self {
        FallbackAdapter { policy }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn classify<T>(&self, result: Result<T, ApiError>) -> RemoteOutcome<T> {
        match result {
            Ok(value) => RemoteOutcome::Success(value),
            Err(err) => match self.policy.classify(&err) {
                FailureClass::Recoverable => RemoteOutcome::Recoverable(err),
                FailureClass::Fatal => RemoteOutcome::Fatal(err),
            },
        }
    }

    /// Calls `remote(args)`; on a recoverable failure calls `local(args)` with
    /// the same arguments. Fatal failures are returned untouched and `local`
    /// is never invoked.
    pub async fn execute<A, T, R, Fut, L>(
        &self,
        remote: R,
        local: L,
        args: A,
    ) -> Result<Persisted<T>, ApiError>
    where
        A: Clone,
        R: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
        L: FnOnce(A) -> T,
    {
        match self.classify(remote(args.clone()).await) {
            RemoteOutcome::Success(data) => Ok(Persisted { data, used_local: false }),
            RemoteOutcome::Recoverable(err) => {
                tracing::warn!(
                    status = ?err.status(),
                    "Remote call unavailable, using local cache: {}",
                    err
                );
                Ok(Persisted { data: local(args), used_local: true })
            }
            RemoteOutcome::Fatal(err) => {
                tracing::error!(status = ?err.status(), "Remote call rejected: {}", err);
                Err(err)
            }
        }
    }
}
