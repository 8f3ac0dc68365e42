//! Transport collaborators
//!
//! The client never opens connections itself. Every request goes through a
//! [`Transport`], authenticated with a token from a [`TokenSource`]; both
//! receive the caller's [`Context`] so they can honor cancellation and
//! deadlines. Retry policy belongs to the transport.

use grove_core::{Error, Result, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation flag plus optional deadline for one logical operation.
///
/// Clones share the cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// Context without a deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once cancelled or past the deadline
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Fail with [`Error::Cancelled`] once the context is done.
    pub fn check(&self) -> Result<()> {
        if self.is_done() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Performs one request against the store.
pub trait Transport: Send + Sync {
    /// POST `body` to `url` with bearer `token`; returns the response body.
    fn perform(
        &self,
        ctx: &Context,
        url: &str,
        body: &[u8],
        token: &str,
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Supplies access tokens.
pub trait TokenSource: Send + Sync {
    /// Current token
    fn token(&self, ctx: &Context) -> std::result::Result<String, TransportError>;
}

/// Fixed token, e.g. for emulators that ignore authentication.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn token(&self, _ctx: &Context) -> std::result::Result<String, TransportError> {
        Ok(self.0.clone())
    }
}

impl<F> TokenSource for F
where
    F: Fn(&Context) -> std::result::Result<String, TransportError> + Send + Sync,
{
    fn token(&self, ctx: &Context) -> std::result::Result<String, TransportError> {
        self(ctx)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn perform(
        &self,
        ctx: &Context,
        url: &str,
        body: &[u8],
        token: &str,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).perform(ctx, url, body, token)
    }
}
