//! Tower binding for the request-time handler.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::Request;
use tower::{Layer, Service};
use tracing::error;

use crate::guard::{RequestKind, TargetingSessionGuard};
use crate::session::Session;

/// Installs [`TargetingSessionGuard::on_request`] in a service stack.
///
/// The layer belongs inside the middleware that populates the [`Session`]
/// request extension and outside everything that reads the session, so
/// the bags exist before the first session access. Requests without a
/// [`Session`] extension pass through untouched. A sub-request dispatcher
/// marks its requests with [`RequestKind::Sub`]; anything unmarked counts
/// as a main request.
#[derive(Clone)]
pub struct TargetingSessionLayer {
    guard: Arc<TargetingSessionGuard>,
}

impl TargetingSessionLayer {
    pub fn new(guard: Arc<TargetingSessionGuard>) -> Self {
        Self { guard }
    }
}

impl<S> Layer<S> for TargetingSessionLayer {
    type Service = TargetingSessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TargetingSessionService {
            inner,
            guard: self.guard.clone(),
        }
    }
}

/// Service produced by [`TargetingSessionLayer`].
#[derive(Clone)]
pub struct TargetingSessionService<S> {
    inner: S,
    guard: Arc<TargetingSessionGuard>,
}

impl<S, B> Service<Request<B>> for TargetingSessionService<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let guard = self.guard.clone();

        Box::pin(async move {
            let kind = req
                .extensions()
                .get::<RequestKind>()
                .copied()
                .unwrap_or(RequestKind::Main);

            if let Some(session) = req.extensions().get::<Session>().cloned() {
                if let Err(err) = guard.on_request(kind, &session).await {
                    error!("targeting session bag registration failed: {err}");
                }
            }

            inner.call(req).await
        })
    }
}
