//! Tower middleware layer for quota enforcement.
//!
//! [`PriciLayer`] wraps a service with two hooks:
//!
//! - before the handler, the [`QuotaGate`] resolves the request identity and
//!   either ends the request with a 402 or tags it;
//! - after the handler produced its response, the [`UsageRecorder`] charges
//!   the tag when the status is 2xx. By default the increment is spawned and
//!   the response returns without waiting for it; [`RecordMode::Inline`]
//!   awaits it first.
//!
//! The tag travels inside the request's own future from the first hook to
//! the second. The only state shared between requests is the immutable
//! [`PriciConfig`].
//!
//! Quota service failures during the check come out as the service error
//! ([`tower::BoxError`] wrapping a [`crate::GateError`]), so the host picks
//! the response with `HandleErrorLayer`:
//!
//! ```ignore
//! use axum::error_handling::HandleErrorLayer;
//! use tower::ServiceBuilder;
//!
//! let app = Router::new()
//!     .route("/reports", post(create_report))
//!     .layer(
//!         ServiceBuilder::new()
//!             .layer(HandleErrorLayer::new(prici_axum::handle_error))
//!             .layer(PriciLayer::new(PriciOptions::new(sdk).field_id("reports"))),
//!     );
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use pin_project_lite::pin_project;
use tower::{BoxError, Layer, Service};

use crate::config::{PriciConfig, PriciOptions, RecordMode};
use crate::context::UsageTag;
use crate::error::GateError;
use crate::gate::{GateDecision, QuotaGate};
use crate::usage::{is_success_class, RecordOutcome, UsageRecorder};

/// Tower layer that enforces quotas and records usage.
#[derive(Debug, Clone)]
pub struct PriciLayer {
    config: Arc<PriciConfig>,
}

impl PriciLayer {
    /// Build the configuration from options and create the layer.
    #[must_use]
    pub fn new(options: PriciOptions) -> Self {
        Self::with_config(options.build())
    }

    /// Create the layer from an already built configuration.
    #[must_use]
    pub fn with_config(config: PriciConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration shared by every wrapped service.
    #[must_use]
    pub fn config(&self) -> &PriciConfig {
        &self.config
    }
}

impl<S> Layer<S> for PriciLayer {
    type Service = PriciService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PriciService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// The quota enforcement service.
#[derive(Debug, Clone)]
pub struct PriciService<S> {
    inner: S,
    config: Arc<PriciConfig>,
}

impl<S> Service<Request> for PriciService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    type Response = Response;
    type Error = BoxError;
    type Future = PriciFuture<S>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Keep the instance that was driven to readiness.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        let (parts, body) = req.into_parts();
        let gate = QuotaGate::new(Arc::clone(&self.config));
        let check = Box::pin(async move {
            let decision = gate.check(&parts).await;
            (parts, decision)
        });

        PriciFuture {
            state: FutureState::Gating {
                check,
                inner: Some(inner),
                body: Some(body),
                config: Arc::clone(&self.config),
            },
        }
    }
}

type CheckFuture = BoxFuture<'static, (Parts, Result<GateDecision, GateError>)>;

pin_project! {
    /// Future for the quota enforcement service.
    pub struct PriciFuture<S>
    where
        S: Service<Request>,
    {
        #[pin]
        state: FutureState<S>,
    }
}

pin_project! {
    #[project = FutureStateProj]
    enum FutureState<S>
    where
        S: Service<Request>,
    {
        Gating {
            #[pin]
            check: CheckFuture,
            inner: Option<S>,
            body: Option<Body>,
            config: Arc<PriciConfig>,
        },
        Calling {
            #[pin]
            future: S::Future,
            tag: Option<UsageTag>,
            config: Arc<PriciConfig>,
        },
        Recording {
            #[pin]
            record: BoxFuture<'static, RecordOutcome>,
            response: Option<Response>,
        },
        Done,
    }
}

impl<S> Future for PriciFuture<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    type Output = Result<Response, BoxError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            let this = self.as_mut().project();

            match this.state.project() {
                FutureStateProj::Gating {
                    check,
                    inner,
                    body,
                    config,
                } => {
                    let (parts, decision) = ready!(check.poll(cx));
                    let config = Arc::clone(config);
                    let (Some(mut service), Some(body)) = (inner.take(), body.take()) else {
                        panic!("gate resumed after completion");
                    };

                    let decision = match decision {
                        Ok(decision) => decision,
                        Err(e) => {
                            self.set(Self::done());
                            return Poll::Ready(Err(e.into()));
                        }
                    };

                    let mut request = Request::from_parts(parts, body);
                    let tag = match decision {
                        GateDecision::Deny(denied) => {
                            self.set(Self::done());
                            return Poll::Ready(Ok(denied.into_response()));
                        }
                        GateDecision::Skip => None,
                        GateDecision::Allow(tag) => {
                            request.extensions_mut().insert(tag.clone());
                            Some(tag)
                        }
                    };

                    let future = service.call(request);
                    self.set(PriciFuture {
                        state: FutureState::Calling {
                            future,
                            tag,
                            config,
                        },
                    });
                }
                FutureStateProj::Calling {
                    future,
                    tag,
                    config,
                } => {
                    // Handler errors are forwarded untouched and never charged.
                    let response = match ready!(future.poll(cx)) {
                        Ok(response) => response,
                        Err(e) => {
                            self.set(Self::done());
                            return Poll::Ready(Err(e.into()));
                        }
                    };

                    let status = response.status();
                    let Some(tag) = tag.take().filter(|_| is_success_class(status)) else {
                        self.set(Self::done());
                        return Poll::Ready(Ok(response));
                    };

                    let recorder = UsageRecorder::new(Arc::clone(config.sdk()));
                    match config.record_mode() {
                        RecordMode::Detached => {
                            tokio::spawn(async move {
                                recorder.record(status, Some(tag)).await;
                            });
                            self.set(Self::done());
                            return Poll::Ready(Ok(response));
                        }
                        RecordMode::Inline => {
                            let record =
                                Box::pin(async move { recorder.record(status, Some(tag)).await });
                            self.set(PriciFuture {
                                state: FutureState::Recording {
                                    record,
                                    response: Some(response),
                                },
                            });
                        }
                    }
                }
                FutureStateProj::Recording { record, response } => {
                    ready!(record.poll(cx));
                    let Some(response) = response.take() else {
                        panic!("recorder resumed after completion");
                    };
                    self.set(Self::done());
                    return Poll::Ready(Ok(response));
                }
                FutureStateProj::Done => {
                    panic!("polled after completion");
                }
            }
        }
    }
}

impl<S> PriciFuture<S>
where
    S: Service<Request>,
{
    fn done() -> Self {
        Self {
            state: FutureState::Done,
        }
    }
}
