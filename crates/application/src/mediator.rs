//! Request dispatch.
//!
//! Every request goes through the same pipeline:
//! 1. Authorization against the request's [`Policy`]
//! 2. Validation, collecting every field failure
//! 3. The handler, inside a [`Session`]
//! 4. Dispatch of the domain events the handler raised
//! 5. One atomic commit of everything the handler and event handlers wrote
//!
//! Each step runs inside a tracing span and feeds the request metrics.

use std::time::Instant;

use async_trait::async_trait;

use crate::authorization::{Actor, Policy};
use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::events::EventDispatcher;
use crate::session::Session;
use crate::validation::ValidationErrors;

/// A command or query.
#[async_trait]
pub trait Request: Send + Sized {
    type Response: Send;

    /// Name used in logs and metrics.
    const NAME: &'static str;

    fn policy(&self) -> Policy;

    fn validate(&self, _errors: &mut ValidationErrors) {}

    async fn handle(self, session: &mut Session) -> Result<Self::Response>;
}

/// Runs requests through the pipeline.
pub struct Mediator {
    context: AppContext,
    dispatcher: EventDispatcher,
}

impl Mediator {
    /// Creates a mediator with the standard event handlers.
    pub fn new(context: AppContext) -> Self {
        Self::with_dispatcher(context, EventDispatcher::standard())
    }

    pub fn with_dispatcher(context: AppContext, dispatcher: EventDispatcher) -> Self {
        Self {
            context,
            dispatcher,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    #[tracing::instrument(skip_all, fields(request = R::NAME, actor = %actor))]
    pub async fn send<R: Request>(&self, actor: Actor, request: R) -> Result<R::Response> {
        let start = Instant::now();
        let result = self.run(actor, request).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::Validation(_)) => "invalid",
            Err(AppError::Unauthorized(_) | AppError::Forbidden(_)) => "denied",
            Err(_) => "error",
        };
        metrics::counter!("requests_total", "request" => R::NAME, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("request_duration_seconds", "request" => R::NAME)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => tracing::debug!(outcome, "request handled"),
            Err(err @ (AppError::Store(_) | AppError::Internal(_) | AppError::Gateway(_))) => {
                tracing::error!(error = %err, "request failed");
            }
            Err(err) => tracing::info!(outcome, error = %err, "request rejected"),
        }
        result
    }

    async fn run<R: Request>(&self, actor: Actor, request: R) -> Result<R::Response> {
        request.policy().authorize(&actor)?;

        let mut errors = ValidationErrors::new();
        request.validate(&mut errors);
        errors.into_result()?;

        let mut session = Session::new(self.context.clone(), actor);
        let response = request.handle(&mut session).await?;
        self.dispatcher.dispatch(&mut session).await?;
        session.commit().await?;

        Ok(response)
    }
}
