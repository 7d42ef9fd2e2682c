//! Interceptors and the flow control that drives them.
//!
//! An interceptor sees the exchange on its way in (request phase), on its
//! way out (response phase), or both. The request phase runs interceptors
//! in registration order; the response phase unwinds them in reverse. An
//! interceptor short-circuits the request phase by installing a response
//! and returning [`Outcome::Return`].

mod access_log;
mod dispatching;
mod flow_controller;
mod http_client;
mod rule_matching;
mod user_flow;

pub use access_log::AccessLog;
pub use dispatching::Dispatching;
pub use flow_controller::FlowController;
pub use http_client::HttpClientInterceptor;
pub use rule_matching::RuleMatching;
pub use user_flow::UserFlow;

use std::error::Error;

use async_trait::async_trait;

use crate::exchange::Exchange;

/// Errors surfaced by interceptor handlers.
pub type InterceptorError = Box<dyn Error + Send + Sync>;

/// What the pipeline does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Hand the exchange to the next interceptor.
    Continue,
    /// Turn around: the exchange has its response, unwind the stack.
    Return,
    /// Tear the exchange down without writing a response.
    Abort,
}

/// Which sides of the exchange an interceptor handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Request,
    Response,
    RequestResponse,
}

/// A pipeline stage.
///
/// Handlers default to passing the exchange through untouched, so an
/// implementation only overrides the side it cares about (and advertises
/// that side via [`flow`](Interceptor::flow)).
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn flow(&self) -> Flow {
        Flow::RequestResponse
    }

    async fn handle_request(&self, _exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        Ok(Outcome::Continue)
    }

    async fn handle_response(&self, _exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        Ok(Outcome::Continue)
    }
}
