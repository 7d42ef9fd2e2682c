use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::exchange::Exchange;
use crate::interceptor::{Flow, Interceptor, Outcome};

/// Walks a chain of interceptors over an exchange.
///
/// Every interceptor that wants to see the response side is pushed onto the
/// exchange stack before its request handler runs, so the response phase
/// unwinds the stack in exact reverse order no matter where the request
/// phase turned around. A handler error is logged and aborts the exchange.
#[derive(Debug)]
pub struct FlowController;

impl FlowController {
    /// Runs the request phase and, unless it aborted, the response phase.
    pub async fn invoke_handlers(
        chain: &[Arc<dyn Interceptor>],
        exchange: &mut Exchange,
    ) -> Outcome {
        match Self::run_request_phase(chain, exchange).await {
            Outcome::Abort => Outcome::Abort,
            _ => Self::invoke_response_handlers(exchange).await,
        }
    }

    /// Runs request handlers front to back until one turns the exchange
    /// around or the chain is exhausted.
    pub async fn run_request_phase(
        chain: &[Arc<dyn Interceptor>],
        exchange: &mut Exchange,
    ) -> Outcome {
        for interceptor in chain {
            match interceptor.flow() {
                Flow::Response => {
                    exchange.push_interceptor(Arc::clone(interceptor));
                    continue;
                }
                Flow::RequestResponse => exchange.push_interceptor(Arc::clone(interceptor)),
                Flow::Request => {}
            }

            debug!(interceptor = interceptor.name(), "handling request");
            match interceptor.handle_request(exchange).await {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Return) => return Outcome::Return,
                Ok(Outcome::Abort) => {
                    warn!(interceptor = interceptor.name(), "aborted the exchange");
                    return Outcome::Abort;
                }
                Err(error) => {
                    error!(interceptor = interceptor.name(), %error, "request handler failed");
                    return Outcome::Abort;
                }
            }
        }
        Outcome::Continue
    }

    /// Unwinds the exchange stack, invoking response handlers in reverse
    /// registration order. Only an abort stops the unwind.
    pub async fn invoke_response_handlers(exchange: &mut Exchange) -> Outcome {
        while let Some(interceptor) = exchange.pop_interceptor() {
            debug!(interceptor = interceptor.name(), "handling response");
            match interceptor.handle_response(exchange).await {
                Ok(Outcome::Abort) => {
                    warn!(interceptor = interceptor.name(), "aborted the exchange");
                    return Outcome::Abort;
                }
                Ok(_) => {}
                Err(error) => {
                    error!(interceptor = interceptor.name(), %error, "response handler failed");
                    return Outcome::Abort;
                }
            }
        }
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::InterceptorError;
    use async_trait::async_trait;
    use http::Method;
    use portico_http::protocol::Request;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: &'static str,
        flow: Flow,
        on_request: Outcome,
        on_response: Outcome,
        fail_request: bool,
        log: Log,
    }

    impl Recording {
        fn new(name: &'static str, flow: Flow, log: &Log) -> Self {
            Self {
                name,
                flow,
                on_request: Outcome::Continue,
                on_response: Outcome::Continue,
                fail_request: false,
                log: Arc::clone(log),
            }
        }

        fn on_request(mut self, outcome: Outcome) -> Self {
            self.on_request = outcome;
            self
        }

        fn on_response(mut self, outcome: Outcome) -> Self {
            self.on_response = outcome;
            self
        }

        fn failing(mut self) -> Self {
            self.fail_request = true;
            self
        }

        fn note(&self, phase: &str) {
            self.log.lock().unwrap().push(format!("{}:{phase}", self.name));
        }
    }

    #[async_trait]
    impl Interceptor for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn flow(&self) -> Flow {
            self.flow
        }

        async fn handle_request(
            &self,
            _exchange: &mut Exchange,
        ) -> Result<Outcome, InterceptorError> {
            self.note("req");
            if self.fail_request {
                return Err("handler blew up".into());
            }
            Ok(self.on_request)
        }

        async fn handle_response(
            &self,
            _exchange: &mut Exchange,
        ) -> Result<Outcome, InterceptorError> {
            self.note("resp");
            Ok(self.on_response)
        }
    }

    fn exchange() -> Exchange {
        Exchange::new(Request::new(Method::GET, "/"), 2000)
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn chain_runs_forward_then_unwinds_in_reverse() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("a", Flow::RequestResponse, &log)),
            Arc::new(Recording::new("b", Flow::RequestResponse, &log)),
            Arc::new(Recording::new("c", Flow::RequestResponse, &log)),
        ];
        let mut ex = exchange();

        let outcome = FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(
            entries(&log),
            ["a:req", "b:req", "c:req", "c:resp", "b:resp", "a:resp"]
        );
    }

    #[tokio::test]
    async fn returning_interceptor_still_sees_the_response() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("a", Flow::RequestResponse, &log)),
            Arc::new(Recording::new("b", Flow::RequestResponse, &log).on_request(Outcome::Return)),
            Arc::new(Recording::new("c", Flow::RequestResponse, &log)),
        ];
        let mut ex = exchange();

        let outcome = FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(entries(&log), ["a:req", "b:req", "b:resp", "a:resp"]);
    }

    #[tokio::test]
    async fn response_flow_interceptor_skips_the_request_phase() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("tap", Flow::Response, &log)),
            Arc::new(
                Recording::new("client", Flow::RequestResponse, &log).on_request(Outcome::Return),
            ),
        ];
        let mut ex = exchange();

        FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(entries(&log), ["client:req", "client:resp", "tap:resp"]);
    }

    #[tokio::test]
    async fn request_flow_interceptor_is_not_unwound() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("once", Flow::Request, &log)),
            Arc::new(
                Recording::new("client", Flow::RequestResponse, &log).on_request(Outcome::Return),
            ),
        ];
        let mut ex = exchange();

        FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(entries(&log), ["once:req", "client:req", "client:resp"]);
    }

    #[tokio::test]
    async fn abort_skips_the_response_phase() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("a", Flow::RequestResponse, &log)),
            Arc::new(Recording::new("b", Flow::RequestResponse, &log).on_request(Outcome::Abort)),
        ];
        let mut ex = exchange();

        let outcome = FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(outcome, Outcome::Abort);
        assert_eq!(entries(&log), ["a:req", "b:req"]);
    }

    #[tokio::test]
    async fn failed_request_handler_aborts() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("a", Flow::RequestResponse, &log)),
            Arc::new(Recording::new("b", Flow::RequestResponse, &log).failing()),
        ];
        let mut ex = exchange();

        let outcome = FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(outcome, Outcome::Abort);
        assert_eq!(entries(&log), ["a:req", "b:req"]);
    }

    #[tokio::test]
    async fn abort_during_unwind_stops_it() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recording::new("a", Flow::RequestResponse, &log)),
            Arc::new(Recording::new("b", Flow::RequestResponse, &log).on_response(Outcome::Abort)),
            Arc::new(Recording::new("c", Flow::RequestResponse, &log)),
        ];
        let mut ex = exchange();

        let outcome = FlowController::invoke_handlers(&chain, &mut ex).await;

        assert_eq!(outcome, Outcome::Abort);
        assert_eq!(entries(&log), ["a:req", "b:req", "c:req", "c:resp", "b:resp"]);
    }
}
