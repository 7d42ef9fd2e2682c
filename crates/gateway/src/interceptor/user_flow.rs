use async_trait::async_trait;
use http::StatusCode;
use portico_http::protocol::Response;
use tracing::warn;

use crate::exchange::Exchange;
use crate::interceptor::{FlowController, Interceptor, InterceptorError, Outcome};

/// Enforces the matched rule's block flags and runs the interceptors
/// configured on it.
///
/// The rule's interceptors push onto the same exchange stack as the global
/// chain, so their response handlers take part in the one shared unwind.
#[derive(Debug)]
pub struct UserFlow;

#[async_trait]
impl Interceptor for UserFlow {
    fn name(&self) -> &str {
        "user-flow"
    }

    async fn handle_request(&self, exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        let Some(rule) = exchange.rule().cloned() else {
            warn!("exchange reached the user flow without a rule");
            exchange.set_response(Response::error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The gateway could not route this request.",
            ));
            return Ok(Outcome::Return);
        };

        if rule.request_blocked() {
            warn!(rule = rule.name(), "request blocked");
            exchange.set_response(Response::error_page(
                StatusCode::FORBIDDEN,
                "This request was blocked.",
            ));
            return Ok(Outcome::Return);
        }

        Ok(FlowController::run_request_phase(rule.interceptors(), exchange).await)
    }

    async fn handle_response(&self, exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        let Some(rule) = exchange.rule().cloned() else {
            return Ok(Outcome::Continue);
        };

        if rule.response_blocked() {
            warn!(rule = rule.name(), "response blocked");
            exchange.set_response(Response::error_page(
                StatusCode::FORBIDDEN,
                "The response from the service was blocked.",
            ));
        }
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::Flow;
    use crate::rules::{Rule, RuleKey, Target};
    use http::Method;
    use portico_http::protocol::{Message, Request};
    use std::sync::Arc;

    struct Marking;

    #[async_trait]
    impl Interceptor for Marking {
        fn name(&self) -> &str {
            "marking"
        }

        async fn handle_request(
            &self,
            exchange: &mut Exchange,
        ) -> Result<Outcome, InterceptorError> {
            exchange.set_property("marked", true);
            Ok(Outcome::Continue)
        }
    }

    struct Answering;

    #[async_trait]
    impl Interceptor for Answering {
        fn name(&self) -> &str {
            "answering"
        }

        fn flow(&self) -> Flow {
            Flow::Request
        }

        async fn handle_request(
            &self,
            exchange: &mut Exchange,
        ) -> Result<Outcome, InterceptorError> {
            exchange.set_response(Response::ok().body("answered locally").build());
            Ok(Outcome::Return)
        }
    }

    fn rule() -> Rule {
        let key = RuleKey::new("*", "*", ".*", 2000).unwrap();
        Rule::new(key, Target::forward("backend", 3000))
    }

    fn exchange_with(rule: Rule) -> Exchange {
        let mut ex = Exchange::new(Request::new(Method::GET, "/"), 2000);
        ex.set_rule(Arc::new(rule));
        ex
    }

    #[tokio::test]
    async fn blocked_request_is_answered_403() {
        let mut ex = exchange_with(rule().block_request(true));

        let outcome = UserFlow.handle_request(&mut ex).await.unwrap();

        assert_eq!(outcome, Outcome::Return);
        assert_eq!(ex.response().unwrap().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blocked_response_is_replaced_with_403() {
        let mut ex = exchange_with(rule().block_response(true));
        ex.set_response(Response::ok().body("secret").build());

        UserFlow.handle_response(&mut ex).await.unwrap();

        let response = ex.response().unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.body().content().unwrap().as_ref().starts_with(b"secret"));
    }

    #[tokio::test]
    async fn rule_interceptors_run_and_join_the_stack() {
        let mut ex = exchange_with(rule().with_interceptor(Arc::new(Marking)));

        let outcome = UserFlow.handle_request(&mut ex).await.unwrap();

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(ex.property::<bool>("marked"), Some(&true));
        assert_eq!(ex.stack_len(), 1);
    }

    #[tokio::test]
    async fn rule_interceptor_can_answer_locally() {
        let mut ex = exchange_with(rule().with_interceptor(Arc::new(Answering)));

        let outcome = UserFlow.handle_request(&mut ex).await.unwrap();

        assert_eq!(outcome, Outcome::Return);
        assert_eq!(
            ex.response().unwrap().body().content().unwrap().as_ref(),
            b"answered locally"
        );
    }

    #[tokio::test]
    async fn missing_rule_is_a_server_error() {
        let mut ex = Exchange::new(Request::new(Method::GET, "/"), 2000);

        let outcome = UserFlow.handle_request(&mut ex).await.unwrap();

        assert_eq!(outcome, Outcome::Return);
        assert_eq!(ex.response().unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
