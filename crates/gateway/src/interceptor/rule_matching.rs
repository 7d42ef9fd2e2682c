use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use portico_http::protocol::{Message, Response};
use tracing::debug;

use crate::exchange::{Exchange, keys};
use crate::interceptor::{Flow, Interceptor, InterceptorError, Outcome};
use crate::rules::RuleTable;

/// Binds each exchange to the first rule matching its coordinates, or
/// answers 404 when nothing does.
///
/// Also stamps the client address onto `X-Forwarded-For` once the request
/// is known to be forwarded somewhere.
#[derive(Debug)]
pub struct RuleMatching {
    table: Arc<RuleTable>,
}

impl RuleMatching {
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl Interceptor for RuleMatching {
    fn name(&self) -> &str {
        "rule-matching"
    }

    fn flow(&self) -> Flow {
        Flow::Request
    }

    async fn handle_request(&self, exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        let port = exchange.listen_port();
        let request = exchange.request();
        let host = request.header().host().unwrap_or("");
        let rule = self.table.match_rule(host, request.method().as_str(), request.path(), port);

        let Some(rule) = rule else {
            debug!(host, path = request.path(), port, "no rule matched");
            exchange.set_response(Response::error_page(
                StatusCode::NOT_FOUND,
                "This request was not mapped to any service.",
            ));
            return Ok(Outcome::Return);
        };

        debug!(rule = rule.name(), "matched");
        exchange.set_rule(rule);

        if let Some(ip) = exchange.property::<String>(keys::SOURCE_IP).cloned() {
            exchange.request_mut().header_mut().append_x_forwarded_for(&ip);
        }
        Ok(Outcome::Continue)
    }
}
