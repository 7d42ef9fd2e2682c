use async_trait::async_trait;
use tracing::info;

use crate::exchange::Exchange;
use crate::interceptor::{Flow, Interceptor, InterceptorError, Outcome};

/// Writes one line per exchange once its response is known.
///
/// Registered first so its response handler is the last to run, after every
/// other interceptor had its say.
#[derive(Debug)]
pub struct AccessLog;

#[async_trait]
impl Interceptor for AccessLog {
    fn name(&self) -> &str {
        "access-log"
    }

    fn flow(&self) -> Flow {
        Flow::Response
    }

    async fn handle_response(&self, exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        let status = exchange.response().map_or(0, |r| r.status().as_u16());
        let rule = exchange.rule().map_or("-", |r| r.name());
        info!(
            method = %exchange.request().method(),
            uri = exchange.request().uri(),
            status,
            rule,
            elapsed_ms = exchange.elapsed().as_millis() as u64,
            "exchange completed"
        );
        Ok(Outcome::Continue)
    }
}
