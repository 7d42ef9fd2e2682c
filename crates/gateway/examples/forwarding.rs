//! A minimal forwarding gateway: everything arriving on port 2000 is
//! proxied to a single local upstream service.
//!
//! Run an upstream on 127.0.0.1:3000, then:
//!
//! ```shell
//! cargo run --example forwarding
//! curl -v http://127.0.0.1:2000/
//! ```

use portico_gateway::Gateway;
use portico_gateway::rules::{Rule, RuleKey, Target};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let gateway = Gateway::builder().build();

    let key = RuleKey::new("*", "*", ".*", 2000)?;
    let rule = Rule::new(key, Target::forward("127.0.0.1", 3000)).named("everything");
    gateway.add_rule(rule).await?;

    info!(port = 2000, upstream = "127.0.0.1:3000", "gateway is forwarding");
    std::future::pending::<()>().await;
    Ok(())
}
