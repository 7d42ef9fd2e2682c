use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::HttpClient;
use crate::interceptor::{
    AccessLog, Dispatching, HttpClientInterceptor, Interceptor, RuleMatching, UserFlow,
};
use crate::rules::RuleTable;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The assembled gateway: a shared rule table plus the interceptor chain
/// every exchange runs through.
///
/// Ports are opened with [`open_port`](Gateway::open_port); which rules
/// apply to a connection is decided per request from the rule table, so
/// rules can be added and removed while ports are serving.
pub struct Gateway {
    table: Arc<RuleTable>,
    chain: Vec<Arc<dyn Interceptor>>,
    read_timeout: Duration,
    ports: Mutex<HashMap<u16, JoinHandle<()>>>,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// The rule table routing all exchanges of this gateway.
    pub fn table(&self) -> &Arc<RuleTable> {
        &self.table
    }

    pub(crate) fn chain(&self) -> &[Arc<dyn Interceptor>] {
        &self.chain
    }

    pub(crate) fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub(crate) fn register_port(&self, port: u16, acceptor: JoinHandle<()>) {
        let mut ports = self.ports.lock().unwrap_or_else(PoisonError::into_inner);
        ports.insert(port, acceptor);
    }

    pub(crate) fn unregister_port(&self, port: u16) -> Option<JoinHandle<()>> {
        self.ports.lock().unwrap_or_else(PoisonError::into_inner).remove(&port)
    }

    pub(crate) fn unregister_all_ports(&self) -> Vec<(u16, JoinHandle<()>)> {
        self.ports.lock().unwrap_or_else(PoisonError::into_inner).drain().collect()
    }

    /// Whether an accept loop is currently serving this port.
    pub fn is_port_open(&self, port: u16) -> bool {
        self.ports.lock().unwrap_or_else(PoisonError::into_inner).contains_key(&port)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open_ports = self.ports.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("Gateway")
            .field("rules", &self.table.len())
            .field("chain", &self.chain.iter().map(|i| i.name()).collect::<Vec<_>>())
            .field("read_timeout", &self.read_timeout)
            .field("open_ports", &open_ports)
            .finish()
    }
}

/// Configures and assembles a [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayBuilder {
    read_timeout: Duration,
    connect_timeout: Duration,
    adjust_host_header: bool,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            adjust_host_header: true,
        }
    }
}

impl GatewayBuilder {
    /// How long a read on either side may stall before the exchange is
    /// given up.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether forwarded requests get their `Host` header rewritten to the
    /// target address. On by default.
    pub fn adjust_host_header(mut self, adjust: bool) -> Self {
        self.adjust_host_header = adjust;
        self
    }

    pub fn build(self) -> Arc<Gateway> {
        let table = Arc::new(RuleTable::new());
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(AccessLog),
            Arc::new(RuleMatching::new(Arc::clone(&table))),
            Arc::new(Dispatching::new(self.adjust_host_header)),
            Arc::new(UserFlow),
            Arc::new(HttpClientInterceptor::new(HttpClient::new(
                self.connect_timeout,
                self.read_timeout,
            ))),
        ];
        Arc::new(Gateway {
            table,
            chain,
            read_timeout: self.read_timeout,
            ports: Mutex::new(HashMap::new()),
        })
    }
}
