use super::RequestsLoggingLevel;
use crate::config::DEFAULT_HISTORY_LIMIT;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Shared secret for the trigger endpoints, `None` leaves them open.
    pub agents_secret: Option<String>,
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            agents_secret: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}
