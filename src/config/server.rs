use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "127.0.0.1")
    pub host: String,

    /// Port number to bind to (e.g., 3001)
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, as handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL a client on this machine would use to reach the server.
    pub fn default_base_url(&self) -> String {
        format!("http://{}", self.bind_addr())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("SERVER_HOST must not be empty".to_string());
        }
        Ok(())
    }
}
