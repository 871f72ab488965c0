use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL for the watch record store.
    /// When absent the service runs on in-memory stores.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the response cache. Optional; without it
    /// recommendation and stats responses are computed on every request.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_storage_urls() {
        let config: Config = envy::from_iter::<_, Config>(std::iter::empty::<(String, String)>())
            .expect("empty env should satisfy defaults");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_port_parsed_from_env() {
        let vars = vec![("PORT".to_string(), "8080".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 8080);
    }
}
