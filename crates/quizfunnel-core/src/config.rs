use tracing::warn;

/// Fallback pair baked into the client so the funnel works with zero
/// environment configuration, matching the deployed setup. The key is the
/// store's public anonymous-role key, not a secret.
const FALLBACK_STORE_URL: &str = "https://qzfunnel.supabase.co";
const FALLBACK_ANON_KEY: &str = "public-anon-key";

#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub anon_key: String,
}

impl Config {
    /// Environment overrides with the baked-in fallback pair.
    pub fn from_env() -> Self {
        Self {
            store_url: std::env::var("QUIZFUNNEL_STORE_URL")
                .unwrap_or_else(|_| FALLBACK_STORE_URL.to_string()),
            anon_key: std::env::var("QUIZFUNNEL_STORE_KEY")
                .unwrap_or_else(|_| FALLBACK_ANON_KEY.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        url::Url::parse(&self.store_url).is_ok() && !self.anon_key.is_empty()
    }

    /// Warn, without failing, when the endpoint cannot possibly work.
    /// Analytics is best-effort: a bad URL disables it, never the funnel.
    pub fn validate(&self) {
        if !self.is_valid() {
            warn!(
                store_url = %self.store_url,
                "store configuration looks invalid; analytics will not work"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_pair_is_valid() {
        let config = Config {
            store_url: FALLBACK_STORE_URL.to_string(),
            anon_key: FALLBACK_ANON_KEY.to_string(),
        };
        assert!(config.is_valid());
    }

    #[test]
    fn malformed_url_or_empty_key_is_invalid() {
        let config = Config {
            store_url: "not a url".to_string(),
            anon_key: "k".to_string(),
        };
        assert!(!config.is_valid());

        let config = Config {
            store_url: FALLBACK_STORE_URL.to_string(),
            anon_key: String::new(),
        };
        assert!(!config.is_valid());
    }
}
