use crate::client::jsdelivr::DEFAULT_BASE_URL;
use crate::error::Result;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Prefix of the environment variables read by [`KitConfig::from_env`].
pub const ENV_PREFIX: &str = "TASBIHKIT_";

/// Configuration for the HTTP-backed client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitConfig {
    /// Directory URL the `{category}.json` files are served from.
    pub base_url: String,
    /// Transport-level timeout per request. `None` leaves it to the HTTP backend.
    pub request_timeout_secs: Option<u64>,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl KitConfig {
    /// Defaults overlaid with `TASBIHKIT_*` environment variables,
    /// e.g. `TASBIHKIT_BASE_URL` or `TASBIHKIT_REQUEST_TIMEOUT_SECS`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(KitConfig::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::figment().extract()?)
    }
}
