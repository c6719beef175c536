//! Configuration loading for the portal.
//!
//! ```toml
//! [portal]
//! tabs = ["initial_bridge", "swap", "onramp"]
//! enable_onramp = true
//! use_hash_router = false
//! supported_chains = [1, 42161, 33139]
//!
//! [tokens]
//! default_source = { chain_id = 1, address = "0x4d224452801ACEd8B2F0aebE155379bb5D594381" }
//! lock_destination = false
//!
//! [defaults]
//! swap = { source = { chain_id = 33139, address = "0x0000000000000000000000000000000000000000" }, destination = { chain_id = 33139, address = "0xA2235d059F80e176D931Ef76b6C51953Eb3fBEf4" } }
//!
//! [quote]
//! debounce_ms = 300
//!
//! [catalog]
//! path = "tokens.toml"
//! ```

mod tabs;
mod token_list;
mod tokens;

pub use tabs::{TabConfig, TabConfigError};
pub use token_list::{RouteRule, StablePair, TokenList, TokenListError};
pub use tokens::{DefaultAmount, TokenConfig, TokenConfigError};

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portal_types::{
    APE_USD_OMNICHAIN, APECOIN_ETHEREUM, Address, ChainId, NATIVE_TOKEN_ADDRESS, TabEntry, TokenId,
};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "PORTAL_CONFIG";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

// Default value function for serde (bool::default() is false, so only true needs a fn)
const fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Raw config file contents. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct PortalConfig {
    pub portal: Option<PortalSection>,
    pub tokens: Option<TokenConfig>,
    pub defaults: Option<DefaultsSection>,
    pub quote: Option<QuoteSection>,
    pub catalog: Option<CatalogSection>,
    /// Directory of the file this was loaded from; relative paths resolve against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct PortalSection {
    pub tabs: Option<Vec<TabEntry>>,
    #[serde(default = "default_true")]
    pub enable_onramp: bool,
    /// Let `#bridge`, `#swap/<chain>/<token>` style fragments drive the portal.
    #[serde(default)]
    pub use_hash_router: bool,
    #[serde(default)]
    pub enable_solana_redirect: bool,
    /// Receiver override for every quote.
    pub destination_address: Option<Address>,
    pub supported_chains: Option<Vec<ChainId>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefaultsSection {
    pub bridge: Option<PairSpec>,
    pub swap: Option<PairSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteSection {
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSection {
    pub path: Option<PathBuf>,
}

/// A token pair by reference; metadata is looked up in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PairSpec {
    pub source: TokenId,
    pub destination: TokenId,
}

/// Known-good pairs used whenever automatic resolution gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalSpec {
    pub bridge: PairSpec,
    pub swap: PairSpec,
}

impl Default for CanonicalSpec {
    fn default() -> Self {
        Self {
            bridge: PairSpec {
                source: TokenId::new(ChainId::ETHEREUM, APECOIN_ETHEREUM),
                destination: TokenId::new(ChainId::APE, NATIVE_TOKEN_ADDRESS),
            },
            swap: PairSpec {
                source: TokenId::new(ChainId::APE, NATIVE_TOKEN_ADDRESS),
                destination: TokenId::new(ChainId::APE, APE_USD_OMNICHAIN),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub enable_onramp: bool,
    pub use_hash_router: bool,
    pub enable_solana_redirect: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_onramp: true,
            use_hash_router: false,
            enable_solana_redirect: false,
        }
    }
}

/// Validated configuration, ready to build a portal from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub tabs: TabConfig,
    pub flags: FeatureFlags,
    pub tokens: TokenConfig,
    pub canonical: CanonicalSpec,
    pub supported_chains: Vec<ChainId>,
    pub debounce: Duration,
    pub destination_address: Option<Address>,
    pub catalog_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        PortalConfig::default().resolve()
    }
}

#[must_use]
pub fn default_supported_chains() -> Vec<ChainId> {
    vec![ChainId::ETHEREUM, ChainId::ARBITRUM, ChainId::APE]
}

impl PortalConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "Failed to read config");
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match Self::from_toml_str(&content) {
            Ok(mut config) => {
                config.base_dir = path.parent().map(Path::to_path_buf);
                Ok(Some(config))
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "Failed to parse config");
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply defaults and validate. Invalid pieces fall back with a warning.
    /// Default pairs are checked against the catalog when the portal is built.
    #[must_use]
    pub fn resolve(self) -> ResolvedConfig {
        let flags = self
            .portal
            .as_ref()
            .map(|portal| FeatureFlags {
                enable_onramp: portal.enable_onramp,
                use_hash_router: portal.use_hash_router,
                enable_solana_redirect: portal.enable_solana_redirect,
            })
            .unwrap_or_default();

        let tabs = TabConfig::resolve_or_default(
            self.portal.as_ref().and_then(|portal| portal.tabs.clone()),
        );

        let supported_chains = match self
            .portal
            .as_ref()
            .and_then(|portal| portal.supported_chains.clone())
        {
            Some(chains) if !chains.is_empty() => chains,
            Some(_) => {
                tracing::warn!("supported_chains is empty; using built-in chain set");
                default_supported_chains()
            }
            None => default_supported_chains(),
        };

        let mut canonical = CanonicalSpec::default();
        if let Some(defaults) = self.defaults {
            if let Some(bridge) = defaults.bridge {
                canonical.bridge = bridge;
            }
            if let Some(swap) = defaults.swap {
                canonical.swap = swap;
            }
        }

        let debounce = self
            .quote
            .and_then(|quote| quote.debounce_ms)
            .map_or(DEFAULT_DEBOUNCE, Duration::from_millis);

        let catalog_path = self
            .catalog
            .and_then(|catalog| catalog.path)
            .map(|path| match &self.base_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path,
            });

        ResolvedConfig {
            tabs,
            flags,
            tokens: self.tokens.unwrap_or_default(),
            canonical,
            supported_chains,
            debounce,
            destination_address: self.portal.and_then(|portal| portal.destination_address),
            catalog_path,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".portal").join("config.toml"))
}

/// Log file locations, most preferred first: `logs/portal.log` beside the
/// config file, then under `./.portal`.
#[must_use]
pub fn log_path_candidates() -> Vec<PathBuf> {
    let beside_config = config_path()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("logs").join("portal.log"));
    beside_config
        .into_iter()
        .chain([PathBuf::from(".portal").join("logs").join("portal.log")])
        .collect()
}
