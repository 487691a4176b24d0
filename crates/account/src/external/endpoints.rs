use std::collections::BTreeMap;

use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

/// Infrastructure endpoints of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEndpoints {
    /// JSON-RPC node.
    pub rpc_url: String,
    /// ERC-4337 bundler.
    pub bundler_url: String,
    /// Paymaster service.
    pub paymaster_url: String,
}

impl ChainEndpoints {
    fn validate(&self, chain_id: u64) -> Result<(), EndpointError> {
        for url in [&self.rpc_url, &self.bundler_url, &self.paymaster_url] {
            let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"));
            if rest.is_none_or(str::is_empty) {
                return Err(EndpointError::InvalidUrl { chain_id, url: url.clone() });
            }
        }
        Ok(())
    }
}

/// Errors of an [`EndpointRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// No endpoints are registered for the chain.
    #[error("unknown chain {0}")]
    UnknownChain(u64),
    /// An endpoint is not an `http(s)` URL.
    #[error("invalid endpoint url for chain {chain_id}: {url}")]
    InvalidUrl {
        /// Chain the endpoint belongs to
        chain_id: u64,
        /// The rejected URL
        url: String,
    },
    /// The registry document could not be parsed.
    #[error("invalid endpoint configuration: {0}")]
    InvalidConfig(String),
}

/// Resolves a chain id to its infrastructure endpoints.
#[auto_impl(&, Box, Arc)]
pub trait EndpointRegistry {
    /// Returns the endpoints of `chain_id`.
    fn resolve(&self, chain_id: u64) -> Result<ChainEndpoints, EndpointError>;
}

/// An [`EndpointRegistry`] backed by a fixed table.
///
/// The JSON form maps decimal chain ids to endpoints:
///
/// ```json
/// { "10": { "rpcUrl": "https://...", "bundlerUrl": "https://...", "paymasterUrl": "https://..." } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticEndpointRegistry {
    chains: BTreeMap<u64, ChainEndpoints>,
}

impl StaticEndpointRegistry {
    /// Parses and validates a registry document.
    pub fn from_json(json: &str) -> Result<Self, EndpointError> {
        let registry: Self =
            serde_json::from_str(json).map_err(|err| EndpointError::InvalidConfig(err.to_string()))?;
        for (chain_id, endpoints) in &registry.chains {
            endpoints.validate(*chain_id)?;
        }
        Ok(registry)
    }

    /// Adds or replaces the endpoints of `chain_id`.
    pub fn with_chain(
        mut self,
        chain_id: u64,
        endpoints: ChainEndpoints,
    ) -> Result<Self, EndpointError> {
        endpoints.validate(chain_id)?;
        self.chains.insert(chain_id, endpoints);
        Ok(self)
    }

    /// Registered chain ids, ascending.
    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }
}

impl EndpointRegistry for StaticEndpointRegistry {
    fn resolve(&self, chain_id: u64) -> Result<ChainEndpoints, EndpointError> {
        self.chains.get(&chain_id).cloned().ok_or(EndpointError::UnknownChain(chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "10": {
            "rpcUrl": "https://mainnet.optimism.io",
            "bundlerUrl": "https://bundler.omni.app/10",
            "paymasterUrl": "https://paymaster.omni.app/10"
        },
        "137": {
            "rpcUrl": "http://localhost:8545",
            "bundlerUrl": "http://localhost:4337",
            "paymasterUrl": "http://localhost:3000"
        }
    }"#;

    #[test]
    fn test_resolve_from_json() {
        let registry = StaticEndpointRegistry::from_json(CONFIG).unwrap();
        assert_eq!(registry.chain_ids().collect::<Vec<_>>(), vec![10, 137]);
        assert_eq!(registry.resolve(10).unwrap().rpc_url, "https://mainnet.optimism.io");
        assert_eq!(registry.resolve(1), Err(EndpointError::UnknownChain(1)));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let endpoints = ChainEndpoints {
            rpc_url: "wss://node".to_string(),
            bundler_url: "https://b".to_string(),
            paymaster_url: "https://p".to_string(),
        };
        assert!(matches!(
            StaticEndpointRegistry::default().with_chain(1, endpoints),
            Err(EndpointError::InvalidUrl { chain_id: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_non_numeric_chain_id() {
        let json = r#"{ "optimism": { "rpcUrl": "https://a", "bundlerUrl": "https://b", "paymasterUrl": "https://c" } }"#;
        assert!(matches!(
            StaticEndpointRegistry::from_json(json),
            Err(EndpointError::InvalidConfig(_))
        ));
    }
}
