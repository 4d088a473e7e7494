//! Node candidate validation

use super::config::NodeCandidate;
use url::Url;

/// Longest accepted node name, after trimming
pub const MAX_NAME_LENGTH: usize = 64;

/// Checks a candidate node for well-formedness
pub trait NodeValidator: Send + Sync {
    /// Returns an error message if the candidate is not acceptable
    fn check(&self, candidate: &NodeCandidate) -> Option<String>;
}

/// Default validator: non-empty name and absolute http(s) endpoint URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlNodeValidator;

impl NodeValidator for UrlNodeValidator {
    fn check(&self, candidate: &NodeCandidate) -> Option<String> {
        let name = candidate.name.trim();
        if name.is_empty() {
            return Some("Invalid node name provided".to_string());
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Some(format!(
                "Node name must be at most {} characters",
                MAX_NAME_LENGTH
            ));
        }

        let endpoints = [
            ("full node", &candidate.full),
            ("solidity node", &candidate.solidity),
            ("event server", &candidate.event),
        ];

        endpoints
            .iter()
            .find(|(_, url)| !is_valid_endpoint(url))
            .map(|(label, _)| format!("Invalid {} provided", label))
    }
}

fn is_valid_endpoint(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
