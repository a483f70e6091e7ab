use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::MolscreenError;

/// An allowlist-capped HTTP client that only talks to the remote data
/// services the pipeline depends on. Every request URL is checked against
/// the allowlist before the request is built.
#[derive(Debug, Clone)]
pub struct NetClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl NetClient {
    /// Creates a new client with the default allowlist of data hosts.
    pub fn new() -> Result<Self, MolscreenError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "www.ebi.ac.uk",    // ChEMBL web services
            "s3.amazonaws.com", // Drug Repurposing Hub bulk files
            "data.clue.io",     // Repurposing Hub alternate host
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(MolscreenError::Http)?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current allowlist.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder pattern for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, MolscreenError> {
        if !self.is_allowed(url) {
            return Err(MolscreenError::Security(format!(
                "domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }
}
