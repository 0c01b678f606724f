use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// One device's attributes endpoint: `{host}/api/v1/{token}/attributes`.
///
/// The access token only lives inside the URL path, so neither `Debug`
/// nor `Display` ever print the full URL. Logs see `{host}/api/v1/***/attributes`.
#[derive(Clone)]
pub struct Endpoint {
    host: Url,
    attributes_url: Url,
}

impl Endpoint {
    /// Build the endpoint for an already-normalized host (scheme included).
    ///
    /// Any path on the host is kept as a prefix, so servers mounted under a
    /// sub-path (`https://example.com/tb`) work unchanged.
    pub fn new(host: &str, token: &SecretString) -> Result<Self, Error> {
        let host_url = Url::parse(host)?;

        let mut attributes_url = host_url.clone();
        attributes_url
            .path_segments_mut()
            .map_err(|()| Error::InvalidHost {
                host: host.to_owned(),
            })?
            .pop_if_empty()
            .extend(["api", "v1", token.expose_secret(), "attributes"]);

        Ok(Self {
            host: host_url,
            attributes_url,
        })
    }

    pub(crate) fn attributes_url(&self) -> &Url {
        &self.attributes_url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host.as_str().trim_end_matches('/');
        write!(f, "{host}/api/v1/***/attributes")
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host.as_str())
            .field("token", &"***")
            .finish()
    }
}
