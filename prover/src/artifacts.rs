//! Retrieval of proving artifacts from HTTP endpoints or the local
//! filesystem. The prover treats both uniformly so deployments can serve the
//! circuit and keys from a static host while development reads them straight
//! out of the keygen output directory.

use crate::error::FetchError;
use std::path::PathBuf;
use std::time::Duration;

/// Where one artifact lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactSource {
    Http(String),
    File(PathBuf),
}

impl ArtifactSource {
    /// Interpret a configuration string: anything with an HTTP scheme is a
    /// URL, everything else is a filesystem path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ArtifactSource::Http(value.to_string())
        } else {
            ArtifactSource::File(PathBuf::from(value))
        }
    }
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactSource::Http(url) => write!(f, "{url}"),
            ArtifactSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches artifact bytes with a bounded timeout on the HTTP path.
#[derive(Clone, Debug)]
pub struct ArtifactFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl ArtifactFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn fetch(&self, source: &ArtifactSource) -> Result<Vec<u8>, FetchError> {
        match source {
            ArtifactSource::Http(url) => {
                let exchange = async {
                    let response = self.http.get(url).send().await?;
                    let status = response.status();
                    if !status.is_success() {
                        return Err(FetchError::Status {
                            status: status.as_u16(),
                            url: url.clone(),
                        });
                    }
                    Ok(response.bytes().await?.to_vec())
                };
                tokio::time::timeout(self.timeout, exchange)
                    .await
                    .map_err(|_| FetchError::Timeout(self.timeout))?
            }
            ArtifactSource::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}
