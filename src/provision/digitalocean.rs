use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, ProvisionResult};
use crate::provision::{Compute, Droplet, DropletId, DropletSpec, ReservedIp, is_public_key};

pub const DO_API: &str = "https://api.digitalocean.com/v2";

/// `DigitalOcean` compute provider talking to the v2 REST API.
pub struct DigitalOcean {
    client: reqwest::Client,
    token: String,
    base_url: String,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

impl DigitalOcean {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            base_url: DO_API.to_string(),
            poll_attempts: 60,
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Point the client at another API root (a mock server in tests).
    #[must_use]
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn poll(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ProvisionResult<T> {
        self.get_url(&self.url(path)).await
    }

    /// GET an absolute URL, as handed out in pagination links.
    async fn get_url<T: DeserializeOwned>(&self, url: &str) -> ProvisionResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ProvisionResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl Compute for DigitalOcean {
    async fn resolve_ssh_key(&self, key: &str, name: &str) -> ProvisionResult<String> {
        if !is_public_key(key) {
            return Ok(key.to_string());
        }

        let wanted = normalize_key(key);
        let mut url = self.url("/account/keys?per_page=200");
        loop {
            let page: SshKeyList = self.get_url(&url).await?;
            if let Some(existing) = page
                .ssh_keys
                .iter()
                .find(|k| normalize_key(&k.public_key) == wanted)
            {
                tracing::debug!(key_id = existing.id, "SSH key already registered");
                return Ok(existing.id.to_string());
            }
            match page.links.pages.next {
                Some(next) => url = next,
                None => break,
            }
        }

        tracing::info!(name, "registering SSH key");
        let created: SshKeyEnvelope = self
            .post(
                "/account/keys",
                &NewSshKey {
                    name,
                    public_key: key.trim(),
                },
            )
            .await?;
        Ok(created.ssh_key.id.to_string())
    }

    async fn create_droplet(&self, spec: &DropletSpec) -> ProvisionResult<Droplet> {
        tracing::info!(
            name = %spec.name,
            region = %spec.region,
            size = %spec.size,
            image = %spec.image,
            "creating droplet"
        );

        let body = NewDroplet {
            name: &spec.name,
            region: &spec.region,
            size: &spec.size,
            image: &spec.image,
            backups: spec.backups,
            ssh_keys: &spec.ssh_keys,
        };
        let created: DropletEnvelope = self.post("/droplets", &body).await?;
        let id = created.droplet.id.into_id()?;

        Ok(Droplet {
            id,
            name: created.droplet.name,
            region: spec.region.clone(),
        })
    }

    async fn wait_until_active(&self, droplet: &Droplet) -> ProvisionResult<()> {
        let path = format!("/droplets/{}", droplet.id);
        for attempt in 1..=self.poll_attempts {
            let current: DropletEnvelope = self.get(&path).await?;
            tracing::debug!(
                droplet_id = %droplet.id,
                status = %current.droplet.status,
                attempt,
                "polling droplet"
            );
            if current.droplet.status == "active" {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(ProvisionError::Timeout(format!(
            "droplet {} not active after {} attempts",
            droplet.id, self.poll_attempts
        )))
    }

    async fn create_reserved_ip(
        &self,
        droplet_id: DropletId,
        region: &str,
    ) -> ProvisionResult<ReservedIp> {
        tracing::info!(%droplet_id, region, "reserving IP");

        // The API infers the region from the droplet.
        let body = NewReservedIp {
            droplet_id: droplet_id.0,
        };
        let created: ReservedIpEnvelope = self.post("/reserved_ips", &body).await?;

        Ok(ReservedIp {
            ip: created.reserved_ip.ip,
            droplet_id,
            region: region.to_string(),
        })
    }
}

/// Map non-2xx responses to [`ProvisionError::Api`].
async fn check(response: reqwest::Response) -> ProvisionResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await?;
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    Err(ProvisionError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Compare keys by type and key material, ignoring the comment.
fn normalize_key(key: &str) -> String {
    key.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

// ============ API Types ============

/// Droplet ids are numeric, but some responses carry them as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_id(self) -> ProvisionResult<DropletId> {
        match self {
            Self::Number(n) => Ok(DropletId(n)),
            Self::Text(s) => s.parse(),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewDroplet<'a> {
    name: &'a str,
    region: &'a str,
    size: &'a str,
    image: &'a str,
    backups: bool,
    ssh_keys: &'a [String],
}

#[derive(Debug, Deserialize)]
struct DropletEnvelope {
    droplet: ApiDroplet,
}

#[derive(Debug, Deserialize)]
struct ApiDroplet {
    id: RawId,
    name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct NewReservedIp {
    droplet_id: u64,
}

#[derive(Debug, Deserialize)]
struct ReservedIpEnvelope {
    reserved_ip: ApiReservedIp,
}

#[derive(Debug, Deserialize)]
struct ApiReservedIp {
    ip: String,
}

#[derive(Debug, Serialize)]
struct NewSshKey<'a> {
    name: &'a str,
    public_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct SshKeyList {
    #[serde(default)]
    ssh_keys: Vec<ApiSshKey>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Pages,
}

#[derive(Debug, Default, Deserialize)]
struct Pages {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SshKeyEnvelope {
    ssh_key: ApiSshKey,
}

#[derive(Debug, Deserialize)]
struct ApiSshKey {
    id: u64,
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
