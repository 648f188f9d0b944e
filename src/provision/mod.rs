pub mod digitalocean;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{ProvisionError, ProvisionResult};

pub const DEFAULT_IMAGE: &str = "ubuntu-24-10-x64";
pub const DEFAULT_REGION: &str = "syd1";
pub const DEFAULT_SIZE: &str = "s-1vcpu-1gb";

/// Provider-assigned droplet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropletId(pub u64);

impl fmt::Display for DropletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DropletId {
    type Err = ProvisionError;

    /// Parse an identifier that arrived as text. Never defaults.
    fn from_str(s: &str) -> ProvisionResult<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|source| ProvisionError::InvalidDropletId {
                value: s.to_string(),
                source,
            })
    }
}

/// What to create in step one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropletSpec {
    pub name: String,
    pub image: String,
    pub region: String,
    pub size: String,
    pub backups: bool,
    pub ssh_keys: Vec<String>,
}

impl DropletSpec {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            region: DEFAULT_REGION.to_string(),
            size: DEFAULT_SIZE.to_string(),
            backups: true,
            ssh_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    #[must_use]
    pub fn region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    #[must_use]
    pub fn size(mut self, size: &str) -> Self {
        self.size = size.to_string();
        self
    }

    #[must_use]
    pub const fn backups(mut self, enabled: bool) -> Self {
        self.backups = enabled;
        self
    }

    #[must_use]
    pub fn ssh_key(mut self, key: &str) -> Self {
        self.ssh_keys.push(key.to_string());
        self
    }
}

/// A created droplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Droplet {
    pub id: DropletId,
    pub name: String,
    pub region: String,
}

/// A reserved IP bound to a droplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedIp {
    pub ip: String,
    pub droplet_id: DropletId,
    pub region: String,
}

/// A compute provider: creates droplets and reserved IPs.
#[async_trait]
pub trait Compute: Send + Sync {
    /// Turn a configured SSH key into something the provider accepts
    /// in [`DropletSpec::ssh_keys`].
    async fn resolve_ssh_key(&self, key: &str, _name: &str) -> ProvisionResult<String> {
        Ok(key.to_string())
    }

    /// Create a droplet. Returns once the provider has assigned an id.
    async fn create_droplet(&self, spec: &DropletSpec) -> ProvisionResult<Droplet>;

    /// Block until the droplet can accept a reserved IP.
    async fn wait_until_active(&self, _droplet: &Droplet) -> ProvisionResult<()> {
        Ok(())
    }

    /// Reserve a static IP bound to `droplet_id` in `region`.
    async fn create_reserved_ip(
        &self,
        droplet_id: DropletId,
        region: &str,
    ) -> ProvisionResult<ReservedIp>;
}

/// True for OpenSSH public key text as opposed to a key id or
/// fingerprint.
#[must_use]
pub fn is_public_key(key: &str) -> bool {
    let key = key.trim_start();
    ["ssh-", "ecdsa-", "sk-"]
        .iter()
        .any(|prefix| key.starts_with(prefix))
}
