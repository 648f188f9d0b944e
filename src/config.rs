//! Environment-driven configuration.
//!
//! Every variable is declared up front in [`VARS`] with its name,
//! description and flags. [`Config::from_env`] reads all of them
//! eagerly and reports every missing one in a single
//! [`ProvisionError::ConfigMissing`], so nothing remote is touched
//! until the whole contract is satisfied.

use std::fmt::{self, Write};

use crate::error::{MissingVar, ProvisionError, ProvisionResult};

pub const DROPLET_INSTANCE_NAME: &str = "DROPLET_INSTANCE_NAME";
pub const CLOUDFLARE_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
pub const CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
pub const DO_SSH_PUBLIC_KEY: &str = "DO_SSH_PUBLIC_KEY";
pub const DIGITALOCEAN_TOKEN: &str = "DIGITALOCEAN_TOKEN";

/// Ambient name used by `doctl` and the `DigitalOcean` provider plugins.
pub const DIGITALOCEAN_ACCESS_TOKEN: &str = "DIGITALOCEAN_ACCESS_TOKEN";

/// Declaration of one environment variable.
#[derive(Debug, Clone, Copy)]
pub struct EnvVar {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub sensitive: bool,
    /// Consulted when `name` is unset.
    pub fallback: Option<&'static str>,
}

pub const VARS: &[EnvVar] = &[
    EnvVar {
        name: DROPLET_INSTANCE_NAME,
        description: "Unique name for droplet",
        required: true,
        sensitive: false,
        fallback: None,
    },
    EnvVar {
        name: CLOUDFLARE_ZONE_ID,
        description: "Cloudflare zone id",
        required: true,
        sensitive: false,
        fallback: None,
    },
    EnvVar {
        name: CLOUDFLARE_API_TOKEN,
        description: "Cloudflare API token",
        required: true,
        sensitive: true,
        fallback: None,
    },
    EnvVar {
        name: DO_SSH_PUBLIC_KEY,
        description: "SSH key for this droplet",
        required: true,
        sensitive: false,
        fallback: None,
    },
    EnvVar {
        name: DIGITALOCEAN_TOKEN,
        description: "DigitalOcean API token",
        required: true,
        sensitive: true,
        fallback: Some(DIGITALOCEAN_ACCESS_TOKEN),
    },
];

impl EnvVar {
    /// Resolve this variable through `lookup`, trying the fallback
    /// name when the primary one is unset. Blank values count as
    /// unset.
    pub fn resolve<F>(&self, lookup: &F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        read(self.name).or_else(|| self.fallback.and_then(read))
    }
}

/// Validated configuration for one provisioning run.
#[derive(Clone)]
pub struct Config {
    pub instance_name: String,
    pub zone_id: String,
    pub cloudflare_token: String,
    pub ssh_public_key: String,
    pub digitalocean_token: String,
}

impl Config {
    /// Read and validate configuration from the process environment.
    pub fn from_env() -> ProvisionResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read and validate configuration through an arbitrary lookup.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use anchorage::config::Config;
    ///
    /// let env: HashMap<&str, &str> = HashMap::from([
    ///     ("DROPLET_INSTANCE_NAME", "web-01"),
    ///     ("CLOUDFLARE_ZONE_ID", "zone123"),
    ///     ("CLOUDFLARE_API_TOKEN", "cf-token"),
    ///     ("DO_SSH_PUBLIC_KEY", "ssh-rsa AAAA"),
    ///     ("DIGITALOCEAN_ACCESS_TOKEN", "do-token"),
    /// ]);
    /// let config = Config::from_lookup(|k| env.get(k).map(|v| (*v).to_string())).unwrap();
    /// assert_eq!(config.digitalocean_token, "do-token");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> ProvisionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values: Vec<Option<String>> = VARS.iter().map(|var| var.resolve(&lookup)).collect();

        let missing: Vec<MissingVar> = VARS
            .iter()
            .zip(&values)
            .filter(|(var, value)| var.required && value.is_none())
            .map(|(var, _)| MissingVar {
                name: var.name.to_string(),
                description: var.description.to_string(),
            })
            .collect();
        if !missing.is_empty() {
            return Err(ProvisionError::ConfigMissing(missing));
        }

        let get = |name: &str| {
            VARS.iter()
                .position(|var| var.name == name)
                .and_then(|i| values.get(i).cloned().flatten())
                .unwrap_or_default()
        };
        Ok(Self {
            instance_name: get(DROPLET_INSTANCE_NAME),
            zone_id: get(CLOUDFLARE_ZONE_ID),
            cloudflare_token: get(CLOUDFLARE_API_TOKEN),
            ssh_public_key: get(DO_SSH_PUBLIC_KEY),
            digitalocean_token: get(DIGITALOCEAN_TOKEN),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("instance_name", &self.instance_name)
            .field("zone_id", &self.zone_id)
            .field("cloudflare_token", &"<redacted>")
            .field("ssh_public_key", &self.ssh_public_key)
            .field("digitalocean_token", &"<redacted>")
            .finish()
    }
}

/// One row of the environment description table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Rendered value, `None` when unset. Sensitive values are masked.
    pub value: Option<String>,
}

/// Describe every declared variable as seen through `lookup`.
pub fn describe<F>(lookup: F) -> Vec<VarStatus>
where
    F: Fn(&str) -> Option<String>,
{
    VARS.iter()
        .map(|var| VarStatus {
            name: var.name,
            description: var.description,
            required: var.required,
            value: var.resolve(&lookup).map(|v| {
                if var.sensitive {
                    "********".to_string()
                } else {
                    v
                }
            }),
        })
        .collect()
}

/// Render the description table as aligned text.
#[must_use]
pub fn render_table(rows: &[VarStatus]) -> String {
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let flag = if row.required { "required" } else { "optional" };
        let status = match &row.value {
            Some(v) => format!("= {v}"),
            None if row.required => "✗ unset".to_string(),
            None => "- unset".to_string(),
        };
        let fallback = VARS
            .iter()
            .find(|v| v.name == row.name)
            .and_then(|v| v.fallback)
            .map(|f| format!(" (or {f})"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<width$}  {flag:<8}  {}{fallback}  {status}",
            row.name, row.description
        );
    }
    out
}
