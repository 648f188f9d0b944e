pub mod cloudflare;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProvisionResult;

/// Record name for the zone apex.
pub const APEX: &str = "@";

/// A DNS record to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    #[serde(skip)]
    pub zone_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub proxied: bool,
    /// 1 lets Cloudflare pick the TTL.
    pub ttl: u32,
}

impl DnsRecord {
    /// Proxied A record at the apex of `zone_id` pointing to `ip`.
    #[must_use]
    pub fn apex_a(zone_id: &str, ip: &str) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            name: APEX.to_string(),
            record_type: "A".to_string(),
            content: ip.to_string(),
            proxied: true,
            ttl: 1,
        }
    }
}

/// A record as reported back by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordInfo {
    pub id: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
}

/// A DNS provider that can create records in a zone.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    async fn create_record(&self, record: &DnsRecord) -> ProvisionResult<DnsRecordInfo>;
}
