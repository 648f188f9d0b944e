use async_trait::async_trait;
use serde::Deserialize;

use crate::dns::{DnsProvider, DnsRecord, DnsRecordInfo};
use crate::error::{ProvisionError, ProvisionResult};

pub const CF_API: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare DNS provider using the v4 REST API.
///
/// The token needs `Zone > DNS > Edit` on the target zone.
pub struct Cloudflare {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl Cloudflare {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            base_url: CF_API.to_string(),
        }
    }

    #[must_use]
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl DnsProvider for Cloudflare {
    async fn create_record(&self, record: &DnsRecord) -> ProvisionResult<DnsRecordInfo> {
        tracing::info!(
            zone_id = %record.zone_id,
            name = %record.name,
            content = %record.content,
            proxied = record.proxied,
            "creating DNS record"
        );

        let url = format!("{}/zones/{}/dns_records", self.base_url, record.zone_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let api_response: ApiResponse<ApiDnsRecord> = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ProvisionError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }
            Err(e) => return Err(e.into()),
        };

        match api_response.result {
            Some(r) if api_response.success => Ok(DnsRecordInfo {
                id: r.id,
                name: r.name,
                content: r.content,
                proxied: r.proxied,
            }),
            _ => {
                let message = api_response
                    .errors
                    .first()
                    .map_or_else(|| "Unknown error".to_string(), |e| e.message.clone());
                Err(ProvisionError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiDnsRecord {
    id: String,
    name: String,
    content: String,
    #[serde(default)]
    proxied: bool,
}
