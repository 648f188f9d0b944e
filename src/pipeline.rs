use std::fmt;

use crate::config::Config;
use crate::dns::{DnsProvider, DnsRecord, DnsRecordInfo};
use crate::error::{ProvisionResult, Stage};
use crate::outputs::Outputs;
use crate::provision::{Compute, Droplet, DropletSpec, ReservedIp};

/// The resources one run will create, resolved from configuration
/// before anything remote happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub droplet: DropletSpec,
    pub zone_id: String,
}

impl Plan {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            droplet: DropletSpec::new(&config.instance_name).ssh_key(&config.ssh_public_key),
            zone_id: config.zone_id.clone(),
        }
    }

    #[must_use]
    pub fn droplet(mut self, spec: DropletSpec) -> Self {
        self.droplet = spec;
        self
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.droplet;
        let preview = DnsRecord::apex_a(&self.zone_id, "<reserved ip>");
        writeln!(f, "1. Droplet '{}'", d.name)?;
        writeln!(f, "     image:   {}", d.image)?;
        writeln!(f, "     region:  {}", d.region)?;
        writeln!(f, "     size:    {}", d.size)?;
        writeln!(f, "     backups: {}", d.backups)?;
        writeln!(f, "     ssh keys: {}", d.ssh_keys.len())?;
        writeln!(f, "2. Reserved IP in {} bound to the droplet", d.region)?;
        writeln!(
            f,
            "3. DNS {} record '{}' in zone {} -> {} (proxied: {})",
            preview.record_type, preview.name, self.zone_id, preview.content, preview.proxied
        )
    }
}

/// Provisioning pipeline: droplet, then reserved IP, then DNS.
///
/// Each stage consumes the previous stage's typed output, so no step
/// can start before the value it depends on exists. The first failure
/// ends the run; nothing already created is rolled back.
pub struct Pipeline {
    compute: Box<dyn Compute>,
    dns: Box<dyn DnsProvider>,
}

impl Pipeline {
    #[must_use]
    pub fn new(compute: impl Compute + 'static, dns: impl DnsProvider + 'static) -> Self {
        Self {
            compute: Box::new(compute),
            dns: Box::new(dns),
        }
    }

    /// Run all three stages, recording outputs into `outputs` as soon
    /// as each becomes known.
    pub async fn up(&self, plan: &Plan, outputs: &mut Outputs) -> ProvisionResult<DnsRecordInfo> {
        let droplet = self
            .create_instance(&plan.droplet)
            .await
            .map_err(|e| e.at(Stage::Instance))?;
        outputs.id = Some(droplet.id.to_string());
        tracing::info!(droplet_id = %droplet.id, "droplet created");

        self.compute
            .wait_until_active(&droplet)
            .await
            .map_err(|e| e.at(Stage::Instance))?;

        let reserved = self
            .reserve_ip(&droplet)
            .await
            .map_err(|e| e.at(Stage::ReservedIp))?;
        outputs.static_address = Some(reserved.ip.clone());
        tracing::info!(ip = %reserved.ip, droplet_id = %droplet.id, "reserved IP assigned");

        let record = self
            .point_dns(&plan.zone_id, &reserved)
            .await
            .map_err(|e| e.at(Stage::DnsRecord))?;
        tracing::info!(record_id = %record.id, name = %record.name, "DNS record created");

        Ok(record)
    }

    async fn create_instance(&self, spec: &DropletSpec) -> ProvisionResult<Droplet> {
        let mut spec = spec.clone();
        let mut keys = Vec::with_capacity(spec.ssh_keys.len());
        for key in &spec.ssh_keys {
            keys.push(self.compute.resolve_ssh_key(key, &spec.name).await?);
        }
        spec.ssh_keys = keys;
        self.compute.create_droplet(&spec).await
    }

    async fn reserve_ip(&self, droplet: &Droplet) -> ProvisionResult<ReservedIp> {
        self.compute
            .create_reserved_ip(droplet.id, &droplet.region)
            .await
    }

    async fn point_dns(
        &self,
        zone_id: &str,
        reserved: &ReservedIp,
    ) -> ProvisionResult<DnsRecordInfo> {
        self.dns
            .create_record(&DnsRecord::apex_a(zone_id, &reserved.ip))
            .await
    }
}
