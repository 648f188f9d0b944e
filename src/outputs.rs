use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::ProvisionResult;

/// Named results of a run. Fields fill in as stages complete, so a
/// failed run still reports what it created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outputs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "staticAddress", skip_serializing_if = "Option::is_none")]
    pub static_address: Option<String>,
}

impl Outputs {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_none() && self.static_address.is_none()
    }

    pub fn to_json(&self) -> ProvisionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> ProvisionResult<()> {
        std::fs::write(path, self.to_json()? + "\n")?;
        Ok(())
    }
}

impl fmt::Display for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.id {
            writeln!(f, "id: {id}")?;
        }
        if let Some(ip) = &self.static_address {
            writeln!(f, "staticAddress: {ip}")?;
        }
        Ok(())
    }
}
