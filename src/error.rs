use std::fmt;

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// The pipeline step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Instance,
    ReservedIp,
    DnsRecord,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "droplet creation",
            Self::ReservedIp => "reserved IP creation",
            Self::DnsRecord => "DNS record creation",
        };
        f.write_str(name)
    }
}

/// A required environment variable that was not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVar {
    pub name: String,
    pub description: String,
}

impl fmt::Display for MissingVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("environment variables missing: {}", join_missing(.0))]
    ConfigMissing(Vec<MissingVar>),

    #[error("invalid droplet id '{value}': {source}")]
    InvalidDropletId {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Timeout(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        source: Box<Self>,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProvisionError {
    /// Tag an error with the pipeline stage it came from.
    #[must_use]
    pub fn at(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error is attributed to, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

fn join_missing(vars: &[MissingVar]) -> String {
    vars.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
