//! Provision a `DigitalOcean` droplet behind a reserved IP and point a
//! Cloudflare apex record at it.
//!
//! # Overview
//!
//! A run is a [`Pipeline`] of three dependent stages:
//!
//! 1. **Droplet** - create the VM from a [`DropletSpec`] and wait
//!    for the provider to assign an id and bring it up
//! 2. **Reserved IP** - reserve a static address bound to that
//!    droplet id
//! 3. **DNS** - create a proxied `A` record at the zone apex (`@`)
//!    pointing to the reserved address
//!
//! Each stage takes the previous stage's output as its input, so a
//! later stage can never start early. The first failure stops the
//! run and is reported with the stage it happened in. Nothing
//! created by earlier stages is rolled back.
//!
//! Providers plug in through the [`Compute`] and
//! [`DnsProvider`](dns::DnsProvider) traits. The bundled ones are
//! [`DigitalOcean`] and [`Cloudflare`], both talking to the public
//! REST APIs.
//!
//! # Configuration
//!
//! All settings come from the environment and are validated before
//! any network call. Every missing variable is reported at once.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `DROPLET_INSTANCE_NAME` | Unique name for droplet |
//! | `CLOUDFLARE_ZONE_ID` | Cloudflare zone id |
//! | `CLOUDFLARE_API_TOKEN` | Cloudflare API token |
//! | `DO_SSH_PUBLIC_KEY` | SSH key for this droplet |
//! | `DIGITALOCEAN_TOKEN` | `DigitalOcean` API token (or `DIGITALOCEAN_ACCESS_TOKEN`) |
//!
//! # Example
//!
//! ```rust,no_run
//! use anchorage::{Cloudflare, Config, DigitalOcean, Outputs, Pipeline, Plan};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let plan = Plan::from_config(&config);
//!
//!     let pipeline = Pipeline::new(
//!         DigitalOcean::new(&config.digitalocean_token),
//!         Cloudflare::new(&config.cloudflare_token),
//!     );
//!
//!     let mut outputs = Outputs::default();
//!     pipeline.up(&plan, &mut outputs).await?;
//!     print!("{outputs}");
//!     Ok(())
//! }
//! ```
//!
//! Or from the command line:
//!
//! ```sh
//! anchorage env              # show the environment contract
//! anchorage up --dry-run     # print what would be created
//! anchorage up --outputs outputs.json
//! ```
//!
//! [`Compute`]: provision::Compute

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod outputs;
pub mod pipeline;
pub mod provision;

pub use config::Config;
pub use dns::DnsRecord;
pub use dns::cloudflare::Cloudflare;
pub use outputs::Outputs;
pub use pipeline::{Pipeline, Plan};
pub use provision::DropletSpec;
pub use provision::digitalocean::DigitalOcean;
