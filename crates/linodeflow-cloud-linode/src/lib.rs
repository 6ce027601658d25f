//! Linode provider for linodeflow
//!
//! Implements [`linodeflow_cloud::CloudProvider`] for Linode through the
//! v4 REST API. Resource types:
//!
//! - `sshkey`: profile SSH keys
//! - `instance`: Linode instances
//! - `volume`: block storage volumes, attachable to an instance
//! - `image`: private images captured from an instance disk
//!
//! # Example
//!
//! ```ignore
//! use linodeflow_cloud::{CloudProvider, GlobalState};
//! use linodeflow_cloud_linode::{LinodeProvider, ProviderConfig};
//!
//! let provider = LinodeProvider::new(ProviderConfig::from_env()?);
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let mut state = GlobalState::new();
//! let plan = provider.plan(&desired, &state).await?;
//! provider.apply(&plan, &mut state).await?;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod provider;
pub mod resources;
pub mod wait;

#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

pub use api::LinodeApi;
pub use client::{DEFAULT_API_URL, LinodeClient, ProviderConfig};
pub use error::{LinodeError, Result};
pub use provider::{LinodeProvider, PROVIDER_NAME};
pub use resources::{ImageResource, InstanceResource, SshKeyResource, VolumeResource};

#[cfg(any(test, feature = "test-utils"))]
pub use fake::FakeLinode;
