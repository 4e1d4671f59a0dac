//! FKG federation.
//!
//! Remote authorities publish their PKG as a zip at `{endpoint}/pkg/latest`.
//! [`FederationPuller`] downloads it, optionally checks its signature and
//! imports it under the remote's own namespace with every integrity gate on.
//! [`RemoteRegistry`] holds the configured remotes and their trust policy.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
mod pull;
mod registry;

pub use error::{PullError, PullResult};
pub use pull::{FederationPuller, PullOutcome};
pub use registry::RemoteRegistry;
