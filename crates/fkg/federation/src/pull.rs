//! Fetch, verify and import a remote authority's PKG.
//!
//! A pull is `GET {endpoint}/pkg/latest` → zip on disk → extracted PKG →
//! optional signature check → import under the remote's namespace. The
//! download and extraction live in a [`tempfile::TempDir`] that is removed on
//! every exit path.

use crate::error::{PullError, PullResult};
use crate::registry::RemoteRegistry;
use fkg_pkg::{
    import_pkg, unpack_pkg, Authority, ImportOptions, ImportStats, PkgContext, SignatureVerifier,
    StubVerifier,
};
use fkg_storage::GraphStore;
use fkg_types::{FederationSettings, RemoteConfig};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Per-remote result of [`FederationPuller::pull_all_remotes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ImportStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PullResult<ImportStats>> for PullOutcome {
    fn from(result: PullResult<ImportStats>) -> Self {
        match result {
            Ok(stats) => Self {
                success: true,
                stats: Some(stats),
                error: None,
            },
            Err(err) => Self {
                success: false,
                stats: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// A downloaded and extracted PKG. Dropping it deletes the files.
struct FetchedPkg {
    _workdir: TempDir,
    root: PathBuf,
}

/// Pulls PKGs from remote authorities into a local store.
pub struct FederationPuller {
    client: Client,
    ctx: PkgContext,
    verifier: Arc<dyn SignatureVerifier>,
    max_concurrent_pulls: usize,
    /// Parent of the per-pull temp dirs; the system temp dir when unset
    work_dir: Option<PathBuf>,
    // Downloads run in parallel, imports one at a time
    import_lock: Mutex<()>,
}

impl FederationPuller {
    /// Build a puller with the placeholder signature verifier.
    pub fn new(ctx: PkgContext, settings: &FederationSettings) -> PullResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.pull_timeout_secs))
            .build()
            .map_err(PullError::Client)?;
        let verifier = Arc::new(StubVerifier::new(ctx.validator.clone()));

        Ok(Self {
            client,
            ctx,
            verifier,
            max_concurrent_pulls: settings.max_concurrent_pulls.max(1),
            work_dir: None,
            import_lock: Mutex::new(()),
        })
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Pull one remote.
    ///
    /// `verify_signatures` overrides the remote's trust policy when set.
    /// Checksums and structural validation are always enforced, and records
    /// are always owned by `remote.id`.
    pub async fn pull_remote<S>(
        &self,
        store: &S,
        remote: &RemoteConfig,
        verify_signatures: Option<bool>,
    ) -> PullResult<ImportStats>
    where
        S: GraphStore + ?Sized,
    {
        let fetched = self.fetch(remote).await?;

        let verify = verify_signatures.unwrap_or(remote.trust.verify_signatures);
        if verify {
            self.check_signature(remote, &fetched)?;
        }

        let options = ImportOptions {
            authority: Authority::Remote(remote.id.clone()),
            verify_checksums: true,
            validate: true,
            allow_entity_types: Some(remote.trust.allow_entity_types.clone()),
        };

        let _guard = self.import_lock.lock().await;
        let stats = import_pkg(&self.ctx, store, &fetched.root, &options)
            .await
            .map_err(PullError::Import)?;

        info!(
            remote = %remote.id,
            entities = stats.entities,
            edges = stats.edges,
            sources = stats.sources,
            skipped = stats.skipped,
            "pulled remote"
        );
        Ok(stats)
    }

    /// Pull every remote in the registry. A failing remote is reported in
    /// its own outcome and never stops the others.
    pub async fn pull_all_remotes<S>(
        &self,
        store: &S,
        registry: &RemoteRegistry,
    ) -> BTreeMap<String, PullOutcome>
    where
        S: GraphStore + ?Sized,
    {
        stream::iter(registry.list())
            .map(|remote| async move {
                let result = self.pull_remote(store, remote, None).await;
                if let Err(err) = &result {
                    error!(remote = %remote.id, error = %err, "pull failed");
                }
                (remote.id.clone(), PullOutcome::from(result))
            })
            .buffer_unordered(self.max_concurrent_pulls)
            .collect()
            .await
    }

    async fn fetch(&self, remote: &RemoteConfig) -> PullResult<FetchedPkg> {
        let url = remote.pkg_url();
        info!(remote = %remote.id, %url, "fetching pkg");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| PullError::Fetch {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PullError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(|source| PullError::Fetch {
            url: url.clone(),
            source,
        })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("fkg-pull-");
        let workdir = match &self.work_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        let zip_path = workdir.path().join("pkg.zip");
        tokio::fs::write(&zip_path, &body).await?;
        debug!(remote = %remote.id, bytes = body.len(), "downloaded pkg");

        let root = unpack_pkg(&zip_path, &workdir.path().join("pkg")).map_err(PullError::Archive)?;
        Ok(FetchedPkg {
            _workdir: workdir,
            root,
        })
    }

    fn check_signature(&self, remote: &RemoteConfig, fetched: &FetchedPkg) -> PullResult<()> {
        let report = self
            .verifier
            .verify(&fetched.root, remote.public_key.as_deref());
        if !report.valid {
            return Err(PullError::Signature(
                report
                    .error
                    .unwrap_or_else(|| "signature rejected".to_string()),
            ));
        }
        if !report.verified {
            warn!(remote = %remote.id, "remote pkg accepted without a cryptographic signature check");
        }
        Ok(())
    }
}

impl fmt::Debug for FederationPuller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederationPuller")
            .field("ctx", &self.ctx)
            .field("max_concurrent_pulls", &self.max_concurrent_pulls)
            .field("work_dir", &self.work_dir)
            .finish_non_exhaustive()
    }
}
