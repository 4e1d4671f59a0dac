use crate::error::{PullError, PullResult};
use fkg_types::{FederationSettings, RemoteConfig};
use tracing::info;

/// Configured remote authorities, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteRegistry {
    remotes: Vec<RemoteConfig>,
}

impl RemoteRegistry {
    pub fn new(remotes: Vec<RemoteConfig>) -> Self {
        let mut registry = Self::default();
        for remote in remotes {
            registry.add(remote);
        }
        registry
    }

    pub fn from_settings(settings: &FederationSettings) -> Self {
        Self::new(settings.remotes.clone())
    }

    pub fn get(&self, remote_id: &str) -> Option<&RemoteConfig> {
        self.remotes.iter().find(|r| r.id == remote_id)
    }

    /// Like [`get`](Self::get) but unknown ids are an error.
    pub fn require(&self, remote_id: &str) -> PullResult<&RemoteConfig> {
        self.get(remote_id)
            .ok_or_else(|| PullError::UnknownRemote(remote_id.to_string()))
    }

    pub fn list(&self) -> &[RemoteConfig] {
        &self.remotes
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    /// Add a remote, replacing any existing remote with the same id.
    pub fn add(&mut self, remote: RemoteConfig) {
        match self.remotes.iter_mut().find(|r| r.id == remote.id) {
            Some(existing) => *existing = remote,
            None => {
                info!(remote = %remote.id, endpoint = %remote.endpoint, "registered remote");
                self.remotes.push(remote);
            }
        }
    }

    /// Returns `false` when no remote had that id.
    pub fn remove(&mut self, remote_id: &str) -> bool {
        let before = self.remotes.len();
        self.remotes.retain(|r| r.id != remote_id);
        self.remotes.len() != before
    }

    /// Whether the remote's trust policy admits entities of this type.
    /// Unknown remotes admit nothing.
    pub fn is_entity_type_allowed(&self, remote_id: &str, entity_type: &str) -> bool {
        self.get(remote_id).is_some_and(|r| {
            r.trust
                .allow_entity_types
                .iter()
                .any(|t| t == entity_type)
        })
    }
}
