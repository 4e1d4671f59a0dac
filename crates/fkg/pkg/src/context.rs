use fkg_types::{InstanceSettings, NoopValidator, RecordValidator};
use std::fmt;
use std::sync::Arc;

/// What every PKG operation needs to know about the local instance.
#[derive(Clone)]
pub struct PkgContext {
    pub instance: InstanceSettings,
    pub validator: Arc<dyn RecordValidator>,
}

impl PkgContext {
    pub fn new(instance: InstanceSettings, validator: Arc<dyn RecordValidator>) -> Self {
        Self {
            instance,
            validator,
        }
    }

    /// Context that skips structural validation entirely.
    pub fn unvalidated(instance: InstanceSettings) -> Self {
        Self::new(instance, Arc::new(NoopValidator))
    }
}

impl fmt::Debug for PkgContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkgContext")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}
