//! Settings loading.
//!
//! Layers, later wins: built-in defaults, then one YAML file, then `FKG_*`
//! environment variables (`FKG_INSTANCE__ID=county.x` sets `instance.id`).

use config::{Config, ConfigError, Environment, File, Map};
use fkg_types::Settings;
use std::path::{Path, PathBuf};

/// Files tried, in order, when no `--config` is given.
const DEFAULT_LOCATIONS: [&str; 3] = ["fkg.yaml", "config/fkg.yaml", "/etc/fkg/fkg.yaml"];

/// Load settings. An explicit `path` must exist; otherwise the first
/// existing default location is used, if any.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    load_with_env(path, None)
}

/// Same as [`load`]; `env` replaces the process environment when set.
fn load_with_env(
    path: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

    match path {
        Some(path) => builder = builder.add_source(File::from(path).required(true)),
        None => {
            if let Some(found) = discover() {
                builder = builder.add_source(File::from(found.as_path()));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("FKG")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    builder.build()?.try_deserialize()
}

fn discover() -> Option<PathBuf> {
    DEFAULT_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fkg_types::StorageSettings;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fkg.yaml");
        std::fs::write(
            &path,
            r#"
instance:
  id: county.x
  authority_name: County X Health
storage:
  type: file
  path: /var/lib/fkg/graph.json
federation:
  remotes:
    - id: county.y
      endpoint: https://fkg.county-y.example
      trust:
        verify_signatures: true
"#,
        )
        .unwrap();

        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.instance.id, "county.x");
        assert_eq!(settings.instance.authority_name, "County X Health");
        // untouched keys keep their defaults
        assert_eq!(settings.instance.jurisdiction, "Development");
        assert_eq!(
            settings.storage,
            StorageSettings::File {
                path: PathBuf::from("/var/lib/fkg/graph.json")
            }
        );
        let remote = &settings.federation.remotes[0];
        assert!(remote.trust.verify_signatures);
        assert_eq!(
            remote.trust.allow_entity_types,
            vec!["organization", "service", "location"]
        );
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("missing.yaml"))).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fkg.yaml");
        std::fs::write(&path, "instance:\n  id: county.x\n").unwrap();

        let env = Map::from([
            ("FKG_FEDERATION__PULL_TIMEOUT_SECS".to_string(), "15".to_string()),
            ("FKG_INSTANCE__ID".to_string(), "county.z".to_string()),
            ("OTHER_FEDERATION__PULL_TIMEOUT_SECS".to_string(), "99".to_string()),
        ]);
        let settings = load_with_env(Some(&path), Some(env)).unwrap();
        assert_eq!(settings.federation.pull_timeout_secs, 15);
        // environment wins over the file
        assert_eq!(settings.instance.id, "county.z");
    }
}
