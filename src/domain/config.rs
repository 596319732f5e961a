use std::path::Path;

use serde::{Deserialize, Serialize};

/// What happens when a local placement that other placements are relative to
/// is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementDeletePolicy {
    /// The deletion fails with
    /// [`IntegrityError::Referenced`](crate::IntegrityError::Referenced).
    #[default]
    Reject,
    /// The deletion succeeds and the children become roots of their own
    /// trees.
    Reroot,
}

/// Configuration of a [`Universe`](crate::Universe).
///
/// These settings control how the integrity rules that IFC leaves open are
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// What happens to child placements when their parent is deleted.
    pub placement_delete_policy: PlacementDeletePolicy,

    /// The deepest placement chain accepted.
    ///
    /// Ancestor walks stop after this many steps, so a corrupt store with a
    /// very long or cyclic chain is rejected rather than walked forever.
    max_placement_depth: usize,

    /// Whether a user-defined field set without the `USERDEFINED`
    /// classification is an error.
    ///
    /// When `false` (default): the record is accepted and a warning is logged.
    ///
    /// When `true`: the record is rejected with
    /// [`ValidationError::UserDefinedMismatch`](crate::ValidationError::UserDefinedMismatch).
    pub strict_user_defined: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placement_delete_policy: PlacementDeletePolicy::default(),
            max_placement_depth: default_max_placement_depth(),
            strict_user_defined: false,
        }
    }
}

/// Errors reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    /// The file is not a valid configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be encoded.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The file could not be written.
    #[error("failed to write config file: {0}")]
    Write(#[source] std::io::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Returns the maximum placement chain depth.
    #[must_use]
    pub const fn max_placement_depth(&self) -> usize {
        self.max_placement_depth
    }

    /// Sets the maximum placement chain depth. A depth of zero is raised to
    /// one, so a placement can always have a parent.
    pub fn set_max_placement_depth(&mut self, depth: usize) {
        self.max_placement_depth = depth.max(1);
    }
}

const fn default_max_placement_depth() -> usize {
    256
}

/// On-disk layouts of the configuration, keyed by `_version`. Older layouts
/// stay readable after the in-memory [`Config`] changes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        placement_delete_policy: PlacementDeletePolicy,

        #[serde(default = "default_max_placement_depth")]
        max_placement_depth: usize,

        #[serde(default)]
        strict_user_defined: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                placement_delete_policy,
                max_placement_depth,
                strict_user_defined,
            } => Self {
                placement_delete_policy,
                max_placement_depth: max_placement_depth.max(1),
                strict_user_defined,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            placement_delete_policy: config.placement_delete_policy,
            max_placement_depth: config.max_placement_depth,
            strict_user_defined: config.strict_user_defined,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nplacement_delete_policy = \"reroot\"\nmax_placement_depth = 16\nstrict_user_defined = true\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.placement_delete_policy, PlacementDeletePolicy::Reroot);
        assert_eq!(config.max_placement_depth(), 16);
        assert!(config.strict_user_defined);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read(_)));
        assert!(error.to_string().starts_with("failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nplacement_delete_policy = \"cascade\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.max_placement_depth(), 256);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ifc.toml");

        let mut config = Config {
            placement_delete_policy: PlacementDeletePolicy::Reroot,
            ..Config::default()
        };
        config.set_max_placement_depth(0);
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_version = \"1\""));
        assert_eq!(Config::load(&path).unwrap(), config);
        assert_eq!(config.max_placement_depth(), 1);
    }
}
