//! Connection profiles
//!
//! A profile is a JSON file carrying the per-replica settings a site would
//! otherwise repeat on every invocation. Every field is optional; explicit
//! command-line flags always win.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};

/// Optional settings shared by both audit tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Entry snapshot of the first replica (repl-sdiff)
    #[serde(default)]
    pub snapshot1: Option<PathBuf>,

    /// Entry snapshot of the second replica (repl-sdiff)
    #[serde(default)]
    pub snapshot2: Option<PathBuf>,

    /// Display name of the first replica
    #[serde(default)]
    pub hostname1: Option<String>,

    /// Display name of the second replica
    #[serde(default)]
    pub hostname2: Option<String>,

    /// Change-log dump directory (repl-status)
    #[serde(default)]
    pub dump: Option<PathBuf>,

    /// Display name of the replica (repl-status)
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Profile {
    /// Load a profile from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read profile: {}", e)))?;

        let profile: Profile = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid profile JSON: {}", e)))?;

        profile.validate()?;

        Ok(profile)
    }

    /// Load from an optional path, or an empty profile when none given
    pub fn load_optional(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        for (name, value) in [
            ("hostname1", &self.hostname1),
            ("hostname2", &self.hostname2),
            ("hostname", &self.hostname),
        ] {
            if value.as_deref() == Some("") {
                return Err(CliError::config_error(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{"hostname1": "ldap1", "snapshot1": "/tmp/snap1.tsv"}"#)
            .unwrap();
        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.hostname1.as_deref(), Some("ldap1"));
        assert_eq!(profile.snapshot1, Some(PathBuf::from("/tmp/snap1.tsv")));
        assert!(profile.hostname2.is_none());
    }

    #[test]
    fn test_empty_hostname_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, br#"{"hostname": ""}"#).unwrap();
        assert!(Profile::load(&path).is_err());
    }

    #[test]
    fn test_missing_profile_is_config_error() {
        let err = Profile::load(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(err.to_string().contains("REPL_CLI_CONFIG_ERROR"));
    }

    #[test]
    fn test_no_path_gives_empty_profile() {
        let profile = Profile::load_optional(None).unwrap();
        assert!(profile.snapshot1.is_none());
    }
}
