use std::fmt;
use std::path::{Component, Path};

use anyhow::{anyhow, Context, Result};
use semver::Version;
use serde::{Deserialize, Deserializer};

/// A package version. Full semver strings get semver equality; shorter
/// forms like `1.0` are kept verbatim and compared literally, so markers
/// such as `simple-1.0.info` come out exactly as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgVersion(String);

impl PkgVersion {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("version must not be empty"));
        }
        if trimmed.contains(char::is_whitespace) || trimmed.contains('/') {
            return Err(anyhow!("invalid version '{trimmed}'"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn semver(&self) -> Option<Version> {
        Version::parse(&self.0).ok()
    }

    /// Two versions match when both parse as semver and compare equal, or
    /// when their literal spellings agree.
    pub fn matches(&self, other: &PkgVersion) -> bool {
        match (self.semver(), other.semver()) {
            (Some(a), Some(b)) => a == b,
            _ => self.0 == other.0,
        }
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PkgVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Package descriptor read from `pkg.toml` at the root of a source
/// directory. `files` lists the payload paths to copy, relative to the
/// source directory.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PkgManifest {
    pub name: String,
    pub version: PkgVersion,
    #[serde(default)]
    pub files: Vec<String>,
}

impl PkgManifest {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse pkg.toml")?;
        if manifest.name.trim().is_empty() {
            return Err(anyhow!("package name must not be empty"));
        }
        for file in &manifest.files {
            validate_payload_path(file)
                .with_context(|| format!("invalid payload path '{file}'"))?;
        }
        Ok(manifest)
    }
}

fn validate_payload_path(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(anyhow!("payload path must not be empty"));
    }
    let path = Path::new(raw);
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => {
                return Err(anyhow!(
                    "payload path must be relative and must not traverse upward"
                ));
            }
        }
    }
    Ok(())
}
