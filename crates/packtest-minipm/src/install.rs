use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};

use crate::manifest::{PkgManifest, PkgVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    pub name: String,
    pub version: String,
    pub source: String,
    pub files: Vec<String>,
    pub installed_at_unix: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed {
        name: String,
        version: String,
        file_count: usize,
    },
    AlreadyInstalled {
        name: String,
        version: String,
    },
    Upgraded {
        name: String,
        previous: String,
        version: String,
        file_count: usize,
    },
}

/// Install destination: the default `site/` directory under the prefix, or
/// a directory supplied via the target option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRoot {
    root: PathBuf,
}

impl SiteRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn marker_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(format!("{name}-{version}.info"))
    }

    pub fn receipt_path(&self, name: &str, version: &str) -> PathBuf {
        self.marker_dir(name, version).join("RECEIPT")
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))
    }
}

/// Loads and validates the manifest of a package source directory.
pub fn load_source_manifest(source: &Path) -> Result<PkgManifest> {
    if !source.is_dir() {
        return Err(anyhow!(
            "{} is not installable: not a directory",
            source.display()
        ));
    }
    let manifest_path = source.join("pkg.toml");
    if !manifest_path.is_file() {
        return Err(anyhow!(
            "{} is not installable. File 'pkg.toml' not found.",
            source.display()
        ));
    }
    let raw = fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    PkgManifest::from_toml_str(&raw)
        .with_context(|| format!("invalid manifest {}", manifest_path.display()))
}

/// Resolves an install argument to a package source directory: either a
/// filesystem path, or a `name==version` spec looked up under the
/// find-links directory.
pub fn resolve_source(spec: &str, find_links: Option<&Path>) -> Result<PathBuf> {
    let Some((name, version)) = spec.split_once("==") else {
        return Ok(PathBuf::from(spec));
    };

    let requested = PkgVersion::parse(version)
        .with_context(|| format!("invalid version in spec '{spec}'"))?;
    let links = find_links
        .ok_or_else(|| anyhow!("cannot resolve '{spec}' without --find-links"))?;

    let candidate = links.join(name);
    let manifest = load_source_manifest(&candidate)
        .with_context(|| format!("no candidate for {name}=={requested} under {}", links.display()))?;
    if manifest.name != name || !manifest.version.matches(&requested) {
        return Err(anyhow!(
            "no candidate for {name}=={requested} under {} (found {} {})",
            links.display(),
            manifest.name,
            manifest.version
        ));
    }
    Ok(candidate)
}

pub fn install_package(site: &SiteRoot, source: &Path, upgrade: bool) -> Result<InstallOutcome> {
    let manifest = load_source_manifest(source)?;
    let name = manifest.name.clone();
    let version = manifest.version.to_string();

    let existing = installed_version(site, &name)?;
    if let Some(previous) = existing {
        if !upgrade {
            return Ok(InstallOutcome::AlreadyInstalled {
                name,
                version: previous,
            });
        }
        remove_installed(site, &name, &previous)?;
        let file_count = copy_payload(site, source, &manifest)?;
        write_receipt(site, source, &manifest)?;
        return Ok(InstallOutcome::Upgraded {
            name,
            previous,
            version,
            file_count,
        });
    }

    let file_count = copy_payload(site, source, &manifest)?;
    write_receipt(site, source, &manifest)?;
    Ok(InstallOutcome::Installed {
        name,
        version,
        file_count,
    })
}

/// Removes a package's payload and marker. Returns the version that was
/// removed, or `None` when the package was not installed.
pub fn uninstall_package(site: &SiteRoot, name: &str) -> Result<Option<String>> {
    let Some(version) = installed_version(site, name)? else {
        return Ok(None);
    };
    remove_installed(site, name, &version)?;
    Ok(Some(version))
}

/// All installed packages under the site root, sorted by name.
pub fn list_installed(site: &SiteRoot) -> Result<Vec<InstallReceipt>> {
    if !site.root().is_dir() {
        return Ok(Vec::new());
    }

    let mut receipts = Vec::new();
    for entry in fs::read_dir(site.root())
        .with_context(|| format!("failed to read site directory {}", site.root().display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        let is_marker = path
            .file_name()
            .and_then(|value| value.to_str())
            .is_some_and(|value| value.ends_with(".info"));
        if !is_marker {
            continue;
        }

        let receipt_path = path.join("RECEIPT");
        let raw = fs::read_to_string(&receipt_path)
            .with_context(|| format!("failed to read receipt {}", receipt_path.display()))?;
        let receipt = parse_receipt(&raw)
            .with_context(|| format!("failed to parse receipt {}", receipt_path.display()))?;
        receipts.push(receipt);
    }

    receipts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(receipts)
}

fn installed_version(site: &SiteRoot, name: &str) -> Result<Option<String>> {
    Ok(list_installed(site)?
        .into_iter()
        .find(|receipt| receipt.name == name)
        .map(|receipt| receipt.version))
}

fn remove_installed(site: &SiteRoot, name: &str, version: &str) -> Result<()> {
    let package_dir = site.package_dir(name);
    if package_dir.exists() {
        fs::remove_dir_all(&package_dir)
            .with_context(|| format!("failed to remove {}", package_dir.display()))?;
    }
    let marker_dir = site.marker_dir(name, version);
    if marker_dir.exists() {
        fs::remove_dir_all(&marker_dir)
            .with_context(|| format!("failed to remove {}", marker_dir.display()))?;
    }
    Ok(())
}

fn copy_payload(site: &SiteRoot, source: &Path, manifest: &PkgManifest) -> Result<usize> {
    site.ensure()?;
    let package_dir = site.package_dir(&manifest.name);
    fs::create_dir_all(&package_dir)
        .with_context(|| format!("failed to create {}", package_dir.display()))?;

    for file in &manifest.files {
        let from = source.join(file);
        let to = package_dir.join(file);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(&from, &to).with_context(|| {
            format!(
                "payload file missing or unreadable: {} (from manifest of '{}')",
                from.display(),
                manifest.name
            )
        })?;
    }
    Ok(manifest.files.len())
}

fn write_receipt(site: &SiteRoot, source: &Path, manifest: &PkgManifest) -> Result<PathBuf> {
    let version = manifest.version.to_string();
    let marker_dir = site.marker_dir(&manifest.name, &version);
    fs::create_dir_all(&marker_dir)
        .with_context(|| format!("failed to create {}", marker_dir.display()))?;

    let mut payload = String::new();
    payload.push_str(&format!("name={}\n", manifest.name));
    payload.push_str(&format!("version={version}\n"));
    payload.push_str(&format!("source={}\n", source.display()));
    for file in &manifest.files {
        payload.push_str(&format!("file={file}\n"));
    }
    payload.push_str(&format!(
        "installed_at_unix={}\n",
        current_unix_timestamp()
    ));

    let path = site.receipt_path(&manifest.name, &version);
    fs::write(&path, payload.as_bytes())
        .with_context(|| format!("failed to write receipt: {}", path.display()))?;
    Ok(path)
}

pub(crate) fn parse_receipt(raw: &str) -> Result<InstallReceipt> {
    let mut name = None;
    let mut version = None;
    let mut source = None;
    let mut files = Vec::new();
    let mut installed_at_unix = None;

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "name" => name = Some(value.to_string()),
            "version" => version = Some(value.to_string()),
            "source" => source = Some(value.to_string()),
            "file" => files.push(value.to_string()),
            "installed_at_unix" => {
                installed_at_unix = Some(value.parse().context("installed_at_unix must be u64")?)
            }
            _ => {}
        }
    }

    Ok(InstallReceipt {
        name: name.context("missing name")?,
        version: version.context("missing version")?,
        source: source.context("missing source")?,
        files,
        installed_at_unix: installed_at_unix.context("missing installed_at_unix")?,
    })
}

fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
