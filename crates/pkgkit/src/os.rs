//! Linux distribution detection.
//!
//! Detection reads `/etc/os-release` (falling back to `/usr/lib/os-release`)
//! and maps `ID`/`ID_LIKE` onto one of two supported families. Anything that
//! cannot be read or recognized is [`OsFamily::Unknown`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

const DEBIAN_IDS: &[&str] = &[
    "debian",
    "ubuntu",
    "linuxmint",
    "pop",
    "elementary",
    "zorin",
    "kali",
    "raspbian",
];

const RPM_IDS: &[&str] = &["fedora", "rhel", "centos", "rocky", "almalinux", "ol", "nobara"];

/// Distribution family, which decides the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Debian, Ubuntu and derivatives (apt)
    Debian,
    /// Fedora, RHEL and derivatives (dnf)
    Rpm,
    /// Anything else, or detection failed
    Unknown,
}

impl OsFamily {
    /// Normalized identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Debian => "debian",
            OsFamily::Rpm => "rpm",
            OsFamily::Unknown => "unknown",
        }
    }

    /// Whether dotstrap can install on this family.
    pub fn is_supported(&self) -> bool {
        is_supported(*self)
    }

    fn from_os_id(id: &str) -> Option<Self> {
        if DEBIAN_IDS.contains(&id) {
            Some(OsFamily::Debian)
        } else if RPM_IDS.contains(&id) {
            Some(OsFamily::Rpm)
        } else {
            None
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to `Unknown` rather than an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "debian" | "ubuntu" => OsFamily::Debian,
            "rpm" | "fedora" => OsFamily::Rpm,
            _ => OsFamily::Unknown,
        })
    }
}

/// Returns true only for the two supported families.
pub fn is_supported(family: OsFamily) -> bool {
    matches!(family, OsFamily::Debian | OsFamily::Rpm)
}

/// The running distribution, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsIdentity {
    /// Distribution family
    pub family: OsFamily,
    /// `ID` from os-release (e.g., "ubuntu")
    pub id: String,
    /// `VERSION_ID` from os-release (e.g., "24.04")
    pub version: String,
    /// `PRETTY_NAME` from os-release
    pub pretty_name: Option<String>,
}

impl OsIdentity {
    /// Identity used when detection fails.
    pub fn unknown() -> Self {
        Self {
            family: OsFamily::Unknown,
            id: "unknown".to_string(),
            version: String::new(),
            pretty_name: None,
        }
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> String {
        match &self.pretty_name {
            Some(name) => name.clone(),
            None if self.version.is_empty() => self.id.clone(),
            None => format!("{} {}", self.id, self.version),
        }
    }
}

/// Detect the running distribution.
pub fn detect() -> OsIdentity {
    for path in OS_RELEASE_PATHS {
        let path = Path::new(path);
        if path.exists() {
            return detect_from(path);
        }
    }
    log::debug!("No os-release file found");
    OsIdentity::unknown()
}

/// Detect from a specific os-release file.
pub fn detect_from(path: &Path) -> OsIdentity {
    match fs::read_to_string(path) {
        Ok(content) => parse_os_release(&content),
        Err(e) => {
            log::debug!("Could not read {}: {e}", path.display());
            OsIdentity::unknown()
        }
    }
}

/// Parse os-release content.
pub fn parse_os_release(content: &str) -> OsIdentity {
    let mut id = None;
    let mut id_like = None;
    let mut version = None;
    let mut pretty_name = None;

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        match key {
            "ID" => id = Some(value.to_lowercase()),
            "ID_LIKE" => id_like = Some(value.to_lowercase()),
            "VERSION_ID" => version = Some(value),
            "PRETTY_NAME" => pretty_name = Some(value),
            _ => {}
        }
    }

    let Some(id) = id.filter(|i| !i.is_empty()) else {
        return OsIdentity::unknown();
    };

    let family = OsFamily::from_os_id(&id)
        .or_else(|| {
            id_like
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .find_map(OsFamily::from_os_id)
        })
        .unwrap_or(OsFamily::Unknown);

    OsIdentity {
        family,
        id,
        version: version.unwrap_or_default(),
        pretty_name,
    }
}
