//! Target platform description.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SproutError;

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Linux,
    #[serde(alias = "darwin", alias = "mac")]
    Macos,
    Windows,
}

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[serde(alias = "x86_64", alias = "amd64")]
    X64,
    #[serde(alias = "aarch64")]
    Arm64,
    #[serde(alias = "i686", alias = "i386")]
    X86,
}

/// Operating system plus architecture an installation is planned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetPlatform {
    pub os: OperatingSystem,
    pub arch: Architecture,
}

impl TargetPlatform {
    pub fn new(os: OperatingSystem, arch: Architecture) -> Self {
        Self { os, arch }
    }

    /// Platform of the running process, if it is one Sprout knows about
    pub fn current() -> Option<Self> {
        let os = OperatingSystem::from_str(std::env::consts::OS).ok()?;
        let arch = Architecture::from_str(std::env::consts::ARCH).ok()?;
        Some(Self { os, arch })
    }

    /// Whether binaries built for `arch` run on this platform, natively or
    /// through the OS's emulation layer.
    pub fn can_run(&self, arch: Architecture) -> bool {
        use Architecture::*;

        match (self.os, self.arch, arch) {
            (_, host, guest) if host == guest => true,
            (OperatingSystem::Macos, Arm64, X64) => true,
            (OperatingSystem::Windows, Arm64, X64 | X86) => true,
            (_, X64, X86) => true,
            _ => false,
        }
    }
}

impl FromStr for OperatingSystem {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(OperatingSystem::Linux),
            "macos" | "darwin" | "mac" => Ok(OperatingSystem::Macos),
            "windows" | "win32" => Ok(OperatingSystem::Windows),
            other => Err(SproutError::ConfigValidation {
                field: "os".to_string(),
                reason: format!("unknown operating system '{}'", other),
            }),
        }
    }
}

impl FromStr for Architecture {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Ok(Architecture::X64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "x86" | "i686" | "i386" => Ok(Architecture::X86),
            other => Err(SproutError::ConfigValidation {
                field: "arch".to_string(),
                reason: format!("unknown architecture '{}'", other),
            }),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatingSystem::Linux => "linux",
            OperatingSystem::Macos => "macos",
            OperatingSystem::Windows => "windows",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Architecture::X64 => "x64",
            Architecture::Arm64 => "arm64",
            Architecture::X86 => "x86",
        };
        f.write_str(name)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
