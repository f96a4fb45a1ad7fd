//! Read-only view of an ELF dynamic section.
//!
//! Lists the strings that patching targets: the library's own SONAME,
//! its DT_NEEDED dependencies and its RPATH/RUNPATH search paths.
//! Patching itself never depends on this parse succeeding.

use std::path::Path;

use crate::error::{Error, Result};

/// Dependency-related strings from the dynamic section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicInfo {
    /// DT_SONAME, if present.
    pub soname: Option<String>,
    /// DT_NEEDED entries in table order.
    pub needed: Vec<String>,
    /// DT_RPATH entries.
    pub rpath: Vec<String>,
    /// DT_RUNPATH entries.
    pub runpath: Vec<String>,
}

impl DynamicInfo {
    /// Read the dynamic section of the ELF file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Parse dynamic-section strings from raw ELF data.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let elf = goblin::elf::Elf::parse(data)
            .map_err(|e| Error::Elf(format!("parse ELF: {}", e)))?;

        Ok(DynamicInfo {
            soname: elf.soname.map(str::to_string),
            needed: elf.libraries.iter().map(|s| s.to_string()).collect(),
            rpath: elf.rpaths.iter().map(|s| s.to_string()).collect(),
            runpath: elf.runpaths.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Whether `name` is one of the DT_NEEDED entries.
    pub fn needs(&self, name: &str) -> bool {
        self.needed.iter().any(|n| n == name)
    }
}
