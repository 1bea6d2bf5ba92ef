use anyhow::{Result, bail};

/// Extract `(name, version)` from core metadata (`METADATA` / `PKG-INFO`).
///
/// Only the header block is read; it ends at the first blank line.
pub fn parse_metadata(content: &str) -> Result<(String, Option<String>)> {
    let mut name = None;
    let mut version = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Name:") {
            name.get_or_insert_with(|| value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Version:") {
            version.get_or_insert_with(|| value.trim().to_string());
        }
    }

    match name {
        Some(name) if !name.is_empty() => Ok((name, version.filter(|v| !v.is_empty()))),
        _ => bail!("Metadata has no Name field"),
    }
}
