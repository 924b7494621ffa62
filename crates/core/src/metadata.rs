//! Conversion from what the walker reports for one entry into [`FileInfo`].

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::FileInfo;

/// Descriptor for a single walked entry, as handed over by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Base name. Walkers convert non-UTF-8 names lossily (U+FFFD), so this
    /// and the derived extension may not match the OS bytes.
    pub name: String,
    pub size: u64,
    pub mode: u32,
    pub modified: SystemTime,
    pub is_dir: bool,
}

impl RawEntry {
    /// Builds a descriptor from OS metadata. `name` is the entry's base name.
    pub fn from_metadata(name: impl Into<String>, md: &std::fs::Metadata) -> Self {
        Self {
            name: name.into(),
            size: md.len(),
            mode: mode_bits(md),
            modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_dir: md.is_dir(),
        }
    }
}

#[cfg(unix)]
fn mode_bits(md: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode()
}

#[cfg(not(unix))]
fn mode_bits(md: &std::fs::Metadata) -> u32 {
    let perm = if md.permissions().readonly() { 0o444 } else { 0o644 };
    if md.is_dir() {
        0o040000 | perm
    } else {
        perm
    }
}

/// Converts without panicking; times outside chrono's range clamp to
/// `MIN_UTC` or `MAX_UTC`.
fn utc_from_system_time(t: SystemTime) -> DateTime<Utc> {
    let (secs, nanos) = match t.duration_since(UNIX_EPOCH) {
        Ok(d) => match i64::try_from(d.as_secs()) {
            Ok(s) => (s, d.subsec_nanos()),
            Err(_) => return DateTime::<Utc>::MAX_UTC,
        },
        Err(before) => {
            let d = before.duration();
            let Ok(s) = i64::try_from(d.as_secs()) else {
                return DateTime::<Utc>::MIN_UTC;
            };
            match d.subsec_nanos() {
                0 => (-s, 0),
                n => (-s - 1, 1_000_000_000 - n),
            }
        }
    };
    DateTime::<Utc>::from_timestamp(secs, nanos).unwrap_or(if secs < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Everything from the last `.` onward, or empty when the name has none.
///
/// `".gitignore"` is its own extension; `"README"` has none.
pub fn extension_of(name: &str) -> &str {
    name.rfind('.').map(|i| &name[i..]).unwrap_or("")
}

impl FileInfo {
    pub fn extract(raw: &RawEntry) -> Self {
        FileInfo {
            name: raw.name.clone(),
            size: raw.size,
            mode: raw.mode,
            mod_time: utc_from_system_time(raw.modified),
            is_dir: raw.is_dir,
            extension: extension_of(&raw.name).to_string(),
        }
    }
}

impl From<&RawEntry> for FileInfo {
    fn from(raw: &RawEntry) -> Self {
        FileInfo::extract(raw)
    }
}
