// src/provision/naming.rs

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{Local, NaiveDateTime};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generate a database name unique across concurrently running processes.
///
/// `<prefix>_<YYYYMMDDHHMMSS>_<pid>`; later names from the same process get
/// `_<n>` appended.
pub fn generate_database_name(prefix: &str) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format_database_name(
        prefix,
        Local::now().naive_local(),
        std::process::id(),
        seq,
    )
}

pub fn format_database_name(prefix: &str, at: NaiveDateTime, pid: u32, seq: u32) -> String {
    let timestamp = at.format("%Y%m%d%H%M%S");
    if seq == 0 {
        format!("{prefix}_{timestamp}_{pid}")
    } else {
        format!("{prefix}_{timestamp}_{pid}_{seq}")
    }
}
