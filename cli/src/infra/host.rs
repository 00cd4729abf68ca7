//! Host identity: implements the `HostIdentity` port.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;

use crate::application::ports::HostIdentity;

/// Reads the kernel hostname, then `HOSTNAME`, then asks `hostname`.
pub struct SystemHostname {
    proc_path: PathBuf,
}

impl Default for SystemHostname {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from("/proc/sys/kernel/hostname"),
        }
    }
}

impl HostIdentity for SystemHostname {
    fn hostname(&self) -> Result<String> {
        if let Some(name) = std::fs::read_to_string(&self.proc_path)
            .ok()
            .and_then(|s| non_empty(&s))
        {
            return Ok(name);
        }
        if let Some(name) = std::env::var("HOSTNAME").ok().and_then(|s| non_empty(&s)) {
            return Ok(name);
        }
        let output = Command::new("hostname").output().ok();
        output
            .filter(|o| o.status.success())
            .and_then(|o| non_empty(&String::from_utf8_lossy(&o.stdout)))
            .ok_or_else(|| {
                anyhow::anyhow!("cannot determine hostname. Set 'hostname' in the config or pass --hostname")
            })
    }
}

/// Host name fixed by config or flag.
pub struct FixedHostname(pub String);

impl HostIdentity for FixedHostname {
    fn hostname(&self) -> Result<String> {
        non_empty(&self.0).ok_or_else(|| anyhow::anyhow!("hostname must not be empty"))
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
