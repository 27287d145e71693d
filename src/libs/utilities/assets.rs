use crate::error::{InstallerError, Result};
use crate::{log_debug, log_info};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Upper bound for a single-file download, connection included.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads `url` into `dest`, replacing it.
///
/// Any non-2xx status is an error (ureq reports those as `Error::Status`).
/// The whole request is cut off after `timeout`.
pub fn download_file(url: &str, dest: &Path, timeout: Duration) -> Result<()> {
    log_debug!("[Download] GET {} (timeout {:?})", url, timeout);

    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::Status(code, _) => InstallerError::Download {
            url: url.to_string(),
            reason: format!("HTTP {code}"),
        },
        other => InstallerError::Download {
            url: url.to_string(),
            reason: other.to_string(),
        },
    })?;

    let mut file = File::create(dest).map_err(|e| InstallerError::io("cannot create file", dest, e))?;
    let mut reader = response.into_reader();
    std::io::copy(&mut reader, &mut file).map_err(|e| InstallerError::Download {
        url: url.to_string(),
        reason: format!("cannot write {}: {e}", dest.display()),
    })?;

    log_info!("[Download] Saved {} to {}", url, dest.display());
    Ok(())
}
