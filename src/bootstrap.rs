use std::fs::File;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::detection::PropertyDatabase;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No database path or no dataset URL is configured.
    Unconfigured,
    /// The database file already exists.
    Present,
    /// The dataset was downloaded; carries the number of bytes written.
    Downloaded(u64),
    /// Something went wrong; the details were logged.
    Failed,
}

/// Make sure the detection database file exists, downloading it from the
/// configured dataset URL when it does not.
///
/// Never fails: the provider must come up even without a database, in which
/// case every detection-backed claim resolves to its default.
pub fn ensure_database(config: &DetectionConfig) -> BootstrapOutcome {
    let path = match config.effective_database_path() {
        Ok(Some(path)) => path,
        Ok(None) => {
            debug!("no detection database path configured, skipping download");
            return BootstrapOutcome::Unconfigured;
        }
        Err(e) => {
            warn!(error = %e, "cannot resolve detection database path");
            return BootstrapOutcome::Failed;
        }
    };

    if path.exists() {
        debug!(path = %path.display(), "detection database present");
        return BootstrapOutcome::Present;
    }

    let Some(url) = config.dataset_url() else {
        debug!(path = %path.display(), "detection database missing and no dataset url configured");
        return BootstrapOutcome::Unconfigured;
    };
    match download(url, &path) {
        Ok(bytes) => {
            debug!(path = %path.display(), url, bytes, "downloaded detection database");
            BootstrapOutcome::Downloaded(bytes)
        }
        Err(e) => {
            warn!(path = %path.display(), url, error = %e, "detection database download failed");
            BootstrapOutcome::Failed
        }
    }
}

/// Stream `url` into `dest`. The body goes to a sibling `.download` file that
/// is renamed into place once complete and loadable, so a reader never sees
/// a partial or unreadable database under the final name.
fn download(url: &str, dest: &Path) -> Result<u64> {
    if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut response = reqwest::blocking::get(url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let partial = dest.with_extension("download");
    let written = {
        let mut file = File::create(&partial)?;
        response.copy_to(&mut file)
    };
    let checked = written
        .map_err(Error::from)
        .and_then(|n| PropertyDatabase::from_path(&partial).map(|_| n));
    let bytes = match checked {
        Ok(n) => n,
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
    };

    std::fs::rename(&partial, dest)?;
    Ok(bytes)
}
