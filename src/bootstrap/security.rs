use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::config::{BootstrapConfig, ALPHA_CHANNEL};

const RELEASE_BASE_URL: &str = "https://github.com/docworks-app/docworks/releases/download";
const SECURED_JAR_NAME: &str = "docworks-secured.jar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub primary_url: String,
    pub fallback_url: String,
    pub destination: PathBuf,
}

impl FetchPlan {
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        let mut path = self.destination.clone();
        path.set_extension("jar.download");
        path
    }
}

/// Decides whether the secured artifact needs to be fetched. `None` means
/// the step is skipped; the reasons are logged here so the caller stays
/// uncluttered.
pub fn plan(config: &BootstrapConfig) -> Option<FetchPlan> {
    if !config.security_enabled {
        debug!("Security features disabled; skipping artifact download");
        return None;
    }

    let Some(tag) = config.version_tag.as_deref() else {
        debug!("No release tag configured; skipping artifact download");
        return None;
    };

    if tag == ALPHA_CHANNEL {
        info!("Alpha channel has no secured artifact; skipping download");
        return None;
    }

    if config.security_jar.exists() {
        info!(
            "Secured artifact {} already present; skipping download",
            config.security_jar.display()
        );
        return None;
    }

    Some(FetchPlan {
        primary_url: release_url(tag),
        fallback_url: release_url(&toggle_v_prefix(tag)),
        destination: config.security_jar.clone(),
    })
}

fn release_url(tag: &str) -> String {
    format!("{RELEASE_BASE_URL}/{tag}/{SECURED_JAR_NAME}")
}

// Releases have been published both with and without the leading "v".
fn toggle_v_prefix(tag: &str) -> String {
    match tag.strip_prefix('v') {
        Some(rest) => rest.to_string(),
        None => format!("v{tag}"),
    }
}

/// Downloads the artifact to a staging file and renames it into place, so a
/// partial download never counts as a completed one. The fallback URL is
/// tried once after a primary failure.
pub fn fetch(plan: &FetchPlan) -> Result<()> {
    let client = Client::builder().build().context("create http client")?;
    let staging = plan.staging_path();
    if let Some(parent) = staging.parent() {
        fs::create_dir_all(parent).context("create staging directory")?;
    }

    info!("Downloading secured artifact from {}", plan.primary_url);
    let bytes = match download_to_file(&client, &plan.primary_url, &staging) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(
                "Primary download failed: {error:#}; retrying via {}",
                plan.fallback_url
            );
            download_to_file(&client, &plan.fallback_url, &staging).with_context(|| {
                format!(
                    "both {} and {} failed",
                    plan.primary_url, plan.fallback_url
                )
            })?
        }
    };

    fs::rename(&staging, &plan.destination)
        .with_context(|| format!("move downloaded artifact to {}", plan.destination.display()))?;
    info!(
        "Downloaded {bytes} bytes to {}",
        plan.destination.display()
    );
    Ok(())
}

fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<u64> {
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("request {url}"))?
        .error_for_status()
        .with_context(|| format!("download {url}"))?;

    let mut file = File::create(path).context("create staging file")?;
    let mut downloaded = 0u64;
    const CHUNK_SIZE: usize = 32 * 1024;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = response.read(&mut buffer).context("read download chunk")?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).context("write download chunk")?;
        downloaded += read as u64;
    }
    Ok(downloaded)
}

/// Re-points the application entry point at the freshly downloaded jar.
/// Only called after a successful fetch.
pub fn point_entrypoint_at(jar: &Path, entrypoint: &Path) -> Result<()> {
    match fs::remove_file(entrypoint) {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(error).with_context(|| {
                format!("remove old entry point {}", entrypoint.display())
            });
        }
    }

    std::os::unix::fs::symlink(jar, entrypoint)
        .with_context(|| format!("link {} to {}", entrypoint.display(), jar.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapConfig;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, enabled: bool, tag: Option<&str>) -> BootstrapConfig {
        BootstrapConfig {
            tessdata_source: dir.path().join("defaults"),
            tessdata_target: dir.path().join("tessdata"),
            languages: vec![],
            security_enabled: enabled,
            version_tag: tag.map(str::to_string),
            security_jar: dir.path().join("app-security.jar"),
            entrypoint_jar: dir.path().join("app.jar"),
        }
    }

    #[test]
    fn disabled_security_plans_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(plan(&test_config(&dir, false, Some("v1.2.3"))), None);
    }

    #[test]
    fn missing_tag_plans_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(plan(&test_config(&dir, true, None)), None);
    }

    #[test]
    fn alpha_channel_plans_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(plan(&test_config(&dir, true, Some("alpha"))), None);
    }

    #[test]
    fn present_artifact_plans_nothing() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, true, Some("v1.2.3"));
        fs::write(&config.security_jar, b"already here").unwrap();
        assert_eq!(plan(&config), None);
    }

    #[test]
    fn plan_builds_both_url_variants() {
        let dir = TempDir::new().unwrap();
        let plan = plan(&test_config(&dir, true, Some("v1.2.3"))).unwrap();
        assert!(plan.primary_url.contains("/v1.2.3/"));
        assert!(plan.fallback_url.contains("/1.2.3/"));
        assert!(plan.primary_url.ends_with("docworks-secured.jar"));
    }

    #[test]
    fn v_prefix_toggles_both_ways() {
        assert_eq!(toggle_v_prefix("v1.2.3"), "1.2.3");
        assert_eq!(toggle_v_prefix("1.2.3"), "v1.2.3");
    }

    #[test]
    fn staging_path_appends_download_suffix() {
        let plan = FetchPlan {
            primary_url: String::new(),
            fallback_url: String::new(),
            destination: PathBuf::from("/app-security.jar"),
        };
        assert_eq!(
            plan.staging_path(),
            PathBuf::from("/app-security.jar.download")
        );
    }

    #[cfg(unix)]
    #[test]
    fn entrypoint_swap_replaces_regular_file() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("app-security.jar");
        let entrypoint = dir.path().join("app.jar");
        fs::write(&jar, b"secured bytes").unwrap();
        fs::write(&entrypoint, b"plain bytes").unwrap();

        point_entrypoint_at(&jar, &entrypoint).unwrap();

        assert_eq!(fs::read_link(&entrypoint).unwrap(), jar);
        assert_eq!(fs::read(&entrypoint).unwrap(), b"secured bytes");
    }

    #[cfg(unix)]
    #[test]
    fn entrypoint_swap_works_without_existing_file() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("app-security.jar");
        let entrypoint = dir.path().join("app.jar");
        fs::write(&jar, b"secured bytes").unwrap();

        point_entrypoint_at(&jar, &entrypoint).unwrap();

        assert_eq!(fs::read_link(&entrypoint).unwrap(), jar);
    }

    fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).is_ok() {
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    line.clear();
                }
                let header = format!(
                    "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        format!("http://{addr}/docworks-secured.jar")
    }

    #[test]
    fn fallback_download_succeeds_after_primary_failure() {
        let dir = TempDir::new().unwrap();
        let plan = FetchPlan {
            primary_url: serve_once("HTTP/1.1 404 Not Found", b""),
            fallback_url: serve_once("HTTP/1.1 200 OK", b"secured bytes"),
            destination: dir.path().join("app-security.jar"),
        };

        fetch(&plan).unwrap();

        assert_eq!(fs::read(&plan.destination).unwrap(), b"secured bytes");
        assert!(!plan.staging_path().exists());
    }

    #[test]
    fn both_urls_failing_is_fatal() {
        let dir = TempDir::new().unwrap();
        let plan = FetchPlan {
            primary_url: serve_once("HTTP/1.1 404 Not Found", b""),
            fallback_url: serve_once("HTTP/1.1 500 Internal Server Error", b""),
            destination: dir.path().join("app-security.jar"),
        };

        let error = fetch(&plan).unwrap_err();

        assert!(format!("{error:#}").contains("failed"));
        assert!(!plan.destination.exists());
    }
}
