use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::info;

const APT_PROGRAM: &str = "apt-get";
const APT_LISTS_DIR: &str = "/var/lib/apt/lists";

pub fn package_name(code: &str) -> String {
    format!("tesseract-ocr-{code}")
}

pub struct AptInstaller {
    program: PathBuf,
    lists_dir: PathBuf,
}

impl AptInstaller {
    pub fn new() -> Self {
        Self::with_program(APT_PROGRAM, APT_LISTS_DIR)
    }

    pub fn with_program(program: impl Into<PathBuf>, lists_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            lists_dir: lists_dir.into(),
        }
    }

    /// Installs one language pack per code, in order, stopping at the first
    /// failure. On full success the package cache and list files are removed
    /// to keep the image small.
    pub fn install(&self, languages: &[String]) -> Result<()> {
        self.run(&["update"]).context("refresh package index")?;

        for code in languages {
            let package = package_name(code);
            info!("Installing OCR language pack {package}");
            self.run(&["install", "-y", &package])
                .with_context(|| format!("install language pack for {code:?}"))?;
        }

        self.run(&["clean"]).context("clean package cache")?;
        self.remove_list_files().context("remove package list files")?;
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        let output = Command::new(&self.program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .with_context(|| format!("spawn {:?}", self.program))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!(
            "{:?} {} exited with status {:?}: {}",
            self.program,
            args.join(" "),
            output.status.code(),
            stderr.trim()
        ))
    }

    fn remove_list_files(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.lists_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };
        for entry in entries {
            let entry = entry.context("read list entry")?;
            if entry.file_type().context("stat list entry")?.is_file() {
                fs::remove_file(entry.path())
                    .with_context(|| format!("remove {}", entry.path().display()))?;
            }
        }
        Ok(())
    }
}

impl Default for AptInstaller {
    fn default() -> Self {
        Self::new()
    }
}
