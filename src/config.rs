use std::env;
use std::path::PathBuf;

pub const ENV_LANGS: &str = "TESSERACT_LANGS";
pub const ENV_SECURITY: &str = "DOCKER_ENABLE_SECURITY";
pub const ENV_VERSION_TAG: &str = "VERSION_TAG";

const TESSDATA_SOURCE: &str = "/usr/share/tessdata-defaults";
const TESSDATA_TARGET: &str = "/usr/share/tessdata";
const SECURITY_JAR: &str = "/app-security.jar";
const ENTRYPOINT_JAR: &str = "/app.jar";

/// Release channel that never publishes a secured artifact.
pub const ALPHA_CHANNEL: &str = "alpha";

/// Everything the bootstrap steps need, resolved once at startup. Steps
/// never read the environment themselves.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub tessdata_source: PathBuf,
    pub tessdata_target: PathBuf,
    pub languages: Vec<String>,
    pub security_enabled: bool,
    pub version_tag: Option<String>,
    pub security_jar: PathBuf,
    pub entrypoint_jar: PathBuf,
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        Self {
            tessdata_source: PathBuf::from(TESSDATA_SOURCE),
            tessdata_target: PathBuf::from(TESSDATA_TARGET),
            languages: env::var(ENV_LANGS)
                .map(|value| parse_languages(&value))
                .unwrap_or_default(),
            security_enabled: env::var(ENV_SECURITY)
                .map(|value| flag_enabled(&value))
                .unwrap_or(false),
            version_tag: env::var(ENV_VERSION_TAG)
                .ok()
                .and_then(|value| normalize_tag(&value)),
            security_jar: PathBuf::from(SECURITY_JAR),
            entrypoint_jar: PathBuf::from(ENTRYPOINT_JAR),
        }
    }
}

fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag_enabled(raw: &str) -> bool {
    raw == "true"
}

fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_split_on_commas_and_skip_blanks() {
        assert_eq!(parse_languages("fra, ,deu"), vec!["fra", "deu"]);
        assert_eq!(parse_languages("  eng  "), vec!["eng"]);
        assert!(parse_languages("").is_empty());
        assert!(parse_languages(" , ,").is_empty());
    }

    #[test]
    fn security_flag_requires_exact_true() {
        assert!(flag_enabled("true"));
        assert!(!flag_enabled("TRUE"));
        assert!(!flag_enabled("1"));
        assert!(!flag_enabled(""));
    }

    #[test]
    fn blank_version_tags_normalize_to_none() {
        assert_eq!(normalize_tag(""), None);
        assert_eq!(normalize_tag("   "), None);
        assert_eq!(normalize_tag(" v1.2.3 "), Some("v1.2.3".to_string()));
    }
}
