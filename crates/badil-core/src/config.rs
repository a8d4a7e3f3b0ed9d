//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level Badil configuration, loaded from `badil.json` (JSON5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference: Option<InferenceConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the credential store JSON file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore: Option<String>,

    /// Path to the boycott/alternatives catalog JSON file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dimension: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Wall-clock deadline the transport imposes on each inference call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Overrides for the built-in system prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_generation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::BadilError::Io)?;
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::BadilError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file location: `~/.badil/badil.json`
    pub fn default_path() -> PathBuf {
        data_dir().join("badil.json")
    }

    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(8970)
    }

    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn keystore_path(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.keystore.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("keys.json"))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.catalog.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("catalog.json"))
    }

    pub fn max_dimension(&self) -> u32 {
        self.media
            .as_ref()
            .and_then(|m| m.max_dimension)
            .unwrap_or(800)
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.media
            .as_ref()
            .and_then(|m| m.jpeg_quality)
            .unwrap_or(70)
    }

    pub fn inference_timeout_secs(&self) -> u64 {
        self.inference
            .as_ref()
            .and_then(|i| i.timeout_secs)
            .unwrap_or(25)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn image_analysis_prompt(&self) -> Option<&str> {
        self.prompts
            .as_ref()
            .and_then(|p| p.image_analysis.as_deref())
    }

    pub fn text_generation_prompt(&self) -> Option<&str> {
        self.prompts
            .as_ref()
            .and_then(|p| p.text_generation.as_deref())
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
        }

        if let Some(q) = self.media.as_ref().and_then(|m| m.jpeg_quality) {
            if q == 0 || q > 100 {
                errors.push(format!("JPEG quality must be 1-100, got {q}"));
            }
        }

        if self.inference_timeout_secs() < 5 {
            warnings.push(format!(
                "Inference timeout of {}s is tight for vision calls",
                self.inference_timeout_secs()
            ));
        }

        (warnings, errors)
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Base directory for Badil data: `~/.badil/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".badil")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, single-threaded test runner
        unsafe { std::env::set_var("TEST_BADIL_KEY", "gsk-test-123") };
        let input = r#"{"key": "${TEST_BADIL_KEY}", "other": "plain"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains("gsk-test-123"));
        assert!(result.contains("plain"));
        unsafe { std::env::remove_var("TEST_BADIL_KEY") };
    }

    #[test]
    fn test_env_var_missing() {
        let input = r#"{"key": "${NONEXISTENT_VAR_BADIL_TEST}"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains(r#""""#));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway_port(), 8970);
        assert_eq!(config.max_dimension(), 800);
        assert_eq!(config.jpeg_quality(), 70);
        assert_eq!(config.inference_timeout_secs(), 25);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/badil.json")).unwrap();
        assert_eq!(config.gateway_port(), 8970);
    }

    #[test]
    fn test_load_json5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badil.json");
        std::fs::write(
            &path,
            r#"{
                // comments are fine in json5
                gateway: { port: 9001 },
                media: { jpeg_quality: 85 },
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.gateway_port(), 9001);
        assert_eq!(config.jpeg_quality(), 85);
    }

    #[test]
    fn test_validate_port_zero_errors() {
        let config = Config {
            gateway: Some(GatewayConfig { port: 0, bind: None }),
            ..Default::default()
        };
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("port")));
    }

    #[test]
    fn test_validate_quality_range() {
        let config = Config {
            media: Some(MediaConfig {
                max_dimension: None,
                jpeg_quality: Some(150),
            }),
            ..Default::default()
        };
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("quality")));
    }
}
