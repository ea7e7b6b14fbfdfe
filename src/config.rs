use crate::error::{EnrichError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_COMPANIES_KEY: &str = "companies.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "/tmp/companies_details.json";
pub const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Groq,
    Gemini,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Groq => "llama-3.1-70b-versatile",
            Provider::Gemini => "gemini-1.5-flash",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "groq" => Ok(Provider::Groq),
            "gemini" => Ok(Provider::Gemini),
            other => Err(EnrichError::Configuration(format!(
                "Unknown LLM_PROVIDER '{}': expected openai, groq or gemini",
                other
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAi => "openai",
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct ModelConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

// Keeps the API key out of logs.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum SourceConfig {
    S3(S3Config),
    Local { root: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub source: SourceConfig,
    pub companies_key: String,
    pub output_path: PathBuf,
    pub few_shot: bool,
    pub shared_session: bool,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| EnrichError::Configuration(format!("{} must be set", key)))
        };

        let provider = match get("LLM_PROVIDER") {
            Some(name) => name.parse::<Provider>()?,
            None => Provider::OpenAi,
        };

        let temperature = match get("LLM_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().map_err(|_| {
                EnrichError::Configuration(format!("LLM_TEMPERATURE '{}' is not a number", raw))
            })?,
            None => 0.0,
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(EnrichError::Configuration(format!(
                "LLM_TEMPERATURE {} must be within 0.0..=2.0",
                temperature
            )));
        }

        let model = ModelConfig {
            provider,
            api_key: require(provider.api_key_var())?,
            model: get("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature,
        };

        let source = match get("SOURCE_DIR") {
            Some(dir) => SourceConfig::Local {
                root: PathBuf::from(dir),
            },
            None => SourceConfig::S3(S3Config {
                endpoint: require("S3_ENDPOINT")?.trim_end_matches('/').to_string(),
                access_key: require("S3_ACCESS_KEY")?,
                secret_key: require("S3_SECRET_KEY")?,
                bucket: require("S3_BUCKET_NAME")?,
                region: get("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            }),
        };

        Ok(Self {
            model,
            source,
            companies_key: get("COMPANIES_KEY").unwrap_or_else(|| DEFAULT_COMPANIES_KEY.to_string()),
            output_path: PathBuf::from(
                get("OUTPUT_PATH").unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            ),
            few_shot: parse_flag(get("ENRICH_FEW_SHOT"), "ENRICH_FEW_SHOT")?,
            shared_session: parse_flag(get("ENRICH_SHARED_SESSION"), "ENRICH_SHARED_SESSION")?,
        })
    }
}

fn parse_flag(value: Option<String>, key: &str) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(EnrichError::Configuration(format!(
                "{} '{}' is not a boolean",
                key, v
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const S3_VARS: [(&str, &str); 4] = [
        ("S3_ENDPOINT", "https://s3.example.com/"),
        ("S3_ACCESS_KEY", "AKID"),
        ("S3_SECRET_KEY", "secret"),
        ("S3_BUCKET_NAME", "bucket"),
    ];

    #[test]
    fn test_defaults_with_openai_and_s3() {
        let mut vars = S3_VARS.to_vec();
        vars.push(("OPENAI_API_KEY", "sk-test"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.model.provider, Provider::OpenAi);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.temperature, 0.0);
        assert_eq!(config.companies_key, "companies.txt");
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert!(!config.few_shot);
        assert!(!config.shared_session);
        match config.source {
            SourceConfig::S3(s3) => {
                assert_eq!(s3.endpoint, "https://s3.example.com");
                assert_eq!(s3.region, "us-east-1");
            }
            other => panic!("expected S3 source, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup(&S3_VARS)).unwrap_err();
        match err {
            EnrichError::Configuration(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = S3_VARS.to_vec();
        vars.push(("OPENAI_API_KEY", "  "));
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(EnrichError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_bucket_is_configuration_error() {
        let vars = [
            ("OPENAI_API_KEY", "sk-test"),
            ("S3_ENDPOINT", "https://s3.example.com"),
            ("S3_ACCESS_KEY", "AKID"),
            ("S3_SECRET_KEY", "secret"),
        ];
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET_NAME"));
    }

    #[test]
    fn test_local_source_skips_s3_settings() {
        let vars = [
            ("LLM_PROVIDER", "Groq"),
            ("GROQ_API_KEY", "gsk-test"),
            ("SOURCE_DIR", "/data"),
            ("ENRICH_FEW_SHOT", "yes"),
            ("ENRICH_SHARED_SESSION", "1"),
        ];
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.model.provider, Provider::Groq);
        assert_eq!(config.model.model, "llama-3.1-70b-versatile");
        assert_eq!(config.model.base_url, "https://api.groq.com/openai/v1");
        assert!(config.few_shot);
        assert!(config.shared_session);
        assert!(matches!(config.source, SourceConfig::Local { .. }));
    }

    #[test]
    fn test_invalid_provider_and_temperature() {
        let vars = [("LLM_PROVIDER", "anthropic"), ("SOURCE_DIR", "/data")];
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(EnrichError::Configuration(_))
        ));

        let vars = [
            ("OPENAI_API_KEY", "sk-test"),
            ("SOURCE_DIR", "/data"),
            ("LLM_TEMPERATURE", "3.5"),
        ];
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(EnrichError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let mut vars = S3_VARS.to_vec();
        vars.push(("OPENAI_API_KEY", "sk-very-secret"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("\"secret\""));
    }
}
