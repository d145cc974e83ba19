use crate::provider::ModelSource;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub upload: UploadConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub onnx_file: String,
    /// Serve synthetic predictions instead of loading an artifact.
    #[serde(default)]
    pub substitute: bool,
    /// Load and warm up the model at startup rather than on the first request.
    #[serde(default = "default_preload")]
    pub preload: bool,
}

fn default_preload() -> bool {
    true
}

impl ModelConfig {
    pub fn get_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.onnx_file)
    }

    pub fn source(&self) -> ModelSource {
        if self.substitute {
            ModelSource::Substitute
        } else {
            ModelSource::Trained(self.get_model_path())
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_max_upload_mb() -> usize {
    5
}

impl UploadConfig {
    pub fn max_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config = config.try_deserialize::<Config>()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_source_is_trained_by_default() {
        let model = ModelConfig {
            model_dir: PathBuf::from("./model"),
            onnx_file: "leaf_classifier.onnx".to_string(),
            substitute: false,
            preload: true,
        };

        match model.source() {
            ModelSource::Trained(path) => {
                assert_eq!(path, PathBuf::from("./model/leaf_classifier.onnx"))
            }
            ModelSource::Substitute => panic!("expected trained source"),
        }
    }

    #[test]
    fn model_source_honours_substitute_flag() {
        let model = ModelConfig {
            model_dir: PathBuf::from("./model"),
            onnx_file: "leaf_classifier.onnx".to_string(),
            substitute: true,
            preload: false,
        };

        assert!(matches!(model.source(), ModelSource::Substitute));
    }

    #[test]
    fn upload_limit_is_in_megabytes() {
        let upload = UploadConfig {
            upload_dir: PathBuf::from("./uploads"),
            max_upload_mb: 5,
        };

        assert_eq!(upload.max_bytes(), 5 * 1024 * 1024);
    }
}
