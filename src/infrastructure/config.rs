use crate::application::annotation_service::DEFAULT_FRAMES_PER_CHUNK;
use crate::application::event_detector::DetectorConfig;
use serde::Deserialize;

const CONFIG_FILE: &str = "config/flight";
const ENV_PREFIX: &str = "FLIGHT";

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub analysis: DetectorConfig,
    pub annotation: AnnotationSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding one CSV log per flight
    pub directory: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            directory: "flights".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnnotationSettings {
    pub frames_per_chunk: usize,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            frames_per_chunk: DEFAULT_FRAMES_PER_CHUNK,
        }
    }
}

/// Defaults, then `config/flight.*` if present, then `FLIGHT__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_with_file(config::File::with_name(CONFIG_FILE).required(false))
}

fn load_with_file<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults() {
        let config = load_with_file(File::from_str("", FileFormat::Toml)).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.data.directory, "flights");
        assert_eq!(config.analysis, DetectorConfig::default());
        assert_eq!(config.annotation.frames_per_chunk, 30);
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
            [server]
            bind = "127.0.0.1:9000"

            [analysis]
            deploy_accel_g = 2.5
            land_velocity_window_s = 3.0
        "#;
        let config = load_with_file(File::from_str(toml, FileFormat::Toml)).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.analysis.deploy_accel_g, 2.5);
        assert_eq!(config.analysis.land_velocity_window_s, 3.0);
        assert_eq!(config.analysis.launch_accel_g, 1.5);
        assert_eq!(config.analysis.fit_degree, 4);
        assert_eq!(config.data.directory, "flights");
    }
}
