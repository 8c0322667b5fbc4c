use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub site_base_url: String,
    pub site_name: String,
    pub store_path: String,
    pub output_dir: String,
    pub shortener_endpoints: Vec<String>,
    pub default_expiry_days: i64,
    pub log_level: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("site_base_url", "https://annotationhub.com/")?
            .set_default("site_name", "Annotation Hub")?
            .set_default("store_path", "annotation-metadata.json")?
            .set_default("output_dir", ".")?
            .set_default(
                "shortener_endpoints",
                vec![
                    "https://is.gd/create.php?format=simple&url={url}".to_string(),
                    "https://tinyurl.com/api-create.php?url={url}".to_string(),
                ],
            )?
            .set_default("default_expiry_days", 7)?
            .set_default("log_level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .build()?;

        s.try_deserialize()
    }
}
