use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_LLM_API_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_IMAGE_API_URL: &str = "https://fal.run/fal-ai/flux/schnell";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub stories_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub image_api_url: String,
    pub fal_key: Option<String>,
    pub diffusion_steps: u32,
    pub request_timeout_secs: u64,
    pub embed_images: bool,
    pub image_fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 5000,
            stories_dir: PathBuf::from("stories"),
            cors_origins: vec!["*".to_string()],
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_api_key: None,
            llm_model: "llama3.1".to_string(),
            llm_temperature: 0.7,
            image_api_url: DEFAULT_IMAGE_API_URL.to_string(),
            fal_key: None,
            diffusion_steps: 4,
            request_timeout_secs: 300,
            embed_images: true,
            image_fetch_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Settings {
            host: text("API_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "API_PORT", defaults.port)?,
            stories_dir: text("STORIES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.stories_dir),
            cors_origins: text("CORS_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or(defaults.cors_origins),
            llm_api_url: text("LLM_API_URL").unwrap_or(defaults.llm_api_url),
            llm_api_key: text("LLM_API_KEY"),
            llm_model: text("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_temperature: parse_or(&lookup, "LLM_TEMPERATURE", defaults.llm_temperature)?,
            image_api_url: text("IMAGE_API_URL").unwrap_or(defaults.image_api_url),
            fal_key: text("FAL_KEY"),
            diffusion_steps: parse_or(&lookup, "DIFFUSION_STEPS", defaults.diffusion_steps)?,
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            embed_images: parse_or(&lookup, "EMBED_IMAGES", defaults.embed_images)?,
            image_fetch_timeout_secs: parse_or(
                &lookup,
                "IMAGE_FETCH_TIMEOUT_SECS",
                defaults.image_fetch_timeout_secs,
            )?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return vec!["*".to_string()];
    }
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
