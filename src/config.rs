use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "interview-prep";
const CONFIG_FILE: &str = "config.json";
const TOKEN_XOR_KEY: &[u8] = b"interview-prep-local-v1";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_QUESTIONS_PER_BATCH: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const MAX_QUESTIONS_PER_BATCH: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to resolve config dir")]
    NoConfigDir,

    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to save config: {0}")]
    Write(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_token_obfuscated: Option<String>,
    pub user_name: String,
    pub request_timeout_secs: u64,
    pub questions_per_batch: u32,
    pub score_bands: ScoreBands,
    pub transcription: TranscriptionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token_obfuscated: None,
            user_name: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            questions_per_batch: DEFAULT_QUESTIONS_PER_BATCH,
            score_bands: ScoreBands::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

/// Lower bounds of the green and yellow score bands (0-100 scale).
/// Display convention only, the evaluator does not promise a rubric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreBands {
    pub good: f64,
    pub fair: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            good: 80.0,
            fair: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub language: String,
    pub server_fallback: bool,
    pub whisper_bin: Option<PathBuf>,
    pub whisper_model: Option<PathBuf>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            server_fallback: true,
            whisper_bin: None,
            whisper_model: None,
        }
    }
}

pub fn normalize_language(input: &str) -> String {
    let trimmed = input.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        trimmed
    }
}

pub fn normalize_base_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Config file location: `INTERVIEW_PREP_CONFIG` or the platform config dir
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("INTERVIEW_PREP_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let dir = dirs::config_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(CONFIG_DIR);
    Ok(dir.join(CONFIG_FILE))
}

pub fn load_or_create(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        save(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Config at {} is unreadable ({}), resetting", path.display(), e);
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = AppConfig::default();
            save(path, &config)?;
            Ok(config)
        }
    }
}

pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ConfigError::Serialize(e.to_string()))?;
    fs::write(path, json).map_err(|e| ConfigError::Write(e.to_string()))
}

/// Environment wins over the file for the API URL, token and whisper paths
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = std::env::var("INTERVIEW_PREP_API_URL") {
        config.api_base_url = normalize_base_url(&url);
    }

    if let Ok(token) = std::env::var("INTERVIEW_PREP_TOKEN") {
        let trimmed = token.trim();
        if !trimmed.is_empty() {
            config.auth_token_obfuscated = Some(obfuscate_token(trimmed));
        }
    }

    if let Ok(bin) = std::env::var("WHISPER_CPP_BIN") {
        config.transcription.whisper_bin = Some(PathBuf::from(bin));
    }

    if let Ok(model) = std::env::var("WHISPER_MODEL") {
        config.transcription.whisper_model = Some(PathBuf::from(model));
    }
}

pub fn decode_auth_token(config: &AppConfig) -> Option<String> {
    config
        .auth_token_obfuscated
        .as_deref()
        .and_then(deobfuscate_token)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Persist or clear the auth token in the file at `path`
pub fn store_auth_token(path: &Path, token: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut config = load_or_create(path)?;
    config.auth_token_obfuscated = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(obfuscate_token);
    save(path, &config)?;
    Ok(config)
}

pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 10 {
        return "******".to_string();
    }

    let prefix: String = chars[..6].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}********{}", prefix, suffix)
}

fn normalize_config(config: &mut AppConfig) {
    config.api_base_url = normalize_base_url(&config.api_base_url);
    config.user_name = config.user_name.trim().to_string();
    config.transcription.language = normalize_language(&config.transcription.language);
    config.questions_per_batch = config
        .questions_per_batch
        .clamp(1, MAX_QUESTIONS_PER_BATCH);
    if config.request_timeout_secs == 0 {
        config.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
    }

    let bands = &mut config.score_bands;
    bands.good = bands.good.clamp(0.0, 100.0);
    bands.fair = bands.fair.clamp(0.0, 100.0);
    if bands.fair > bands.good {
        tracing::warn!(
            "score_bands.fair ({}) above score_bands.good ({}), using defaults",
            bands.fair,
            bands.good
        );
        *bands = ScoreBands::default();
    }
}

fn obfuscate_token(token: &str) -> String {
    let mut bytes = token.as_bytes().to_vec();
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= TOKEN_XOR_KEY[idx % TOKEN_XOR_KEY.len()];
    }
    BASE64_STANDARD.encode(bytes)
}

fn deobfuscate_token(obfuscated: &str) -> Option<String> {
    let mut bytes = BASE64_STANDARD.decode(obfuscated).ok()?;
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= TOKEN_XOR_KEY[idx % TOKEN_XOR_KEY.len()];
    }
    String::from_utf8(bytes).ok()
}
