use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::llm::models::DEFAULT_MODEL;
use crate::relay::Mode;

pub const DEFAULT_OPENAI_MODEL: &str = DEFAULT_MODEL;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_MODE: Mode = Mode::Homework;

const CONFIG_DIR_NAME: &str = "pathway";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub config_is_explicit: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub default_mode: Mode,
    pub request_timeout_secs: Option<u64>,
    pub server_addr: String,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub modes: HashMap<Mode, HexColor>,
    pub styles: HashMap<ThemeToken, StyleOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    Light,
    HighContrast,
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "light" => Ok(Self::Light),
            "high-contrast" => Ok(Self::HighContrast),
            _ => Err(format!("unknown preset '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    UserInput,
    AssistantText,
    AssistantWaiting,
    SystemInfo,
    SystemError,
}

impl ThemeToken {
    pub fn all() -> [ThemeToken; 5] {
        [
            Self::UserInput,
            Self::AssistantText,
            Self::AssistantWaiting,
            Self::SystemInfo,
            Self::SystemError,
        ]
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "user_input" => Ok(Self::UserInput),
            "assistant_text" => Ok(Self::AssistantText),
            "assistant_waiting" => Ok(Self::AssistantWaiting),
            "system_info" => Ok(Self::SystemInfo),
            "system_error" => Ok(Self::SystemError),
            _ => Err(format!("unknown token '{value}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOverride {
    pub fg: Option<HexColor>,
    pub bg: Option<HexColor>,
    pub modifiers: Option<Vec<ThemeModifier>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        const EXPECTED: &str = "invalid hex color, expected #RRGGBB";

        let digits = value
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6 && digits.is_ascii())
            .ok_or_else(|| EXPECTED.to_string())?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| EXPECTED.to_string())
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeModifier {
    Bold,
    Dim,
    Italic,
    Underlined,
    SlowBlink,
    RapidBlink,
    Reversed,
    Hidden,
    CrossedOut,
}

impl FromStr for ThemeModifier {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "bold" => Ok(Self::Bold),
            "dim" => Ok(Self::Dim),
            "italic" => Ok(Self::Italic),
            "underlined" => Ok(Self::Underlined),
            "slow_blink" => Ok(Self::SlowBlink),
            "rapid_blink" => Ok(Self::RapidBlink),
            "reversed" => Ok(Self::Reversed),
            "hidden" => Ok(Self::Hidden),
            "crossed_out" => Ok(Self::CrossedOut),
            _ => Err(format!("unknown modifier '{value}'")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    default_mode: Option<String>,
    request_timeout_secs: Option<u64>,
    server_addr: Option<String>,
    theme: Option<RawThemeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThemeConfig {
    name: Option<String>,
    modes: Option<HashMap<String, String>>,
    styles: Option<HashMap<String, RawStyleOverride>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyleOverride {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Loads the config file (explicit path or discovered), then layers the
    /// process environment and `.env` on top of it.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_is_explicit = explicit_path.is_some();
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!(
                        "Failed to load config {}: file does not exist",
                        path.display()
                    );
                }
                path.to_path_buf()
            }
            None => discover_config_path()?,
        };
        let file_config = load_file_config(&config_path)?;

        dotenvy::dotenv().ok();

        let file_value = |select: fn(&RawFileConfig) -> Option<&String>| {
            file_config
                .as_ref()
                .and_then(select)
                .and_then(|value| non_empty(value).map(ToOwned::to_owned))
        };
        let file_api_key = file_value(|cfg| cfg.openai_api_key.as_ref());
        let file_model = file_value(|cfg| cfg.openai_model.as_ref());
        let file_base_url = file_value(|cfg| cfg.openai_base_url.as_ref());
        let file_server_addr = file_value(|cfg| cfg.server_addr.as_ref());

        let default_mode = match file_value(|cfg| cfg.default_mode.as_ref()) {
            Some(tag) => Mode::from_str(&tag)
                .map_err(|reason| config_error(&config_path, "default_mode", &reason))?,
            None => DEFAULT_MODE,
        };

        let request_timeout_secs = file_config.as_ref().and_then(|cfg| cfg.request_timeout_secs);
        if request_timeout_secs == Some(0) {
            return Err(config_error(
                &config_path,
                "request_timeout_secs",
                "must be at least 1",
            ));
        }

        let theme = validate_theme(
            file_config.as_ref().and_then(|cfg| cfg.theme.as_ref()),
            &config_path,
        )?;

        Ok(Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY").or(file_api_key),
            openai_model: env_non_empty("OPENAI_MODEL")
                .or(file_model)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: env_non_empty("OPENAI_BASE_URL")
                .or(file_base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            default_mode,
            request_timeout_secs,
            server_addr: file_server_addr.unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            theme,
            config_path,
            config_is_explicit,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_theme(raw_theme: Option<&RawThemeConfig>, config_path: &Path) -> Result<ThemeConfig> {
    let Some(theme) = raw_theme else {
        return Ok(ThemeConfig::default());
    };

    let mut config = ThemeConfig::default();

    if let Some(name) = &theme.name {
        config.preset = ThemePreset::from_str(name)
            .map_err(|reason| config_error(config_path, "theme.name", &reason))?;
    }

    if let Some(modes) = &theme.modes {
        for (tag, color) in modes {
            let key_path = format!("theme.modes.{tag}");
            let mode = Mode::from_str(tag)
                .map_err(|reason| config_error(config_path, &key_path, &reason))?;
            let color = HexColor::from_str(color)
                .map_err(|reason| config_error(config_path, &key_path, &reason))?;
            config.modes.insert(mode, color);
        }
    }

    if let Some(styles) = &theme.styles {
        for (token_name, raw_style) in styles {
            let token = ThemeToken::from_str(token_name).map_err(|reason| {
                config_error(config_path, &format!("theme.styles.{token_name}"), &reason)
            })?;

            let fg = parse_color(raw_style.fg.as_deref(), config_path, token_name, "fg")?;
            let bg = parse_color(raw_style.bg.as_deref(), config_path, token_name, "bg")?;
            let modifiers =
                parse_modifiers(raw_style.modifiers.as_deref(), config_path, token_name)?;

            config.styles.insert(token, StyleOverride { fg, bg, modifiers });
        }
    }

    Ok(config)
}

fn parse_color(
    value: Option<&str>,
    config_path: &Path,
    token_name: &str,
    field_name: &str,
) -> Result<Option<HexColor>> {
    let Some(value) = value else {
        return Ok(None);
    };

    HexColor::from_str(value).map(Some).map_err(|reason| {
        config_error(
            config_path,
            &format!("theme.styles.{token_name}.{field_name}"),
            &reason,
        )
    })
}

fn parse_modifiers(
    values: Option<&[String]>,
    config_path: &Path,
    token_name: &str,
) -> Result<Option<Vec<ThemeModifier>>> {
    let Some(values) = values else {
        return Ok(None);
    };

    values
        .iter()
        .map(|value| {
            ThemeModifier::from_str(value).map_err(|reason| {
                config_error(
                    config_path,
                    &format!("theme.styles.{token_name}.modifiers"),
                    &reason,
                )
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| non_empty(&value).map(ToOwned::to_owned))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
