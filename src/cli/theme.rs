use crate::config::{
    HexColor, StyleOverride, ThemeConfig as UserThemeConfig, ThemeModifier, ThemePreset, ThemeToken,
};
use crate::relay::Mode;
use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone)]
pub struct Theme {
    enabled: bool,
    styles: HashMap<ThemeToken, ContentStyle>,
    accents: HashMap<Mode, HexColor>,
}

impl Theme {
    #[cfg(test)]
    pub fn new(enabled: bool) -> Self {
        Self::from_config(enabled, &UserThemeConfig::default())
    }

    pub fn from_config(enabled: bool, config: &UserThemeConfig) -> Self {
        let mut styles = preset_styles(config.preset);
        for (token, override_style) in &config.styles {
            let base = styles.get(token).copied().unwrap_or_default();
            styles.insert(*token, merge_style(base, override_style));
        }

        let accents = Mode::ALL
            .into_iter()
            .map(|mode| {
                let color = config.modes.get(&mode).copied().unwrap_or(mode.accent());
                (mode, color)
            })
            .collect();

        Self {
            enabled,
            styles,
            accents,
        }
    }

    pub fn style(&self, token: ThemeToken) -> ContentStyle {
        if !self.enabled {
            return ContentStyle::default();
        }

        self.styles.get(&token).copied().unwrap_or_default()
    }

    pub fn prompt_style(&self, mode: Mode) -> ContentStyle {
        if !self.enabled {
            return ContentStyle::default();
        }

        let mut style = ContentStyle::new();
        style.foreground_color = self.accents.get(&mode).copied().map(color_from_hex);
        style.attributes.set(Attribute::Bold);
        style
    }

    pub fn paint(&self, token: ThemeToken, text: &str) -> String {
        apply(self.style(token), text)
    }

    /// `<mode-tag>> ` in the mode's accent color.
    pub fn prompt(&self, mode: Mode) -> String {
        apply(self.prompt_style(mode), &format!("{}> ", mode.tag()))
    }
}

/// Color output is on unless `NO_COLOR` is set to a non-empty value.
pub fn color_enabled() -> bool {
    env::var_os("NO_COLOR").is_none_or(|value| value.is_empty())
}

fn apply(style: ContentStyle, text: &str) -> String {
    if style == ContentStyle::default() {
        text.to_string()
    } else {
        style.apply(text).to_string()
    }
}

fn preset_styles(preset: ThemePreset) -> HashMap<ThemeToken, ContentStyle> {
    ThemeToken::all()
        .iter()
        .copied()
        .map(|token| (token, preset_style(preset, token)))
        .collect()
}

fn preset_style(preset: ThemePreset, token: ThemeToken) -> ContentStyle {
    match preset {
        ThemePreset::Default => default_preset_style(token),
        ThemePreset::Light => light_preset_style(token),
        ThemePreset::HighContrast => high_contrast_preset_style(token),
    }
}

fn styled(fg: (u8, u8, u8), attributes: &[Attribute]) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(Color::Rgb {
        r: fg.0,
        g: fg.1,
        b: fg.2,
    });
    for attribute in attributes {
        style.attributes.set(*attribute);
    }
    style
}

fn default_preset_style(token: ThemeToken) -> ContentStyle {
    match token {
        ThemeToken::UserInput => styled((255, 255, 255), &[]),
        ThemeToken::AssistantText => styled((192, 202, 245), &[]),
        ThemeToken::AssistantWaiting => styled((138, 138, 138), &[Attribute::Italic]),
        ThemeToken::SystemInfo => styled((86, 95, 137), &[]),
        ThemeToken::SystemError => styled((247, 118, 142), &[Attribute::Bold]),
    }
}

fn light_preset_style(token: ThemeToken) -> ContentStyle {
    match token {
        ThemeToken::UserInput => styled((36, 41, 47), &[]),
        ThemeToken::AssistantText => styled((9, 105, 218), &[]),
        ThemeToken::AssistantWaiting => styled((80, 90, 110), &[Attribute::Italic]),
        ThemeToken::SystemInfo => styled((36, 70, 120), &[]),
        ThemeToken::SystemError => styled((176, 0, 32), &[Attribute::Bold]),
    }
}

fn high_contrast_preset_style(token: ThemeToken) -> ContentStyle {
    match token {
        ThemeToken::UserInput => styled((255, 255, 255), &[]),
        ThemeToken::AssistantText => styled((135, 206, 250), &[]),
        ThemeToken::AssistantWaiting => {
            styled((255, 255, 0), &[Attribute::Bold, Attribute::Underlined])
        }
        ThemeToken::SystemInfo => styled((173, 216, 230), &[]),
        ThemeToken::SystemError => styled((255, 64, 64), &[Attribute::Bold]),
    }
}

fn merge_style(base: ContentStyle, override_style: &StyleOverride) -> ContentStyle {
    let mut merged = base;

    if let Some(fg) = override_style.fg {
        merged.foreground_color = Some(color_from_hex(fg));
    }

    if let Some(bg) = override_style.bg {
        merged.background_color = Some(color_from_hex(bg));
    }

    if let Some(modifiers) = &override_style.modifiers {
        merged.attributes = modifiers_to_attributes(modifiers);
    }

    merged
}

fn color_from_hex(color: HexColor) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn modifiers_to_attributes(modifiers: &[ThemeModifier]) -> Attributes {
    let mut attributes = Attributes::default();
    for modifier in modifiers {
        attributes.set(modifier_to_attribute(*modifier));
    }
    attributes
}

fn modifier_to_attribute(modifier: ThemeModifier) -> Attribute {
    match modifier {
        ThemeModifier::Bold => Attribute::Bold,
        ThemeModifier::Dim => Attribute::Dim,
        ThemeModifier::Italic => Attribute::Italic,
        ThemeModifier::Underlined => Attribute::Underlined,
        ThemeModifier::SlowBlink => Attribute::SlowBlink,
        ThemeModifier::RapidBlink => Attribute::RapidBlink,
        ThemeModifier::Reversed => Attribute::Reverse,
        ThemeModifier::Hidden => Attribute::Hidden,
        ThemeModifier::CrossedOut => Attribute::CrossedOut,
    }
}
