#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_MODEL: &str = "gpt-5-mini-2025-08-07";

/// Models offered by the picker. Other ids are still passed through as-is.
pub const KNOWN_MODELS: [ModelInfo; 5] = [
    ModelInfo {
        id: "gpt-5-2025-08-07",
        name: "GPT-5",
    },
    ModelInfo {
        id: DEFAULT_MODEL,
        name: "GPT-5 Mini",
    },
    ModelInfo {
        id: "gpt-5-nano-2025-08-07",
        name: "GPT-5 Nano",
    },
    ModelInfo {
        id: "o3-2025-04-16",
        name: "O3",
    },
    ModelInfo {
        id: "o4-mini-2025-04-16",
        name: "O4 Mini",
    },
];

pub fn display_name(id: &str) -> Option<&'static str> {
    KNOWN_MODELS
        .iter()
        .find(|model| model.id == id)
        .map(|model| model.name)
}
