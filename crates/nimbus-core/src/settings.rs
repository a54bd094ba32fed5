//! User settings

use serde::{Deserialize, Serialize};

use nimbus_navigation::SearchEngine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// Persisted as a single record; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Empty means the built-in new tab page
    pub homepage: String,
    pub search_engine: SearchEngine,
    pub theme: Theme,
    /// Share the user's position with the assistant for maps grounding
    pub enable_geolocation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            homepage: String::new(),
            search_engine: SearchEngine::Google,
            theme: Theme::Dark,
            enable_geolocation: true,
        }
    }
}
