//! Editor settings
//!
//! Settings travel with the JSON export and control autosave. All fields use
//! `#[serde(default)]` so settings written by older versions still deserialize.

use serde::{Deserialize, Serialize};

/// Per-session editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Persist automatically when the outline has unsaved changes (default: true)
    #[serde(default = "default_autosave")]
    pub autosave: bool,

    /// Whether to render inline markers in node content (default: false = raw text)
    #[serde(default)]
    pub render_markdown: bool,

    /// Color theme: "system", "light", or "dark" (default: "system")
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave: default_autosave(),
            render_markdown: false,
            theme: default_theme(),
        }
    }
}

fn default_autosave() -> bool {
    true
}

fn default_theme() -> String {
    "system".to_string()
}
