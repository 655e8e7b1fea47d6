use serde::{Deserialize, Serialize};

use target_finder::SnapConfig;
use topo_index::{IndexConfig, PickConfig};

/// All tunables of the editor core.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub index: IndexConfig,
    pub pick: PickConfig,
    pub snap: SnapConfig,
}

impl EditorConfig {
    /// Touch screens: wider pick and snap radii.
    pub fn touch() -> Self {
        Self {
            pick: PickConfig::touch(),
            snap: SnapConfig {
                snap_threshold_pixels: 24.0,
                ..SnapConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
