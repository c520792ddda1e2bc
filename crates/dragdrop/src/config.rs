use std::time::Duration;

use plate_model::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transfer::{DataTransfer, DropEffect, EffectAllowed};

const DEFAULT_MARKER_INTERVAL_MS: u64 = 40;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid drag and drop config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("marker interval must be greater than zero")]
    ZeroInterval,
}

/// Rendering environment families that differ in how they report drag
/// positions and drop effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Gecko,
    Blink,
    WebKit,
}

/// Direction of the nearest-selection search when a reported drop point is
/// not a valid caret position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBias {
    Forward,
    Backward,
}

impl SearchBias {
    pub fn direction(self) -> Direction {
        match self {
            SearchBias::Forward => Direction::Forward,
            SearchBias::Backward => Direction::Backward,
        }
    }
}

/// Where the effect of a finished drop is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropEffectSource {
    /// The carrier's drop effect is reliable at drop time.
    DropEffect,
    /// Only the allowed effects are reliable: `copy_move` means move.
    EffectAllowed,
}

impl DropEffectSource {
    pub fn final_effect(self, transfer: &DataTransfer) -> DropEffect {
        match self {
            DropEffectSource::DropEffect => transfer.drop_effect(),
            DropEffectSource::EffectAllowed => {
                if transfer.effect_allowed() == EffectAllowed::CopyMove {
                    DropEffect::Move
                } else {
                    DropEffect::Copy
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDropConfig {
    /// Coalescing interval of drop marker updates and the delay of its removal.
    pub marker_interval_ms: u64,
    pub search_bias: SearchBias,
    pub drop_effect_source: DropEffectSource,
    /// Make the whole editable draggable on pointer down over a text selection.
    pub draggable_editable_on_selection: bool,
}

impl Default for DragDropConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Blink)
    }
}

impl DragDropConfig {
    pub fn for_environment(environment: Environment) -> Self {
        let gecko = environment == Environment::Gecko;
        Self {
            marker_interval_ms: DEFAULT_MARKER_INTERVAL_MS,
            search_bias: if gecko {
                SearchBias::Forward
            } else {
                SearchBias::Backward
            },
            drop_effect_source: if gecko {
                DropEffectSource::DropEffect
            } else {
                DropEffectSource::EffectAllowed
            },
            draggable_editable_on_selection: environment == Environment::Blink,
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    pub fn marker_interval(&self) -> Duration {
        Duration::from_millis(self.marker_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DragDropConfig::from_json_str(r#"{ "search_bias": "forward" }"#).unwrap();
        assert_eq!(config.search_bias, SearchBias::Forward);
        assert_eq!(config.marker_interval(), Duration::from_millis(40));
        assert_eq!(config.drop_effect_source, DropEffectSource::EffectAllowed);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = DragDropConfig::from_json_str(r#"{ "marker_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroInterval));
        assert!(DragDropConfig::from_json_str("{").is_err());
    }

    #[test]
    fn gecko_reads_the_drop_effect() {
        let config = DragDropConfig::for_environment(Environment::Gecko);
        assert_eq!(config.search_bias, SearchBias::Forward);
        assert!(!config.draggable_editable_on_selection);

        let transfer = DataTransfer::new();
        transfer.set_effect_allowed(EffectAllowed::CopyMove);
        transfer.set_drop_effect(DropEffect::Copy);
        assert_eq!(config.drop_effect_source.final_effect(&transfer), DropEffect::Copy);
        assert_eq!(
            DropEffectSource::EffectAllowed.final_effect(&transfer),
            DropEffect::Move
        );
    }
}
