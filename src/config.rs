use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::document::NodeInfo;

/// How `{enter}` picks the ancestor to insert the new block after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum EnterAnchor {
    /// The ancestor's default child type name contains this substring.
    DefaultChildContains(String),
    /// The ancestor's default child type is exactly this name.
    DefaultChildIs(String),
}

impl EnterAnchor {
    pub fn matches(&self, node: &NodeInfo) -> bool {
        let Some(child) = node.default_child.as_deref() else {
            return false;
        };
        match self {
            EnterAnchor::DefaultChildContains(needle) => child.contains(needle.as_str()),
            EnterAnchor::DefaultChildIs(name) => child == name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPolicy {
    /// Block type created by `{enter}` and treated as paragraph-like by `{backspace}`.
    pub paragraph_type: String,
    pub enter_anchor: EnterAnchor,
}

impl Default for BlockPolicy {
    fn default() -> Self {
        Self {
            paragraph_type: "paragraph".to_string(),
            enter_anchor: EnterAnchor::DefaultChildContains("paragraph".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub typing_quiet_ms: u64,
    pub blur_grace_ms: u64,
    pub recent_key_ms: u64,
    pub refocus_debounce_ms: u64,
    pub focus_retry_ms: u64,
    pub tap_debounce_ms: u64,
    pub block_policy: BlockPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            typing_quiet_ms: 300,
            blur_grace_ms: 300,
            recent_key_ms: 500,
            refocus_debounce_ms: 100,
            focus_retry_ms: 50,
            tap_debounce_ms: 400,
            block_policy: BlockPolicy::default(),
        }
    }
}

pub fn validate_config(cfg: &ControllerConfig) -> Result<()> {
    ensure!(cfg.typing_quiet_ms > 0, "typing_quiet_ms must be > 0");
    ensure!(cfg.blur_grace_ms > 0, "blur_grace_ms must be > 0");
    ensure!(cfg.refocus_debounce_ms > 0, "refocus_debounce_ms must be > 0");
    ensure!(cfg.focus_retry_ms > 0, "focus_retry_ms must be > 0");
    ensure!(cfg.tap_debounce_ms > 0, "tap_debounce_ms must be > 0");
    ensure!(
        cfg.recent_key_ms >= cfg.typing_quiet_ms,
        "recent_key_ms must be >= typing_quiet_ms"
    );

    let policy = &cfg.block_policy;
    ensure!(
        !policy.paragraph_type.trim().is_empty(),
        "block_policy.paragraph_type must not be empty"
    );
    let needle = match &policy.enter_anchor {
        EnterAnchor::DefaultChildContains(s) | EnterAnchor::DefaultChildIs(s) => s,
    };
    ensure!(
        !needle.trim().is_empty(),
        "block_policy.enter_anchor must name a block type"
    );

    Ok(())
}
