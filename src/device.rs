use serde::{Deserialize, Serialize};

pub const DEFAULT_TOUCH_MAX_WIDTH: u32 = 768;

const MOBILE_USER_AGENT_MARKERS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Answers whether the current environment should be treated as a touch device.
///
/// Implementations are queried on every decision and must not cache: a
/// viewport resize can change the answer between two calls.
pub trait DeviceOracle {
    fn is_touch(&self) -> bool;
}

impl<F: Fn() -> bool> DeviceOracle for F {
    fn is_touch(&self) -> bool {
        self()
    }
}

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_USER_AGENT_MARKERS
        .iter()
        .any(|marker| ua.contains(marker))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub viewport_width: u32,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default = "default_touch_max_width")]
    pub touch_max_width: u32,
}

fn default_touch_max_width() -> u32 {
    DEFAULT_TOUCH_MAX_WIDTH
}

impl DeviceProfile {
    pub fn desktop() -> Self {
        Self {
            viewport_width: 1280,
            user_agent: String::new(),
            touch_max_width: DEFAULT_TOUCH_MAX_WIDTH,
        }
    }

    pub fn phone() -> Self {
        Self {
            viewport_width: 390,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".to_string(),
            touch_max_width: DEFAULT_TOUCH_MAX_WIDTH,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

impl DeviceOracle for DeviceProfile {
    fn is_touch(&self) -> bool {
        self.viewport_width <= self.touch_max_width || is_mobile_user_agent(&self.user_agent)
    }
}
