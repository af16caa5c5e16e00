use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Whether the touch landed inside an editable region.
    #[serde(default)]
    pub inside_editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchDisposition {
    /// Let the platform handle it (caret placement, native selection, scrolling).
    Native,
    /// Default action suppressed; treated as a tap on the document.
    Intercepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TapOutcome {
    /// Within the debounce window of the previous accepted tap.
    Debounced,
    /// Accepted, but the device is not a touch device so nothing is activated.
    Accepted,
    /// Accepted and the keyboard was revealed with a refocus requested.
    Activated,
}

/// Separates taps that should open the keyboard from gestures the platform owns.
#[derive(Debug, Clone)]
pub struct SurfaceCoordinator {
    tap_debounce_ms: u64,
    last_tap_ms: Option<u64>,
}

impl SurfaceCoordinator {
    pub fn new(tap_debounce_ms: u64) -> Self {
        Self {
            tap_debounce_ms,
            last_tap_ms: None,
        }
    }

    pub fn classify_touch(&self, touches: &[TouchPoint], is_touch: bool) -> TouchDisposition {
        if !is_touch {
            return TouchDisposition::Native;
        }
        match touches {
            [single] if single.inside_editable => TouchDisposition::Native,
            _ => TouchDisposition::Intercepted,
        }
    }

    /// Record a tap unless it falls inside the debounce window of the last accepted one.
    pub fn accept_tap(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_tap_ms {
            if now_ms.saturating_sub(last) < self.tap_debounce_ms {
                return false;
            }
        }
        self.last_tap_ms = Some(now_ms);
        true
    }

    pub fn last_tap_ms(&self) -> Option<u64> {
        self.last_tap_ms
    }

    pub fn reset(&mut self) {
        self.last_tap_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSIDE: TouchPoint = TouchPoint {
        inside_editable: true,
    };
    const OUTSIDE: TouchPoint = TouchPoint {
        inside_editable: false,
    };

    #[test]
    fn single_touch_inside_editable_is_native() {
        let coord = SurfaceCoordinator::new(400);
        assert_eq!(coord.classify_touch(&[INSIDE], true), TouchDisposition::Native);
        assert_eq!(
            coord.classify_touch(&[OUTSIDE], true),
            TouchDisposition::Intercepted
        );
        assert_eq!(
            coord.classify_touch(&[INSIDE, INSIDE], true),
            TouchDisposition::Intercepted
        );
        assert_eq!(coord.classify_touch(&[OUTSIDE], false), TouchDisposition::Native);
    }

    #[test]
    fn taps_inside_window_are_debounced() {
        let mut coord = SurfaceCoordinator::new(400);
        assert!(coord.accept_tap(0));
        assert!(!coord.accept_tap(399));
        assert!(coord.accept_tap(400));
        assert!(!coord.accept_tap(500));
        assert_eq!(coord.last_tap_ms(), Some(400));
    }
}
