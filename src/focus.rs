//! Keyboard visibility and focus hand-off between the keyboard and the editor surface.
//!
//! Visibility is a two-state machine:
//!
//! - `Hidden -> Visible` on a surface focus signal, on an accepted surface tap
//!   (touch devices), or at mount on non-touch devices.
//! - `Visible -> Hidden` only when a blur's grace period elapses with focus
//!   outside both the keyboard and the editor, no typing in progress and no
//!   content key pressed within `recent_key_ms`.
//!
//! The arbiter only listens to focus/blur on touch devices; on desktop the
//! keyboard is a docked panel that stays visible.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ControllerConfig;
use crate::document::{Bias, EditorView, FocusTarget};
use crate::scheduler::{CoalescingScheduler, TimerKind};
use crate::typing::TypingTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardVisibility {
    #[default]
    Hidden,
    Visible,
}

#[derive(Debug, Clone)]
pub struct FocusArbiter {
    visibility: KeyboardVisibility,
    listening: bool,
    blur_grace_ms: u64,
    recent_key_ms: u64,
    refocus_debounce_ms: u64,
    focus_retry_ms: u64,
}

impl FocusArbiter {
    pub fn new(cfg: &ControllerConfig) -> Self {
        Self {
            visibility: KeyboardVisibility::Hidden,
            listening: false,
            blur_grace_ms: cfg.blur_grace_ms,
            recent_key_ms: cfg.recent_key_ms,
            refocus_debounce_ms: cfg.refocus_debounce_ms,
            focus_retry_ms: cfg.focus_retry_ms,
        }
    }

    pub fn mount(&mut self, is_touch: bool) {
        if is_touch {
            self.listening = true;
            self.visibility = KeyboardVisibility::Hidden;
        } else {
            self.listening = false;
            self.visibility = KeyboardVisibility::Visible;
        }
    }

    pub fn detach(&mut self) {
        self.listening = false;
        self.visibility = KeyboardVisibility::Hidden;
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn visibility(&self) -> KeyboardVisibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == KeyboardVisibility::Visible
    }

    pub fn show(&mut self) {
        self.visibility = KeyboardVisibility::Visible;
    }

    pub fn on_focus(&mut self, now_ms: u64, sched: &mut CoalescingScheduler) {
        if !self.listening {
            return;
        }
        sched.cancel(TimerKind::BlurDismiss);
        self.show();
        self.request_refocus(now_ms, sched);
    }

    pub fn on_blur(&mut self, now_ms: u64, sched: &mut CoalescingScheduler) {
        if !self.listening {
            return;
        }
        sched.schedule(
            TimerKind::BlurDismiss,
            now_ms.saturating_add(self.blur_grace_ms),
        );
    }

    /// Decide whether the blur grace period ends with the keyboard hidden.
    /// Returns true if visibility changed.
    pub fn on_blur_timer(
        &mut self,
        active: FocusTarget,
        typing: &TypingTracker,
        now_ms: u64,
    ) -> bool {
        if !self.listening || !self.is_visible() {
            return false;
        }

        let focus_retained = matches!(active, FocusTarget::Keyboard | FocusTarget::Editor);
        let recent_key = typing.pressed_within(now_ms, self.recent_key_ms);
        if focus_retained || typing.is_typing() || recent_key {
            debug!(
                ?active,
                typing = typing.is_typing(),
                recent_key,
                "keyboard dismissal aborted"
            );
            return false;
        }

        self.visibility = KeyboardVisibility::Hidden;
        true
    }

    pub fn request_refocus(&mut self, now_ms: u64, sched: &mut CoalescingScheduler) {
        sched.schedule(
            TimerKind::Refocus,
            now_ms.saturating_add(self.refocus_debounce_ms),
        );
    }

    /// Focus the surface and re-seat the caret, then arm one verification.
    pub fn run_refocus<V: EditorView + ?Sized>(
        &mut self,
        view: &mut V,
        now_ms: u64,
        sched: &mut CoalescingScheduler,
    ) {
        view.focus();
        let selection = view.selection();
        view.select_near(selection.to, Bias::Forward);
        view.scroll_into_view();
        sched.schedule(
            TimerKind::FocusRetry,
            now_ms.saturating_add(self.focus_retry_ms),
        );
    }

    pub fn run_focus_retry<V: EditorView + ?Sized>(&mut self, view: &mut V) {
        if view.active_target() != FocusTarget::Editor {
            debug!("editor did not take focus; retrying once");
            view.focus();
        }
    }
}
