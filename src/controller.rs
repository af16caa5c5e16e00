use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ControllerConfig;
use crate::device::DeviceOracle;
use crate::document::{EditorView, FocusTarget};
use crate::focus::{FocusArbiter, KeyboardVisibility};
use crate::keyboard::{Key, KeyboardProps, LayoutName};
use crate::scheduler::{CoalescingScheduler, TimerKind};
use crate::surface::{SurfaceCoordinator, TapOutcome, TouchDisposition, TouchPoint};
use crate::translate::{translate, Translation};
use crate::typing::TypingTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "layout", rename_all = "snake_case")]
pub enum KeyOutcome {
    Edited,
    LayoutChanged(LayoutName),
    Ignored,
}

/// Drives an editor surface from on-screen keyboard events.
///
/// All entry points take the current time in milliseconds. Timers that fell
/// due before that time are fired first, in deadline order, so events and
/// deferred actions interleave the way they would on a live event loop.
pub struct InputController<V: EditorView, D: DeviceOracle> {
    config: ControllerConfig,
    device: D,
    view: Option<V>,
    layout: LayoutName,
    sched: CoalescingScheduler,
    typing: TypingTracker,
    focus: FocusArbiter,
    surface: SurfaceCoordinator,
}

impl<V: EditorView, D: DeviceOracle> InputController<V, D> {
    pub fn new(config: ControllerConfig, device: D) -> Self {
        let typing = TypingTracker::new(config.typing_quiet_ms);
        let focus = FocusArbiter::new(&config);
        let surface = SurfaceCoordinator::new(config.tap_debounce_ms);
        Self {
            config,
            device,
            view: None,
            layout: LayoutName::Default,
            sched: CoalescingScheduler::new(),
            typing,
            focus,
            surface,
        }
    }

    pub fn mount(&mut self, mut view: V, now_ms: u64) {
        self.advance(now_ms);
        let is_touch = self.device.is_touch();
        if is_touch {
            view.suppress_native_keyboard();
        }
        self.view = Some(view);
        self.focus.mount(is_touch);
        debug!(is_touch, "editor mounted");
    }

    /// Cancel every pending timer, stop listening for focus changes, reset
    /// session state and hand the view back.
    pub fn dispose(&mut self) -> Option<V> {
        self.sched.cancel_all();
        self.focus.detach();
        self.layout = LayoutName::Default;
        self.typing.reset();
        self.surface.reset();
        self.view.take()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut V> {
        self.view.as_mut()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn layout(&self) -> LayoutName {
        self.layout
    }

    pub fn keyboard_props(&self) -> KeyboardProps {
        KeyboardProps::new(self.layout)
    }

    pub fn visibility(&self) -> KeyboardVisibility {
        self.focus.visibility()
    }

    pub fn is_keyboard_visible(&self) -> bool {
        self.focus.is_visible()
    }

    /// Whether the keyboard widget should be on screen right now.
    pub fn should_render_keyboard(&self) -> bool {
        !self.device.is_touch() || self.focus.is_visible()
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_typing()
    }

    pub fn pending_timers(&self) -> usize {
        self.sched.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.sched.next_deadline()
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.sched.is_pending(kind)
    }

    /// Fire every timer due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        while let Some((kind, due)) = self.sched.pop_due(now_ms) {
            trace!(?kind, due, "timer fired");
            self.fire(kind, due);
        }
    }

    fn fire(&mut self, kind: TimerKind, at_ms: u64) {
        match kind {
            TimerKind::TypingStop => self.typing.on_stop_timer(at_ms),
            TimerKind::BlurDismiss => {
                if !self.device.is_touch() {
                    return;
                }
                let active = self
                    .view
                    .as_ref()
                    .map(|v| v.active_target())
                    .unwrap_or(FocusTarget::None);
                if self.focus.on_blur_timer(active, &self.typing, at_ms) {
                    debug!("keyboard hidden after blur");
                }
            }
            TimerKind::Refocus => match self.view.as_mut() {
                Some(view) => self.focus.run_refocus(view, at_ms, &mut self.sched),
                None => debug!("refocus skipped: editor not mounted"),
            },
            TimerKind::FocusRetry => {
                if let Some(view) = self.view.as_mut() {
                    self.focus.run_focus_retry(view);
                }
            }
        }
    }

    /// Every key that reaches a mounted editor counts as activity, including
    /// layout switches and edits the document rejects.
    pub fn handle_key(&mut self, id: &str, now_ms: u64) -> KeyOutcome {
        self.advance(now_ms);

        if self.view.is_none() {
            debug!(key = id, "key ignored: editor not mounted");
            return KeyOutcome::Ignored;
        }

        self.typing.start_typing(now_ms, &mut self.sched);
        let outcome = self.apply_key(id, now_ms);
        self.typing.stop_typing(now_ms, &mut self.sched);
        outcome
    }

    fn apply_key(&mut self, id: &str, now_ms: u64) -> KeyOutcome {
        let Some(view) = self.view.as_mut() else {
            return KeyOutcome::Ignored;
        };

        let key = Key::parse(id);
        let selection = view.selection();
        let Some(from) = view.resolve(selection.from) else {
            debug!(key = id, ?selection, "key ignored: selection does not resolve");
            return KeyOutcome::Ignored;
        };

        match translate(
            &key,
            self.layout,
            selection,
            &from,
            &self.config.block_policy,
        ) {
            Translation::Edit { mutation, caret } => {
                if let Err(err) = view.apply(&mutation) {
                    debug!(key = id, ?mutation, "mutation rejected: {err:#}");
                    return KeyOutcome::Ignored;
                }
                if let Some(caret) = caret {
                    view.select_near(caret.pos, caret.bias);
                }
                view.scroll_into_view();

                self.focus.request_refocus(now_ms, &mut self.sched);
                KeyOutcome::Edited
            }
            Translation::Layout { layout } => {
                self.layout = layout;
                KeyOutcome::LayoutChanged(layout)
            }
            Translation::Ignore => KeyOutcome::Ignored,
        }
    }

    pub fn handle_focus(&mut self, now_ms: u64) {
        self.advance(now_ms);
        if self.device.is_touch() {
            self.focus.on_focus(now_ms, &mut self.sched);
        }
    }

    pub fn handle_blur(&mut self, now_ms: u64) {
        self.advance(now_ms);
        if self.device.is_touch() {
            self.focus.on_blur(now_ms, &mut self.sched);
        }
    }

    pub fn handle_touch_start(&mut self, touches: &[TouchPoint], now_ms: u64) -> TouchDisposition {
        self.advance(now_ms);
        let disposition = self
            .surface
            .classify_touch(touches, self.device.is_touch());
        if disposition == TouchDisposition::Intercepted {
            self.tap(now_ms);
        }
        disposition
    }

    pub fn handle_click(&mut self, now_ms: u64) -> TapOutcome {
        self.advance(now_ms);
        self.tap(now_ms)
    }

    fn tap(&mut self, now_ms: u64) -> TapOutcome {
        if !self.surface.accept_tap(now_ms) {
            return TapOutcome::Debounced;
        }
        if !self.device.is_touch() {
            return TapOutcome::Accepted;
        }
        self.focus.request_refocus(now_ms, &mut self.sched);
        self.focus.show();
        TapOutcome::Activated
    }
}
