use std::ops::ControlFlow;

use anyhow::{ensure, Context, Result};
use serde::Serialize;

use crate::config::validate_config;
use crate::controller::InputController;
use crate::device::DeviceProfile;
use crate::document::memory::{MemoryDocument, MemoryView};
use crate::document::{EditorView, Selection};
use crate::focus::KeyboardVisibility;
use crate::keyboard::LayoutName;
use crate::model::{keys_for_text, Event, Script, SCRIPT_VERSION};

pub type ScriptController = InputController<MemoryView, DeviceProfile>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptStats {
    pub events: usize,
    pub key_presses: usize,
    pub total_wait_ms: u64,
}

pub fn stats(script: &Script) -> ScriptStats {
    let mut out = ScriptStats {
        events: script.events.len(),
        ..Default::default()
    };

    for event in &script.events {
        match event {
            Event::Wait { ms } => {
                out.total_wait_ms = out.total_wait_ms.saturating_add(*ms);
            }
            Event::Key { .. } => out.key_presses += 1,
            Event::Type { text } => out.key_presses += text.chars().count(),
            _ => {}
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    /// Text of each textblock, with `|` at the caret.
    pub blocks: Vec<String>,
    pub selection: Selection,
    pub layout: LayoutName,
    pub keyboard: KeyboardVisibility,
    pub keyboard_rendered: bool,
    pub typing: bool,
    pub focus_grants: u32,
    pub scroll_requests: u32,
    pub elapsed_ms: u64,
}

/// Build a controller mounted on the script's starting document.
pub fn build_controller(script: &Script) -> Result<ScriptController> {
    ensure!(
        script.version == SCRIPT_VERSION,
        "unsupported script version {}; expected {SCRIPT_VERSION}",
        script.version
    );
    validate_config(&script.config).context("invalid controller config")?;

    let doc = MemoryDocument::new(script.schema.clone(), &script.document)?;
    let mut view = MemoryView::new(doc);
    if let Some(selection) = script.selection {
        view.set_selection(selection);
    }

    let mut ctl = InputController::new(script.config.clone(), script.device.clone());
    ctl.mount(view, 0);
    Ok(ctl)
}

pub fn replay(script: &Script) -> Result<ReplayOutcome> {
    replay_with(script, |_, _| ControlFlow::Continue(()))
}

/// Replay a script, calling `before_event` ahead of each event. Returning
/// `ControlFlow::Break` stops feeding events; pending timers still settle.
pub fn replay_with(
    script: &Script,
    mut before_event: impl FnMut(usize, &Event) -> ControlFlow<()>,
) -> Result<ReplayOutcome> {
    let mut ctl = build_controller(script)?;
    let mut now = 0u64;

    for (index, event) in script.events.iter().enumerate() {
        if before_event(index, event).is_break() {
            break;
        }
        apply_event(&mut ctl, event, &mut now);
    }

    while let Some(deadline) = ctl.next_deadline() {
        now = now.max(deadline);
        ctl.advance(deadline);
    }

    outcome(&ctl, now)
}

pub fn apply_event(ctl: &mut ScriptController, event: &Event, now: &mut u64) {
    match event {
        Event::Key { key } => {
            ctl.handle_key(key, *now);
        }
        Event::Type { text } => {
            for key in keys_for_text(text) {
                ctl.handle_key(&key, *now);
            }
        }
        Event::Wait { ms } => {
            *now = now.saturating_add(*ms);
            ctl.advance(*now);
        }
        Event::Focus => ctl.handle_focus(*now),
        Event::Blur => ctl.handle_blur(*now),
        Event::TouchStart { touches } => {
            ctl.handle_touch_start(touches, *now);
        }
        Event::Click => {
            ctl.handle_click(*now);
        }
        Event::SetActive { target } => {
            ctl.advance(*now);
            if let Some(view) = ctl.view_mut() {
                view.set_active_target(*target);
            }
        }
        Event::Resize { viewport_width } => {
            ctl.advance(*now);
            ctl.device_mut().viewport_width = *viewport_width;
        }
        Event::Select { from, to } => {
            ctl.advance(*now);
            if let Some(view) = ctl.view_mut() {
                view.set_selection(Selection::range(*from, *to));
            }
        }
    }
}

fn outcome(ctl: &ScriptController, elapsed_ms: u64) -> Result<ReplayOutcome> {
    let view = ctl.view().context("editor is not mounted")?;
    Ok(ReplayOutcome {
        blocks: view.text_blocks_with_caret(),
        selection: view.selection(),
        layout: ctl.layout(),
        keyboard: ctl.visibility(),
        keyboard_rendered: ctl.should_render_keyboard(),
        typing: ctl.is_typing(),
        focus_grants: view.focus_grants,
        scroll_requests: view.scroll_requests,
        elapsed_ms,
    })
}
