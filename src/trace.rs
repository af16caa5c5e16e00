use crate::keyboard::{Key, LayoutName};
use crate::model::{keys_for_text, Event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub event_index: usize,
    pub line: String,
}

/// Precompute console trace lines so a typing run can be announced before
/// its first key is replayed.
pub fn script_console_trace(events: &[Event]) -> Vec<TraceEvent> {
    let mut planner = TracePlanner::default();
    for (event_index, event) in events.iter().enumerate() {
        planner.observe_event(event_index, event);
    }
    planner.finish();

    planner.events.sort_by_key(|event| event.event_index);
    planner.events
}

#[derive(Debug, Default, Clone)]
struct TracePlanner {
    layout: LayoutName,

    typing_run_start: Option<usize>,
    typing_run: String,

    backspace_run_start: Option<usize>,
    backspaces: usize,

    events: Vec<TraceEvent>,
}

impl TracePlanner {
    fn observe_event(&mut self, event_index: usize, event: &Event) {
        match event {
            Event::Key { key } => self.observe_key(event_index, key),
            Event::Type { text } => {
                for key in keys_for_text(text) {
                    self.observe_key(event_index, &key);
                }
            }
            Event::Wait { .. } => {}
            Event::Focus => self.push_line(event_index, "Focus".to_string()),
            Event::Blur => self.push_line(event_index, "Blur".to_string()),
            Event::TouchStart { .. } | Event::Click => {
                self.push_line(event_index, "Tap".to_string())
            }
            Event::SetActive { target } => {
                self.push_line(event_index, format!("Focus moves to {target:?}"))
            }
            Event::Resize { viewport_width } => {
                self.push_line(event_index, format!("Viewport {viewport_width}px"))
            }
            Event::Select { from, to } => {
                self.push_line(event_index, format!("Select {from}..{to}"))
            }
        }
    }

    fn observe_key(&mut self, event_index: usize, id: &str) {
        let key = Key::parse(id);

        if let Some(c) = key.text() {
            self.flush_backspaces();
            if self.typing_run.is_empty() {
                self.typing_run_start = Some(event_index);
            }
            self.typing_run.push(c);
            return;
        }

        match key {
            Key::Backspace => {
                self.flush_typing_run();
                if self.backspaces == 0 {
                    self.backspace_run_start = Some(event_index);
                }
                self.backspaces += 1;
            }
            Key::Enter => self.push_line(event_index, "New block".to_string()),
            Key::Shift | Key::Numbers | Key::Default => {
                self.layout = match key {
                    Key::Shift => self.layout.toggled_shift(),
                    Key::Numbers => LayoutName::Numbers,
                    _ => LayoutName::Default,
                };
                let line = format!("Layout {}", self.layout);
                self.push_line(event_index, line);
            }
            _ => {}
        }
    }

    fn push_line(&mut self, event_index: usize, line: String) {
        self.flush_typing_run();
        self.flush_backspaces();
        self.events.push(TraceEvent { event_index, line });
    }

    fn flush_typing_run(&mut self) {
        let Some(start) = self.typing_run_start.take() else {
            self.typing_run.clear();
            return;
        };
        if self.typing_run.is_empty() {
            return;
        }
        self.events.push(TraceEvent {
            event_index: start,
            line: format!("Typing \"{}\"...", escape_for_log(&self.typing_run)),
        });
        self.typing_run.clear();
    }

    fn flush_backspaces(&mut self) {
        let Some(start) = self.backspace_run_start.take() else {
            return;
        };
        let count = std::mem::take(&mut self.backspaces);
        self.events.push(TraceEvent {
            event_index: start,
            line: format!("Backspace x{count}"),
        });
    }

    fn finish(&mut self) {
        self.flush_typing_run();
        self.flush_backspaces();
    }
}

fn escape_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
