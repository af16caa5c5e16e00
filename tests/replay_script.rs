use std::ops::ControlFlow;

use pretty_assertions::assert_eq;

use oskedit::document::Selection;
use oskedit::focus::KeyboardVisibility;
use oskedit::keyboard::LayoutName;
use oskedit::model::{Event, Script};
use oskedit::replay::{replay, replay_with, stats, ReplayOutcome};
use oskedit::trace::{script_console_trace, TraceEvent};

fn script(json: &str) -> Script {
    serde_json::from_str(json).expect("valid script")
}

fn key(id: &str) -> Event {
    Event::Key {
        key: id.to_string(),
    }
}

fn type_text(text: &str) -> Event {
    Event::Type {
        text: text.to_string(),
    }
}

#[test]
fn desktop_session_edits_and_settles() {
    let script = script(
        r#"{
            "version": 1,
            "document": [{"type": "paragraph", "text": "hello"}],
            "selection": {"from": 6, "to": 6},
            "events": [
                {"type": "type", "text": " world"},
                {"type": "key", "key": "{backspace}"},
                {"type": "key", "key": "{enter}"},
                {"type": "type", "text": "ok"},
                {"type": "wait", "ms": 1000}
            ]
        }"#,
    );

    let outcome = replay(&script).expect("replay succeeds");
    assert_eq!(
        outcome,
        ReplayOutcome {
            blocks: vec!["hello worl".to_string(), "ok|".to_string()],
            selection: Selection::caret(15),
            layout: LayoutName::Default,
            keyboard: KeyboardVisibility::Visible,
            keyboard_rendered: true,
            typing: false,
            focus_grants: 1,
            scroll_requests: 11,
            elapsed_ms: 1000,
        }
    );
}

#[test]
fn nested_document_enter_keeps_containers_intact() {
    let script = script(
        r#"{
            "version": 1,
            "document": [{"type": "blockGroup", "content": [
                {"type": "blockContainer", "content": [{"type": "paragraph", "text": "ab"}]},
                {"type": "blockContainer", "content": [{"type": "paragraph", "text": "cd"}]}
            ]}],
            "selection": {"from": 4, "to": 4},
            "events": [
                {"type": "key", "key": "{enter}"},
                {"type": "type", "text": "new"}
            ]
        }"#,
    );

    let outcome = replay(&script).expect("replay succeeds");
    assert_eq!(outcome.blocks, vec!["ab", "new|", "cd"]);
}

#[test]
fn touch_session_hides_keyboard_when_focus_leaves() {
    let script = script(
        r#"{
            "version": 1,
            "device": {"viewport_width": 390},
            "document": [{"type": "paragraph", "text": "note"}],
            "events": [
                {"type": "click"},
                {"type": "wait", "ms": 500},
                {"type": "set_active", "target": "elsewhere"},
                {"type": "blur"},
                {"type": "wait", "ms": 400}
            ]
        }"#,
    );

    let outcome = replay(&script).expect("replay succeeds");
    assert_eq!(outcome.keyboard, KeyboardVisibility::Hidden);
    assert!(!outcome.keyboard_rendered);
    assert_eq!(outcome.focus_grants, 1);
    assert_eq!(outcome.blocks, vec!["|note"]);
}

#[test]
fn resize_to_desktop_renders_keyboard_again() {
    let script = script(
        r#"{
            "version": 1,
            "device": {"viewport_width": 390},
            "document": [{"type": "paragraph"}],
            "events": [
                {"type": "resize", "viewport_width": 1440}
            ]
        }"#,
    );

    let outcome = replay(&script).expect("replay succeeds");
    assert_eq!(outcome.keyboard, KeyboardVisibility::Hidden);
    assert!(outcome.keyboard_rendered);
}

#[test]
fn select_then_backspace_deletes_range() {
    let script = script(
        r#"{
            "version": 1,
            "document": [
                {"type": "paragraph", "text": "hello"},
                {"type": "paragraph", "text": "world"}
            ],
            "events": [
                {"type": "select", "from": 3, "to": 10},
                {"type": "key", "key": "{backspace}"},
                {"type": "key", "key": "{shift}"},
                {"type": "key", "key": "X"}
            ]
        }"#,
    );

    let outcome = replay(&script).expect("replay succeeds");
    assert_eq!(outcome.blocks, vec!["heX|rld"]);
    assert_eq!(outcome.layout, LayoutName::Shift);
}

#[test]
fn rejects_unknown_script_version() {
    let script = script(r#"{"version": 2, "document": [], "events": []}"#);
    let err = replay(&script).expect_err("version 2 is not supported");
    assert!(
        format!("{err:#}").contains("unsupported script version 2"),
        "{err:#}"
    );
}

#[test]
fn rejects_invalid_config() {
    let script = script(
        r#"{
            "version": 1,
            "config": {"typing_quiet_ms": 0},
            "document": [{"type": "paragraph"}],
            "events": []
        }"#,
    );
    let err = replay(&script).expect_err("zero quiet period is invalid");
    let msg = format!("{err:#}");
    assert!(msg.contains("invalid controller config"), "{msg}");
    assert!(msg.contains("typing_quiet_ms"), "{msg}");
}

#[test]
fn rejects_text_outside_textblocks() {
    let script = script(
        r#"{
            "version": 1,
            "document": [{"type": "blockGroup", "text": "loose"}],
            "events": []
        }"#,
    );
    assert!(replay(&script).is_err());
}

#[test]
fn break_stops_feeding_events_but_settles_timers() {
    let script = script(
        r#"{
            "version": 1,
            "document": [{"type": "paragraph"}],
            "events": [
                {"type": "type", "text": "ab"},
                {"type": "wait", "ms": 50},
                {"type": "type", "text": "cd"}
            ]
        }"#,
    );

    let mut seen = Vec::new();
    let outcome = replay_with(&script, |index, _| {
        seen.push(index);
        if index == 2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .expect("replay succeeds");

    assert_eq!(seen, vec![0, 1, 2]);
    assert_eq!(outcome.blocks, vec!["ab|"]);
    assert!(!outcome.typing);
    assert_eq!(outcome.elapsed_ms, 300);
}

#[test]
fn stats_count_keys_and_waits() {
    let script = Script {
        events: vec![
            type_text("ab c"),
            key("{enter}"),
            Event::Wait { ms: 200 },
            Event::Wait { ms: 300 },
        ],
        ..script(r#"{"version": 1, "document": [], "events": []}"#)
    };

    let st = stats(&script);
    assert_eq!(st.events, 4);
    assert_eq!(st.key_presses, 5);
    assert_eq!(st.total_wait_ms, 500);
}

#[test]
fn console_trace_groups_runs() {
    let events = vec![
        type_text("hi"),
        key("{backspace}"),
        key("{backspace}"),
        key("{shift}"),
        key("A"),
        key("{enter}"),
        Event::Blur,
    ];

    let trace = script_console_trace(&events);
    let expected = [
        (0, "Typing \"hi\"..."),
        (1, "Backspace x2"),
        (3, "Layout shift"),
        (4, "Typing \"A\"..."),
        (5, "New block"),
        (6, "Blur"),
    ]
    .into_iter()
    .map(|(event_index, line)| TraceEvent {
        event_index,
        line: line.to_string(),
    })
    .collect::<Vec<_>>();

    assert_eq!(trace, expected);
}

#[test]
fn console_trace_tracks_layout_across_shift_toggles() {
    let events = vec![
        key("{shift}"),
        key("{shift}"),
        key("{numbers}"),
        type_text("a\"b"),
        key("{default}"),
    ];

    let lines: Vec<String> = script_console_trace(&events)
        .into_iter()
        .map(|event| event.line)
        .collect();
    assert_eq!(
        lines,
        vec![
            "Layout shift",
            "Layout default",
            "Layout numbers",
            "Typing \"a\\\"b\"...",
            "Layout default",
        ]
    );
}
