use std::fs;
use std::io::{self, Read};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use oskedit::device::{is_mobile_user_agent, DeviceOracle, DeviceProfile, DEFAULT_TOUCH_MAX_WIDTH};
use oskedit::keyboard::{display_label, layout_rows, LayoutName};
use oskedit::model::{Event, Script};
use oskedit::replay::{replay_with, stats};
use oskedit::trace::script_console_trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Default,
    Shift,
    Numbers,
}

impl LayoutArg {
    fn to_library(self) -> LayoutName {
        match self {
            LayoutArg::Default => LayoutName::Default,
            LayoutArg::Shift => LayoutName::Shift,
            LayoutArg::Numbers => LayoutName::Numbers,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "oskedit")]
#[command(about = "On-screen keyboard input controller for rich-text editors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a recorded session script against an in-memory document
    Replay {
        /// Script file (JSON), or '-' for stdin
        #[arg(long, value_name = "PATH")]
        script: PathBuf,

        /// Write the outcome JSON here instead of stdout
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Pace `wait` events on the wall clock (Ctrl+C stops early)
        #[arg(long)]
        realtime: bool,

        /// Disable console trace output
        #[arg(long)]
        no_trace: bool,
    },

    /// Print keyboard layouts with display labels
    Layouts {
        /// Only print this layout
        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,
    },

    /// Report whether a viewport / user agent counts as a touch device
    Classify {
        #[arg(long)]
        width: u32,

        #[arg(long, default_value = "")]
        user_agent: String,

        #[arg(long, default_value_t = DEFAULT_TOUCH_MAX_WIDTH)]
        touch_max_width: u32,
    },
}

#[derive(Debug, Serialize)]
struct Classification {
    touch: bool,
    narrow_viewport: bool,
    mobile_user_agent: bool,
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == std::ffi::OsStr::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: &PathBuf, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn sleep_interruptible(stop: &AtomicBool, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(50);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}

fn print_trace_line(line: &str) {
    const RESET: &str = "\x1b[0m";
    const TYPING: &str = "\x1b[34m";
    const DELETE: &str = "\x1b[33m";

    if let Some(rest) = line.strip_prefix("Typing") {
        eprintln!("{TYPING}Typing{RESET}{rest}");
    } else if let Some(rest) = line.strip_prefix("Backspace") {
        eprintln!("{DELETE}Backspace{RESET}{rest}");
    } else {
        eprintln!("{line}");
    }
}

fn render_layout(layout: LayoutName) -> String {
    let mut out = format!("[{layout}]\n");
    for row in layout_rows(layout) {
        let keys: Vec<&str> = row
            .split(' ')
            .filter(|id| !id.is_empty())
            .map(|id| display_label(id).unwrap_or(id))
            .collect();
        out.push_str(&keys.join(" "));
        out.push('\n');
    }
    out
}

fn run_replay(script_path: &PathBuf, output: Option<PathBuf>, realtime: bool, trace: bool) -> Result<()> {
    let json = read_input(script_path)?;
    let script: Script = serde_json::from_str(&json).context("failed to parse script JSON")?;

    let st = stats(&script);
    eprintln!(
        "Replaying: {} events, {} key presses, {:.1}s of waits",
        st.events,
        st.key_presses,
        (st.total_wait_ms as f64) / 1000.0
    );

    let stop = Arc::new(AtomicBool::new(false));
    if realtime {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("failed to install Ctrl+C handler")?;
    }

    let trace_events = trace.then(|| script_console_trace(&script.events));
    let mut next_trace_event = 0usize;

    let outcome = replay_with(&script, |index, event| {
        if stop.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }

        if let Some(events) = &trace_events {
            while next_trace_event < events.len() && events[next_trace_event].event_index == index {
                print_trace_line(&events[next_trace_event].line);
                next_trace_event += 1;
            }
        }

        if realtime {
            if let Event::Wait { ms } = event {
                sleep_interruptible(stop.as_ref(), *ms);
            }
        }
        ControlFlow::Continue(())
    })?;

    if stop.load(Ordering::SeqCst) {
        eprintln!("Interrupted; reporting state at the point of interruption.");
    }

    let json = serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?;
    if let Some(out) = output {
        write_output(&out, &json)?;
    } else {
        println!("{json}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            script,
            output,
            realtime,
            no_trace,
        } => run_replay(&script, output, realtime, !no_trace)?,
        Command::Layouts { layout } => {
            let layouts: Vec<LayoutName> = match layout {
                Some(l) => vec![l.to_library()],
                None => LayoutName::ALL.to_vec(),
            };
            for layout in layouts {
                print!("{}", render_layout(layout));
            }
        }
        Command::Classify {
            width,
            user_agent,
            touch_max_width,
        } => {
            let profile = DeviceProfile {
                viewport_width: width,
                user_agent,
                touch_max_width,
            };
            let classification = Classification {
                touch: profile.is_touch(),
                narrow_viewport: profile.viewport_width <= profile.touch_max_width,
                mobile_user_agent: is_mobile_user_agent(&profile.user_agent),
            };
            let json = serde_json::to_string_pretty(&classification)
                .context("failed to serialize classification")?;
            println!("{json}");
        }
    }

    Ok(())
}
