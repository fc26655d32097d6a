//! Demo callbacks
//!
//! Four callbacks that report what they are called with. Each one records a
//! line in a shared [`Transcript`] instead of printing directly, so the run
//! report can show the lines or serialize them.

use callback_registry::{CallbackRef, CallbackResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Names a scenario may refer to
pub const DEMO_CALLBACKS: &[&str] = &["cbk1", "cbk2", "cbk3", "cbk4"];

/// Lines recorded by the demo callbacks, in call order
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        log::trace!("transcript: {}", line);
        self.lines.lock().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

/// Render a context value the way the demo prints it
pub fn format_context(ctx: &Value) -> String {
    match ctx {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The four demo callbacks, bound to one transcript
pub struct DemoCallbacks {
    callbacks: Vec<(&'static str, CallbackRef<Value>)>,
}

impl DemoCallbacks {
    pub fn new(transcript: &Transcript) -> Self {
        let callbacks = vec![
            ("cbk1", plain("1st callback", transcript)),
            ("cbk2", detailed("2nd callback", transcript)),
            ("cbk3", detailed("3rd callback", transcript)),
            ("cbk4", plain("4th callback", transcript)),
        ];
        Self { callbacks }
    }

    /// Look up a callback by its scenario name
    pub fn get(&self, name: &str) -> Option<&CallbackRef<Value>> {
        self.callbacks
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, cb)| cb)
    }
}

/// Callback that only announces itself
fn plain(label: &'static str, transcript: &Transcript) -> CallbackRef<Value> {
    let transcript = transcript.clone();
    CallbackRef::new(move |_, _, _| -> CallbackResult {
        transcript.push(label.to_string());
        Ok(())
    })
}

/// Callback that reports its arguments
fn detailed(label: &'static str, transcript: &Transcript) -> CallbackRef<Value> {
    let transcript = transcript.clone();
    CallbackRef::new(move |str_val, int_val, ctx| -> CallbackResult {
        transcript.push(format!(
            "{} [{}] {} {}",
            label,
            str_val,
            int_val,
            format_context(ctx)
        ));
        Ok(())
    })
}
