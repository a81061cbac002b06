//! Where revealed secrets go.

use std::time::Duration;

use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::process;

/// Receives one secret value per call.
pub trait Sink {
    /// Hand over `value` exactly as given. Failures are `SinkUnavailable`.
    fn send(&mut self, value: &str) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn send(&mut self, value: &str) -> Result<()> {
        (**self).send(value)
    }
}

/// Pipes the value into a configured command such as `pbcopy`,
/// `xclip -selection clipboard` or `wl-copy`.
#[derive(Debug, Clone)]
pub struct CommandSink {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandSink {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }
}

impl Sink for CommandSink {
    fn send(&mut self, value: &str) -> Result<()> {
        process::run_discarding_stdout(&self.argv, value.as_bytes(), self.timeout)
            .map_err(|e| CredVaultError::SinkUnavailable(e.to_string()))?;
        Ok(())
    }
}

/// Writes the value to the system clipboard.
///
/// The clipboard handle is opened on first use and kept for the life of
/// the sink: on X11 and Wayland the copied text is only served while it
/// is alive.
#[derive(Default)]
pub struct ClipboardSink {
    clipboard: Option<arboard::Clipboard>,
}

impl ClipboardSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for ClipboardSink {
    fn send(&mut self, value: &str) -> Result<()> {
        let clipboard = match &mut self.clipboard {
            Some(c) => c,
            slot @ None => slot.insert(
                arboard::Clipboard::new()
                    .map_err(|e| CredVaultError::SinkUnavailable(format!("clipboard: {e}")))?,
            ),
        };
        clipboard
            .set_text(value.to_string())
            .map_err(|e| CredVaultError::SinkUnavailable(format!("clipboard: {e}")))
    }
}

/// The sink described by `settings`: the configured command, or the
/// system clipboard when none is set.
pub fn from_settings(settings: &Settings) -> Box<dyn Sink> {
    if settings.sink_command.is_empty() {
        Box::new(ClipboardSink::new())
    } else {
        Box::new(CommandSink::new(
            settings.sink_command.clone(),
            settings.sink_timeout(),
        ))
    }
}
