//! Per-instance diagnostics from the engine.
//!
//! Each engine context carries its own handler, so two compressors running on
//! different threads never share a message sink unless the caller hands them
//! the same one.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageLevel {
    Warning,
    Error,
}

/// Receives engine diagnostics.
pub trait MessageHandler: Send + Sync {
    fn message(&self, level: MessageLevel, text: &str);
}

impl<F> MessageHandler for F
where
    F: Fn(MessageLevel, &str) + Send + Sync,
{
    fn message(&self, level: MessageLevel, text: &str) {
        self(level, text)
    }
}

/// Engine configuration injected at construction.
#[derive(Clone, Default)]
pub struct EngineConfig {
    handler: Option<Arc<dyn MessageHandler>>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    pub fn set_message_handler(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handler = Some(handler);
    }

    pub fn emit(&self, level: MessageLevel, text: &str) {
        match &self.handler {
            Some(handler) => handler.message(level, text),
            None => match level {
                MessageLevel::Warning => log::warn!("{text}"),
                MessageLevel::Error => log::error!("{text}"),
            },
        }
    }

    pub fn warn(&self, text: &str) {
        self.emit(MessageLevel::Warning, text);
    }

    /// Report `err` and hand it back, for use in `map_err`.
    pub fn report<E: fmt::Display>(&self, err: E) -> E {
        self.emit(MessageLevel::Error, &err.to_string());
        err
    }
}
