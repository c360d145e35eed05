//! Callback listeners - Tag-routed handlers for callback events
//!
//! A listener publishes an explicit table of `tag -> handler` pairs. The
//! router stores one binding per tag; the tag of an event is its payload up
//! to the first `#`.

use std::fmt;
use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::CallbackEvent;

/// Callback handler result: optional text shown to the user who pressed the button
pub type CallbackResult = Result<Option<String>, CommandError>;

/// Handler method of a listener
pub type CallbackFn<L> = fn(&L, &CallbackEvent) -> CallbackResult;

/// Object answering callback events
pub trait CallbackListener: Send + Sync + 'static {
    fn callback_table(&self) -> CallbackTable<Self>
    where
        Self: Sized;
}

/// Tag to handler table of one listener type
pub struct CallbackTable<L> {
    entries: Vec<(String, CallbackFn<L>)>,
}

impl<L> CallbackTable<L> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn on(mut self, tag: impl Into<String>, handler: CallbackFn<L>) -> Self {
        self.entries.push((tag.into(), handler));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L> Default for CallbackTable<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener instance and handler bound to one tag
#[derive(Clone)]
pub struct CallbackBinding {
    tag: String,
    listener: &'static str,
    handler: Arc<dyn Fn(&CallbackEvent) -> CallbackResult + Send + Sync>,
}

impl CallbackBinding {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Type name of the listener, for logs
    pub fn listener(&self) -> &'static str {
        self.listener
    }

    pub fn invoke(&self, event: &CallbackEvent) -> CallbackResult {
        (self.handler)(event)
    }
}

impl fmt::Debug for CallbackBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBinding")
            .field("tag", &self.tag)
            .field("listener", &self.listener)
            .finish()
    }
}

/// Bind every entry of a listener's table to the shared instance
pub fn bind<L: CallbackListener>(listener: Arc<L>) -> Vec<CallbackBinding> {
    listener
        .callback_table()
        .entries
        .into_iter()
        .map(|(tag, handler)| {
            let instance = Arc::clone(&listener);
            CallbackBinding {
                tag,
                listener: std::any::type_name::<L>(),
                handler: Arc::new(move |event: &CallbackEvent| handler(&instance, event)),
            }
        })
        .collect()
}
