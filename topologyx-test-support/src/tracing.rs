//! Span and event capture for asserting `tracing` instrumentation in tests.
//!
//! [`TraceCapture`] is a [`Layer`] that keeps closed spans and emitted events
//! in memory. [`capture`] installs it as the thread-local default subscriber
//! for the duration of a closure.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Fields recorded against a span or event, keyed by field name.
pub type Fields = BTreeMap<String, String>;

/// A span observed by [`TraceCapture`], recorded when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSpan {
    /// Span name from the callsite metadata.
    pub name: String,
    /// Fields present at creation plus any recorded later.
    pub fields: Fields,
}

/// An event observed by [`TraceCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Event target (usually the emitting module path).
    pub target: String,
    /// Structured fields, including `message` when present.
    pub fields: Fields,
}

impl CapturedEvent {
    /// Returns the event's `message` field, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").map(String::as_str)
    }
}

#[derive(Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// In-memory layer collecting spans and events.
///
/// # Examples
/// ```
/// use topologyx_test_support::tracing::capture;
///
/// let ((), trace) = capture(|| tracing::info!(points = 3, "done"));
/// assert!(trace.has_event(tracing::Level::INFO, "done"));
/// ```
#[derive(Clone, Default)]
pub struct TraceCapture {
    inner: Arc<Mutex<Captured>>,
}

impl TraceCapture {
    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of closed spans in completion order.
    #[must_use]
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.lock().spans.clone()
    }

    /// Snapshot of events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().events.clone()
    }

    /// Returns the first closed span called `name`.
    #[must_use]
    pub fn span(&self, name: &str) -> Option<CapturedSpan> {
        self.lock().spans.iter().find(|span| span.name == name).cloned()
    }

    /// Counts closed spans called `name`.
    #[must_use]
    pub fn span_count(&self, name: &str) -> usize {
        self.lock()
            .spans
            .iter()
            .filter(|span| span.name == name)
            .count()
    }

    /// Whether an event with `level` and `message` was emitted.
    #[must_use]
    pub fn has_event(&self, level: Level, message: &str) -> bool {
        self.lock()
            .events
            .iter()
            .any(|event| event.level == level && event.message() == Some(message))
    }
}

/// Runs `body` with a fresh [`TraceCapture`] installed as the default
/// subscriber and returns its result alongside the capture.
pub fn capture<T>(body: impl FnOnce() -> T) -> (T, TraceCapture) {
    let layer = TraceCapture::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let output = tracing::subscriber::with_default(subscriber, body);
    (output, layer)
}

struct OpenSpan {
    name: String,
    fields: Fields,
}

impl<S> Layer<S> for TraceCapture
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Fields::new();
        attrs.record(&mut FieldWriter(&mut fields));
        span.extensions_mut().insert(OpenSpan {
            name: attrs.metadata().name().to_owned(),
            fields,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(open) = span.extensions_mut().get_mut::<OpenSpan>() {
            values.record(&mut FieldWriter(&mut open.fields));
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(open) = span.extensions_mut().remove::<OpenSpan>() else {
            return;
        };
        self.lock().spans.push(CapturedSpan {
            name: open.name,
            fields: open.fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::new();
        event.record(&mut FieldWriter(&mut fields));
        let metadata = event.metadata();
        self.lock().events.push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_owned(),
            fields,
        });
    }
}

struct FieldWriter<'a>(&'a mut Fields);

impl FieldWriter<'_> {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldWriter<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_owned());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, value.to_string());
    }
}
