//! Input events and the callback list that routes them.
//!
//! The host translates its native events into [`InputEvent`]s; a
//! [`Dispatcher`] hands each one to every callback registered for its
//! [`EventKind`], in registration order.

use crate::render::RenderFlags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Orbit,
    Pan,
    Zoom,
    ResetView,
    Toggle,
    Resize,
}

/// Viewport input, already scaled to camera units by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Orbit around the target; degrees.
    Orbit { dx: f32, dy: f32 },
    /// Move the target in the view plane; world units.
    Pan { dx: f32, dy: f32 },
    /// Move toward (positive) or away from the target.
    Zoom(f32),
    ResetView,
    Toggle(RenderFlags),
    Resize { width: u32, height: u32 },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Orbit { .. } => EventKind::Orbit,
            InputEvent::Pan { .. } => EventKind::Pan,
            InputEvent::Zoom(_) => EventKind::Zoom,
            InputEvent::ResetView => EventKind::ResetView,
            InputEvent::Toggle(_) => EventKind::Toggle,
            InputEvent::Resize { .. } => EventKind::Resize,
        }
    }
}

pub type Callback<C> = fn(&mut C, &InputEvent);

pub struct Dispatcher<C> {
    callbacks: Vec<(EventKind, Callback<C>)>,
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn register(&mut self, kind: EventKind, callback: Callback<C>) {
        self.callbacks.push((kind, callback));
    }

    /// Drop every callback bound to `kind`.
    pub fn clear(&mut self, kind: EventKind) {
        self.callbacks.retain(|(k, _)| *k != kind);
    }

    /// Run the callbacks bound to the event's kind. Returns how many ran.
    pub fn dispatch(&self, context: &mut C, event: &InputEvent) -> usize {
        let kind = event.kind();
        let mut handled = 0;
        for (_, callback) in self.callbacks.iter().filter(|(k, _)| *k == kind) {
            callback(context, event);
            handled += 1;
        }
        handled
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.callbacks.iter().map(|(kind, _)| kind))
            .finish()
    }
}
