#![forbid(unsafe_code)]

//! The host components run in.
//!
//! A [`Page`] owns the [`Document`], the transition [`Timeline`], the
//! lifecycle [`EventBus`] and the registry of bound modals. Input arrives
//! through [`Page::dispatch_input`]; time moves only through
//! [`Page::advance`] and [`Page::run_until_idle`], so every transition is
//! reproducible in tests.
//!
//! # Input routing
//!
//! | Input       | Effect                                                    |
//! |-------------|-----------------------------------------------------------|
//! | `Key`       | Tab direction recorded; Escape offered to enclosing modals |
//! | `MouseDown` | Remembered by enclosing modals                            |
//! | `Click`     | Backdrop-click check, then toggle/dismiss triggers        |
//! | `FocusIn`   | Focus moves, then the focus trap may pull it back         |
//! | `Resize`    | Viewport updated; idle open modals re-pad                 |

use std::fmt;
use std::time::Duration;

use veil_core::{Document, ElementId, InputEvent, KeyCode, KeyEvent, Modifiers, Viewport};
use veil_runtime::{EventBus, Timeline};

use crate::component::{ComponentData, InstanceSerial};
use crate::error::ModalError;
use crate::modal::{self, FocusTrap, ModalEvent, ModalEventKind, ModalInstance, Task};

/// Upper bound on steps run by one [`Page::run_until_idle`] call.
const MAX_IDLE_STEPS: usize = 10_000;

pub struct Page {
    pub(crate) doc: Document,
    pub(crate) timeline: Timeline<Task>,
    pub(crate) bus: EventBus<ElementId, ModalEvent>,
    pub(crate) modals: ComponentData<ModalInstance>,
    pub(crate) focus_trap: FocusTrap,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("elements", &self.doc.len())
            .field("now", &self.timeline.now())
            .field("pending_tasks", &self.timeline.len())
            .field("modals", &self.modals.len())
            .field("focus_trap", &self.focus_trap.active())
            .finish()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl Page {
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            timeline: Timeline::new(),
            bus: EventBus::new(),
            modals: ComponentData::new(),
            focus_trap: FocusTrap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Lifecycle event bus. Listeners stay registered while the returned
    /// [`Subscription`](veil_runtime::Subscription) is alive.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus<ElementId, ModalEvent> {
        &self.bus
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// Number of scheduled transition steps.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.timeline.len()
    }

    /// Number of bound modals.
    #[must_use]
    pub fn modal_count(&self) -> usize {
        self.modals.len()
    }

    /// Element currently holding the focus trap.
    #[must_use]
    pub fn focus_trap(&self) -> Option<ElementId> {
        self.focus_trap.active()
    }

    // --- Time ---

    /// Move the clock forward by `dt`, running every step that falls due.
    /// Returns how many steps ran.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let limit = self.timeline.now().saturating_add(dt);
        let mut ran = 0;
        while let Some((_, task)) = self.timeline.pop_due(limit) {
            self.run_step(task);
            ran += 1;
        }
        self.timeline.advance_to(limit);
        ran
    }

    /// Run steps until none are pending. Returns how many ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while ran < MAX_IDLE_STEPS {
            let Some(deadline) = self.timeline.next_deadline() else {
                break;
            };
            let Some((_, task)) = self.timeline.pop_due(deadline) else {
                break;
            };
            self.run_step(task);
            ran += 1;
        }
        if ran == MAX_IDLE_STEPS {
            tracing::warn!(pending = self.timeline.len(), "run_until_idle hit its step limit");
        }
        ran
    }

    // --- Input ---

    /// Deliver one input event.
    ///
    /// # Errors
    ///
    /// Only the declarative triggers can fail: a toggle whose target
    /// selector is invalid or matches nothing, or a target whose markup
    /// options do not parse.
    pub fn dispatch_input(&mut self, input: InputEvent) -> Result<(), ModalError> {
        let _span = tracing::debug_span!("dispatch_input", ?input).entered();
        match input {
            InputEvent::Key(key) => {
                self.on_key(key);
                Ok(())
            }
            InputEvent::MouseDown { target } => {
                for (modal, serial) in self.enclosing_modals(target) {
                    self.modal_mousedown(modal, serial, target);
                }
                Ok(())
            }
            InputEvent::Click { target } => {
                for (modal, serial) in self.enclosing_modals(target) {
                    self.modal_click(modal, serial, target);
                }
                modal::handle_click(self, target)
            }
            InputEvent::FocusIn { target } => {
                self.on_focus_in(target);
                Ok(())
            }
            InputEvent::Resize(viewport) => {
                self.on_resize(viewport);
                Ok(())
            }
        }
    }

    /// Press and release the primary button over `target`.
    pub fn click(&mut self, target: ElementId) -> Result<(), ModalError> {
        self.dispatch_input(InputEvent::MouseDown { target })?;
        self.dispatch_input(InputEvent::Click { target })
    }

    /// Move focus to `target` as if the user did.
    pub fn focus(&mut self, target: ElementId) {
        self.on_focus_in(target);
    }

    /// Press `code` on the focused element (or `<body>`).
    pub fn press_key(&mut self, code: KeyCode) {
        self.press_key_with(code, Modifiers::empty());
    }

    pub fn press_key_with(&mut self, code: KeyCode, modifiers: Modifiers) {
        let target = self.doc.active_element().unwrap_or_else(|| self.doc.body());
        self.on_key(KeyEvent::new(target, code).with_modifiers(modifiers));
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Tab {
            self.focus_trap
                .record_tab(key.modifiers.contains(Modifiers::SHIFT));
        }
        for (modal, serial) in self.enclosing_modals(key.target) {
            self.modal_keydown(modal, serial, key);
        }
    }

    fn on_focus_in(&mut self, target: ElementId) {
        self.doc.focus(target);
        if let Some(redirect) = self.focus_trap.redirect(&self.doc, target) {
            tracing::trace!(from = %target, to = %redirect, "focus trapped");
            self.doc.focus(redirect);
        }
    }

    fn on_resize(&mut self, viewport: Viewport) {
        self.doc.set_viewport(viewport);
        for (modal, serial) in self.modals.bound() {
            let idle_and_open = self
                .modals
                .get(modal, serial)
                .is_some_and(|inst| inst.is_shown && !inst.is_transitioning);
            if idle_and_open {
                self.adjust_dialog(modal, serial);
            }
        }
    }

    /// Bound modals on `target`'s propagation path, innermost first.
    fn enclosing_modals(&self, target: ElementId) -> Vec<(ElementId, InstanceSerial)> {
        self.doc
            .propagation_path(target)
            .into_iter()
            .filter_map(|el| self.modals.serial(el).map(|serial| (el, serial)))
            .collect()
    }

    // --- Events ---

    /// Fire `kind` at `target`, bubbling to its ancestors.
    pub(crate) fn emit(
        &self,
        target: ElementId,
        kind: ModalEventKind,
        related: Option<ElementId>,
    ) -> ModalEvent {
        let event = ModalEvent::new(kind, target, related);
        let path = self.doc.propagation_path(target);
        let listeners = self.bus.dispatch(&path, &event);
        tracing::debug!(
            event = kind.name(),
            element = %target,
            listeners,
            prevented = event.is_default_prevented(),
            "modal event"
        );
        event
    }
}
