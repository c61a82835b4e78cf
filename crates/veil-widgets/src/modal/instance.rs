#![forbid(unsafe_code)]

//! Per-element modal state and the show/hide sequences.
//!
//! # State Machine
//!
//! ```text
//!            show()                 transition end
//!  Hidden ───────────▶ Showing ───────────────────▶ Shown
//!    ▲                                                │  ▲
//!    │ backdrop transition end         hide()         │  │ hidePrevented
//!    └──────────────── Hiding ◀──────────────────────┘──┘
//! ```
//!
//! `is_shown` flips at the start of a sequence and `is_transitioning`
//! stays set until the element transition ends; every public entry point
//! refuses to start while a sequence is running.
//!
//! # Failure Modes
//!
//! - Steps for an instance that was disposed (or replaced) are dropped.
//! - Disposal resolves any outstanding completions with
//!   [`TransitionOutcome::Aborted`].

use std::time::Duration;

use veil_core::{Direction, ElementId, KeyCode, KeyEvent, Selector};
use veil_runtime::{Completion, Resolver, completion};

use super::backdrop::BackdropLayer;
use super::event::ModalEventKind;
use super::options::{Backdrop, ModalOptions};
use super::scrollbar;
use super::{ModalPhase, TransitionOutcome};
use crate::component::InstanceSerial;
use crate::page::Page;

/// Added on top of every transition duration before a step fires.
pub(crate) const TRANSITION_PADDING: Duration = Duration::from_millis(5);

const CLASS_OPEN: &str = "modal-open";
const CLASS_FADE: &str = "fade";
const CLASS_SHOW: &str = "show";
const CLASS_STATIC: &str = "modal-static";
const SELECTOR_DIALOG: &str = ".modal-dialog";
const SELECTOR_BODY: &str = ".modal-body";

/// State held for each element with a bound modal.
#[derive(Debug)]
pub(crate) struct ModalInstance {
    pub(crate) options: ModalOptions,
    pub(crate) dialog: Option<ElementId>,
    pub(crate) is_shown: bool,
    pub(crate) is_transitioning: bool,
    pub(crate) backdrop: BackdropLayer,
    pub(crate) pending_mousedown: Option<ElementId>,
    pub(crate) related_target: Option<ElementId>,
    pub(crate) return_focus: Option<ElementId>,
    waiting_show: Vec<Resolver<TransitionOutcome>>,
    waiting_hide: Vec<Resolver<TransitionOutcome>>,
}

impl ModalInstance {
    pub(crate) fn new(options: ModalOptions, dialog: Option<ElementId>, animated: bool) -> Self {
        Self {
            options,
            dialog,
            is_shown: false,
            is_transitioning: false,
            backdrop: BackdropLayer::new(options.backdrop.is_visible(), animated),
            pending_mousedown: None,
            related_target: None,
            return_focus: None,
            waiting_show: Vec::new(),
            waiting_hide: Vec::new(),
        }
    }

    pub(crate) fn phase(&self) -> ModalPhase {
        match (self.is_shown, self.is_transitioning) {
            (false, false) => ModalPhase::Hidden,
            (true, true) => ModalPhase::Showing,
            (true, false) => ModalPhase::Shown,
            (false, true) => ModalPhase::Hiding,
        }
    }

    fn wait_for_show(&mut self) -> Completion<TransitionOutcome> {
        let (resolver, done) = completion();
        self.waiting_show.push(resolver);
        done
    }

    fn wait_for_hide(&mut self) -> Completion<TransitionOutcome> {
        let (resolver, done) = completion();
        self.waiting_hide.push(resolver);
        done
    }

    /// Resolve every outstanding completion with `outcome`.
    pub(crate) fn abort_waiters(&mut self, outcome: TransitionOutcome) {
        for resolver in self
            .waiting_show
            .drain(..)
            .chain(self.waiting_hide.drain(..))
        {
            resolver.resolve(outcome);
        }
    }
}

/// A deferred step of a modal sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Task {
    pub(crate) modal: ElementId,
    pub(crate) serial: InstanceSerial,
    pub(crate) step: Step,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    BackdropShown,
    ShowComplete,
    HideComplete,
    BackdropRemoved,
    /// Carries the inline `overflow-y` to restore afterwards.
    StaticBounceEnd(Option<String>),
    RestoreOverflow(Option<String>),
}

impl Page {
    /// Resolve options and bind a new instance to `element`.
    pub(crate) fn bind_modal(
        &mut self,
        element: ElementId,
        options: ModalOptions,
    ) -> InstanceSerial {
        let dialog = Selector::parse(SELECTOR_DIALOG)
            .ok()
            .and_then(|sel| self.doc.select_within(element, &sel).first().copied());
        let animated = self.doc.has_class(element, CLASS_FADE);
        let serial = self
            .modals
            .insert(element, ModalInstance::new(options, dialog, animated));
        tracing::debug!(element = %element, serial = serial.get(), ?options, "modal bound");
        serial
    }

    fn is_animated(&self, element: ElementId) -> bool {
        self.doc.has_class(element, CLASS_FADE)
    }

    /// Run `step` now, or after `wait_on`'s transition when animated.
    fn queue_step(
        &mut self,
        modal: ElementId,
        serial: InstanceSerial,
        step: Step,
        wait_on: ElementId,
        animated: bool,
    ) {
        let task = Task {
            modal,
            serial,
            step,
        };
        if animated {
            let delay = self.doc.transition_duration(wait_on) + TRANSITION_PADDING;
            self.timeline.schedule(delay, task);
        } else {
            self.run_step(task);
        }
    }

    pub(crate) fn run_step(&mut self, task: Task) {
        let Task {
            modal,
            serial,
            step,
        } = task;
        if self.modals.get(modal, serial).is_none() {
            tracing::trace!(element = %modal, ?step, "dropping step for stale modal");
            return;
        }
        tracing::trace!(element = %modal, ?step, "modal step");
        match step {
            Step::BackdropShown => self.show_element(modal, serial),
            Step::ShowComplete => self.finish_show(modal, serial),
            Step::HideComplete => self.hide_element(modal, serial),
            Step::BackdropRemoved => {
                if let Some(inst) = self.modals.get_mut(modal, serial) {
                    inst.backdrop.detach(&mut self.doc);
                }
                self.finish_hide(modal, serial);
            }
            Step::StaticBounceEnd(initial) => {
                self.doc.remove_class(modal, CLASS_STATIC);
                let dialog = self.dialog_of(modal, serial);
                self.queue_step(modal, serial, Step::RestoreOverflow(initial), dialog, true);
            }
            Step::RestoreOverflow(initial) => match initial {
                Some(value) => self.doc.set_style(modal, "overflow-y", value),
                None => self.doc.remove_style(modal, "overflow-y"),
            },
        }
    }

    fn dialog_of(&self, modal: ElementId, serial: InstanceSerial) -> ElementId {
        self.modals
            .get(modal, serial)
            .and_then(|inst| inst.dialog)
            .unwrap_or(modal)
    }

    // --- Show ---

    pub(crate) fn modal_show(
        &mut self,
        modal: ElementId,
        serial: InstanceSerial,
        related: Option<ElementId>,
    ) -> Completion<TransitionOutcome> {
        match self.modals.get(modal, serial) {
            None => return Completion::ready(TransitionOutcome::Aborted),
            Some(inst) if inst.is_shown || inst.is_transitioning => {
                tracing::trace!(element = %modal, phase = ?inst.phase(), "show skipped");
                return Completion::ready(TransitionOutcome::Skipped);
            }
            Some(_) => {}
        }

        let event = self.emit(modal, ModalEventKind::Show, related);
        if event.is_default_prevented() {
            return Completion::ready(TransitionOutcome::Prevented);
        }

        let Some(inst) = self.modals.get_mut(modal, serial) else {
            return Completion::ready(TransitionOutcome::Aborted);
        };
        inst.is_shown = true;
        inst.is_transitioning = true;
        inst.related_target = related;
        let done = inst.wait_for_show();

        scrollbar::hide(&mut self.doc);
        let body = self.doc.body();
        self.doc.add_class(body, CLASS_OPEN);
        self.adjust_dialog(modal, serial);

        let backdrop = match self.modals.get_mut(modal, serial) {
            Some(inst) => {
                let animated = inst.backdrop.is_animated();
                inst.backdrop.show(&mut self.doc).map(|el| (el, animated))
            }
            None => None,
        };
        match backdrop {
            Some((el, animated)) => self.queue_step(modal, serial, Step::BackdropShown, el, animated),
            None => self.show_element(modal, serial),
        }
        done
    }

    fn show_element(&mut self, modal: ElementId, serial: InstanceSerial) {
        let body = self.doc.body();
        if !self.doc.contains(body, modal) {
            self.doc.append_child(body, modal);
        }
        self.doc.set_style(modal, "display", "block");
        self.doc.remove_attribute(modal, "aria-hidden");
        self.doc.set_attribute(modal, "aria-modal", "true");
        self.doc.set_attribute(modal, "role", "dialog");
        self.doc.set_scroll_top(modal, 0);

        let dialog = self.dialog_of(modal, serial);
        if let Ok(sel) = Selector::parse(SELECTOR_BODY)
            && let Some(&modal_body) = self.doc.select_within(dialog, &sel).first()
        {
            self.doc.set_scroll_top(modal_body, 0);
        }

        self.doc.add_class(modal, CLASS_SHOW);
        let animated = self.is_animated(modal);
        self.queue_step(modal, serial, Step::ShowComplete, dialog, animated);
    }

    fn finish_show(&mut self, modal: ElementId, serial: InstanceSerial) {
        let Some(inst) = self.modals.get_mut(modal, serial) else {
            return;
        };
        if inst.options.focus {
            self.focus_trap.activate(&mut self.doc, modal);
        }
        inst.is_transitioning = false;
        let related = inst.related_target.take();
        let waiters = std::mem::take(&mut inst.waiting_show);

        self.emit(modal, ModalEventKind::Shown, related);
        for resolver in waiters {
            resolver.resolve(TransitionOutcome::Completed);
        }
    }

    // --- Hide ---

    pub(crate) fn modal_hide(
        &mut self,
        modal: ElementId,
        serial: InstanceSerial,
    ) -> Completion<TransitionOutcome> {
        match self.modals.get(modal, serial) {
            None => return Completion::ready(TransitionOutcome::Aborted),
            Some(inst) if !inst.is_shown || inst.is_transitioning => {
                tracing::trace!(element = %modal, phase = ?inst.phase(), "hide skipped");
                return Completion::ready(TransitionOutcome::Skipped);
            }
            Some(_) => {}
        }

        let event = self.emit(modal, ModalEventKind::Hide, None);
        if event.is_default_prevented() {
            return Completion::ready(TransitionOutcome::Prevented);
        }

        let Some(inst) = self.modals.get_mut(modal, serial) else {
            return Completion::ready(TransitionOutcome::Aborted);
        };
        inst.is_shown = false;
        inst.is_transitioning = true;
        let done = inst.wait_for_hide();

        self.focus_trap.deactivate(modal);
        self.doc.remove_class(modal, CLASS_SHOW);
        let animated = self.is_animated(modal);
        self.queue_step(modal, serial, Step::HideComplete, modal, animated);
        done
    }

    fn hide_element(&mut self, modal: ElementId, serial: InstanceSerial) {
        self.doc.set_style(modal, "display", "none");
        self.doc.set_attribute(modal, "aria-hidden", "true");
        self.doc.remove_attribute(modal, "aria-modal");
        self.doc.remove_attribute(modal, "role");

        let Some(inst) = self.modals.get_mut(modal, serial) else {
            return;
        };
        inst.is_transitioning = false;
        let animated = inst.backdrop.is_animated();
        match inst.backdrop.hide(&mut self.doc) {
            Some(el) => self.queue_step(modal, serial, Step::BackdropRemoved, el, animated),
            None => self.finish_hide(modal, serial),
        }
    }

    fn finish_hide(&mut self, modal: ElementId, serial: InstanceSerial) {
        let body = self.doc.body();
        self.doc.remove_class(body, CLASS_OPEN);
        self.reset_adjustments(modal);
        scrollbar::reset(&mut self.doc);

        self.emit(modal, ModalEventKind::Hidden, None);

        let Some(inst) = self.modals.get_mut(modal, serial) else {
            return;
        };
        let waiters = std::mem::take(&mut inst.waiting_hide);
        let return_focus = inst.return_focus.take();
        for resolver in waiters {
            resolver.resolve(TransitionOutcome::Completed);
        }
        if let Some(trigger) = return_focus
            && self.doc.is_visible(trigger)
        {
            self.doc.focus(trigger);
        }
    }

    // --- Layout ---

    /// Pad the modal so its content does not jump when the page scrollbar
    /// disappears.
    pub(crate) fn adjust_dialog(&mut self, modal: ElementId, serial: InstanceSerial) {
        if self.modals.get(modal, serial).is_none() {
            return;
        }
        let overflowing = self.is_modal_overflowing(modal);
        let width = scrollbar::width(&self.doc);
        let rtl = self.doc.direction() == Direction::Rtl;
        let value = format!("{width}px");
        if width > 0 && !overflowing {
            let property = if rtl { "padding-left" } else { "padding-right" };
            self.doc.set_style(modal, property, value);
        } else if width == 0 && overflowing {
            let property = if rtl { "padding-right" } else { "padding-left" };
            self.doc.set_style(modal, property, value);
        }
    }

    fn reset_adjustments(&mut self, modal: ElementId) {
        self.doc.remove_style(modal, "padding-left");
        self.doc.remove_style(modal, "padding-right");
    }

    fn is_modal_overflowing(&self, modal: ElementId) -> bool {
        self.doc.metrics(modal).scroll_height > self.doc.viewport().inner_height
    }

    // --- Dismissal ---

    /// Refuse a dismissal: fire `hidePrevented` and play the bounce.
    pub(crate) fn trigger_backdrop_transition(&mut self, modal: ElementId, serial: InstanceSerial) {
        let event = self.emit(modal, ModalEventKind::HidePrevented, None);
        if event.is_default_prevented() {
            return;
        }
        let initial = self.doc.style(modal, "overflow-y").map(str::to_owned);
        if initial.as_deref() == Some("hidden") || self.doc.has_class(modal, CLASS_STATIC) {
            return;
        }
        if !self.is_modal_overflowing(modal) {
            self.doc.set_style(modal, "overflow-y", "hidden");
        }
        self.doc.add_class(modal, CLASS_STATIC);
        let dialog = self.dialog_of(modal, serial);
        self.queue_step(modal, serial, Step::StaticBounceEnd(initial), dialog, true);
    }

    /// Escape pressed somewhere inside `modal`.
    pub(crate) fn modal_keydown(&mut self, modal: ElementId, serial: InstanceSerial, key: KeyEvent) {
        if key.code != KeyCode::Escape {
            return;
        }
        let Some(inst) = self.modals.get(modal, serial) else {
            return;
        };
        if !inst.is_shown {
            return;
        }
        if inst.options.keyboard {
            let _ = self.modal_hide(modal, serial);
        } else {
            self.trigger_backdrop_transition(modal, serial);
        }
    }

    pub(crate) fn modal_mousedown(&mut self, modal: ElementId, serial: InstanceSerial, target: ElementId) {
        if let Some(inst) = self.modals.get_mut(modal, serial) {
            inst.pending_mousedown = Some(target);
        }
    }

    /// A click reached `modal`. Only a press and release both landing on
    /// the modal element itself (outside the dialog) count as a backdrop
    /// click.
    pub(crate) fn modal_click(&mut self, modal: ElementId, serial: InstanceSerial, target: ElementId) {
        let Some(inst) = self.modals.get_mut(modal, serial) else {
            return;
        };
        let Some(pressed) = inst.pending_mousedown.take() else {
            return;
        };
        if pressed != modal || target != modal {
            return;
        }
        let backdrop = inst.options.backdrop;
        match backdrop {
            Backdrop::Static => self.trigger_backdrop_transition(modal, serial),
            Backdrop::Dismissible => {
                let _ = self.modal_hide(modal, serial);
            }
            Backdrop::Disabled => {}
        }
    }

    // --- Disposal ---

    pub(crate) fn modal_dispose(&mut self, modal: ElementId, serial: InstanceSerial) -> bool {
        if self.modals.get(modal, serial).is_none() {
            return false;
        }
        let Some(mut inst) = self.modals.remove(modal) else {
            return false;
        };
        self.focus_trap.deactivate(modal);
        inst.backdrop.dispose(&mut self.doc);
        let cancelled = self
            .timeline
            .cancel_where(|task| task.modal == modal && task.serial == serial);
        inst.abort_waiters(TransitionOutcome::Aborted);
        tracing::debug!(element = %modal, cancelled = cancelled.len(), "modal disposed");
        true
    }
}
