#![forbid(unsafe_code)]

//! Declarative triggers: `data-bs-toggle="modal"` and
//! `data-bs-dismiss="modal"`.
//!
//! Clicks are handled at the page level after the modal's own click
//! handling, so they see the state the modal left behind.

use veil_core::{Document, ElementId, Selector};

use super::{Modal, PartialModalOptions, TransitionOutcome};
use crate::error::ModalError;
use crate::page::Page;

const SELECTOR_TOGGLE: &str = "[data-bs-toggle=\"modal\"]";
const SELECTOR_DISMISS: &str = "[data-bs-dismiss=\"modal\"]";
const SELECTOR_OPEN: &str = ".modal.show";
const SELECTOR_MODAL: &str = ".modal";

/// Route a click on `target` to the toggle and dismiss triggers around it.
pub(crate) fn handle_click(page: &mut Page, target: ElementId) -> Result<(), ModalError> {
    let toggle = Selector::parse(SELECTOR_TOGGLE)?;
    if let Some(trigger) = page.document().closest(target, &toggle) {
        toggle_from_trigger(page, trigger)?;
    }
    let dismiss = Selector::parse(SELECTOR_DISMISS)?;
    if let Some(trigger) = page.document().closest(target, &dismiss) {
        dismiss_from_trigger(page, trigger)?;
    }
    Ok(())
}

/// Selector a trigger points at: `data-bs-target`, else the fragment of
/// its `href` (or the `href` itself when it is a class selector).
pub(crate) fn target_selector(doc: &Document, trigger: ElementId) -> Option<String> {
    if let Some(sel) = doc.attribute(trigger, "data-bs-target")
        && !sel.is_empty()
        && sel != "#"
    {
        return Some(sel.trim().to_owned());
    }
    let href = doc.attribute(trigger, "href")?.trim();
    if href.starts_with('.') {
        return Some(href.to_owned());
    }
    if let Some((_, fragment)) = href.split_once('#') {
        return (!fragment.is_empty()).then(|| format!("#{fragment}"));
    }
    None
}

fn element_from_trigger(page: &Page, trigger: ElementId) -> Result<Option<ElementId>, ModalError> {
    match target_selector(page.document(), trigger) {
        Some(sel) => Ok(page.document().query_selector(&sel)?),
        None => Ok(None),
    }
}

fn toggle_from_trigger(page: &mut Page, trigger: ElementId) -> Result<(), ModalError> {
    let Some(sel) = target_selector(page.document(), trigger) else {
        tracing::debug!(trigger = %trigger, "modal toggle without a target");
        return Ok(());
    };
    let Some(target) = page.document().query_selector(&sel)? else {
        return Err(ModalError::ElementNotFound(sel));
    };

    let open = Selector::parse(SELECTOR_OPEN)?;
    if let Some(&already_open) = page.document().select_all(&open).first()
        && let Some(other) = Modal::get_instance(page, already_open)
    {
        other.hide(page)?;
    }

    let modal = Modal::get_or_create_instance(page, target, PartialModalOptions::new())?;
    let was_shown = modal.is_shown(page)?;
    let done = modal.toggle_from(page, trigger)?;
    let started_show = !was_shown
        && !matches!(
            done.peek(),
            Some(TransitionOutcome::Prevented | TransitionOutcome::Skipped)
        );
    if started_show && let Some(inst) = page.modals.get_mut(modal.element(), modal.serial) {
        inst.return_focus = Some(trigger);
    }
    Ok(())
}

fn dismiss_from_trigger(page: &mut Page, trigger: ElementId) -> Result<(), ModalError> {
    if page.document().is_disabled(trigger) {
        return Ok(());
    }
    let target = match element_from_trigger(page, trigger)? {
        Some(el) => Some(el),
        None => {
            let modal = Selector::parse(SELECTOR_MODAL)?;
            page.document().closest(trigger, &modal)
        }
    };
    let Some(target) = target else {
        tracing::debug!(trigger = %trigger, "modal dismiss without a target");
        return Ok(());
    };
    let modal = Modal::get_or_create_instance(page, target, PartialModalOptions::new())?;
    modal.hide(page)?;
    Ok(())
}
