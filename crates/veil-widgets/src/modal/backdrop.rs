#![forbid(unsafe_code)]

//! The dimming layer rendered behind an open modal.

use veil_core::{Document, ElementId};

const CLASS_NAME: &str = "modal-backdrop";
const CLASS_FADE: &str = "fade";
const CLASS_SHOW: &str = "show";

/// A modal's backdrop element.
///
/// Created lazily on the first [`show`](Self::show). [`detach`](Self::detach)
/// takes it out of the tree but keeps it for the next show, so repeated
/// show/hide cycles reuse one element. [`dispose`](Self::dispose) forgets
/// it. With `visible == false` no element is ever created and both
/// transitions complete immediately.
#[derive(Debug)]
pub struct BackdropLayer {
    visible: bool,
    animated: bool,
    element: Option<ElementId>,
}

impl BackdropLayer {
    #[must_use]
    pub fn new(visible: bool, animated: bool) -> Self {
        Self {
            visible,
            animated,
            element: None,
        }
    }

    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// Attach and reveal the backdrop.
    ///
    /// Returns the element whose transition gates the next step, or `None`
    /// when there is nothing to wait for.
    pub fn show(&mut self, doc: &mut Document) -> Option<ElementId> {
        if !self.visible {
            return None;
        }
        let body = doc.body();
        let el = match self.element {
            Some(el) => {
                if !doc.is_connected(el) {
                    doc.append_child(body, el);
                }
                el
            }
            None => {
                let mut builder = doc.build("div").class(CLASS_NAME);
                if self.animated {
                    builder = builder.class(CLASS_FADE);
                }
                let el = builder.append_to(body);
                self.element = Some(el);
                el
            }
        };
        doc.add_class(el, CLASS_SHOW);
        Some(el)
    }

    /// Start fading the backdrop out. Call [`detach`](Self::detach) once
    /// the returned element's transition is over.
    pub fn hide(&mut self, doc: &mut Document) -> Option<ElementId> {
        if !self.visible {
            return None;
        }
        let el = self.element.filter(|&el| doc.is_connected(el))?;
        doc.remove_class(el, CLASS_SHOW);
        Some(el)
    }

    /// Take the backdrop out of the document, keeping it for reuse.
    pub fn detach(&mut self, doc: &mut Document) {
        if let Some(el) = self.element {
            doc.remove(el);
        }
    }

    /// Detach the backdrop and drop it for good.
    pub fn dispose(&mut self, doc: &mut Document) {
        self.detach(doc);
        self.element = None;
    }
}
