#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use veil_core::{Document, ElementId, Stylesheet};
use veil_runtime::Subscription;
use veil_widgets::{ModalEvent, ModalEventKind, Page};

static TRACING: Once = Once::new();

/// Install a test subscriber once; `RUST_LOG=veil_widgets=trace` shows the
/// modal sequences.
pub fn init_tracing() {
    TRACING.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// A page with one modal in the usual markup:
///
/// ```text
/// body
/// ├── button#open[data-bs-toggle=modal][data-bs-target=#dlg]
/// ├── button#outside
/// └── div#dlg.modal(.fade)
///     └── div.modal-dialog
///         └── div.modal-content
///             ├── div.modal-body > input#field
///             └── button#close[data-bs-dismiss=modal]
/// ```
pub struct Fixture {
    pub page: Page,
    pub modal: ElementId,
    pub dialog: ElementId,
    pub modal_body: ElementId,
    pub field: ElementId,
    pub close: ElementId,
    pub trigger: ElementId,
    pub outside: ElementId,
}

pub fn fixture(animated: bool, modal_attrs: &[(&str, &str)]) -> Fixture {
    init_tracing();
    let mut doc = Document::new().with_stylesheet(Stylesheet::bootstrap());
    let body = doc.body();
    let trigger = doc
        .build("button")
        .id("open")
        .attr("data-bs-toggle", "modal")
        .attr("data-bs-target", "#dlg")
        .append_to(body);
    let outside = doc.build("button").id("outside").append_to(body);

    let mut builder = doc
        .build("div")
        .id("dlg")
        .class(if animated { "modal fade" } else { "modal" })
        .attr("tabindex", "-1")
        .style("display", "none")
        .attr("aria-hidden", "true");
    for (name, value) in modal_attrs {
        builder = builder.attr(name, value);
    }
    let modal = builder.append_to(body);
    let dialog = doc.build("div").class("modal-dialog").append_to(modal);
    let content = doc.build("div").class("modal-content").append_to(dialog);
    let modal_body = doc.build("div").class("modal-body").append_to(content);
    let field = doc.build("input").id("field").append_to(modal_body);
    let close = doc
        .build("button")
        .id("close")
        .attr("data-bs-dismiss", "modal")
        .append_to(content);

    Fixture {
        page: Page::new(doc),
        modal,
        dialog,
        modal_body,
        field,
        close,
        trigger,
        outside,
    }
}

/// Records every modal event reaching an element.
pub struct Recorder {
    log: Rc<RefCell<Vec<(ModalEventKind, Option<ElementId>)>>>,
    _sub: Subscription,
}

impl Recorder {
    pub fn attach(page: &Page, element: ElementId) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = page.events().on_any(element, move |e: &ModalEvent| {
            sink.borrow_mut().push((e.kind(), e.related_target()));
        });
        Self { log, _sub: sub }
    }

    pub fn kinds(&self) -> Vec<ModalEventKind> {
        self.log.borrow().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn related(&self, kind: ModalEventKind) -> Vec<Option<ElementId>> {
        self.log
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, related)| *related)
            .collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}
