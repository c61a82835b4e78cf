#![forbid(unsafe_code)]

mod common;

use common::{Recorder, fixture};
use proptest::prelude::*;
use veil_widgets::{
    Backdrop, LegacyCall, Modal, ModalError, ModalEventKind, ModalMethod, PartialModalOptions,
};

#[test]
fn show_on_unbound_element_constructs_then_shows() {
    let mut fx = fixture(false, &[]);
    let events = Recorder::attach(&fx.page, fx.modal);
    Modal::legacy_interface(&mut fx.page, "#dlg", ModalMethod::Show, Some(fx.trigger)).unwrap();

    let modal = Modal::get_instance(&fx.page, "#dlg").unwrap();
    assert_eq!(modal.is_shown(&fx.page), Ok(true));
    assert_eq!(events.kinds(), [ModalEventKind::Show, ModalEventKind::Shown]);
    assert_eq!(events.related(ModalEventKind::Shown), [Some(fx.trigger)]);
}

#[test]
fn configure_then_invoke() {
    let mut fx = fixture(false, &[]);
    Modal::legacy_interface(
        &mut fx.page,
        fx.modal,
        PartialModalOptions::new().backdrop(Backdrop::Static),
        None,
    )
    .unwrap();
    let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
    assert_eq!(modal.options(&fx.page).unwrap().backdrop, Backdrop::Static);
    assert_eq!(modal.is_shown(&fx.page), Ok(false));

    // Options passed to an existing instance are ignored.
    Modal::legacy_interface(
        &mut fx.page,
        fx.modal,
        PartialModalOptions::new().backdrop(false),
        None,
    )
    .unwrap();
    assert_eq!(modal.options(&fx.page).unwrap().backdrop, Backdrop::Static);

    Modal::legacy_interface(&mut fx.page, fx.modal, ModalMethod::Toggle, None).unwrap();
    assert_eq!(modal.is_shown(&fx.page), Ok(true));
    Modal::legacy_interface(&mut fx.page, fx.modal, ModalMethod::HandleUpdate, None).unwrap();
    Modal::legacy_interface(&mut fx.page, fx.modal, ModalMethod::Hide, None).unwrap();
    assert_eq!(modal.is_shown(&fx.page), Ok(false));
    Modal::legacy_interface(&mut fx.page, fx.modal, ModalMethod::Dispose, None).unwrap();
    assert_eq!(Modal::get_instance(&fx.page, fx.modal), None);
}

#[test]
fn method_names_parse_from_strings() {
    let mut fx = fixture(false, &[]);
    let call: LegacyCall = "show".parse().unwrap();
    Modal::legacy_interface(&mut fx.page, ".modal", call, None).unwrap();
    assert_eq!(fx.page.modal_count(), 1);

    assert_eq!(
        "explode".parse::<LegacyCall>(),
        Err(ModalError::UnknownMethod("explode".into()))
    );
}

#[test]
fn applies_to_every_match_and_tolerates_none() {
    let mut fx = fixture(false, &[]);
    let doc = fx.page.document_mut();
    let body = doc.body();
    doc.build("div").class("modal").append_to(body);

    Modal::legacy_interface(&mut fx.page, ".modal", LegacyCall::default(), None).unwrap();
    assert_eq!(fx.page.modal_count(), 2);
    Modal::legacy_interface(&mut fx.page, ".nothing", ModalMethod::Show, None).unwrap();
    assert!(matches!(
        Modal::legacy_interface(&mut fx.page, "[", ModalMethod::Show, None),
        Err(ModalError::InvalidSelector(_))
    ));
}

#[test]
fn bad_markup_on_one_match_binds_none() {
    let mut fx = fixture(false, &[]);
    let doc = fx.page.document_mut();
    let body = doc.body();
    doc.build("div")
        .class("modal")
        .attr("data-bs-backdrop", "sometimes")
        .append_to(body);

    let result = Modal::legacy_interface(&mut fx.page, ".modal", ModalMethod::Show, None);
    assert!(matches!(
        result,
        Err(ModalError::InvalidOption { option: "backdrop", .. })
    ));
    assert_eq!(fx.page.modal_count(), 0);
    assert!(!fx.page.document().has_class(fx.modal, "show"));
}

fn method() -> impl Strategy<Value = ModalMethod> {
    prop::sample::select(vec![
        ModalMethod::Toggle,
        ModalMethod::Show,
        ModalMethod::Hide,
        ModalMethod::HandleUpdate,
    ])
}

proptest! {
    /// Whatever sequence of calls arrives, the modal settles into a
    /// consistent phase, and disposal leaves no trap or pending step.
    #[test]
    fn any_call_sequence_leaves_consistent_state(calls in prop::collection::vec(method(), 0..12)) {
        let mut fx = fixture(true, &[]);
        for call in calls {
            Modal::legacy_interface(&mut fx.page, fx.modal, call, None).unwrap();
            fx.page.run_until_idle();
            let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
            let shown = modal.is_shown(&fx.page).unwrap();
            prop_assert_eq!(fx.page.document().has_class(fx.modal, "show"), shown);
            prop_assert_eq!(fx.page.focus_trap().is_some(), shown);
            prop_assert_eq!(fx.page.pending_tasks(), 0);
        }
        Modal::legacy_interface(&mut fx.page, fx.modal, ModalMethod::Dispose, None).unwrap();
        prop_assert_eq!(fx.page.focus_trap(), None);
        prop_assert_eq!(fx.page.pending_tasks(), 0);
        prop_assert_eq!(fx.page.modal_count(), 0);
    }
}
