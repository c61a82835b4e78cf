#![forbid(unsafe_code)]

mod common;

use common::{Recorder, fixture};
use veil_widgets::{Modal, ModalError, ModalEventKind, PartialModalOptions};

#[test]
fn toggle_trigger_creates_and_shows() {
    let mut fx = fixture(false, &[]);
    let events = Recorder::attach(&fx.page, fx.modal);
    assert_eq!(Modal::get_instance(&fx.page, fx.modal), None);

    fx.page.click(fx.trigger).unwrap();
    let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
    assert_eq!(modal.is_shown(&fx.page), Ok(true));
    assert_eq!(events.related(ModalEventKind::Show), [Some(fx.trigger)]);
}

#[test]
fn dismiss_button_hides_and_focus_returns_to_trigger() {
    let mut fx = fixture(true, &[]);
    fx.page.click(fx.trigger).unwrap();
    fx.page.run_until_idle();
    assert_eq!(fx.page.document().active_element(), Some(fx.modal));

    fx.page.click(fx.close).unwrap();
    fx.page.run_until_idle();
    let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
    assert_eq!(modal.is_shown(&fx.page), Ok(false));
    assert_eq!(fx.page.document().active_element(), Some(fx.trigger));
}

#[test]
fn disabled_dismiss_button_does_nothing() {
    let mut fx = fixture(false, &[]);
    fx.page.click(fx.trigger).unwrap();
    fx.page
        .document_mut()
        .set_attribute(fx.close, "disabled", "");
    fx.page.click(fx.close).unwrap();
    let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
    assert_eq!(modal.is_shown(&fx.page), Ok(true));
}

#[test]
fn prevented_show_does_not_return_focus_later() {
    let mut fx = fixture(false, &[]);
    let veto = fx
        .page
        .events()
        .on(fx.modal, ModalEventKind::Show, |e| e.prevent_default());
    fx.page.click(fx.trigger).unwrap();
    drop(veto);

    let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
    modal.show(&mut fx.page).unwrap();
    fx.page.focus(fx.field);
    modal.hide(&mut fx.page).unwrap();
    assert_ne!(fx.page.document().active_element(), Some(fx.trigger));
}

#[test]
fn opening_another_modal_hides_the_open_one() {
    let mut fx = fixture(false, &[]);
    let doc = fx.page.document_mut();
    let body = doc.body();
    let second = doc.build("div").id("second").class("modal").append_to(body);
    let second_trigger = doc
        .build("a")
        .attr("data-bs-toggle", "modal")
        .attr("href", "#second")
        .append_to(body);

    fx.page.click(fx.trigger).unwrap();
    fx.page.click(second_trigger).unwrap();

    let first = Modal::get_instance(&fx.page, fx.modal).unwrap();
    let second = Modal::get_instance(&fx.page, second).unwrap();
    assert_eq!(first.is_shown(&fx.page), Ok(false));
    assert_eq!(second.is_shown(&fx.page), Ok(true));
}

#[test]
fn trigger_with_unknown_target_is_an_error() {
    let mut fx = fixture(false, &[]);
    fx.page
        .document_mut()
        .set_attribute(fx.trigger, "data-bs-target", "#missing");
    assert_eq!(
        fx.page.click(fx.trigger),
        Err(ModalError::ElementNotFound("#missing".into()))
    );
}

#[test]
fn markup_config_is_applied_on_first_use() {
    let mut fx = fixture(false, &[("data-bs-config", r#"{"keyboard":false}"#)]);
    fx.page.click(fx.trigger).unwrap();
    let modal = Modal::get_instance(&fx.page, fx.modal).unwrap();
    assert!(!modal.options(&fx.page).unwrap().keyboard);
}

#[test]
fn bad_markup_config_surfaces_from_constructor() {
    let mut fx = fixture(false, &[("data-bs-config", "{not json")]);
    let err = Modal::new(&mut fx.page, fx.modal, PartialModalOptions::new()).unwrap_err();
    assert!(matches!(err, ModalError::InvalidConfig(_)));
    assert_eq!(fx.page.modal_count(), 0);
}
