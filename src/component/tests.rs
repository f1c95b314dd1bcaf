//! Tests for view lifecycle management

use crate::component::{
    lifecycle, Context, Design, LifecyclePhase, View, ViewConfig, ViewError, ViewId, ViewRef,
};
use crate::kit::components::{ButtonView, ContainerView, LabelView, PageView};
use crate::kit::theme::ClassThemeEngine;
use crate::platform::{Document, MemoryDocument, Mutation};

struct Fixture {
    ctx: Context,
    page: ViewRef,
    label: ViewRef,
    button: ViewRef,
}

fn fixture() -> Fixture {
    let mut ctx = Context::in_memory();
    let label: ViewRef = LabelView::new().design(&mut ctx, ViewConfig::new().value("Hello"));
    let button: ViewRef = ButtonView::new().design(&mut ctx, ViewConfig::new().value("Go"));
    let row: ViewRef = ContainerView::row().design(
        &mut ctx,
        ViewConfig::new()
            .child_order(["label", "button"])
            .child("label", label.clone())
            .child("button", button.clone()),
    );
    let page: ViewRef = PageView::titled("Home").design(&mut ctx, ViewConfig::new().child("row", row));
    Fixture {
        ctx,
        page,
        label,
        button,
    }
}

fn id(view: &ViewRef) -> ViewId {
    lifecycle::id_of(view).unwrap()
}

fn document(ctx: &mut Context) -> &mut MemoryDocument {
    ctx.document_as::<MemoryDocument>().unwrap()
}

#[test]
fn test_page_is_inserted_once_with_view_ids() {
    let Fixture {
        mut ctx,
        page,
        label,
        button,
    } = fixture();
    ctx.show_page(&page).unwrap();

    let doc = document(&mut ctx);
    let inserts = doc
        .mutations()
        .iter()
        .filter(|m| matches!(m, Mutation::Insert { .. }))
        .count();
    assert_eq!(inserts, 1);
    for view in [&page, &label, &button] {
        assert!(doc.contains(id(view).as_str()));
    }

    let resolved = ctx.registry().get_view_by_id(&id(&label)).unwrap();
    assert!(lifecycle::same(&resolved, &label));
    assert_eq!(lifecycle::phase_of(&button), Some(LifecyclePhase::EventsBound));
}

#[test]
fn test_children_get_name_and_parent() {
    let Fixture {
        mut ctx, page, label, ..
    } = fixture();
    ctx.show_page(&page).unwrap();

    let label = label.borrow();
    assert_eq!(label.core().name.as_deref(), Some("label"));
    let parent = label.core().parent.clone().unwrap();
    assert!(ctx.registry().contains(&parent));
}

#[test]
fn test_destroy_releases_the_whole_tree() {
    let Fixture {
        mut ctx,
        page,
        label,
        button,
    } = fixture();
    ctx.show_page(&page).unwrap();
    let ids = [id(&page), id(&label), id(&button)];

    lifecycle::destroy(&page, &mut ctx).unwrap();

    for view_id in &ids {
        assert!(!ctx.registry().contains(view_id));
        assert!(!document(&mut ctx).contains(view_id.as_str()));
        assert!(ctx.dispatcher().bound_events(view_id.as_str()).is_empty());
    }
    assert!(!button.borrow().core().is_alive());

    // Second destroy is a no-op
    lifecycle::destroy(&page, &mut ctx).unwrap();
}

#[test]
fn test_theme_and_bind_are_idempotent() {
    let Fixture {
        mut ctx, page, button, ..
    } = fixture();
    ctx.show_page(&page).unwrap();
    let button_id = id(&button);

    lifecycle::theme(&page, &mut ctx).unwrap();
    lifecycle::register_events(&page, &mut ctx).unwrap();
    lifecycle::register_events(&page, &mut ctx).unwrap();

    let engine = ctx.theme_engine_as::<ClassThemeEngine>().unwrap();
    assert_eq!(engine.enhancements(button_id.as_str()), 1);
    assert_eq!(document(&mut ctx).listener_count(button_id.as_str(), "tap"), 1);
}

#[test]
fn test_update_patches_only_the_view() {
    let Fixture {
        mut ctx, page, label, ..
    } = fixture();
    ctx.show_page(&page).unwrap();
    document(&mut ctx).clear_mutations();

    lifecycle::update(&label, &mut ctx, "Bye".into()).unwrap();

    let label_id = id(&label);
    let doc = document(&mut ctx);
    assert_eq!(doc.mutations(), &[Mutation::SetText { id: label_id.to_string() }]);
    assert_eq!(doc.text(label_id.as_str()).as_deref(), Some("Bye"));
}

#[test]
fn test_deep_clone_assigns_fresh_ids() {
    let Fixture { mut ctx, page, .. } = fixture();
    let copy = lifecycle::deep_clone(&page, &mut ctx).unwrap();

    assert_ne!(id(&copy), id(&page));
    assert_eq!(lifecycle::phase_of(&copy), Some(LifecyclePhase::Unconfigured));

    let original = lifecycle::find_descendant(&page, "label").unwrap();
    let cloned = lifecycle::find_descendant(&copy, "label").unwrap();
    assert!(!lifecycle::same(&original, &cloned));
    assert_ne!(id(&original), id(&cloned));
    assert_eq!(cloned.borrow().core().value, original.borrow().core().value);
    assert!(ctx.registry().contains(&id(&cloned)));
}

#[test]
fn test_out_of_order_transitions_are_rejected() {
    let Fixture { mut ctx, label, .. } = fixture();

    let err = lifecycle::theme(&label, &mut ctx).unwrap_err();
    assert!(matches!(
        err,
        ViewError::InvalidLifecycleTransition { operation: "theme", .. }
    ));

    lifecycle::destroy(&label, &mut ctx).unwrap();
    let err = lifecycle::render(&label, &mut ctx).unwrap_err();
    assert!(matches!(
        err,
        ViewError::InvalidLifecycleTransition {
            phase: LifecyclePhase::Destroyed,
            ..
        }
    ));
}

#[test]
fn test_missing_child_is_skipped() {
    let mut ctx = Context::in_memory();
    let label: ViewRef = LabelView::new().design(&mut ctx, ViewConfig::new().value("only"));
    let page: ViewRef = PageView::new().design(
        &mut ctx,
        ViewConfig::new()
            .child_order(["missing", "label"])
            .child("label", label.clone()),
    );

    ctx.show_page(&page).unwrap();
    assert!(document(&mut ctx).contains(id(&label).as_str()));
    assert_eq!(
        page.borrow().core().child_views.unresolved(),
        vec!["missing".to_string()]
    );
}

#[test]
fn test_attached_view_is_not_rendered_or_themed_again() {
    let Fixture {
        mut ctx, page, button, ..
    } = fixture();
    ctx.show_page(&page).unwrap();
    let button_id = id(&button);

    let err = lifecycle::render(&button, &mut ctx).unwrap_err();
    assert!(matches!(
        err,
        ViewError::InvalidLifecycleTransition {
            operation: "render",
            phase: LifecyclePhase::EventsBound,
            ..
        }
    ));
    assert_eq!(lifecycle::phase_of(&button), Some(LifecyclePhase::EventsBound));

    lifecycle::activate(&button, &mut ctx).unwrap();
    let engine = ctx.theme_engine_as::<ClassThemeEngine>().unwrap();
    assert_eq!(engine.enhancements(button_id.as_str()), 1);
}

#[test]
fn test_detach_allows_a_fresh_attachment() {
    let Fixture {
        mut ctx,
        page,
        label,
        button,
    } = fixture();
    ctx.show_page(&page).unwrap();
    let row = lifecycle::find_descendant(&page, "row").unwrap();
    let button_id = id(&button);

    lifecycle::detach(&row, &mut ctx).unwrap();
    for view in [&row, &label, &button] {
        assert_eq!(lifecycle::phase_of(view), Some(LifecyclePhase::Unconfigured));
        assert!(!document(&mut ctx).contains(id(view).as_str()));
        assert!(ctx.registry().contains(&id(view)));
    }
    assert!(ctx.dispatcher().bound_events(button_id.as_str()).is_empty());

    let node = lifecycle::render(&row, &mut ctx).unwrap().unwrap();
    let page_id = id(&page);
    ctx.document_mut().insert(Some(page_id.as_str()), &node).unwrap();
    lifecycle::activate(&row, &mut ctx).unwrap();

    assert_eq!(lifecycle::phase_of(&button), Some(LifecyclePhase::EventsBound));
    assert_eq!(document(&mut ctx).listener_count(button_id.as_str(), "tap"), 1);
    let engine = ctx.theme_engine_as::<ClassThemeEngine>().unwrap();
    assert_eq!(engine.enhancements(button_id.as_str()), 2);
}

#[test]
fn test_destroyed_view_cannot_be_detached() {
    let Fixture { mut ctx, label, .. } = fixture();
    lifecycle::destroy(&label, &mut ctx).unwrap();
    let err = lifecycle::detach(&label, &mut ctx).unwrap_err();
    assert!(matches!(
        err,
        ViewError::InvalidLifecycleTransition { operation: "detach", .. }
    ));
}
