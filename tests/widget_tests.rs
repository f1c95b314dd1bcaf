// Widget behaviour against the in-memory document

use std::cell::RefCell;
use std::rc::Rc;

use orbit_mobile::layout::Size;
use orbit_mobile::platform::Mutation;
use orbit_mobile::prelude::*;
use serde_json::{json, Value};

type Calls = Rc<RefCell<Vec<Vec<Value>>>>;

/// Callback binding that records the arguments it was called with
fn recorder() -> (Calls, Binding) {
    let calls: Calls = Rc::new(RefCell::new(Vec::new()));
    let seen = calls.clone();
    let binding = Binding::callback(move |_, call| {
        seen.borrow_mut().push(call.args.clone());
        HandlerOutcome::Consumed
    });
    (calls, binding)
}

fn id(view: &ViewRef) -> ViewId {
    lifecycle::id_of(view).unwrap()
}

fn app() -> Application {
    Application::in_memory(AppConfig::default())
}

fn show(app: &mut Application, children: Vec<(&str, ViewRef)>) -> ViewRef {
    let mut config = ViewConfig::new();
    for (name, child) in children {
        config = config.child(name, child);
    }
    let page: ViewRef = PageView::new().design(app.context_mut(), config);
    app.show_page(&page).unwrap();
    page
}

fn tap(app: &mut Application, view: &ViewRef) -> usize {
    let target = id(view);
    app.memory_document().unwrap().fire(target.as_str(), "tap");
    app.pump()
}

#[test]
fn test_list_update_patches_a_single_sub_view() {
    let mut app = app();
    let ctx = app.context_mut();
    let title: ViewRef = LabelView::new().design(ctx, ViewConfig::new().value("<%= name %>"));
    let city: ViewRef = LabelView::new().design(ctx, ViewConfig::new().value("<%= city %>"));
    let template: ViewRef = ListItemView::new().design(
        ctx,
        ViewConfig::new()
            .child_order(["title", "city"])
            .child("title", title)
            .child("city", city),
    );
    let list = ListView::new().template(template).design(ctx, ViewConfig::new());
    let records = vec![
        json!({"id": 1, "name": "Ada", "city": "London"}),
        json!({"id": 2, "name": "Grace"}),
        json!({"id": 3, "name": "Edsger", "city": "Austin"}),
    ];
    list.borrow_mut().set_items(ctx, &records).unwrap();
    let list_ref: ViewRef = list.clone();
    show(&mut app, vec![("list", list_ref)]);

    assert_eq!(list.borrow().model_ids(), vec!["1", "2", "3"]);
    let item = list.borrow().item("2").unwrap();
    let title = lifecycle::find_descendant(&item, "title").unwrap();
    let city = lifecycle::find_descendant(&item, "city").unwrap();
    assert_eq!(title.borrow().core().value, json!("Grace"));
    assert_eq!(city.borrow().core().value, json!(""));

    app.memory_document().unwrap().clear_mutations();
    let changed = list
        .borrow_mut()
        .update_list_item_view(app.context_mut(), "2", &[ItemUpdate::new("title", "Hopper")])
        .unwrap();

    assert_eq!(changed, 1);
    let doc = app.memory_document().unwrap();
    assert_eq!(doc.mutations(), &[Mutation::SetText { id: id(&title).to_string() }]);
    assert_eq!(doc.text(id(&title).as_str()).as_deref(), Some("Hopper"));
}

#[test]
fn test_list_item_tap_forwards_model_id() {
    let mut app = app();
    let (calls, on_select) = recorder();
    let ctx = app.context_mut();
    let template: ViewRef = ListItemView::new().design(ctx, ViewConfig::new().value("<%= name %>"));
    let list = ListView::new()
        .template(template)
        .id_name("key")
        .on_select(on_select)
        .design(ctx, ViewConfig::new().value(json!([{"key": "a", "name": "A"}, {"key": "b", "name": "B"}])));
    let list_ref: ViewRef = list.clone();
    show(&mut app, vec![("list", list_ref)]);

    let item = list.borrow().item("b").unwrap();
    tap(&mut app, &item);
    assert_eq!(*calls.borrow(), vec![vec![json!("b")]]);

    assert!(list.borrow_mut().remove_item(app.context_mut(), "a").unwrap());
    assert_eq!(list.borrow().model_ids(), vec!["b"]);
}

#[test]
fn test_list_rejects_a_template_that_is_not_an_item() {
    let mut app = app();
    let (calls, on_select) = recorder();
    let ctx = app.context_mut();
    let template: ViewRef = LabelView::new().design(ctx, ViewConfig::new().value("<%= id %>"));
    let list = ListView::new()
        .template(template)
        .on_select(on_select)
        .design(ctx, ViewConfig::new().value(json!([{"id": "a"}])));
    let list_ref: ViewRef = list.clone();
    show(&mut app, vec![("list", list_ref.clone())]);

    assert!(list.borrow().model_ids().is_empty());
    assert!(list.borrow().core().child_views.is_empty());
    assert!(app.memory_document().unwrap().contains(id(&list_ref).as_str()));

    tap(&mut app, &list_ref);
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_dashboard_restores_persisted_order() {
    let store = MemoryStore::new();
    let values = [json!("a"), json!("b"), json!("c")];

    let mut first = Application::new(
        AppConfig::default(),
        Box::new(MemoryDocument::new()),
        Box::new(store.clone()),
    );
    let ctx = first.context_mut();
    let dashboard = DashboardView::new().design(ctx, ViewConfig::new());
    let items = DashboardView::items_from_values(ctx, &values);
    dashboard.borrow_mut().set_items(ctx, items).unwrap();
    dashboard.borrow_mut().move_item(ctx, 0, 2).unwrap();
    assert_eq!(dashboard.borrow().item_values(), vec![json!("b"), json!("c"), json!("a")]);

    let mut reloaded = Application::new(
        AppConfig::default(),
        Box::new(MemoryDocument::new()),
        Box::new(store.clone()),
    );
    let ctx = reloaded.context_mut();
    let dashboard = DashboardView::new().design(ctx, ViewConfig::new());
    let items = DashboardView::items_from_values(ctx, &values);
    dashboard.borrow_mut().set_items(ctx, items).unwrap();
    assert_eq!(dashboard.borrow().item_values(), vec![json!("b"), json!("c"), json!("a")]);

    // A different number of items keeps the incoming order
    let more = [json!("a"), json!("b"), json!("c"), json!("d")];
    let items = DashboardView::items_from_values(ctx, &more);
    dashboard.borrow_mut().set_items(ctx, items).unwrap();
    assert_eq!(dashboard.borrow().item_values(), more.to_vec());
}

#[test]
fn test_dashboard_hold_swaps_event_sets() {
    let mut app = app();
    let ctx = app.context_mut();
    let dashboard = DashboardView::new().columns(2).design(ctx, ViewConfig::new());
    let items = DashboardView::items_from_values(ctx, &[json!("a"), json!("b"), json!("c")]);
    dashboard.borrow_mut().set_items(ctx, items).unwrap();
    let dashboard_ref: ViewRef = dashboard.clone();
    show(&mut app, vec![("dashboard", dashboard_ref.clone())]);

    let dashboard_id = id(&dashboard_ref);
    let first = dashboard.borrow().core().child("item0").unwrap();
    let last = dashboard.borrow().core().child("item2").unwrap();
    assert!(app.memory_document().unwrap().contains(&dashboard_id.sub("row2")));

    // A short touch does nothing
    app.memory_document().unwrap().fire(dashboard_id.as_str(), "touchstart");
    app.pump();
    app.memory_document().unwrap().fire(dashboard_id.as_str(), "touchend");
    app.pump();
    app.advance(1_000);
    assert!(!dashboard.borrow().is_editing());

    app.memory_document().unwrap().fire(dashboard_id.as_str(), "touchstart");
    app.pump();
    app.advance(app.context().config().taphold_ms);
    assert!(dashboard.borrow().is_editing());

    let dispatcher = app.context().dispatcher();
    assert_eq!(dispatcher.bound_events(dashboard_id.as_str()), vec!["tap".to_string()]);
    assert_eq!(
        dispatcher.bound_events(id(&first).as_str()),
        vec!["dragstart".to_string(), "drop".to_string()]
    );

    app.memory_document().unwrap().fire(id(&first).as_str(), "dragstart");
    app.memory_document().unwrap().fire(id(&last).as_str(), "drop");
    app.pump();
    assert_eq!(dashboard.borrow().item_values(), vec![json!("b"), json!("c"), json!("a")]);
    assert!(!app.context().dispatcher().is_bound(id(&first).as_str(), "tap"));
    assert!(app.memory_document().unwrap().contains(id(&first).as_str()));
    assert_eq!(lifecycle::phase_of(&first), Some(LifecyclePhase::EventsBound));

    tap(&mut app, &dashboard_ref);
    assert!(!dashboard.borrow().is_editing());
    assert!(app.context().dispatcher().is_bound(id(&first).as_str(), "tap"));
    let stored: Option<Vec<Value>> = app.context().load_json("dashboard").unwrap();
    assert_eq!(stored, Some(vec![json!("b"), json!("c"), json!("a")]));
}

#[test]
fn test_dashboard_copy_does_not_share_a_pending_hold() {
    let mut app = app();
    let ctx = app.context_mut();
    let dashboard = DashboardView::new().design(ctx, ViewConfig::new());
    let items = DashboardView::items_from_values(ctx, &[json!("a"), json!("b")]);
    dashboard.borrow_mut().set_items(ctx, items).unwrap();
    let dashboard_ref: ViewRef = dashboard.clone();
    show(&mut app, vec![("dashboard", dashboard_ref.clone())]);

    app.memory_document().unwrap().fire(id(&dashboard_ref).as_str(), "touchstart");
    app.pump();

    let copy = lifecycle::deep_clone(&dashboard_ref, app.context_mut()).unwrap();
    lifecycle::destroy(&copy, app.context_mut()).unwrap();

    app.advance(app.context().config().taphold_ms);
    assert!(dashboard.borrow().is_editing());
}

#[test]
fn test_dialog_hides_then_destroys() {
    let mut app = app();
    let dialog = DialogView::alert(app.context_mut(), "Saved", "All done").unwrap();
    let dialog_id = id(&dialog);
    let ok = lifecycle::find_descendant(&dialog, "ok").unwrap();
    let ok_id = id(&ok);
    assert!(app.memory_document().unwrap().body().contains(&dialog_id.to_string()));

    tap(&mut app, &ok);
    assert!(app.memory_document().unwrap().has_class(dialog_id.as_str(), "out"));
    assert!(app.memory_document().unwrap().contains(dialog_id.as_str()));

    let transition = app.context().config().transition_ms;
    app.advance(transition - 1);
    assert!(app.memory_document().unwrap().contains(dialog_id.as_str()));

    app.advance(1);
    assert!(!app.memory_document().unwrap().contains(dialog_id.as_str()));
    assert!(!app.context().registry().contains(&ok_id));
    assert_eq!(lifecycle::phase_of(&dialog), Some(LifecyclePhase::Destroyed));
    assert!(app.context().pages().is_empty());
}

#[test]
fn test_confirm_reaches_the_application_handler() {
    let mut app = app();
    let (cancelled, on_confirm) = recorder();
    let dialog = DialogView::confirm(app.context_mut(), "Delete", "Really?", on_confirm).unwrap();
    let cancel = lifecycle::find_descendant(&dialog, "cancel").unwrap();
    tap(&mut app, &cancel);
    assert!(cancelled.borrow().is_empty());
    assert!(with_view::<DialogView, _>(&dialog, |d| d.is_hiding()).unwrap());

    let (confirmed, on_confirm) = recorder();
    let dialog = DialogView::confirm(app.context_mut(), "Delete", "Really?", on_confirm).unwrap();
    let ok = lifecycle::find_descendant(&dialog, "ok").unwrap();
    tap(&mut app, &ok);
    assert_eq!(*confirmed.borrow(), vec![vec![json!("OK")]]);
}

#[test]
fn test_text_field_tracks_focus_and_writes_back() {
    let mut app = app();
    let binding = ContentBinding::new("user", "name");
    let ctx = app.context_mut();
    ctx.set_property("user", "name", json!("Ada"));
    let field: ViewRef = TextFieldView::new().design(
        ctx,
        ViewConfig::new()
            .content_binding(binding.clone())
            .content_binding_reverse(binding.clone()),
    );
    let mirror: ViewRef = LabelView::new().design(ctx, ViewConfig::new().content_binding(binding));
    show(&mut app, vec![("field", field.clone()), ("mirror", mirror.clone())]);
    let field_id = id(&field);
    assert_eq!(app.memory_document().unwrap().text(id(&mirror).as_str()).as_deref(), Some("Ada"));

    app.memory_document().unwrap().fire(field_id.as_str(), "focus");
    app.pump();
    assert!(field.borrow().core().has_focus);

    // Updates from elsewhere do not clobber what is being typed
    app.context_mut().set_property("user", "name", json!("Server"));
    assert_eq!(field.borrow().core().value, json!("Ada"));
    assert_eq!(app.memory_document().unwrap().text(id(&mirror).as_str()).as_deref(), Some("Server"));

    app.memory_document().unwrap().input(field_id.as_str(), "Grace");
    app.pump();
    assert_eq!(app.context().property("user", "name"), Some(json!("Grace")));
    assert_eq!(app.memory_document().unwrap().text(id(&mirror).as_str()).as_deref(), Some("Grace"));

    app.memory_document().unwrap().fire(field_id.as_str(), "blur");
    app.pump();
    app.context_mut().set_property("user", "name", json!("Linus"));
    assert_eq!(app.memory_document().unwrap().value(field_id.as_str()).as_deref(), Some("Linus"));
}

#[test]
fn test_carousel_polls_layout_then_pages() {
    let mut app = app();
    let ctx = app.context_mut();
    let pages: Vec<ViewRef> = (0..3)
        .map(|i| {
            let page: ViewRef = LabelView::new().design(ctx, ViewConfig::new().value(format!("Page {i}")));
            page
        })
        .collect();
    let mut config = ViewConfig::new();
    for (i, page) in pages.into_iter().enumerate() {
        config = config.child(format!("p{i}"), page);
    }
    let carousel = CarouselView::new().design(ctx, config);
    let carousel_ref: ViewRef = carousel.clone();
    show(&mut app, vec![("carousel", carousel_ref.clone())]);
    let carousel_id = id(&carousel_ref);
    assert!(carousel.borrow().paging().is_none());

    // Swipes before layout are ignored
    app.memory_document().unwrap().fire(carousel_id.as_str(), "swipeleft");
    app.pump();
    assert_eq!(carousel.borrow().page, 0);

    app.memory_document()
        .unwrap()
        .set_layout(carousel_id.as_str(), Size::new(320.0, 200.0));
    app.advance(app.context().config().layout_poll_interval_ms);
    assert!(carousel.borrow().paging().is_some());
    assert_eq!(app.context().pending_tasks(), 0);

    let track = carousel_id.sub("track");
    let doc = app.memory_document().unwrap();
    assert_eq!(doc.style(&track, "width").as_deref(), Some("960px"));

    doc.fire(carousel_id.as_str(), "swipeleft");
    app.pump();
    assert_eq!(carousel.borrow().page, 1);
    let doc = app.memory_document().unwrap();
    assert_eq!(doc.style(&track, "transform").as_deref(), Some("translateX(-320px)"));
    assert!(doc.has_class(&carousel_id.sub("dot1"), "ui-carousel-dot-active"));
    assert!(!doc.has_class(&carousel_id.sub("dot0"), "ui-carousel-dot-active"));

    doc.fire_event(DomEvent::new("scrollend", carousel_id.as_str()).at(900.0, 0.0));
    app.pump();
    assert_eq!(carousel.borrow().page, 2);
}

#[test]
fn test_carousel_gives_up_after_bounded_attempts() {
    let mut app = app();
    let (errors, on_error) = recorder();
    let carousel: ViewRef = CarouselView::new().on_error(on_error).design(app.context_mut(), ViewConfig::new());
    show(&mut app, vec![("carousel", carousel.clone())]);
    assert_eq!(app.context().pending_tasks_for(&id(&carousel)), 1);

    let config = app.context().config().clone();
    let runs = app.advance(config.layout_poll_interval_ms * (config.layout_poll_max_attempts as u64 + 5));
    assert_eq!(runs, config.layout_poll_max_attempts as usize);
    assert_eq!(app.context().pending_tasks(), 0);
    assert_eq!(errors.borrow().len(), 1);
}

#[test]
fn test_split_view_follows_orientation() {
    let mut app = app();
    let ctx = app.context_mut();
    let menu: ViewRef = ContainerView::new().design(ctx, ViewConfig::new());
    let content: ViewRef = ContainerView::new().design(ctx, ViewConfig::new());
    let split: ViewRef = SplitView::new().design(
        ctx,
        ViewConfig::new().child("content", content.clone()).child("menu", menu.clone()),
    );
    show(&mut app, vec![("split", split.clone())]);
    let (split_id, menu_id, content_id) = (id(&split), id(&menu), id(&content));

    let doc = app.memory_document().unwrap();
    assert!(doc.has_class(split_id.as_str(), "portrait"));
    assert_eq!(doc.style(menu_id.as_str(), "display").as_deref(), Some("none"));
    assert_eq!(doc.style(content_id.as_str(), "width").as_deref(), Some("100%"));
    // Menu renders first whatever the configured order
    assert_eq!(doc.child_ids(split_id.as_str()), vec![menu_id.to_string(), content_id.to_string()]);

    doc.set_layout(menu_id.as_str(), Size::new(300.0, 200.0));
    doc.set_layout(content_id.as_str(), Size::new(700.0, 2_000.0));
    app.resize(Size::new(1024.0, 768.0));

    let doc = app.memory_document().unwrap();
    assert!(doc.has_class(split_id.as_str(), "landscape"));
    assert!(!doc.has_class(split_id.as_str(), "portrait"));
    assert_eq!(doc.style(menu_id.as_str(), "width").as_deref(), Some("30%"));
    assert_eq!(doc.style(content_id.as_str(), "width").as_deref(), Some("70%"));
    assert!(doc.has_class(content_id.as_str(), "ui-scrollable"));
    assert!(!doc.has_class(menu_id.as_str(), "ui-scrollable"));
}

#[test]
fn test_tab_bar_switches_pages() {
    let mut app = app();
    let ctx = app.context_mut();
    let home: ViewRef = PageView::titled("Home").design(ctx, ViewConfig::new());
    let settings: ViewRef = PageView::titled("Settings").design(ctx, ViewConfig::new());
    let (home_id, settings_id) = (id(&home), id(&settings));

    let home_tab: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value("Home"));
    let settings_tab: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value("Settings"));
    let tabs: ViewRef = TabBarView::new()
        .link("home", &home_id)
        .link("settings", &settings_id)
        .selected("home")
        .design(
            ctx,
            ViewConfig::new()
                .child("home", home_tab)
                .child("settings", settings_tab),
        );
    let settings_tabs = lifecycle::deep_clone(&tabs, ctx).unwrap();
    home.borrow_mut().core_mut().child_views.insert("tabs", tabs.clone());
    settings.borrow_mut().core_mut().child_views.insert("tabs", settings_tabs);
    ctx.add_page(&settings);
    app.show_page(&home).unwrap();

    let settings_tab = lifecycle::find_descendant(&tabs, "settings").unwrap();
    tap(&mut app, &settings_tab);

    assert_eq!(app.context().current_page(), Some(&settings_id));
    let doc = app.memory_document().unwrap();
    assert!(doc.contains(settings_id.as_str()));
    assert!(doc.has_class(home_id.as_str(), "ui-page-hidden"));
    assert!(doc.has_class(id(&settings_tab).as_str(), "ui-btn-active"));
}

#[test]
fn test_button_group_selects_enabled_buttons() {
    let mut app = app();
    let (calls, on_select) = recorder();
    let ctx = app.context_mut();
    let one: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value(1));
    let two: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value(2));
    let off: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value(3).disabled());
    let group: ViewRef = ButtonGroupView::new()
        .items_per_line(2)
        .selectable()
        .on_select(on_select)
        .design(
            ctx,
            ViewConfig::new()
                .child_order(["one", "two", "off"])
                .child("one", one.clone())
                .child("two", two.clone())
                .child("off", off.clone()),
        );
    show(&mut app, vec![("group", group.clone())]);

    let doc = app.memory_document().unwrap();
    let group_id = id(&group);
    assert_eq!(doc.child_ids(&group_id.sub("line1")).len(), 2);
    assert_eq!(doc.child_ids(&group_id.sub("line2")), vec![id(&off).to_string()]);
    assert!(doc.has_class(id(&one).as_str(), "ui-corner-tl"));
    assert!(doc.has_class(id(&two).as_str(), "ui-corner-tr"));
    assert!(doc.has_class(id(&off).as_str(), "ui-corner-bl"));
    assert!(doc.has_class(id(&off).as_str(), "ui-corner-br"));

    tap(&mut app, &two);
    assert_eq!(*calls.borrow(), vec![vec![json!("two"), json!(2)]]);
    assert!(app.memory_document().unwrap().has_class(id(&two).as_str(), "ui-btn-active"));

    tap(&mut app, &off);
    assert_eq!(calls.borrow().len(), 1);
    assert!(!app.memory_document().unwrap().has_class(id(&off).as_str(), "ui-btn-active"));
}

#[test]
fn test_stopped_propagation_skips_ancestors() {
    let mut app = app();
    let (outer_calls, outer) = recorder();
    let ctx = app.context_mut();
    let stopper = Binding::callback(|_, call| {
        call.event.stop_propagation();
        HandlerOutcome::Consumed
    });
    let inner: ViewRef = LabelView::new().design(ctx, ViewConfig::new().on("tap", stopper));
    let plain: ViewRef = LabelView::new().design(ctx, ViewConfig::new());
    let container: ViewRef = ContainerView::new().design(
        ctx,
        ViewConfig::new()
            .on("tap", outer)
            .child("inner", inner.clone())
            .child("plain", plain.clone()),
    );
    show(&mut app, vec![("container", container)]);

    assert_eq!(tap(&mut app, &inner), 1);
    assert!(outer_calls.borrow().is_empty());

    // Elements without a listener still bubble to the container
    assert_eq!(tap(&mut app, &plain), 1);
    assert_eq!(outer_calls.borrow().len(), 1);
}
