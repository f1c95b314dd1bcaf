//! View lifecycle driver
//!
//! Enforces `render -> attach -> theme -> register_events -> (update)* ->
//! destroy` for single views and fans every step out to children. Borrows of a
//! parent are released before its children are visited, so children may look
//! their parent up through the registry while the pass runs.

use std::rc::Rc;

use log::{debug, trace, warn};
use serde_json::Value;

use crate::component::{
    ChildViews, Context, LifecyclePhase, Node, RenderMode, ViewCore, ViewError, ViewId, ViewRef,
};

fn busy(operation: &str) -> ViewError {
    ViewError::Busy(format!("view is borrowed during {operation}"))
}

/// Whether two handles point at the same view
pub fn same(a: &ViewRef, b: &ViewRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Id of a view, `None` while it is mutably borrowed
pub fn id_of(view: &ViewRef) -> Option<ViewId> {
    view.try_borrow().ok().map(|v| v.core().id.clone())
}

/// Lifecycle phase of a view
pub fn phase_of(view: &ViewRef) -> Option<LifecyclePhase> {
    view.try_borrow().ok().map(|v| v.core().phase())
}

fn snapshot(view: &ViewRef, operation: &str) -> Result<(ViewId, LifecyclePhase, Vec<ViewRef>), ViewError> {
    let v = view.try_borrow().map_err(|_| busy(operation))?;
    Ok((v.core().id.clone(), v.core().phase(), v.child_order()))
}

/// Register a freshly designed or cloned view and hook up its content binding
pub(crate) fn install(view: &ViewRef, ctx: &mut Context) {
    let (id, binding, unresolved) = {
        let v = view.borrow();
        let core = v.core();
        (
            core.id.clone(),
            core.content_binding.clone(),
            core.child_views.unresolved(),
        )
    };
    for name in unresolved {
        warn!("{}", ViewError::MissingChild { parent: id.clone(), name });
    }
    ctx.registry.register(view);
    if let Some(binding) = binding {
        ctx.observables.observe(&binding, &id);
        if let Some(value) = ctx.observables.get(&binding).cloned() {
            view.borrow_mut().core_mut().value = value;
        }
    }
}

/// Render a view to markup
///
/// Self-attaching views insert themselves and return `None`. An attached view
/// has to be detached before it can be rendered again.
pub fn render(view: &ViewRef, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
    let mut v = view.try_borrow_mut().map_err(|_| busy("render"))?;
    let phase = v.core().phase();
    if !matches!(phase, LifecyclePhase::Unconfigured | LifecyclePhase::Rendered) {
        return Err(ViewError::InvalidLifecycleTransition {
            id: v.core().id.clone(),
            phase,
            operation: "render",
        });
    }
    trace!("Rendering {} {}", v.core().kind, v.core().id);
    let node = v.render(ctx)?;
    if v.render_mode() == RenderMode::Inline && node.is_none() {
        warn!("Inline view {} rendered no markup", v.core().id);
    }
    v.core_mut().phase = LifecyclePhase::Rendered;
    Ok(node)
}

/// Render one named child of a composite
///
/// Assigns the child's name and parent back-reference. Failures are logged and
/// yield `None` so the rest of the composite still renders.
pub fn render_child(
    ctx: &mut Context,
    parent: &ViewId,
    name: &str,
    child: &ViewRef,
) -> Option<Node> {
    match child.try_borrow_mut() {
        Ok(mut c) => {
            let core = c.core_mut();
            core.name = Some(name.to_string());
            core.parent = Some(parent.clone());
        }
        Err(_) => {
            warn!("Child view '{}' of {} is busy, skipping", name, parent);
            return None;
        }
    }
    match render(child, ctx) {
        Ok(node) => node,
        Err(e) => {
            warn!("Failed to render child view '{}' of {}: {}", name, parent, e);
            None
        }
    }
}

/// Render all children of a composite in declared order
///
/// Declared names without a view are logged and skipped.
pub fn render_children(ctx: &mut Context, core: &ViewCore) -> Vec<Node> {
    render_named(ctx, &core.id, &core.child_views)
}

/// Render the children of an explicit collection in its declared order
pub fn render_named(ctx: &mut Context, parent: &ViewId, children: &ChildViews) -> Vec<Node> {
    let mut nodes = Vec::new();
    for name in children.names() {
        match children.get(name) {
            Some(child) => {
                if let Some(node) = render_child(ctx, parent, name, child) {
                    nodes.push(node);
                }
            }
            None => {
                let missing = ViewError::MissingChild {
                    parent: parent.clone(),
                    name: name.clone(),
                };
                warn!("{}, skipping", missing);
            }
        }
    }
    nodes
}

/// Mark a rendered subtree as attached once its markup is in the document
pub fn attach(view: &ViewRef, ctx: &mut Context) -> Result<(), ViewError> {
    let (id, phase, children) = snapshot(view, "attach")?;
    match phase {
        LifecyclePhase::Rendered => {
            if ctx.document().contains(id.as_str()) {
                view.try_borrow_mut().map_err(|_| busy("attach"))?.core_mut().phase =
                    LifecyclePhase::Attached;
            } else {
                warn!("View {} was rendered but is not in the document", id);
            }
        }
        LifecyclePhase::Destroyed | LifecyclePhase::Unconfigured => {
            return Err(ViewError::InvalidLifecycleTransition {
                id,
                phase,
                operation: "attach",
            });
        }
        _ => debug!("View {} is already attached", id),
    }
    for child in &children {
        if let Err(e) = attach(child, ctx) {
            warn!("Failed to attach child of {}: {}", id, e);
        }
    }
    Ok(())
}

/// Apply visual finalization
///
/// Runs once per attachment; repeated calls are no-ops.
pub fn theme(view: &ViewRef, ctx: &mut Context) -> Result<(), ViewError> {
    let (id, phase, children) = snapshot(view, "theme")?;
    match phase {
        LifecyclePhase::Attached => {
            let mut v = view.try_borrow_mut().map_err(|_| busy("theme"))?;
            v.theme(ctx)?;
            v.core_mut().phase = LifecyclePhase::Themed;
        }
        LifecyclePhase::Themed | LifecyclePhase::EventsBound | LifecyclePhase::Updating => {
            debug!("View {} is already themed", id);
        }
        _ => {
            return Err(ViewError::InvalidLifecycleTransition {
                id,
                phase,
                operation: "theme",
            });
        }
    }
    for child in &children {
        if let Err(e) = theme(child, ctx) {
            warn!("Failed to theme child of {}: {}", id, e);
        }
    }
    Ok(())
}

/// Bind event handlers; calling it again rebinds without duplicating listeners
pub fn register_events(view: &ViewRef, ctx: &mut Context) -> Result<(), ViewError> {
    let (id, phase, children) = snapshot(view, "register events")?;
    match phase {
        LifecyclePhase::Themed | LifecyclePhase::EventsBound | LifecyclePhase::Updating => {
            let mut v = view.try_borrow_mut().map_err(|_| busy("register events"))?;
            v.register_events(ctx)?;
            if phase == LifecyclePhase::Themed {
                v.core_mut().phase = LifecyclePhase::EventsBound;
            }
        }
        _ => {
            return Err(ViewError::InvalidLifecycleTransition {
                id,
                phase,
                operation: "register events",
            });
        }
    }
    for child in &children {
        if let Err(e) = register_events(child, ctx) {
            warn!("Failed to register events for child of {}: {}", id, e);
        }
    }
    Ok(())
}

/// Render, insert once, attach, theme and bind a view
///
/// `container` is the id of the element to append to; `None` means the
/// document body.
pub fn mount(view: &ViewRef, ctx: &mut Context, container: Option<&str>) -> Result<(), ViewError> {
    let node = render(view, ctx)?;
    if let Some(node) = node {
        ctx.document_mut().insert(container, &node)?;
    }
    attach(view, ctx)?;
    theme(view, ctx)?;
    register_events(view, ctx)
}

/// Attach, theme and bind a view whose markup was inserted by a parent patch
pub fn activate(view: &ViewRef, ctx: &mut Context) -> Result<(), ViewError> {
    attach(view, ctx)?;
    theme(view, ctx)?;
    register_events(view, ctx)
}

/// Take an attached subtree out of the document so it can be rendered again
///
/// Children go first. Each view loses its DOM bindings and element and
/// returns to `Unconfigured`; it stays registered and alive, and its pending
/// tasks are kept. Views that were never attached are left alone.
pub fn detach(view: &ViewRef, ctx: &mut Context) -> Result<(), ViewError> {
    let (id, phase, children) = snapshot(view, "detach")?;
    if phase == LifecyclePhase::Destroyed {
        return Err(ViewError::InvalidLifecycleTransition {
            id,
            phase,
            operation: "detach",
        });
    }
    for child in &children {
        if let Err(e) = detach(child, ctx) {
            warn!("Failed to detach child of {}: {}", id, e);
        }
    }
    if phase == LifecyclePhase::Unconfigured {
        return Ok(());
    }
    ctx.unregister_events(id.as_str());
    ctx.document_mut().remove(id.as_str());
    view.try_borrow_mut().map_err(|_| busy("detach"))?.core_mut().phase = LifecyclePhase::Unconfigured;
    trace!("Detached view {}", id);
    Ok(())
}

/// Set a new value and patch the document
pub fn update(view: &ViewRef, ctx: &mut Context, value: Value) -> Result<(), ViewError> {
    let mut v = view.try_borrow_mut().map_err(|_| busy("update"))?;
    let phase = v.core().phase();
    if phase == LifecyclePhase::Destroyed {
        return Err(ViewError::InvalidLifecycleTransition {
            id: v.core().id.clone(),
            phase,
            operation: "update",
        });
    }
    v.set_value(ctx, value)?;
    if phase.is_attached() {
        v.core_mut().phase = LifecyclePhase::Updating;
        let result = v.render_update(ctx);
        v.core_mut().phase = phase;
        result?;
    }
    Ok(())
}

/// Notify a subtree that the viewport orientation changed
pub fn orientation_changed(view: &ViewRef, ctx: &mut Context) {
    let Ok((id, phase, children)) = snapshot(view, "orientation change") else {
        warn!("Skipping orientation change for a busy view");
        return;
    };
    if phase.is_attached() {
        if let Ok(mut v) = view.try_borrow_mut() {
            if let Err(e) = v.orientation_did_change(ctx) {
                warn!("View {} failed to handle orientation change: {}", id, e);
            }
        }
    }
    for child in &children {
        orientation_changed(child, ctx);
    }
}

/// Remove a view and its children
///
/// Children go first. Each view cancels its pending tasks, loses its DOM
/// bindings, element and registry entry, and has its liveness flag cleared.
/// Destroying twice is a no-op.
pub fn destroy(view: &ViewRef, ctx: &mut Context) -> Result<(), ViewError> {
    let (id, phase, children) = snapshot(view, "destroy")?;
    if phase == LifecyclePhase::Destroyed {
        return Ok(());
    }
    for child in &children {
        if let Err(e) = destroy(child, ctx) {
            warn!("Failed to destroy child of {}: {}", id, e);
        }
    }
    {
        let mut v = view.try_borrow_mut().map_err(|_| busy("destroy"))?;
        v.will_destroy(ctx);
        let core = v.core_mut();
        core.phase = LifecyclePhase::Destroyed;
        core.alive = false;
        core.child_views.clear();
    }
    ctx.cancel_tasks(&id);
    ctx.unregister_events(id.as_str());
    ctx.observables.forget(&id);
    ctx.document_mut().remove(id.as_str());
    ctx.registry.unregister(&id);
    trace!("Destroyed view {}", id);
    Ok(())
}

/// Copy a view and its named children with fresh ids
///
/// The copy is registered and `Unconfigured`; internal events are reinstalled
/// for the new id.
pub fn deep_clone(view: &ViewRef, ctx: &mut Context) -> Result<ViewRef, ViewError> {
    let copy = view.try_borrow().map_err(|_| busy("clone"))?.clone_view();
    let original_children = {
        let mut c = copy.borrow_mut();
        let core = c.core_mut();
        core.id = ctx.next_view_id();
        core.phase = LifecyclePhase::Unconfigured;
        core.alive = true;
        core.parent = None;
        core.internal_events.clear();
        std::mem::take(&mut core.child_views)
    };

    let mut children = ChildViews::declare(original_children.names().to_vec());
    for (name, child) in original_children.resolved() {
        children.insert(name, deep_clone(&child, ctx)?);
    }

    {
        let mut c = copy.borrow_mut();
        c.core_mut().child_views = children;
        c.did_design(ctx);
    }
    install(&copy, ctx);
    Ok(copy)
}

/// Depth-first search for a descendant by name
pub fn find_descendant(view: &ViewRef, name: &str) -> Option<ViewRef> {
    let children = view.try_borrow().ok()?.core().child_views.resolved();
    for (child_name, child) in &children {
        if child_name == name {
            return Some(child.clone());
        }
    }
    children
        .iter()
        .find_map(|(_, child)| find_descendant(child, name))
}

/// Visit a view and all descendants, parents first
pub fn walk(view: &ViewRef, f: &mut dyn FnMut(&ViewRef)) {
    f(view);
    let children = match view.try_borrow() {
        Ok(v) => v.child_order(),
        Err(_) => return,
    };
    for child in &children {
        walk(child, f);
    }
}
