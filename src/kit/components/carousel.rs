// Carousel widget for OrbitKit

use log::{debug, error, trace};
use serde_json::Value;

use crate::component::{
    lifecycle, with_view, Context, Node, RetryPolicy, TaskStep, View, ViewCore, ViewError,
};
use crate::events::{Binding, DomEvent, HandlerCall, HandlerOutcome};
use crate::layout::Paging;

/// Horizontally paged children
///
/// Paging needs the carousel's laid-out width, which is only known some time
/// after insertion. Theming therefore polls the layout on the task queue with
/// a bounded number of attempts; swipes before that are ignored.
#[derive(Debug, Clone)]
pub struct CarouselView {
    pub core: ViewCore,
    /// Current page, 0-based
    pub page: usize,
    paging: Option<Paging>,
    /// Called when the layout never became available
    pub on_error: Option<Binding>,
}

impl CarouselView {
    pub const KIND: &'static str = "carousel";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            page: 0,
            paging: None,
            on_error: None,
        }
    }

    pub fn on_error(mut self, binding: Binding) -> Self {
        self.on_error = Some(binding);
        self
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    fn track_id(&self) -> String {
        self.core.id.sub("track")
    }

    fn dot_id(&self, page: usize) -> String {
        self.core.id.sub(&format!("dot{page}"))
    }

    /// Measure and lay out; `false` while the carousel has no size yet
    pub fn try_layout(&mut self, ctx: &mut Context) -> Result<bool, ViewError> {
        let width = match ctx.document().measure(self.core.id.as_str()) {
            Some(size) if size.width > 0.0 => size.width,
            _ => return Ok(false),
        };
        let paging = Paging::new(width, self.core.child_views.len());
        ctx.document_mut()
            .set_style(&self.track_id(), "width", &format!("{}px", paging.track_width()))?;
        self.paging = Some(paging);
        self.go_to(ctx, self.page)?;
        trace!("Carousel {} laid out at {}px per page", self.core.id, width);
        Ok(true)
    }

    /// Show a page, clamped into range
    pub fn go_to(&mut self, ctx: &mut Context, page: usize) -> Result<usize, ViewError> {
        let Some(paging) = self.paging else {
            return Ok(self.page);
        };
        let previous = self.page;
        self.page = paging.clamp(page as isize);
        let offset = paging.offset_for(self.page);

        let document = ctx.document_mut();
        document.set_style(&self.track_id(), "transform", &format!("translateX(-{offset}px)"))?;
        document.remove_class(&self.dot_id(previous), "ui-carousel-dot-active");
        document.add_class(&self.dot_id(self.page), "ui-carousel-dot-active");
        Ok(self.page)
    }

    fn layout_failed(&self, ctx: &mut Context) {
        let Some(on_error) = self.on_error.clone() else {
            return;
        };
        let mut event = DomEvent::new("error", self.core.id.as_str());
        let message = Value::String("carousel was never laid out".to_string());
        if let Err(e) = ctx.call_handler(&on_error, &mut event, false, vec![message]) {
            error!("Error handler of carousel {} failed: {}", self.core.id, e);
        }
    }
}

impl Default for CarouselView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for CarouselView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        for (event, action) in [("swipeleft", "next"), ("swiperight", "prev"), ("scrollend", "snap")] {
            let binding = Binding::on_view(&self.core.id, action);
            self.core.internal_events.insert(event.to_string(), binding);
        }
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let pages = lifecycle::render_children(ctx, &self.core);
        let dots = (0..pages.len()).map(|page| {
            Node::element("span")
                .with_id(self.dot_id(page))
                .with_class("ui-carousel-dot")
                .with_optional_class((page == self.page).then_some("ui-carousel-dot-active"))
        });
        let dots: Vec<Node> = dots.collect();

        Ok(Some(
            Node::element("div")
                .with_id(&self.core.id)
                .with_class("ui-carousel")
                .with_optional_class(self.core.css_class.as_deref())
                .with_child(
                    Node::element("div")
                        .with_id(self.track_id())
                        .with_class("ui-carousel-track")
                        .with_children(pages),
                )
                .with_child(
                    Node::element("div")
                        .with_id(self.core.id.sub("dots"))
                        .with_class("ui-carousel-dots")
                        .with_children(dots),
                ),
        ))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "carousel");
        if self.try_layout(ctx)? {
            return Ok(());
        }

        let config = ctx.config();
        let policy = RetryPolicy::poll(config.layout_poll_interval_ms, config.layout_poll_max_attempts);
        let interval = policy.interval_ms;
        debug!("Carousel {} is not laid out yet, polling", self.core.id);
        ctx.schedule(&self.core.id, "carousel-layout", interval, policy, move |view, ctx, attempt| {
            let laid_out = with_view::<CarouselView, _>(view, |carousel| {
                let done = carousel.try_layout(ctx).unwrap_or(false);
                if !done && attempt >= policy.max_attempts {
                    carousel.layout_failed(ctx);
                }
                done
            });
            match laid_out {
                Some(true) | None => TaskStep::Done,
                Some(false) => TaskStep::Retry,
            }
        });
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["swipeleft", "swiperight", "scrollend", "tap"]
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        let Some(paging) = self.paging else {
            debug!("Carousel {} ignores {} before layout", self.core.id, action);
            return Ok(HandlerOutcome::Consumed);
        };
        let target = match action {
            "next" => self.page + 1,
            "prev" => self.page.saturating_sub(1),
            "snap" => paging.snap(call.event.x),
            _ => {
                return Err(ViewError::UnknownAction {
                    id: self.core.id.clone(),
                    action: action.to_string(),
                })
            }
        };
        let page = self.go_to(ctx, target)?;
        Ok(HandlerOutcome::Forward(vec![Value::from(page)]))
    }

    fn responds_to(&self, action: &str) -> bool {
        matches!(action, "next" | "prev" | "snap")
    }
}
