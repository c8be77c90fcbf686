#![forbid(unsafe_code)]

//! View state machine over the page regions.
//!
//! ```text
//!   Start --begin_analysis--> Loading --complete_analysis--> ShowingResult
//!                                                       \--> ShowingError
//!                                                       \--> Silent (empty error message)
//! ```
//!
//! The machine is single-shot: nothing leads back to `Start`. Every appear is
//! a hidden append followed by a scheduled fade-in; every disappear is a
//! scheduled fade-out followed by a scheduled detach. Transitions return as
//! soon as the ops are queued; [`ViewStateController::tick`] fires them.

use core::time::Duration;

use tracing::{debug, info, warn};

use crate::chart::{PieChart, RenderedChart};
use crate::config::PageConfig;
use crate::dom::Dom;
use crate::error::ViewError;
use crate::timing::{FadeScheduler, FadeTiming, OPACITY_HIDDEN};
use crate::trace::{TraceKind, TransitionTrace};
use crate::triple::AnalysisOutcome;

/// Id given to the loading indicator container.
pub const LOADING_SCREEN_ID: &str = "loading-screen";
/// Text that replaces the input form when the channel name is empty.
pub const INPUT_PROMPT: &str = "Please enter a channel name";

/// Pre-existing page elements the controller drives.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHandles<N> {
    pub input_form: N,
    pub channel_input: N,
    pub start_page: N,
    /// Container that receives the loading indicator, chart and error text.
    pub content: N,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRegion {
    StartPage,
    LoadingIndicator,
    ResultArea,
    ErrorArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPhase {
    /// Start page shown, nothing requested yet.
    Start,
    /// Request in flight, loading indicator shown.
    Loading,
    ShowingResult,
    ShowingError,
    /// Error outcome with an empty message: nothing was rendered.
    Silent,
}

impl ViewPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ShowingResult | Self::ShowingError | Self::Silent)
    }
}

/// The text of the error paragraph for `message`.
#[must_use]
pub fn error_text(message: &str) -> String {
    format!(
        "Error: {message}. Try again by clicking the button in the top right corner, or by refreshing the page."
    )
}

pub struct ViewStateController<N> {
    handles: PageHandles<N>,
    scheduler: FadeScheduler<N>,
    phase: ViewPhase,
    loading: Option<N>,
    result: Option<RenderedChart<N>>,
    error: Option<N>,
    loading_caption: String,
    trace: Option<TransitionTrace>,
}

impl<N> core::fmt::Debug for ViewStateController<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewStateController")
            .field("phase", &self.phase)
            .field("pending_ops", &self.scheduler.pending())
            .finish_non_exhaustive()
    }
}

impl<N> ViewStateController<N> {
    #[must_use]
    pub fn new(handles: PageHandles<N>, timing: FadeTiming) -> Self {
        Self {
            handles,
            scheduler: FadeScheduler::new(timing),
            phase: ViewPhase::Start,
            loading: None,
            result: None,
            error: None,
            loading_caption: PageConfig::default().loading_caption,
            trace: None,
        }
    }

    /// Build from a page config: fade timing, loading caption and tracing.
    #[must_use]
    pub fn from_config(handles: PageHandles<N>, config: &PageConfig) -> Self {
        let controller = Self::new(handles, config.fade_timing())
            .with_loading_caption(config.loading_caption.clone());
        if config.trace {
            controller.with_trace()
        } else {
            controller
        }
    }

    #[must_use]
    pub fn with_loading_caption(mut self, caption: impl Into<String>) -> Self {
        self.loading_caption = caption.into();
        self
    }

    /// Record every transition and fired op in a [`TransitionTrace`].
    #[must_use]
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(TransitionTrace::new());
        self
    }

    #[must_use]
    pub const fn phase(&self) -> ViewPhase {
        self.phase
    }

    #[must_use]
    pub const fn handles(&self) -> &PageHandles<N> {
        &self.handles
    }

    #[must_use]
    pub const fn scheduler(&self) -> &FadeScheduler<N> {
        &self.scheduler
    }

    #[must_use]
    pub const fn trace(&self) -> Option<&TransitionTrace> {
        self.trace.as_ref()
    }

    /// When the host should next call [`Self::tick`].
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Terminal phase reached and every fade has been applied.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.phase.is_terminal() && self.scheduler.is_idle()
    }

    /// Element bound to `region`, if it exists yet.
    #[must_use]
    pub fn region_node(&self, region: ViewRegion) -> Option<&N> {
        match region {
            ViewRegion::StartPage => Some(&self.handles.start_page),
            ViewRegion::LoadingIndicator => self.loading.as_ref(),
            ViewRegion::ResultArea => self.result.as_ref().map(|rendered| &rendered.chart),
            ViewRegion::ErrorArea => self.error.as_ref(),
        }
    }

    /// Result elements, once rendered.
    #[must_use]
    pub const fn rendered_chart(&self) -> Option<&RenderedChart<N>> {
        self.result.as_ref()
    }

    fn record(&mut self, now: Duration, kind: TraceKind) {
        if let Some(trace) = self.trace.as_mut() {
            trace.record(now, kind);
        }
    }
}

impl<N: Clone + PartialEq + core::fmt::Debug> ViewStateController<N> {
    /// Whether `region` is attached to the document.
    pub fn region_present<D>(&self, dom: &D, region: ViewRegion) -> Result<bool, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        match self.region_node(region) {
            Some(node) => dom.is_attached(node).map_err(ViewError::Dom),
            None => Ok(false),
        }
    }

    /// Whether `region` is attached and not faded out.
    pub fn region_visible<D>(&self, dom: &D, region: ViewRegion) -> Result<bool, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        let Some(node) = self.region_node(region) else {
            return Ok(false);
        };
        if !dom.is_attached(node).map_err(ViewError::Dom)? {
            return Ok(false);
        }
        let opacity = dom.style(node, "opacity").map_err(ViewError::Dom)?;
        Ok(opacity.as_deref() != Some(OPACITY_HIDDEN))
    }

    /// Replace the input form's contents with the "enter a channel name"
    /// prompt. Does not change the phase.
    pub fn show_input_error<D>(&mut self, dom: &mut D, now: Duration) -> Result<(), ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        info!("empty channel name, prompting for input");
        dom.set_text(&self.handles.input_form, INPUT_PROMPT)
            .map_err(ViewError::Dom)?;
        self.record(now, TraceKind::InputRejected);
        Ok(())
    }

    /// Start → Loading: fade the start page out and away, then append and
    /// fade in the loading indicator.
    pub fn begin_analysis<D>(&mut self, dom: &mut D, now: Duration) -> Result<(), ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        if self.phase != ViewPhase::Start {
            warn!(phase = ?self.phase, "begin_analysis rejected");
            return Err(ViewError::InvalidTransition {
                transition: "begin analysis",
                phase: self.phase,
            });
        }
        info!("begin analysis");
        self.scheduler
            .fade_out_and_detach(now, self.handles.start_page.clone());

        let loading = self.build_loading_indicator(dom).map_err(ViewError::Dom)?;
        dom.append_child(&self.handles.content, &loading)
            .map_err(ViewError::Dom)?;
        self.scheduler.fade_in(now, loading.clone());
        self.loading = Some(loading);
        self.phase = ViewPhase::Loading;
        self.record(now, TraceKind::Begin);
        Ok(())
    }

    fn build_loading_indicator<D>(&self, dom: &mut D) -> Result<N, D::Error>
    where
        D: Dom<Node = N>,
    {
        let container = dom.create_element("div")?;
        dom.set_id(&container, LOADING_SCREEN_ID)?;
        dom.set_class(&container, "red loading-screen")?;
        dom.set_style(&container, "opacity", OPACITY_HIDDEN)?;

        let spinner = dom.create_element("div")?;
        dom.set_class(&spinner, "loader")?;
        dom.append_child(&container, &spinner)?;

        if !self.loading_caption.is_empty() {
            let caption = dom.create_element("p")?;
            dom.set_class(&caption, "font")?;
            dom.set_text(&caption, &self.loading_caption)?;
            dom.append_child(&container, &caption)?;
        }
        Ok(container)
    }

    /// Loading → terminal: fade the loading indicator out and away, then
    /// render the chart or the error paragraph.
    ///
    /// An error outcome with an empty message renders nothing.
    pub fn complete_analysis<D>(
        &mut self,
        dom: &mut D,
        now: Duration,
        outcome: &AnalysisOutcome,
    ) -> Result<(), ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        if self.phase != ViewPhase::Loading {
            warn!(phase = ?self.phase, "complete_analysis rejected");
            return Err(ViewError::InvalidTransition {
                transition: "complete analysis",
                phase: self.phase,
            });
        }
        if let Some(loading) = self.loading.clone() {
            self.scheduler.fade_out_and_detach(now, loading);
        }

        self.phase = match outcome {
            AnalysisOutcome::Success { data } => {
                info!(
                    negative = data.negative(),
                    neutral = data.neutral(),
                    positive = data.positive(),
                    "rendering result"
                );
                let rendered = PieChart::new(*data)
                    .render_into(dom, &self.handles.content, &mut self.scheduler, now)
                    .map_err(ViewError::Dom)?;
                self.result = Some(rendered);
                ViewPhase::ShowingResult
            }
            AnalysisOutcome::Error { message } if message.is_empty() => {
                warn!("error outcome without a message; nothing is shown");
                ViewPhase::Silent
            }
            AnalysisOutcome::Error { message } => {
                info!(%message, "rendering error");
                let paragraph = dom.create_element("p").map_err(ViewError::Dom)?;
                dom.set_text(&paragraph, &error_text(message))
                    .map_err(ViewError::Dom)?;
                dom.set_style(&paragraph, "opacity", OPACITY_HIDDEN)
                    .map_err(ViewError::Dom)?;
                dom.set_class(&paragraph, "font error")
                    .map_err(ViewError::Dom)?;
                dom.append_child(&self.handles.content, &paragraph)
                    .map_err(ViewError::Dom)?;
                self.scheduler.fade_in(now, paragraph.clone());
                self.error = Some(paragraph);
                ViewPhase::ShowingError
            }
        };
        let label = match self.phase {
            ViewPhase::Silent => "silent",
            _ => outcome.kind(),
        };
        self.record(
            now,
            TraceKind::Complete {
                outcome: label.to_owned(),
            },
        );
        Ok(())
    }

    /// Fire every fade op due at `now`. Returns how many ran.
    pub fn tick<D>(&mut self, dom: &mut D, now: Duration) -> Result<usize, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        let fired = self.scheduler.run_due(dom, now).map_err(ViewError::Dom)?;
        for op in &fired {
            debug!(seq = op.seq, action = op.action.as_str(), "fade op fired");
            self.record(
                now,
                TraceKind::Fired {
                    seq: op.seq,
                    action: op.action,
                },
            );
        }
        Ok(fired.len())
    }
}
