#![forbid(unsafe_code)]

//! One end-to-end analysis: read input, begin, request, decode, complete.
//!
//! The workflow is split around its single suspension point so a host can
//! release its borrow of the DOM while the request is in flight:
//!
//! 1. [`AnalysisWorkflow::submit`] validates the input and begins the view.
//! 2. The host awaits [`AnalysisEndpoint::analyze`] with the returned request.
//! 3. [`AnalysisWorkflow::complete`] decodes the answer and completes the view.
//!
//! [`AnalysisWorkflow::run`] composes the three for single-owner callers.
//! There is no retry, timeout or cancellation: a request that never resolves
//! leaves the loading indicator up.

use core::time::Duration;

use tracing::{Instrument, info, info_span, warn};

use crate::dom::Dom;
use crate::error::{EndpointError, ViewError};
use crate::protocol::{AnalysisEndpoint, AnalysisRequest, AnalysisResponse};
use crate::timing::MonotonicClock;
use crate::triple::{AnalysisOutcome, decode};
use crate::view::ViewStateController;

/// Result of [`AnalysisWorkflow::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Empty channel name: the input prompt was shown, nothing else happened.
    Rejected,
    /// The view is loading; send this request.
    Request(AnalysisRequest),
}

/// Turn an endpoint result into an outcome. Transport and decoding failures
/// become error outcomes so they reach the error area.
#[must_use]
pub fn interpret(result: Result<AnalysisResponse, EndpointError>) -> AnalysisOutcome {
    match result {
        Ok(response) => decode(&response).unwrap_or_else(|err| {
            warn!(error = %err, "undecodable probabilities");
            AnalysisOutcome::error(err.to_string())
        }),
        Err(err) => {
            warn!(error = %err, "analysis request failed");
            AnalysisOutcome::error(format!("request failed: {err}"))
        }
    }
}

#[derive(Debug)]
pub struct AnalysisWorkflow<N> {
    view: ViewStateController<N>,
}

impl<N: Clone + PartialEq + core::fmt::Debug> AnalysisWorkflow<N> {
    #[must_use]
    pub const fn new(view: ViewStateController<N>) -> Self {
        Self { view }
    }

    #[must_use]
    pub const fn view(&self) -> &ViewStateController<N> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewStateController<N> {
        &mut self.view
    }

    /// Read the channel name and either prompt for input or begin loading.
    pub fn submit<D>(&mut self, dom: &mut D, now: Duration) -> Result<Submission, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        let channel_name = dom
            .input_value(&self.view.handles().channel_input)
            .map_err(ViewError::Dom)?;
        if channel_name.is_empty() {
            self.view.show_input_error(dom, now)?;
            return Ok(Submission::Rejected);
        }
        info!(channel = %channel_name, "submitting analysis");
        self.view.begin_analysis(dom, now)?;
        Ok(Submission::Request(AnalysisRequest::new(channel_name)))
    }

    /// Decode the endpoint result and finish the view.
    pub fn complete<D>(
        &mut self,
        dom: &mut D,
        now: Duration,
        result: Result<AnalysisResponse, EndpointError>,
    ) -> Result<AnalysisOutcome, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        let outcome = interpret(result);
        self.view.complete_analysis(dom, now, &outcome)?;
        Ok(outcome)
    }

    /// Fire due fades.
    pub fn tick<D>(&mut self, dom: &mut D, now: Duration) -> Result<usize, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
    {
        self.view.tick(dom, now)
    }

    /// Submit, await the endpoint once, complete. Returns `None` when the
    /// input was rejected.
    pub async fn run<D, C, E>(
        &mut self,
        dom: &mut D,
        clock: &C,
        endpoint: &E,
    ) -> Result<Option<AnalysisOutcome>, ViewError<D::Error>>
    where
        D: Dom<Node = N>,
        C: MonotonicClock,
        E: AnalysisEndpoint + ?Sized,
    {
        let request = match self.submit(dom, clock.now_mono())? {
            Submission::Rejected => return Ok(None),
            Submission::Request(request) => request,
        };
        let span = info_span!("analysis", channel = %request.channel_name);
        let result = endpoint.analyze(&request).instrument(span).await;
        let outcome = self.complete(dom, clock.now_mono(), result)?;
        Ok(Some(outcome))
    }
}
