//! End-to-end workflow runs against the in-memory DOM.
//!
//! Each test builds the stock page markup, types a channel name, runs one
//! analysis against a scripted endpoint and then drives the fade queue on a
//! deterministic clock.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use sentiview_core::view::INPUT_PROMPT;
use sentiview_core::{
    AnalysisEndpoint, AnalysisOutcome, AnalysisRequest, AnalysisResponse, AnalysisWorkflow,
    DeterministicClock, Dom, EndpointError, MemoryDom, MonotonicClock, NodeId, PageConfig, PageHandles,
    ProbabilityTriple, RawProbability, Submission, ViewPhase, ViewRegion, ViewStateController,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Returns a canned answer and records every request it sees.
struct ScriptedEndpoint {
    answer: Result<AnalysisResponse, EndpointError>,
    seen: RefCell<Vec<AnalysisRequest>>,
    calls: Cell<usize>,
}

impl ScriptedEndpoint {
    fn answering(answer: Result<AnalysisResponse, EndpointError>) -> Self {
        Self {
            answer,
            seen: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    fn probabilities(neg: &str, neu: &str, pos: &str, error: &str) -> Self {
        Self::answering(Ok(AnalysisResponse {
            negatives: neg.into(),
            neutrals: neu.into(),
            positives: pos.into(),
            error: error.to_owned(),
        }))
    }
}

#[async_trait(?Send)]
impl AnalysisEndpoint for ScriptedEndpoint {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, EndpointError> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push(request.clone());
        self.answer.clone()
    }
}

struct Page {
    dom: MemoryDom,
    handles: PageHandles<NodeId>,
}

/// `<div id=content><div id=startpage-container><form id=input-form><input id=channelNameInput>`
fn stock_page(channel: &str) -> Page {
    let ids = PageConfig::default().ids;
    let mut dom = MemoryDom::new();
    let root = dom.root();
    let content = dom.create_element("div").unwrap();
    dom.set_id(&content, &ids.content).unwrap();
    let start_page = dom.create_element("div").unwrap();
    dom.set_id(&start_page, &ids.start_page).unwrap();
    let input_form = dom.create_element("form").unwrap();
    dom.set_id(&input_form, &ids.input_form).unwrap();
    let channel_input = dom.create_element("input").unwrap();
    dom.set_id(&channel_input, &ids.channel_input).unwrap();

    dom.append_child(&root, &content).unwrap();
    dom.append_child(&content, &start_page).unwrap();
    dom.append_child(&start_page, &input_form).unwrap();
    dom.append_child(&input_form, &channel_input).unwrap();
    dom.set_value(channel_input, channel).unwrap();

    let handles = PageHandles {
        input_form: dom.find_by_id(&ids.input_form).unwrap(),
        channel_input: dom.find_by_id(&ids.channel_input).unwrap(),
        start_page: dom.find_by_id(&ids.start_page).unwrap(),
        content: dom.find_by_id(&ids.content).unwrap(),
    };
    Page { dom, handles }
}

fn workflow(handles: PageHandles<NodeId>) -> AnalysisWorkflow<NodeId> {
    let config = PageConfig {
        trace: true,
        ..PageConfig::default()
    };
    AnalysisWorkflow::new(ViewStateController::from_config(handles, &config))
}

fn drain(flow: &mut AnalysisWorkflow<NodeId>, dom: &mut MemoryDom, clock: &mut DeterministicClock) {
    while let Some(due) = flow.view().next_due() {
        clock.set(due);
        flow.tick(dom, due).unwrap();
    }
}

#[test]
fn successful_analysis_renders_chart_and_legend() {
    init_tracing();
    let Page { mut dom, handles } = stock_page("veritasium");
    let content = handles.content;
    let mut flow = workflow(handles);
    let mut clock = DeterministicClock::new();
    let endpoint = ScriptedEndpoint::probabilities("0.2", "0.3", "0.5", "");

    let outcome = pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    assert_eq!(
        outcome,
        Some(AnalysisOutcome::Success {
            data: ProbabilityTriple::new(0.2, 0.3, 0.5)
        })
    );
    assert_eq!(endpoint.calls.get(), 1);
    assert_eq!(endpoint.seen.borrow()[0], AnalysisRequest::new("veritasium"));

    drain(&mut flow, &mut dom, &mut clock);
    let view = flow.view();
    assert_eq!(view.phase(), ViewPhase::ShowingResult);
    assert!(view.is_settled());
    assert!(!view.region_present(&dom, ViewRegion::StartPage).unwrap());
    assert!(!view.region_present(&dom, ViewRegion::LoadingIndicator).unwrap());
    assert!(view.region_visible(&dom, ViewRegion::ResultArea).unwrap());
    assert!(!view.region_present(&dom, ViewRegion::ErrorArea).unwrap());

    let legend = dom.find_by_class("labels-item");
    let labels: Vec<_> = legend.iter().map(|&n| dom.text(n).unwrap()).collect();
    assert_eq!(
        labels,
        vec![
            "Negative comments (20%)",
            "Neutral comments (30%)",
            "Positive comments (50%)",
        ]
    );
    let chart = view.rendered_chart().unwrap();
    assert_eq!(dom.children(content), &[chart.legend, chart.chart]);
}

#[test]
fn loading_and_result_are_never_both_visible() {
    let Page { mut dom, handles } = stock_page("mkbhd");
    let mut flow = workflow(handles);
    let mut clock = DeterministicClock::new();

    let Submission::Request(_) = flow.submit(&mut dom, clock.now_mono()).unwrap() else {
        panic!("non-empty channel must produce a request");
    };
    // Response lands before the loading fade-in has run.
    clock.advance(Duration::from_millis(100));
    flow.complete(
        &mut dom,
        clock.now_mono(),
        Ok(AnalysisResponse {
            negatives: RawProbability::Number(0.1),
            neutrals: RawProbability::Number(0.1),
            positives: RawProbability::Number(0.8),
            error: String::new(),
        }),
    )
    .unwrap();

    while let Some(due) = flow.view().next_due() {
        clock.set(due);
        flow.tick(&mut dom, due).unwrap();
        let view = flow.view();
        let loading = view.region_visible(&dom, ViewRegion::LoadingIndicator).unwrap();
        let result = view.region_visible(&dom, ViewRegion::ResultArea).unwrap();
        assert!(!(loading && result), "both visible at {due:?}");
    }
    assert!(flow.view().region_visible(&dom, ViewRegion::ResultArea).unwrap());
}

#[test]
fn empty_channel_never_requests_or_begins() {
    let Page { mut dom, handles } = stock_page("");
    let form = handles.input_form;
    let content = handles.content;
    let mut flow = workflow(handles);
    let clock = DeterministicClock::new();
    let endpoint = ScriptedEndpoint::probabilities("0.2", "0.3", "0.5", "");
    let before = dom.children(content).to_vec();

    let outcome = pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    assert_eq!(outcome, None);
    assert_eq!(endpoint.calls.get(), 0);
    assert_eq!(flow.view().phase(), ViewPhase::Start);
    assert!(flow.view().scheduler().is_idle());
    assert_eq!(dom.text(form), Some(INPUT_PROMPT));
    assert_eq!(dom.children(content), before.as_slice());
}

#[test]
fn server_error_message_is_shown() {
    let Page { mut dom, handles } = stock_page("nobody");
    let mut flow = workflow(handles);
    let mut clock = DeterministicClock::new();
    let endpoint = ScriptedEndpoint::probabilities("", "", "", "Channel not found");

    let outcome = pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    assert_eq!(outcome, Some(AnalysisOutcome::error("Channel not found")));
    drain(&mut flow, &mut dom, &mut clock);

    let view = flow.view();
    assert_eq!(view.phase(), ViewPhase::ShowingError);
    assert!(view.region_visible(&dom, ViewRegion::ErrorArea).unwrap());
    assert!(!view.region_present(&dom, ViewRegion::ResultArea).unwrap());
    let paragraph = dom.find_by_class("error")[0];
    assert!(dom.text(paragraph).unwrap().starts_with("Error: Channel not found."));
}

#[test]
fn empty_server_message_shows_nothing() {
    let Page { mut dom, handles } = stock_page("nobody");
    let mut flow = workflow(handles);
    let mut clock = DeterministicClock::new();
    let endpoint = ScriptedEndpoint::probabilities("", "", "", "");

    pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    drain(&mut flow, &mut dom, &mut clock);

    let view = flow.view();
    assert_eq!(view.phase(), ViewPhase::Silent);
    assert!(dom.find_by_class("error").is_empty());
    assert!(dom.find_by_class("piechart").is_empty());
    assert!(!view.region_present(&dom, ViewRegion::LoadingIndicator).unwrap());
}

#[test]
fn partially_empty_triple_is_rendered_as_data() {
    let Page { mut dom, handles } = stock_page("mixed");
    let mut flow = workflow(handles);
    let clock = DeterministicClock::new();
    let endpoint = ScriptedEndpoint::probabilities("", "0.5", "0.5", "ignored");

    let outcome = pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    assert_eq!(
        outcome,
        Some(AnalysisOutcome::Success {
            data: ProbabilityTriple::new(0.0, 0.5, 0.5)
        })
    );
    assert_eq!(flow.view().phase(), ViewPhase::ShowingResult);
}

#[test]
fn transport_failure_reaches_error_area() {
    let Page { mut dom, handles } = stock_page("offline");
    let mut flow = workflow(handles);
    let mut clock = DeterministicClock::new();
    let endpoint =
        ScriptedEndpoint::answering(Err(EndpointError::Transport("connection refused".into())));

    pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    drain(&mut flow, &mut dom, &mut clock);

    let paragraph = dom.find_by_class("error")[0];
    assert_eq!(
        dom.text(paragraph),
        Some(
            "Error: request failed: transport error: connection refused. Try again by clicking the button in the top right corner, or by refreshing the page."
        )
    );
}

#[test]
fn second_submission_is_rejected_by_single_shot_view() {
    let Page { mut dom, handles } = stock_page("again");
    let mut flow = workflow(handles);
    let clock = DeterministicClock::new();
    let endpoint = ScriptedEndpoint::probabilities("0.2", "0.3", "0.5", "");

    pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap();
    let err = pollster::block_on(flow.run(&mut dom, &clock, &endpoint)).unwrap_err();
    assert!(err.to_string().starts_with("cannot begin analysis"));
    assert_eq!(endpoint.calls.get(), 1);
}

#[test]
fn identical_runs_produce_identical_traces() {
    let run = || {
        let Page { mut dom, handles } = stock_page("determinism");
        let mut flow = workflow(handles);
        let mut clock = DeterministicClock::new();
        flow.submit(&mut dom, clock.now_mono()).unwrap();
        clock.advance(Duration::from_millis(730));
        flow.complete(
            &mut dom,
            clock.now_mono(),
            Ok(AnalysisResponse {
                negatives: "0.3".into(),
                neutrals: "0.3".into(),
                positives: "0.4".into(),
                error: String::new(),
            }),
        )
        .unwrap();
        drain(&mut flow, &mut dom, &mut clock);
        let trace = flow.view().trace().unwrap();
        (trace.checksum(), trace.to_jsonl())
    };
    let (a_sum, a_lines) = run();
    let (b_sum, b_lines) = run();
    assert_eq!(a_sum, b_sum);
    assert_eq!(a_lines, b_lines);
    assert_eq!(a_lines.lines().next(), Some("{\"at_ms\":0,\"event\":\"begin\"}"));
}
