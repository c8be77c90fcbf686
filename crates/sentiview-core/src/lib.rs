#![forbid(unsafe_code)]

//! `sentiview-core` is the page controller behind the channel sentiment view.
//!
//! Design goals:
//! - **Injected handles**: every DOM node the controller touches is passed in
//!   through [`view::PageHandles`] or created through the [`dom::Dom`] trait.
//! - **Deterministic time**: fades are queued on a [`timing::FadeScheduler`]
//!   and fired when the host calls `tick` with a monotonic timestamp.
//! - **No threads, no blocking**: suitable for `wasm32-unknown-unknown`.
//!
//! The browser binding lives in `sentiview-web`; this crate only knows the
//! abstract DOM, so the whole state machine runs against [`dom::MemoryDom`]
//! in tests.

pub mod chart;
pub mod config;
pub mod dom;
pub mod error;
pub mod protocol;
pub mod timing;
pub mod trace;
pub mod triple;
pub mod view;
pub mod workflow;

pub use chart::{ChartColor, ChartSegment, LegendEntry, PieChart, RenderedChart};
pub use config::{ElementIds, PageConfig};
pub use dom::{Dom, MemoryDom, MemoryDomError, NodeId};
pub use error::{ConfigError, DecodeError, EndpointError, ViewError};
pub use protocol::{AnalysisEndpoint, AnalysisRequest, AnalysisResponse};
pub use timing::{DeterministicClock, FadeAction, FadeScheduler, FadeTiming, MonotonicClock};
pub use trace::{TraceEvent, TraceKind, TransitionTrace};
pub use triple::{AnalysisOutcome, Category, ProbabilityTriple, RawProbability, decode, is_empty};
pub use view::{PageHandles, ViewPhase, ViewRegion, ViewStateController};
pub use workflow::{AnalysisWorkflow, Submission};
