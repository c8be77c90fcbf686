#![forbid(unsafe_code)]

//! Host-driven time and the fade choreography queue.
//!
//! Every appear/disappear in the view goes through [`FadeScheduler`]: the
//! controller enqueues opacity flips and detaches at absolute monotonic
//! times, and the host fires them by calling [`FadeScheduler::run_due`]. No
//! callback is ever cancelled.

use core::time::Duration;

use tracing::debug;

use crate::dom::Dom;

/// Inline opacity for a hidden element.
pub const OPACITY_HIDDEN: &str = "0";
/// Inline opacity for a fully shown element.
pub const OPACITY_VISIBLE: &str = "1";

/// Monotonic time source.
pub trait MonotonicClock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl MonotonicClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Fade choreography constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTiming {
    /// Wait before flipping opacity.
    pub delay: Duration,
    /// Wait after a fade-out before the element is detached, so the CSS
    /// opacity transition can finish.
    pub settle: Duration,
}

impl FadeTiming {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(250);

    #[must_use]
    pub const fn from_millis(delay_ms: u64, settle_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            settle: Duration::from_millis(settle_ms),
        }
    }

    /// Time from the start of a fade-out until the element is gone.
    #[must_use]
    pub fn removal_span(&self) -> Duration {
        self.delay.saturating_add(self.settle)
    }
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            settle: Self::DEFAULT_SETTLE,
        }
    }
}

/// What a scheduled operation does to its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeAction {
    /// Set opacity to 1.
    Show,
    /// Set opacity to 0.
    Hide,
    /// Detach from the document.
    Detach,
}

impl FadeAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Detach => "detach",
        }
    }

    fn apply<D: Dom>(self, dom: &mut D, node: &D::Node) -> Result<(), D::Error> {
        match self {
            Self::Show => dom.set_style(node, "opacity", OPACITY_VISIBLE),
            Self::Hide => dom.set_style(node, "opacity", OPACITY_HIDDEN),
            Self::Detach => dom.remove(node),
        }
    }
}

/// One queued operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledOp<N> {
    /// Absolute monotonic time at which the op becomes due.
    pub due: Duration,
    /// Scheduling order; breaks ties between ops with the same `due`.
    pub seq: u64,
    pub node: N,
    pub action: FadeAction,
}

/// Ordered queue of fade operations, fired by the host.
#[derive(Debug, Clone)]
pub struct FadeScheduler<N> {
    timing: FadeTiming,
    queue: Vec<ScheduledOp<N>>,
    next_seq: u64,
}

impl<N> FadeScheduler<N> {
    #[must_use]
    pub fn new(timing: FadeTiming) -> Self {
        Self {
            timing,
            queue: Vec::new(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub const fn timing(&self) -> FadeTiming {
        self.timing
    }

    /// Due time of the earliest pending op.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.first().map(|op| op.due)
    }

    /// Number of ops still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<N: Clone> FadeScheduler<N> {
    fn push(&mut self, due: Duration, node: N, action: FadeAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        // Queue is sorted by (due, seq); seq only grows, so inserting after
        // every op with due <= this one keeps ties in scheduling order.
        let at = self.queue.partition_point(|op| op.due <= due);
        debug!(due_ms = due.as_millis() as u64, seq, action = action.as_str(), "fade scheduled");
        self.queue.insert(
            at,
            ScheduledOp {
                due,
                seq,
                node,
                action,
            },
        );
    }

    /// Flip `node` to full opacity one fade delay after `now`.
    pub fn fade_in(&mut self, now: Duration, node: N) {
        let due = now.saturating_add(self.timing.delay);
        self.push(due, node, FadeAction::Show);
    }

    /// Flip `node` to zero opacity one fade delay after `now`, then detach it
    /// once the settle period has passed. The detach is never due before the
    /// fade-out.
    pub fn fade_out_and_detach(&mut self, now: Duration, node: N) {
        let hide_at = now.saturating_add(self.timing.delay);
        let detach_at = hide_at.saturating_add(self.timing.settle);
        self.push(hide_at, node.clone(), FadeAction::Hide);
        self.push(detach_at, node, FadeAction::Detach);
    }

    /// Apply every op due at or before `now`, in order, and return them.
    ///
    /// An op whose DOM call fails is consumed; ops behind it stay queued.
    pub fn run_due<D>(&mut self, dom: &mut D, now: Duration) -> Result<Vec<ScheduledOp<N>>, D::Error>
    where
        D: Dom<Node = N>,
    {
        let mut fired = Vec::new();
        while self.queue.first().is_some_and(|op| op.due <= now) {
            let op = self.queue.remove(0);
            op.action.apply(dom, &op.node)?;
            fired.push(op);
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now_mono(), Duration::ZERO);

        c.advance(Duration::from_millis(10));
        assert_eq!(c.now_mono(), Duration::from_millis(10));

        c.advance(Duration::from_millis(5));
        assert_eq!(c.now_mono(), Duration::from_millis(15));

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now_mono(), Duration::MAX);
    }

    #[test]
    fn fade_in_waits_for_delay() {
        let mut dom = MemoryDom::new();
        let node = dom.create_element("div").unwrap();
        dom.set_style(&node, "opacity", OPACITY_HIDDEN).unwrap();

        let mut sched = FadeScheduler::new(FadeTiming::default());
        sched.fade_in(Duration::from_millis(100), node);
        assert_eq!(sched.next_due(), Some(Duration::from_millis(350)));

        let fired = sched.run_due(&mut dom, Duration::from_millis(349)).unwrap();
        assert!(fired.is_empty());
        assert_eq!(dom.style_of(node, "opacity"), Some("0"));

        let fired = sched.run_due(&mut dom, Duration::from_millis(350)).unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, FadeAction::Show);
        assert_eq!(dom.style_of(node, "opacity"), Some("1"));
        assert!(sched.is_idle());
    }

    #[test]
    fn detach_is_sequenced_after_fade_out() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let node = dom.create_element("div").unwrap();
        dom.append_child(&root, &node).unwrap();

        let mut sched = FadeScheduler::new(FadeTiming::from_millis(250, 100));
        sched.fade_out_and_detach(Duration::ZERO, node);
        assert_eq!(sched.pending(), 2);

        sched.run_due(&mut dom, Duration::from_millis(250)).unwrap();
        assert_eq!(dom.style_of(node, "opacity"), Some("0"));
        assert!(dom.is_attached(&node).unwrap());

        let fired = sched.run_due(&mut dom, Duration::from_millis(350)).unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, FadeAction::Detach);
        assert!(!dom.is_attached(&node).unwrap());
    }

    #[test]
    fn zero_settle_still_orders_hide_before_detach() {
        let mut dom = MemoryDom::new();
        let node = dom.create_element("div").unwrap();
        let mut sched = FadeScheduler::new(FadeTiming::from_millis(250, 0));
        sched.fade_out_and_detach(Duration::ZERO, node);

        let fired = sched.run_due(&mut dom, Duration::from_secs(1)).unwrap();
        let actions: Vec<_> = fired.iter().map(|op| op.action).collect();
        assert_eq!(actions, vec![FadeAction::Hide, FadeAction::Detach]);
    }

    #[test]
    fn equal_due_ops_fire_in_scheduling_order() {
        let mut dom = MemoryDom::new();
        let a = dom.create_element("div").unwrap();
        let b = dom.create_element("div").unwrap();
        let c = dom.create_element("div").unwrap();

        let mut sched = FadeScheduler::new(FadeTiming::default());
        sched.fade_in(Duration::ZERO, a);
        sched.fade_out_and_detach(Duration::ZERO, b);
        sched.fade_in(Duration::ZERO, c);

        let fired = sched.run_due(&mut dom, Duration::from_secs(1)).unwrap();
        let order: Vec<_> = fired.iter().map(|op| (op.node, op.action)).collect();
        assert_eq!(
            order,
            vec![
                (a, FadeAction::Show),
                (b, FadeAction::Hide),
                (c, FadeAction::Show),
                (b, FadeAction::Detach),
            ]
        );
    }

    #[test]
    fn failing_op_is_consumed_and_rest_stays_queued() {
        let mut dom = MemoryDom::new();
        let good = dom.create_element("div").unwrap();
        let ghost = {
            let mut other = MemoryDom::new();
            for _ in 0..10 {
                other.create_element("div").unwrap();
            }
            other.create_element("div").unwrap()
        };

        let mut sched = FadeScheduler::new(FadeTiming::default());
        sched.fade_in(Duration::ZERO, ghost);
        sched.fade_in(Duration::ZERO, good);

        assert!(sched.run_due(&mut dom, Duration::from_secs(1)).is_err());
        assert_eq!(sched.pending(), 1);
        let fired = sched.run_due(&mut dom, Duration::from_secs(1)).unwrap();
        assert_eq!(fired[0].node, good);
    }
}
