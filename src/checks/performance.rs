//! Load performance probe
//!
//! Navigates a fresh headless browser to the page and waits for the network
//! to go quiet: at most `idle_max_inflight` requests outstanding for
//! `idle_window`. Load time is wall-clock from navigation start to that
//! point. Resource count and transfer size come from the page's
//! resource-timing entries; DOM size is the element count.

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures_util::{stream, Stream, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

use super::browser::evaluate;
use super::PageRenderer;
use crate::config::BrowserSettings;
use crate::error::CheckError;
use crate::models::{NormalizedUrl, PerformanceResult};

/// Run the performance check.
pub async fn check<R: PageRenderer>(
    renderer: &R,
    url: &NormalizedUrl,
) -> Result<PerformanceResult, CheckError> {
    let result = renderer.measure(url).await?;
    debug!(
        "Performance: {} load={}ms resources={} bytes={} nodes={}",
        url,
        result.load_time_ms,
        result.resource_count,
        result.total_transfer_bytes,
        result.dom_node_count
    );
    Ok(result)
}

/// Tracks in-flight requests and when the network last became quiet.
///
/// Start and finish events may arrive in either order; a finish seen before
/// its start cancels that start when it shows up.
#[derive(Debug)]
pub struct IdleTracker {
    inflight: HashSet<String>,
    finished_early: HashSet<String>,
    max_inflight: usize,
    window: Duration,
    quiet_since: Option<Instant>,
}

impl IdleTracker {
    pub fn new(max_inflight: usize, window: Duration, now: Instant) -> Self {
        Self {
            inflight: HashSet::new(),
            finished_early: HashSet::new(),
            max_inflight,
            window,
            quiet_since: Some(now),
        }
    }

    pub fn request_started(&mut self, request_id: impl Into<String>, now: Instant) {
        let request_id = request_id.into();
        if !self.finished_early.remove(&request_id) {
            self.inflight.insert(request_id);
        }
        self.update(now);
    }

    pub fn request_finished(&mut self, request_id: &str, now: Instant) {
        if !self.inflight.remove(request_id) {
            self.finished_early.insert(request_id.to_string());
        }
        self.update(now);
    }

    fn update(&mut self, now: Instant) {
        if self.inflight.len() > self.max_inflight {
            self.quiet_since = None;
        } else if self.quiet_since.is_none() {
            self.quiet_since = Some(now);
        }
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// When the network will count as idle if nothing else happens.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.quiet_since.map(|since| since + self.window)
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        self.idle_deadline().is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMetrics {
    resource_count: u64,
    total_transfer_bytes: u64,
    dom_node_count: u64,
}

const METRICS_SCRIPT: &str = r#"(() => {
  const resources = performance.getEntriesByType('resource');
  return {
    resourceCount: resources.length,
    totalTransferBytes: Math.round(
      resources.reduce((total, e) => total + (e.transferSize || 0), 0)
    ),
    domNodeCount: document.getElementsByTagName('*').length,
  };
})()"#;

/// Navigate `page` to `url`, wait for network quiescence and read metrics.
///
/// `page` should be blank so that every request belongs to this navigation.
pub(crate) async fn measure_page(
    page: &Page,
    url: &NormalizedUrl,
    settings: &BrowserSettings,
) -> Result<PerformanceResult, CheckError> {
    page.execute(EnableParams::default()).await?;
    let started = page.event_listener::<EventRequestWillBeSent>().await?;
    let finished = page.event_listener::<EventLoadingFinished>().await?;
    let failed = page.event_listener::<EventLoadingFailed>().await?;

    let navigation_start = Instant::now();
    page.goto(url.as_str()).await?;

    let mut tracker = IdleTracker::new(
        settings.idle_max_inflight,
        settings.idle_window,
        navigation_start,
    );
    let ended = stream::select(
        finished.map(|event| event.request_id.inner().clone()),
        failed.map(|event| event.request_id.inner().clone()),
    );
    wait_for_idle(
        started.map(|event| event.request_id.inner().clone()),
        ended,
        &mut tracker,
    )
    .await;

    let load_time_ms = navigation_start.elapsed().as_millis() as u64;
    let metrics: PageMetrics = evaluate(page, METRICS_SCRIPT).await?;

    Ok(PerformanceResult {
        load_time_ms,
        resource_count: metrics.resource_count,
        total_transfer_bytes: metrics.total_transfer_bytes,
        dom_node_count: metrics.dom_node_count,
    })
}

/// Feed request events into `tracker` until the network has been quiet for
/// its window.
///
/// Buffered starts are drained before finishes so a request is never seen
/// finishing ahead of its own start when both are already queued.
async fn wait_for_idle<S, E>(started: S, ended: E, tracker: &mut IdleTracker)
where
    S: Stream<Item = String>,
    E: Stream<Item = String>,
{
    let mut started = std::pin::pin!(started);
    let mut ended = std::pin::pin!(ended);
    loop {
        let deadline = tracker.idle_deadline();
        tokio::select! {
            biased;
            Some(request_id) = started.next() => {
                tracker.request_started(request_id, Instant::now());
            }
            Some(request_id) = ended.next() => {
                tracker.request_finished(&request_id, Instant::now());
            }
            _ = sleep_until(deadline) => {
                if tracker.is_idle(Instant::now()) {
                    break;
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fakes::FakeRenderer;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn test_idle_when_nothing_requested() {
        let t0 = Instant::now();
        let tracker = IdleTracker::new(2, WINDOW, t0);
        assert!(!tracker.is_idle(t0 + Duration::from_millis(499)));
        assert!(tracker.is_idle(t0 + WINDOW));
    }

    #[test]
    fn test_busy_network_resets_window() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(2, WINDOW, t0);
        tracker.request_started("a", t0);
        tracker.request_started("b", t0);
        // two in flight is still quiet
        assert_eq!(tracker.idle_deadline(), Some(t0 + WINDOW));

        let t1 = t0 + Duration::from_millis(100);
        tracker.request_started("c", t1);
        assert_eq!(tracker.inflight(), 3);
        assert!(tracker.idle_deadline().is_none());
        assert!(!tracker.is_idle(t0 + Duration::from_secs(10)));

        let t2 = t0 + Duration::from_millis(300);
        tracker.request_finished("a", t2);
        assert_eq!(tracker.idle_deadline(), Some(t2 + WINDOW));
        assert!(!tracker.is_idle(t2 + Duration::from_millis(499)));
        assert!(tracker.is_idle(t2 + WINDOW));
    }

    #[test]
    fn test_unknown_request_finish_is_harmless() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(0, WINDOW, t0);
        tracker.request_finished("never-started", t0);
        assert_eq!(tracker.inflight(), 0);
        assert_eq!(tracker.idle_deadline(), Some(t0 + WINDOW));
    }

    #[test]
    fn test_quiet_period_does_not_restart_on_small_activity() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(2, WINDOW, t0);
        tracker.request_started("a", t0 + Duration::from_millis(200));
        tracker.request_finished("a", t0 + Duration::from_millis(300));
        assert_eq!(tracker.idle_deadline(), Some(t0 + WINDOW));
    }

    #[test]
    fn test_finish_before_start_does_not_leak() {
        let t0 = Instant::now();
        let mut tracker = IdleTracker::new(2, WINDOW, t0);
        for id in ["a", "b", "c"] {
            tracker.request_finished(id, t0);
        }
        for id in ["a", "b", "c"] {
            tracker.request_started(id, t0);
        }
        assert_eq!(tracker.inflight(), 0);
        assert_eq!(tracker.idle_deadline(), Some(t0 + WINDOW));
    }

    /// Queued events followed by a listener that stays open, like a live page.
    fn queued(ids: Vec<String>) -> impl Stream<Item = String> + Unpin {
        stream::iter(ids).chain(stream::pending())
    }

    #[tokio::test]
    async fn test_reaches_idle_when_finishes_arrive_out_of_order() {
        let starts: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
        let finishes: Vec<String> = starts.iter().rev().cloned().collect();
        let mut tracker = IdleTracker::new(0, Duration::from_millis(50), Instant::now());

        let waited = tokio::time::timeout(
            Duration::from_secs(2),
            wait_for_idle(queued(starts), queued(finishes), &mut tracker),
        )
        .await;
        assert!(waited.is_ok(), "network never went idle");
        assert_eq!(tracker.inflight(), 0);
    }

    #[tokio::test]
    async fn test_waits_while_requests_are_outstanding() {
        let mut tracker = IdleTracker::new(0, Duration::from_millis(20), Instant::now());
        let waited = tokio::time::timeout(
            Duration::from_millis(300),
            wait_for_idle(queued(vec!["slow".into()]), queued(Vec::new()), &mut tracker),
        )
        .await;
        assert!(waited.is_err());
        assert_eq!(tracker.inflight(), 1);
    }

    #[test]
    fn test_transfer_total_counts_resource_entries_only() {
        assert!(METRICS_SCRIPT.contains("getEntriesByType('resource')"));
        assert!(!METRICS_SCRIPT.contains("navigation"));
    }

    #[tokio::test]
    async fn test_check_passes_renderer_metrics_through() {
        let renderer = FakeRenderer {
            performance: PerformanceResult {
                load_time_ms: 1234,
                resource_count: 7,
                total_transfer_bytes: 4096,
                dom_node_count: 55,
            },
            ..Default::default()
        };
        let url = NormalizedUrl::parse("example.com").unwrap();
        let result = check(&renderer, &url).await.unwrap();
        assert_eq!(result, renderer.performance);
    }

    #[tokio::test]
    async fn test_check_propagates_renderer_failure() {
        let renderer = FakeRenderer {
            fail_measure: true,
            ..Default::default()
        };
        let url = NormalizedUrl::parse("example.com").unwrap();
        assert!(matches!(
            check(&renderer, &url).await,
            Err(CheckError::Launch(_))
        ));
    }
}
