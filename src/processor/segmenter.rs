//! Splits one vehicle's ordered points into classified segments.
//!
//! The scan is a small state machine. While accumulating a span it checks
//! each consecutive pair for a boundary:
//!
//! - **stop**: more than 15 minutes elapsed with less than 50 m displacement.
//!   The open span closes at the earlier point and the dwell pair becomes a
//!   span of its own.
//! - **activity change**: the working flag flips or the task id changes.
//!   The open span closes at the later point and a new one opens there.
//! - **end of stream** closes whatever is open.
//!
//! Neighbouring segments touch at a shared point, so every leg of the input
//! belongs to exactly one segment. Spans with fewer than two points are
//! dropped. Input is assumed validated.

use std::ops::Range;

use chrono::Duration;

use crate::geo;
use crate::models::path::{PathPoint, PathSegment, SegmentType};

pub const STOP_MIN_DWELL_SECS: i64 = 15 * 60;
pub const STOP_MAX_DISPLACEMENT_M: f64 = 50.0;

const WORKING_RATIO: f64 = 0.8;
const TRANSPORT_RATIO: f64 = 0.8;
const IDLE_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Stop,
    ActivityChange,
}

/// Long dwell between two samples.
pub fn is_stop(prev: &PathPoint, curr: &PathPoint) -> bool {
    curr.timestamp - prev.timestamp > Duration::seconds(STOP_MIN_DWELL_SECS)
        && geo::distance(prev, curr) < STOP_MAX_DISPLACEMENT_M
}

/// Implement engaged/disengaged or switched task. A missing flag counts as not working.
pub fn is_activity_change(prev: &PathPoint, curr: &PathPoint) -> bool {
    prev.is_working() != curr.is_working() || prev.metadata.task_id != curr.metadata.task_id
}

pub fn boundary_between(prev: &PathPoint, curr: &PathPoint) -> Option<Boundary> {
    if is_stop(prev, curr) {
        Some(Boundary::Stop)
    } else if is_activity_change(prev, curr) {
        Some(Boundary::ActivityChange)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Accumulating { start: usize },
}

struct SpanScanner {
    state: ScanState,
    spans: Vec<Range<usize>>,
}

impl SpanScanner {
    fn new() -> Self {
        Self {
            state: ScanState::Accumulating { start: 0 },
            spans: Vec::new(),
        }
    }

    /// Applies the boundary found between `i - 1` and `i`.
    fn on_boundary(&mut self, i: usize, boundary: Boundary) {
        let ScanState::Accumulating { start } = self.state;
        match boundary {
            Boundary::Stop => {
                self.spans.push(start..i);
                self.spans.push(i - 1..i + 1);
            }
            Boundary::ActivityChange => self.spans.push(start..i + 1),
        }
        self.state = ScanState::Accumulating { start: i };
    }

    fn finish(mut self, len: usize) -> Vec<Range<usize>> {
        let ScanState::Accumulating { start } = self.state;
        self.spans.push(start..len);
        self.spans
    }
}

/// Index ranges of the spans, including ones too short to become segments.
pub fn split_spans(points: &[PathPoint]) -> Vec<Range<usize>> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut scanner = SpanScanner::new();
    for i in 1..points.len() {
        if let Some(boundary) = boundary_between(&points[i - 1], &points[i]) {
            scanner.on_boundary(i, boundary);
        }
    }
    scanner.finish(points.len())
}

pub fn segment_path(points: &[PathPoint]) -> Vec<PathSegment> {
    split_spans(points)
        .into_iter()
        .filter(|span| span.len() >= 2)
        .map(|span| create_segment(&points[span.clone()], span.start))
        .collect()
}

/// Builds a segment from at least two points. `offset` is the index of the
/// first point in the scanned stream, keeping ids unique when timestamps repeat.
fn create_segment(points: &[PathPoint], offset: usize) -> PathSegment {
    let first = &points[0];
    let last = &points[points.len() - 1];

    let distance = geo::path_distance(points);
    let duration = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
    let average_speed = if duration > 0.0 {
        (distance / 1000.0) / (duration / 3600.0)
    } else {
        0.0
    };
    let max_speed = points.iter().map(|p| p.speed).fold(0.0, f64::max);

    PathSegment {
        id: format!(
            "segment_{}_{}_{}",
            first.vehicle_id,
            first.timestamp.timestamp_millis(),
            offset
        ),
        vehicle_id: first.vehicle_id.clone(),
        start_time: first.timestamp,
        end_time: last.timestamp,
        points: points.to_vec(),
        distance,
        duration,
        average_speed,
        max_speed,
        segment_type: classify(points),
    }
}

/// First matching rule wins: working, transport, idle, else unknown.
pub fn classify(points: &[PathPoint]) -> SegmentType {
    if points.is_empty() {
        return SegmentType::Unknown;
    }
    let n = points.len() as f64;
    let working_ratio = points.iter().filter(|p| p.is_working()).count() as f64 / n;
    let moving_ratio = points.iter().filter(|p| p.is_moving()).count() as f64 / n;

    if working_ratio > WORKING_RATIO {
        SegmentType::Working
    } else if moving_ratio > TRANSPORT_RATIO {
        SegmentType::Transport
    } else if moving_ratio < IDLE_RATIO {
        SegmentType::Idle
    } else {
        SegmentType::Unknown
    }
}
