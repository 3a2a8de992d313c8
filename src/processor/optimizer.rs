use crate::models::path::PathPoint;

pub const DEFAULT_MAX_DISPLAY_POINTS: usize = 1000;

/// Decimates `points` to roughly `max_points` by taking every n-th sample.
///
/// The final point is always kept so the rendered path ends where the vehicle is.
/// When the stride already fills the budget, the final point takes the place of
/// the last strided one. A zero budget keeps only the final point.
pub fn optimize_path_for_display(points: &[PathPoint], max_points: usize) -> Vec<PathPoint> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let Some(last) = points.last() else {
        return Vec::new();
    };
    if max_points == 0 {
        return vec![last.clone()];
    }

    let step = points.len().div_ceil(max_points);
    let mut optimized: Vec<PathPoint> = points.iter().step_by(step).cloned().collect();

    if (points.len() - 1) % step != 0 {
        if optimized.len() == max_points {
            optimized.pop();
        }
        optimized.push(last.clone());
    }
    optimized
}
