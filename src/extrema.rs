//! Per-bucket minimum/maximum selection for compressed week views.

use tracing::debug;

use crate::bucket::Boundary;
use crate::series::Point;

/// Picks the minimum and maximum point of every boundary.
///
/// Ties resolve to the earliest point, a flat bucket contributes its point once,
/// points sitting exactly on the boundary start are dropped and empty buckets
/// contribute nothing. Within a bucket the minimum comes first.
pub fn extract_extrema(points: &[Point], boundaries: &[Boundary]) -> Vec<Point> {
    let mut selected = Vec::with_capacity(boundaries.len() * 2);

    for boundary in boundaries {
        let Some((min, max)) = bucket_extrema(points, boundary) else {
            debug!(start = %boundary.start, end = %boundary.end, "No points in bucket");
            continue;
        };

        let picks = if min.index == max.index {
            [Some(min), None]
        } else {
            [Some(min), Some(max)]
        };
        selected.extend(
            picks
                .into_iter()
                .flatten()
                .filter(|point| point.time != boundary.start),
        );
    }

    selected
}

fn bucket_extrema(points: &[Point], boundary: &Boundary) -> Option<(Point, Point)> {
    points
        .iter()
        .filter(|point| boundary.contains(point.time))
        .fold(None, |acc, point| match acc {
            None => Some((*point, *point)),
            Some((min, max)) => {
                // Strict comparisons keep the first occurrence on ties.
                let min = if point.value < min.value { *point } else { min };
                let max = if point.value > max.value { *point } else { max };
                Some((min, max))
            }
        })
}
