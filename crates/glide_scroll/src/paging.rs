//! Paging
//!
//! Page-at-a-time resting positions: `0, -vp, -2vp, ...` followed by the
//! end boundary, which may leave a short final page.

/// Release speed (px/s) that commits a page change regardless of drag
pub const PAGING_SPEED_THRESHOLD: f32 = 1200.0;

/// Page step for a gesture: `0`, `page` or `-page`.
///
/// A half-page drag or a fast release each commit a step on their own.
/// When drag and velocity disagree the drag decides only if it cleared its
/// threshold and the release was slow.
pub fn paging_delta(drag_distance: f32, velocity: f32, page_length: f32) -> f32 {
    let drag_over = drag_distance.abs() >= page_length / 2.0;
    let speed_over = velocity.abs() >= PAGING_SPEED_THRESHOLD;
    if !drag_over && !speed_over {
        return 0.0;
    }
    if drag_distance * velocity >= 0.0 {
        let sign = if drag_distance != 0.0 {
            drag_distance.signum()
        } else {
            velocity.signum()
        };
        return sign * page_length;
    }
    if drag_over && !speed_over {
        return drag_distance.signum() * page_length;
    }
    0.0
}

/// Rest position a paging container should settle at after a gesture that
/// dragged `drag_distance` and released at `velocity`
pub fn paging_offset(
    current: f32,
    drag_distance: f32,
    velocity: f32,
    viewport_length: f32,
    scrollable_distance: f32,
    last_page_length: f32,
) -> f32 {
    if viewport_length <= 0.0 || scrollable_distance <= 0.0 {
        return current;
    }
    let end = -scrollable_distance;
    let gesture_start = (current - drag_distance).clamp(end, 0.0);
    let anchor = nearest_rest(gesture_start, viewport_length, end);

    let direction = if drag_distance != 0.0 {
        drag_distance.signum()
    } else {
        velocity.signum()
    };
    let neighbor = if direction < 0.0 {
        (anchor - viewport_length).max(end)
    } else if anchor == end && last_page_length > 0.0 {
        end + last_page_length
    } else {
        (anchor + viewport_length).min(0.0)
    };
    let page_length = (anchor - neighbor).abs();
    if page_length <= 0.0 {
        return anchor;
    }
    let target = (anchor + paging_delta(drag_distance, velocity, page_length)).clamp(end, 0.0);
    tracing::trace!(
        "paging anchor={:.1} page={:.1} drag={:.1} v={:.1} -> {:.1}",
        anchor,
        page_length,
        drag_distance,
        velocity,
        target
    );
    target
}

fn nearest_rest(position: f32, viewport_length: f32, end: f32) -> f32 {
    let index = (-position / viewport_length).round().max(0.0);
    let page = (-index * viewport_length).max(end);
    if (position - end).abs() < (position - page).abs() {
        end
    } else {
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_slow_gesture_stays() {
        assert_eq!(paging_delta(-100.0, -300.0, 500.0), 0.0);
    }

    #[test]
    fn test_half_page_drag_commits() {
        assert_eq!(paging_delta(-250.0, 0.0, 500.0), -500.0);
        assert_eq!(paging_delta(260.0, 0.0, 500.0), 500.0);
    }

    #[test]
    fn test_fast_release_commits() {
        assert_eq!(paging_delta(-20.0, -1500.0, 500.0), -500.0);
        assert_eq!(paging_delta(0.0, 1300.0, 500.0), 500.0);
    }

    #[test]
    fn test_disagreeing_signs() {
        // long drag, slow flick back: the drag wins
        assert_eq!(paging_delta(-300.0, 200.0, 500.0), -500.0);
        // short drag, fast flick back: stay
        assert_eq!(paging_delta(-100.0, 1500.0, 500.0), 0.0);
    }

    #[test]
    fn test_paging_offset_advances_one_page() {
        let target = paging_offset(-300.0, -300.0, -200.0, 500.0, 1800.0, 0.0);
        assert_eq!(target, -500.0);
        let target = paging_offset(-540.0, -40.0, -100.0, 500.0, 1800.0, 0.0);
        assert_eq!(target, -500.0);
    }

    #[test]
    fn test_paging_offset_short_last_page() {
        // pages at 0, -500, -1000, -1500 and a 300px last page ending at -1800
        let target = paging_offset(-1600.0, -100.0, -2000.0, 500.0, 1800.0, 300.0);
        assert_eq!(target, -1800.0);
        let target = paging_offset(-1700.0, 100.0, 1500.0, 500.0, 1800.0, 300.0);
        assert_eq!(target, -1500.0);
    }

    #[test]
    fn test_paging_offset_degenerate_geometry() {
        assert_eq!(paging_offset(-40.0, -40.0, 0.0, 0.0, 100.0, 0.0), -40.0);
        assert_eq!(paging_offset(0.0, -40.0, 0.0, 500.0, 0.0, 0.0), 0.0);
    }
}
