//! Target priority scoring
//!
//! `priority = value / max(distance, floor)^2`, clamped to `[0, ceiling]`.
//! Distance is squared so a nearby modest target beats a distant rich one;
//! the floor keeps targets at the agent's feet from dominating everything.

/// Score a candidate target
pub fn priority(value: f32, distance: f32, distance_floor: f32, ceiling: f32) -> f32 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    let floor = if distance_floor.is_finite() && distance_floor > 0.0 {
        distance_floor
    } else {
        1.0
    };
    let distance = if distance.is_finite() {
        distance.max(floor)
    } else {
        return 0.0;
    };

    let raw = value / (distance * distance);
    if raw.is_finite() {
        raw.clamp(0.0, ceiling)
    } else {
        ceiling
    }
}
