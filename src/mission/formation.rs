//! Defensive ring and retreat geometry around a patient

use std::f32::consts::TAU;

use glam::Vec3;

use crate::world::Navigation;

/// Extra distance past the retreat radius so members clear it comfortably
pub const RETREAT_MARGIN: f32 = 5.0;

/// `count` slots evenly spaced on a ring around `center`.
///
/// A slot that cannot be reached from the center falls back to the center.
pub fn defense_slots<N: Navigation + ?Sized>(center: Vec3, radius: f32, count: usize, nav: &N) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            let slot = center + Vec3::new(angle.cos(), 0.0, angle.sin()) * radius;
            if nav.is_reachable(center, slot) {
                slot
            } else {
                tracing::debug!(?slot, "perimeter slot unreachable, using rally point");
                center
            }
        })
        .collect()
}

/// Point on the ray from the patient through the member, past the retreat radius
pub fn retreat_point(patient: Vec3, member: Vec3, retreat_radius: f32) -> Vec3 {
    let away = Vec3::new(member.x - patient.x, 0.0, member.z - patient.z);
    let direction = away.try_normalize().unwrap_or(Vec3::X);
    patient + direction * (retreat_radius + RETREAT_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OpenField;

    impl Navigation for OpenField {
        fn compute_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
            Some(vec![from, to])
        }
    }

    struct Walled;

    impl Navigation for Walled {
        fn compute_path(&self, _from: Vec3, _to: Vec3) -> Option<Vec<Vec3>> {
            None
        }
    }

    #[test]
    fn test_slots_on_ring() {
        let center = Vec3::new(10.0, 0.0, 10.0);
        let slots = defense_slots(center, 8.0, 4, &OpenField);
        assert_eq!(slots.len(), 4);
        for slot in &slots {
            assert!((slot.distance(center) - 8.0).abs() < 1e-4);
        }
        assert!((slots[0] - Vec3::new(18.0, 0.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn test_unreachable_slot_falls_back_to_center() {
        let center = Vec3::new(3.0, 0.0, 3.0);
        assert_eq!(defense_slots(center, 8.0, 2, &Walled), vec![center, center]);
    }

    #[test]
    fn test_retreat_point_extends_away_from_patient() {
        let patient = Vec3::ZERO;
        let point = retreat_point(patient, Vec3::new(0.0, 0.0, 2.0), 30.0);
        assert!((point - Vec3::new(0.0, 0.0, 35.0)).length() < 1e-4);
        // Member standing on the patient still gets a valid point
        let fallback = retreat_point(patient, patient, 30.0);
        assert!((fallback.length() - 35.0).abs() < 1e-4);
    }
}
