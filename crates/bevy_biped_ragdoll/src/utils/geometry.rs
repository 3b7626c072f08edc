use bevy_math::{Quat, Vec3};

/// The six world axis directions, in the order ties are resolved when snapping.
pub const CARDINAL_AXES: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Finds the cardinal axis closest in direction to `v`.
///
/// A zero vector snaps to `+Z`, since no axis scores better than the starting candidate.
pub fn nearest_cardinal_axis(v: Vec3) -> Vec3 {
    let v = v.normalize_or_zero();
    let mut nearest = Vec3::Z;
    for axis in CARDINAL_AXES {
        if v.dot(axis) > v.dot(nearest) {
            nearest = axis;
        }
    }
    nearest
}

/// Reflects `p` across the plane through the origin with normal `n`.
pub fn mirror_across_plane(p: Vec3, n: Vec3) -> Vec3 {
    let n = n.normalize_or_zero();
    p - 2. * p.dot(n) * n
}

/// Angle between two vectors in degrees, in `[0, 180]`.
pub fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() == 0. || b.length_squared() == 0. {
        return 0.;
    }
    a.angle_between(b).to_degrees()
}

/// Orthonormal set of axes, labelled the way a character rig is labelled: `+X` right, `+Y` up,
/// `+Z` forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTripod {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Default for AxisTripod {
    fn default() -> Self {
        Self {
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::Z,
        }
    }
}

impl AxisTripod {
    pub fn left(&self) -> Vec3 {
        -self.right
    }

    pub fn down(&self) -> Vec3 {
        -self.up
    }

    pub fn back(&self) -> Vec3 {
        -self.forward
    }

    /// Builds a tripod whose forward axis points along `forward` and whose up axis is as close
    /// to `up` as orthogonality allows.
    ///
    /// If `up` is parallel to `forward`, an arbitrary perpendicular is used instead. A zero
    /// `forward` yields the identity tripod.
    pub fn from_forward_up(forward: Vec3, up: Vec3) -> Self {
        let Some(forward) = forward.try_normalize() else {
            return Self::default();
        };
        let right = up
            .cross(forward)
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let up = forward.cross(right);

        Self { right, up, forward }
    }

    pub fn from_quat(rotation: Quat) -> Self {
        Self::from_forward_up(rotation * Vec3::Z, rotation * Vec3::Y)
    }
}

/// Smooth ease between `start` and `end` with flat tangents at both ends.
pub fn smooth_contour(t: f32, start: f32, end: f32) -> f32 {
    let t = t.clamp(0., 1.);
    start + (end - start) * t * t * (3. - 2. * t)
}
