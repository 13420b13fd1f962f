use std::f32::consts::PI;

use bytemuck::NoUninit;
use itertools::Itertools as _;
use rand::Rng;

pub const CLOUD_POINTS: usize = 2500;
pub const CLOUD_RADIUS: f32 = 500.0;

pub const DUST_POINTS: usize = 1000;
pub const DUST_EXTENT: f32 = 2000.0;

/// One point of the main cloud. Generated once at mount, uploaded to a
/// vertex buffer and never rewritten; all per-frame motion happens in the
/// vertex shader.
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
#[repr(C)]
pub struct CloudPoint {
    pub pos: [f32; 3],
    pub scale: f32,
    /// Fixed per-point scalar; both phase and amplitude of the shader-side
    /// oscillation derive from it, giving each point a stable drift path.
    pub randomness: f32,
}

impl CloudPoint {
    /// Spherical field of radius [`CLOUD_RADIUS`], radially biased toward
    /// the center: r = R * u^1.5, direction uniform on the sphere.
    pub fn gen(rng: &mut impl Rng) -> Vec<CloudPoint> {
        (0..CLOUD_POINTS)
            .map(|_| {
                let radius = CLOUD_RADIUS * rng.gen::<f32>().powf(1.5);
                let theta = rng.gen::<f32>() * PI * 2.0;
                let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();

                CloudPoint {
                    pos: [
                        radius * phi.sin() * theta.cos(),
                        radius * phi.sin() * theta.sin(),
                        radius * phi.cos(),
                    ],
                    scale: rng.gen::<f32>() * 2.0,
                    randomness: rng.gen::<f32>(),
                }
            })
            .collect_vec()
    }
}

/// One point of the sparse distant layer, uniform in a cube of side
/// [`DUST_EXTENT`] centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
#[repr(C)]
pub struct DustPoint {
    pub pos: [f32; 3],
}

impl DustPoint {
    pub fn gen(rng: &mut impl Rng) -> Vec<DustPoint> {
        (0..DUST_POINTS)
            .map(|_| DustPoint {
                pos: [
                    (rng.gen::<f32>() - 0.5) * DUST_EXTENT,
                    (rng.gen::<f32>() - 0.5) * DUST_EXTENT,
                    (rng.gen::<f32>() - 0.5) * DUST_EXTENT,
                ],
            })
            .collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    fn radius(p: &CloudPoint) -> f32 {
        (p.pos[0] * p.pos[0] + p.pos[1] * p.pos[1] + p.pos[2] * p.pos[2]).sqrt()
    }

    #[test]
    fn cloud_has_fixed_count_within_radius() {
        let mut rng = SmallRng::seed_from_u64(7);
        let points = CloudPoint::gen(&mut rng);

        assert_eq!(points.len(), CLOUD_POINTS);
        assert!(points.iter().all(|p| radius(p) <= CLOUD_RADIUS + 1e-3));
    }

    #[test]
    fn cloud_density_biases_toward_center() {
        let mut rng = SmallRng::seed_from_u64(7);
        let points = CloudPoint::gen(&mut rng);

        // Median radius for r = R * u^1.5 is R * 0.5^1.5 ~ 0.354 R, so well
        // over half the points sit inside half the radius.
        let inner = points
            .iter()
            .filter(|p| radius(p) < CLOUD_RADIUS * 0.5)
            .count();
        assert!(inner * 2 > points.len());
    }

    #[test]
    fn cloud_attributes_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        let points = CloudPoint::gen(&mut rng);

        for p in &points {
            assert!((0.0..2.0).contains(&p.scale));
            assert!((0.0..1.0).contains(&p.randomness));
        }
    }

    #[test]
    fn dust_has_fixed_count_within_cube() {
        let mut rng = SmallRng::seed_from_u64(7);
        let points = DustPoint::gen(&mut rng);

        assert_eq!(points.len(), DUST_POINTS);
        let half = DUST_EXTENT / 2.0;
        assert!(points
            .iter()
            .all(|p| p.pos.iter().all(|c| c.abs() <= half)));
    }
}
