//! # particle_field
//!
//! Particle arrangements for the gesture tree.  Every particle carries a
//! pair of home positions — one in the **formed** tree silhouette and one
//! in the **chaos** scatter cloud — and eases toward whichever the current
//! [`TreeMode`] selects.  In chaos mode a detected hand pulls the cloud
//! toward the hand's mapped point, so the swirl follows the viewer.
//!
//! The crate owns no rendering: the application projects `Particle::pos`
//! however it likes.

// ════════════════════════════════════════════════════════════════════════════
// TreeMode
// ════════════════════════════════════════════════════════════════════════════

/// Which arrangement the field is easing toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeMode {
    /// Particles dispersed to pseudo-random positions.
    Chaos,
    /// Particles on the tree silhouette.
    Formed,
}

impl TreeMode {
    pub fn flipped(self) -> TreeMode {
        match self {
            TreeMode::Chaos  => TreeMode::Formed,
            TreeMode::Formed => TreeMode::Chaos,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPosition
// ════════════════════════════════════════════════════════════════════════════

/// Normalised hand position from the gesture bridge.
///
/// `x` and `y` are in `[0, 1]` with the origin at the top-left of the
/// capture frame; `detected` is false while no hand is visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPosition {
    pub x:        f32,
    pub y:        f32,
    pub detected: bool,
}

impl Default for HandPosition {
    fn default() -> Self {
        HandPosition { x: 0.5, y: 0.5, detected: false }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Field geometry
// ════════════════════════════════════════════════════════════════════════════

/// Height of the formed tree in world units.
pub const TREE_HEIGHT:  f32 = 9.0;
/// Base radius of the formed cone.
pub const BASE_RADIUS:  f32 = 3.4;
/// Radius of the chaos scatter sphere, centred at mid-tree height.
pub const CHAOS_RADIUS: f32 = 7.5;

/// Fraction of particles assigned to the trunk band.
const TRUNK_SHARE:   f32 = 0.06;
const TRUNK_RADIUS:  f32 = 0.35;
const TRUNK_HEIGHT:  f32 = 1.4;

/// Golden angle in radians — spreads spiral arms evenly around the cone.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Per-frame easing gain applied to each particle's speed.
const EASE: f32 = 0.055;

/// How far a detected hand displaces chaos targets toward its point.
const HAND_PULL: f32 = 0.45;

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

/// One particle with its current position and both home positions.
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos:    [f32; 3],
    pub chaos:  [f32; 3],
    pub formed: [f32; 3],
    /// Individual easing multiplier, 0.6–1.4.
    pub speed:  f32,
    /// Packed ARGB display color.
    pub color:  u32,
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField
// ════════════════════════════════════════════════════════════════════════════

/// The whole field plus the active mode.
pub struct ParticleField {
    particles: Vec<Particle>,
    mode:      TreeMode,
}

impl ParticleField {
    /// Build a field of `count` particles with a random seed.
    pub fn new(count: usize) -> Self {
        Self::with_rng(count, fastrand::Rng::new())
    }

    /// Build a field with a fixed seed — deterministic layouts for tests.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self::with_rng(count, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(count: usize, mut rng: fastrand::Rng) -> Self {
        let trunk_count = (count as f32 * TRUNK_SHARE) as usize;
        let mut particles = Vec::with_capacity(count);

        for i in 0..count {
            let formed = if i < trunk_count {
                trunk_point(i, trunk_count, &mut rng)
            } else {
                cone_point(i - trunk_count, count - trunk_count, &mut rng)
            };
            let chaos = sphere_point(&mut rng);
            let color = if i < trunk_count {
                hsv_to_argb(28.0, 0.62, 0.38)             // bark brown
            } else {
                ornament_color(&mut rng)
            };
            particles.push(Particle {
                pos:    formed,
                chaos,
                formed,
                speed:  0.6 + rng.f32() * 0.8,
                color,
            });
        }

        ParticleField { particles, mode: TreeMode::Formed }
    }

    pub fn mode(&self) -> TreeMode { self.mode }

    pub fn set_mode(&mut self, mode: TreeMode) { self.mode = mode; }

    /// Flip between formed and chaos; returns the new mode.
    pub fn toggle(&mut self) -> TreeMode {
        self.mode = self.mode.flipped();
        self.mode
    }

    pub fn particles(&self) -> &[Particle] { &self.particles }

    pub fn len(&self) -> usize { self.particles.len() }

    pub fn is_empty(&self) -> bool { self.particles.is_empty() }

    /// Advance the easing by one frame.
    ///
    /// In chaos mode a detected hand drags each particle's scatter target
    /// part-way toward the hand's world point before easing.
    pub fn tick(&mut self, hand: &HandPosition) {
        let attractor = hand_world_point(hand);
        for p in &mut self.particles {
            let mut target = match self.mode {
                TreeMode::Formed => p.formed,
                TreeMode::Chaos  => p.chaos,
            };
            if self.mode == TreeMode::Chaos {
                if let Some(a) = attractor {
                    target[0] += (a[0] - target[0]) * HAND_PULL;
                    target[1] += (a[1] - target[1]) * HAND_PULL;
                    target[2] += (a[2] - target[2]) * HAND_PULL;
                }
            }
            let gain = EASE * p.speed;
            p.pos[0] += (target[0] - p.pos[0]) * gain;
            p.pos[1] += (target[1] - p.pos[1]) * gain;
            p.pos[2] += (target[2] - p.pos[2]) * gain;
        }
    }
}

/// Map a normalised hand position into world space on the z = 0 plane.
/// Screen y grows downward, world y grows upward.
fn hand_world_point(hand: &HandPosition) -> Option<[f32; 3]> {
    if !hand.detected {
        return None;
    }
    let wx = (hand.x - 0.5) * 2.0 * CHAOS_RADIUS;
    let wy = (0.5 - hand.y) * 2.0 * CHAOS_RADIUS + TREE_HEIGHT * 0.5;
    Some([wx, wy, 0.0])
}

// ── layout generators ────────────────────────────────────────────────────────

/// Point `i` of `n` on the spiral cone, with a little radial fuzz.
fn cone_point(i: usize, n: usize, rng: &mut fastrand::Rng) -> [f32; 3] {
    let t = (i as f32 + 0.5) / n.max(1) as f32;       // 0 at base, 1 at tip
    let y = t * TREE_HEIGHT;
    let radius = BASE_RADIUS * (1.0 - t) * (0.85 + rng.f32() * 0.3);
    let angle = i as f32 * GOLDEN_ANGLE;
    [angle.cos() * radius, y, angle.sin() * radius]
}

/// Point in the short trunk cylinder below the foliage.
fn trunk_point(i: usize, n: usize, rng: &mut fastrand::Rng) -> [f32; 3] {
    let t = (i as f32 + 0.5) / n.max(1) as f32;
    let y = -TRUNK_HEIGHT + t * TRUNK_HEIGHT;
    let angle = rng.f32() * std::f32::consts::TAU;
    let radius = TRUNK_RADIUS * rng.f32().sqrt();
    [angle.cos() * radius, y, angle.sin() * radius]
}

/// Uniform point in the chaos sphere (rejection-free spherical sampling).
fn sphere_point(rng: &mut fastrand::Rng) -> [f32; 3] {
    let r = CHAOS_RADIUS * rng.f32().cbrt();
    let cos_theta = rng.f32() * 2.0 - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi = rng.f32() * std::f32::consts::TAU;
    [
        r * sin_theta * phi.cos(),
        r * cos_theta + TREE_HEIGHT * 0.5,
        r * sin_theta * phi.sin(),
    ]
}

// ── palette ──────────────────────────────────────────────────────────────────

/// Mostly pine greens with occasional gold and red ornaments.
fn ornament_color(rng: &mut fastrand::Rng) -> u32 {
    match rng.u8(0..10) {
        0     => hsv_to_argb(46.0, 0.88, 0.96),        // gold
        1     => hsv_to_argb(353.0, 0.85, 0.85),       // red
        _     => {
            let hue = 110.0 + rng.f32() * 35.0;
            hsv_to_argb(hue, 0.75, 0.45 + rng.f32() * 0.4)
        }
    }
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r * 255.0) as u32;
    let gi = (g * 255.0) as u32;
    let bi = (b * 255.0) as u32;
    0xFF00_0000 | (ri << 16) | (gi << 8) | bi
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field() -> ParticleField {
        ParticleField::with_seed(500, 7)
    }

    #[test]
    fn starts_formed() {
        assert_eq!(make_field().mode(), TreeMode::Formed);
    }

    #[test]
    fn toggle_flips_mode() {
        let mut f = make_field();
        assert_eq!(f.toggle(), TreeMode::Chaos);
        assert_eq!(f.toggle(), TreeMode::Formed);
    }

    #[test]
    fn formed_positions_inside_cone_bounds() {
        let f = make_field();
        for p in f.particles() {
            let [x, y, z] = p.formed;
            assert!(y >= -TRUNK_HEIGHT - 0.01 && y <= TREE_HEIGHT + 0.01);
            let radius = (x * x + z * z).sqrt();
            assert!(radius <= BASE_RADIUS * 1.15 + 0.01, "r={radius}");
        }
    }

    #[test]
    fn chaos_positions_inside_sphere() {
        let f = make_field();
        for p in f.particles() {
            let [x, y, z] = p.chaos;
            let dy = y - TREE_HEIGHT * 0.5;
            let dist = (x * x + dy * dy + z * z).sqrt();
            assert!(dist <= CHAOS_RADIUS + 0.01, "d={dist}");
        }
    }

    #[test]
    fn tick_converges_toward_chaos_targets() {
        let mut f = make_field();
        f.set_mode(TreeMode::Chaos);
        let hand = HandPosition::default();      // not detected — no pull
        for _ in 0..600 {
            f.tick(&hand);
        }
        for p in f.particles() {
            let d = (0..3)
                .map(|i| (p.pos[i] - p.chaos[i]).powi(2))
                .sum::<f32>()
                .sqrt();
            assert!(d < 0.2, "particle still {d} from target");
        }
    }

    #[test]
    fn detected_hand_pulls_chaos_cloud() {
        let mut near = make_field();
        let mut far = make_field();
        near.set_mode(TreeMode::Chaos);
        far.set_mode(TreeMode::Chaos);

        // Hand parked at the far left of the frame.
        let hand = HandPosition { x: 0.0, y: 0.5, detected: true };
        let idle = HandPosition { x: 0.0, y: 0.5, detected: false };
        for _ in 0..300 {
            near.tick(&hand);
            far.tick(&idle);
        }

        let mean_x = |f: &ParticleField| {
            f.particles().iter().map(|p| p.pos[0]).sum::<f32>() / f.len() as f32
        };
        assert!(mean_x(&near) < mean_x(&far) - 0.5);
    }

    #[test]
    fn colors_are_opaque() {
        for p in make_field().particles() {
            assert_eq!(p.color >> 24, 0xFF);
        }
    }
}
