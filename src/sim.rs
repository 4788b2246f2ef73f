use rand::{rngs::StdRng, Rng};

// Spawn jitter around the origin; particles start inside [0, SPAWN_JITTER)^3
// so neighbouring trajectories diverge chaotically instead of overlapping.
pub(crate) const SPAWN_JITTER: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Vec3 {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
}

/// Lorenz system parameters plus the fixed Euler step, shared by every
/// particle and never mutated after startup.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LorenzParams {
    pub(crate) sigma: f64,
    pub(crate) rho: f64,
    pub(crate) beta: f64,
    pub(crate) dt: f64,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
            dt: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Particle {
    pub(crate) position: Vec3,
    // None until the first integration step; the draw path branches on this
    // so a freshly spawned particle renders nothing for one frame.
    pub(crate) previous_position: Option<Vec3>,
    pub(crate) velocity: Vec3,
    pub(crate) hue: f32,
}

impl Particle {
    pub(crate) fn new(position: Vec3, hue: f32) -> Self {
        Self {
            position,
            previous_position: None,
            velocity: Vec3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            hue,
        }
    }

    /// Lorenz derivatives at the current position, written into `velocity`.
    pub(crate) fn compute_velocity(&mut self, p: &LorenzParams) {
        let Vec3 { x, y, z } = self.position;
        self.velocity.x = p.sigma * (y - x);
        self.velocity.y = x * (p.rho - z) - y;
        self.velocity.z = x * y - p.beta * z;
    }

    /// Forward Euler step: snapshot the position, then move along the
    /// current velocity. Velocity must already reflect the pre-move
    /// position (see `step`).
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.previous_position = Some(self.position);
        self.position.x += self.velocity.x * dt;
        self.position.y += self.velocity.y * dt;
        self.position.z += self.velocity.z * dt;
    }

    pub(crate) fn step(&mut self, p: &LorenzParams) {
        self.compute_velocity(p);
        self.integrate(p.dt);
    }
}

/// Owned simulation state: the particle collection plus the shared
/// parameters. The frame loop drives it; nothing in here touches the
/// terminal.
pub(crate) struct Simulation {
    pub(crate) particles: Vec<Particle>,
    pub(crate) params: LorenzParams,
}

impl Simulation {
    pub(crate) fn seed(rng: &mut StdRng, count: usize) -> Self {
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            let position = Vec3 {
                x: rng.gen_range(0.0..SPAWN_JITTER),
                y: rng.gen_range(0.0..SPAWN_JITTER),
                z: rng.gen_range(0.0..SPAWN_JITTER),
            };
            particles.push(Particle::new(position, rng.gen_range(0.0..360.0)));
        }
        Self {
            particles,
            params: LorenzParams::default(),
        }
    }

    /// Advance every particle one tick, in stable insertion order.
    pub(crate) fn step(&mut self) {
        for p in self.particles.iter_mut() {
            p.step(&self.params);
        }
    }
}
