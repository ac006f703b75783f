//! Random sources for route sampling and spawning.
//!
//! Route sampling only ever asks for one uniform double at a time, through
//! [`UniformSource`].  Two concrete sources exist:
//!
//! - [`SimRng`], one stream for a whole run (tests, global decisions);
//! - [`AgentRng`], one stream per object, derived from the run seed and the
//!   object id, so an object's draws do not depend on how many objects were
//!   created before it.
//!
//! Per-object seeds are `run_seed ^ id * 0x9e37_79b9_7f4a_7c15` (golden
//! ratio, 64-bit fraction).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ObjectId;

const SEED_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

/// Uniform doubles in `[low, high)`.  An empty or inverted interval yields
/// `low`.
pub trait UniformSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

fn draw(rng: &mut SmallRng, low: f64, high: f64) -> f64 {
    if low < high { rng.gen_range(low..high) } else { low }
}

/// Per-object stream.
pub struct AgentRng(SmallRng);

impl AgentRng {
    pub fn new(run_seed: u64, object: ObjectId) -> Self {
        let seed = run_seed ^ u64::from(object.0).wrapping_mul(SEED_SPREAD);
        AgentRng(SmallRng::seed_from_u64(seed))
    }
}

impl UniformSource for AgentRng {
    #[inline]
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        draw(&mut self.0, low, high)
    }
}

/// Run-wide stream.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Independent per-object stream seeded from this one.
    pub fn for_object(&mut self, object: ObjectId) -> AgentRng {
        AgentRng::new(self.0.r#gen::<u64>(), object)
    }
}

impl UniformSource for SimRng {
    #[inline]
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        draw(&mut self.0, low, high)
    }
}
