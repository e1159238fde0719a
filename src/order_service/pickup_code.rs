use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::debug;

use crate::domain::PickupCode;

/// Draws pickup codes that no active order currently holds.
pub struct PickupCodeGenerator {
    rng: Box<dyn RngCore + Send>,
}

impl PickupCodeGenerator {
    /// Production generator, seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Returns a uniformly drawn code not contained in `active`.
    ///
    /// Redraws on collision with no retry bound. The expected number of draws
    /// is `1 / (1 - active / 1_000_000)`, so this only degrades when the
    /// active set approaches the whole code space.
    pub fn generate(&mut self, active: &HashSet<PickupCode>) -> PickupCode {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let code = PickupCode::from_number(self.rng.gen_range(0..PickupCode::SPACE));
            if !active.contains(&code) {
                if attempts > 1 {
                    debug!(attempts, active = active.len(), "Pickup code collided with an active order");
                }
                return code;
            }
        }
    }
}

impl fmt::Debug for PickupCodeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PickupCodeGenerator")
    }
}
