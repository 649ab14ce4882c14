//! The planner registry: process-wide state holding the concrete planner
//! currently used for zombie path computations, rebuildable at runtime.
//!
//! Grounded on the design notes' "global mutable state" lowering: rather
//! than a singleton, this is an explicitly constructed handle the session
//! owns and the planner tick is handed at spawn time. Swaps go through an
//! `RwLock` around an `Arc`, so a reader only ever takes the read lock for
//! the instant it takes to clone the `Arc` out — the actual planning work
//! happens against that clone, entirely off the registry's own lock.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::SimulationConfig;
use crate::map::MapData;
use crate::planners::Planner;

/// A swappable handle to "the current zombie planner". Every zombie path
/// computation reads [`PlannerRegistry::current`] exactly once and holds
/// onto the returned `Arc` for the whole computation, so a concurrent
/// `renew_zombies_planner` call can never be observed mid-compute (§4.5:
/// "read the handle exactly once per compute to avoid mid-tick swap
/// races").
pub struct PlannerRegistry {
    handle: RwLock<Arc<Mutex<Planner>>>,
}

impl PlannerRegistry {
    pub fn new(map: Arc<MapData>, config: &SimulationConfig) -> PlannerRegistry {
        PlannerRegistry {
            handle: RwLock::new(Arc::new(Mutex::new(Planner::build(map, config)))),
        }
    }

    /// Snapshots the current planner handle. Hold the returned `Arc` for
    /// the duration of one planning pass rather than calling this again
    /// mid-pass.
    pub fn current(&self) -> Arc<Mutex<Planner>> {
        self.handle.read().clone()
    }

    /// Builds a new planner for `(map, config)` and atomically replaces the
    /// handle. Every `PlannerKind` this repo knows about has a constructor
    /// (`Planner::build` is total), so this always succeeds; the `bool`
    /// return keeps faith with §4.5/§7's "registry mismatch" contract for a
    /// future planner kind that might not be buildable for a given map.
    pub fn renew_zombies_planner(&self, map: Arc<MapData>, config: &SimulationConfig) -> bool {
        let planner = Planner::build(map, config);
        *self.handle.write() = Arc::new(Mutex::new(planner));
        log::info!("planner registry swapped to {:?}", config.planner_kind);
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geometry::Position;
    use rand::{rngs::StdRng, SeedableRng};

    fn blank_map() -> Arc<MapData> {
        Arc::new(MapData::from_raster(
            600,
            400,
            vec![false; 600 * 400],
            Position::new(10.0, 10.0),
            vec![Position::new(1.0, 1.0)],
            vec![],
        ))
    }

    #[test]
    fn test_current_returns_a_working_planner() {
        let config = SimulationConfig::default();
        let registry = PlannerRegistry::new(blank_map(), &config);
        let planner = registry.current();
        let mut rng = StdRng::seed_from_u64(1);
        let path = planner
            .lock()
            .generate_path(Position::new(10.0, 10.0), Position::new(590.0, 390.0), &mut rng);
        assert!(path.is_some());
    }

    #[test]
    fn test_renew_swaps_the_handle() {
        let config = SimulationConfig::default();
        let registry = PlannerRegistry::new(blank_map(), &config);
        let before = registry.current();
        let mut new_config = config;
        new_config.planner_kind = crate::config::PlannerKind::Rrt;
        assert!(registry.renew_zombies_planner(blank_map(), &new_config));
        let after = registry.current();
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
