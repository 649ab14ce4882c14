use std::path::PathBuf;
use std::sync::Arc;

use survival_arena::app;
use survival_arena::config::SimulationConfig;
use survival_arena::input::KeyState;
use survival_arena::map::MapData;
use survival_arena::registry::PlannerRegistry;
use survival_arena::session::Session;
use survival_arena::simulation::spawn_simulation;

fn main() -> anyhow::Result<()> {
    let map_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("map"));

    let map = Arc::new(MapData::load(&map_dir)?);
    let session = Arc::new(Session::new(map.clone()));
    let config = SimulationConfig::default();
    let registry = Arc::new(PlannerRegistry::new(map, &config));
    let keys = Arc::new(KeyState::new());

    session.start_next_wave(1);

    let simulation = spawn_simulation(session.clone(), registry, keys.clone(), config);

    app::run(session, keys, simulation)
}
