//! The two worker threads: the physics/render tick and the planner tick
//! (§5). Both loop on [`Session::keep_alive`] and exit cooperatively once
//! [`Session::request_shutdown`] flips the flag.
//!
//! Grounded on the teacher's `TerminalController`/`WebController` run-loop
//! shape (sleep-to-budget each iteration, decode input once per frame) —
//! generalized from one thread driving one loop to two threads at two
//! independent periods sharing a session.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use rand::Rng;

use geometry::{Position, Velocity};
use pathfinding::{salvage_path, Path};

use crate::config::{
    SimulationConfig, PHYSICS_LOCK_TIMEOUT, PHYSICS_TICK_PERIOD, PLANNER_TICK_PERIOD,
    WAYPOINT_ARRIVAL_RADIUS, ZOMBIE_MIN_SPEED,
};
use crate::input::KeyState;
use crate::registry::PlannerRegistry;
use crate::session::Session;

/// Join handles for the two worker threads spawned by [`spawn_simulation`].
pub struct SimulationHandles {
    physics: JoinHandle<()>,
    planner: JoinHandle<()>,
}

impl SimulationHandles {
    /// Blocks until both worker threads have exited. Intended to be called
    /// after [`Session::request_shutdown`].
    pub fn join(self) {
        if self.physics.join().is_err() {
            log::warn!("physics tick thread panicked");
        }
        if self.planner.join().is_err() {
            log::warn!("planner tick thread panicked");
        }
    }
}

/// Spawns the physics tick and the planner tick for `session`, sharing
/// `registry` for path computation and `keys` for player input.
pub fn spawn_simulation(
    session: Arc<Session>,
    registry: Arc<PlannerRegistry>,
    keys: Arc<KeyState>,
    config: SimulationConfig,
) -> SimulationHandles {
    let physics_session = session.clone();
    let physics = thread::spawn(move || physics_tick(physics_session, keys));

    let planner = thread::spawn(move || planner_tick(session, registry, config));

    SimulationHandles { physics, planner }
}

/// Sleeps the remainder of `period` after `tick_start`, or not at all if the
/// tick ran over budget (§5's "sleep remainder... never negative").
fn sleep_remainder(tick_start: Instant, period: std::time::Duration) {
    let elapsed = tick_start.elapsed();
    if elapsed < period {
        thread::sleep(period - elapsed);
    }
}

fn physics_tick(session: Arc<Session>, keys: Arc<KeyState>) {
    while session.keep_alive() {
        let tick_start = Instant::now();
        physics_tick_once(&session, &keys);
        sleep_remainder(tick_start, PHYSICS_TICK_PERIOD);
    }
}

/// One physics tick iteration (§5 step 2): translate the player by its
/// current velocity, write back a freshly-read velocity from the key
/// state, then translate every live zombie by its current velocity. All
/// under one timed actor-lock acquisition.
fn physics_tick_once(session: &Session, keys: &KeyState) {
    let dt_secs = PHYSICS_TICK_PERIOD.as_secs_f32();
    let map = session.map().clone();
    let (dx, dy) = keys.movement_axis();
    let sprinting = keys.sprinting();

    session.try_with_actor_world_mut(PHYSICS_LOCK_TIMEOUT, |world| {
        let (vx, vy) = world.player.state.velocity.scaled_by_time(dt_secs);
        world.player.state.attempt_translation_in(vx, vy, &map);

        world.player.state.velocity = if dx == 0.0 && dy == 0.0 {
            Velocity::ZERO
        } else {
            let speed = world.player.speed_for(sprinting);
            let magnitude = (dx * dx + dy * dy).sqrt() * speed;
            Velocity::from_polar(dy.atan2(dx), magnitude)
        };

        if let Some(wave) = &mut world.wave {
            for i in 0..wave.capacity() {
                if let Some(zombie) = wave.zombie_mut(i) {
                    let (zx, zy) = zombie.state.velocity.scaled_by_time(dt_secs);
                    zombie.state.attempt_translation_in(zx, zy, &map);
                }
            }
        }
    });
}

fn planner_tick(session: Arc<Session>, registry: Arc<PlannerRegistry>, config: SimulationConfig) {
    let mut rng = rand::thread_rng();
    while session.keep_alive() {
        let tick_start = Instant::now();
        planner_tick_once(&session, &registry, &config, &mut rng);
        sleep_remainder(tick_start, PLANNER_TICK_PERIOD);
    }
}

/// One planner tick iteration. What drives `Wave::spawn_zombie` over time
/// is left open; the decision here (see DESIGN.md) is that the planner
/// tick tops up one empty slot per iteration at a random zombie spawn
/// point whenever the wave's spawn budget allows, so a wave populates
/// gradually instead of only ever holding whatever was spawned at wave
/// start.
///
/// §5 step 2-3: snapshot live zombie positions/paths and the player goal,
/// salvage or replan each outside the lock, then install results,
/// respawning any slot that ended up pathless.
fn planner_tick_once(
    session: &Session,
    registry: &PlannerRegistry,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) {
    let spawns = session.map().zombie_spawns().to_vec();
    session.with_actor_world_mut(|world| {
        if let Some(wave) = &mut world.wave {
            if !spawns.is_empty() {
                let spawn = spawns[rng.gen_range(0..spawns.len())];
                wave.spawn_zombie(spawn, rng);
            }
        }
    });

    let goal = session.with_actor_world(|world| world.player.state.position);
    let snapshots: Vec<Option<(Position, Option<Path>)>> = session.with_actor_world(|world| {
        match &world.wave {
            Some(wave) => (0..wave.capacity())
                .map(|i| wave.zombie(i).map(|z| (z.state.position, wave.path(i).cloned())))
                .collect(),
            None => Vec::new(),
        }
    });

    if snapshots.is_empty() {
        return;
    }

    let planner = registry.current();
    let mut new_paths: Vec<Option<Path>> = Vec::with_capacity(snapshots.len());
    for slot in &snapshots {
        let computed = match slot {
            None => None,
            Some((position, existing_path)) => {
                let locked = planner.lock();
                // RRT's salvage additionally refuses when a direct line has
                // opened up, since replanning would trivially return it.
                let rrt_should_skip_salvage =
                    locked.is_rrt() && locked.straight_line_clear(*position, goal);
                let mut salvaged = existing_path.clone();
                let ok = !rrt_should_skip_salvage
                    && salvaged
                        .as_mut()
                        .map(|p| {
                            salvage_path(p, *position, goal, config.salvage_threshold, locked.salvage_min_points())
                        })
                        .unwrap_or(false);
                drop(locked);
                if ok {
                    salvaged
                } else {
                    planner.lock().generate_path(*position, goal, rng)
                }
            }
        };
        new_paths.push(computed);
    }

    session.with_actor_world_mut(|world| {
        let Some(wave) = &mut world.wave else { return };
        for (i, slot) in snapshots.iter().enumerate() {
            if slot.is_none() || wave.zombie(i).is_none() {
                continue;
            }
            wave.set_path(i, new_paths[i].take());
            match wave.path(i).cloned() {
                Some(mut path) => {
                    let position = wave.zombie(i).unwrap().state.position;
                    if path.at_next_position(position, WAYPOINT_ARRIVAL_RADIUS) {
                        path.consume_next();
                    }
                    let velocity = path.next_movement(position, ZOMBIE_MIN_SPEED);
                    wave.zombie_mut(i).unwrap().state.velocity = velocity;
                    wave.set_path(i, Some(path));
                }
                None => {
                    let spawn = spawns[rng.gen_range(0..spawns.len())];
                    wave.respawn_zombie(i, spawn);
                }
            }
        }
    });
}
