//! `Session`: owns the map, the player, the current wave, and the fair
//! re-entrant "actor lock" serializing every mutation of the two, plus the
//! wave-change/points-change listener lists dispatched around it.
//!
//! Grounded on §3/§5/§6/§9's "lower cyclic references to owned slots, no
//! back-pointers" and "listener lists are a sequence of callable handles
//! held by the Session, dispatched over a local clone" design notes.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};

use crate::actors::{Player, Wave};
use crate::map::MapData;

/// Everything the actor lock protects: player state and the current wave
/// with its slots. Does NOT include `MapData` (immutable) or a
/// `DiscretizedMap`/planner (built once) — per §5's lock discipline.
pub struct ActorWorld {
    pub player: Player,
    pub wave: Option<Wave>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveChangeEvent {
    pub wave_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsChangeEvent {
    pub point_count: u32,
}

pub type ListenerId = usize;

type WaveListener = Arc<dyn Fn(WaveChangeEvent) + Send + Sync>;
type PointsListener = Arc<dyn Fn(PointsChangeEvent) + Send + Sync>;

/// Owns the map, the player/wave state, and the fair re-entrant "actor
/// lock" (§5). `ReentrantMutex` gives the same-thread reentrancy the lock
/// discipline assumes; because the same thread may hold more than one
/// guard at once, the guard only derefs immutably, so mutation goes
/// through the `RefCell` it wraps. parking_lot's mutexes are eventually
/// fair by construction (an unlock occasionally hands off directly to a
/// waiting thread rather than letting the unlocking thread immediately
/// relock), which is the "fair" half of the spec's "fair re-entrant
/// mutex". §7's "lock misownership" fault — a release attempted by a
/// non-owner thread — has no representation here: Rust's guard-based
/// locking makes a mismatched release unrepresentable rather than merely
/// fatal, so that invariant is satisfied by construction rather than
/// checked at runtime.
pub struct Session {
    map: Arc<MapData>,
    actor_lock: ReentrantMutex<RefCell<ActorWorld>>,
    keep_alive: AtomicBool,
    next_listener_id: AtomicUsize,
    wave_listeners: Mutex<Vec<(ListenerId, WaveListener)>>,
    points_listeners: Mutex<Vec<(ListenerId, PointsListener)>>,
}

impl Session {
    pub fn new(map: Arc<MapData>) -> Session {
        let player = Player::spawn_at(map.player_spawn());
        Session {
            map,
            actor_lock: ReentrantMutex::new(RefCell::new(ActorWorld { player, wave: None })),
            keep_alive: AtomicBool::new(true),
            next_listener_id: AtomicUsize::new(0),
            wave_listeners: Mutex::new(Vec::new()),
            points_listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn map(&self) -> &Arc<MapData> {
        &self.map
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive.load(Ordering::Acquire)
    }

    /// CAS-transitions the cooperative shutdown flag `true -> false` (§5
    /// "Cancellation"). Both worker threads observe this at their loop
    /// head and exit.
    pub fn request_shutdown(&self) {
        self.keep_alive.store(false, Ordering::Release);
    }

    /// Runs `f` with shared access to the actor world, blocking until the
    /// lock is acquired.
    pub fn with_actor_world<T>(&self, f: impl FnOnce(&ActorWorld) -> T) -> T {
        let guard = self.actor_lock.lock();
        f(&guard.borrow())
    }

    /// Runs `f` with exclusive (within this thread) access to the actor
    /// world, blocking until the lock is acquired.
    pub fn with_actor_world_mut<T>(&self, f: impl FnOnce(&mut ActorWorld) -> T) -> T {
        let guard = self.actor_lock.lock();
        f(&mut guard.borrow_mut())
    }

    /// As [`Session::with_actor_world_mut`], but gives up after `timeout`
    /// instead of blocking — the physics tick's "try to acquire... with
    /// timeout `FRAME_PERIOD/2`" step (§5).
    pub fn try_with_actor_world_mut<T>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut ActorWorld) -> T,
    ) -> Option<T> {
        let guard = self.actor_lock.try_lock_for(timeout)?;
        Some(f(&mut guard.borrow_mut()))
    }

    /// Starts the next wave and dispatches `WaveChangeEvent` to every
    /// registered wave listener while the actor lock is held (§6) — the
    /// listener loop runs inside the same `with_actor_world_mut` closure as
    /// the `world.wave` write, so the guard is still held for the dispatch.
    pub fn start_next_wave(&self, wave_number: u32) {
        let listeners = self.wave_listeners.lock().clone();
        let event = WaveChangeEvent { wave_number };
        self.with_actor_world_mut(|world| {
            world.wave = Some(Wave::new(wave_number));
            for (_, listener) in &listeners {
                listener(event);
            }
        });
        log::info!("wave {wave_number} started");
    }

    /// Adds `delta` points to the player's count and dispatches
    /// `PointsChangeEvent` WITHOUT holding the actor lock — preserving the
    /// asymmetry with `start_next_wave` documented in §9's open questions.
    pub fn change_player_points(&self, delta: u32) {
        let point_count = self.with_actor_world_mut(|world| {
            world.player.add_points(delta);
            world.player.point_count()
        });
        let listeners = self.points_listeners.lock().clone();
        let event = PointsChangeEvent { point_count };
        for (_, listener) in &listeners {
            listener(event);
        }
    }

    pub fn add_wave_listener(&self, listener: impl Fn(WaveChangeEvent) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.wave_listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a previously registered wave listener. Returns whether one
    /// was found.
    pub fn remove_wave_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.wave_listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn add_points_listener(&self, listener: impl Fn(PointsChangeEvent) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.points_listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a previously registered points listener. Returns whether one
    /// was found.
    pub fn remove_points_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.points_listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}
