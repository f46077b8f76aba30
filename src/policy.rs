use crate::conflict::compatible;
use crate::lane::LightState;
use crate::network::RoadNetwork;
use crate::{IntersectionId, LaneId};
use arrayvec::ArrayVec;
use rand_chacha::ChaCha8Rng;

pub use clock::Clock;
pub use first_come_first_serve::FirstComeFirstServe;
pub use global_optimum::GlobalOptimum;
pub use local_optimum::LocalOptimum;

mod clock;
mod first_come_first_serve;
mod global_optimum;
mod local_optimum;

/// Selects one of the built-in scheduling policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyKind {
    Clock,
    FirstComeFirstServe,
    LocalOptimum,
    GlobalOptimum,
}

impl PolicyKind {
    /// All policy kinds.
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Clock,
        PolicyKind::FirstComeFirstServe,
        PolicyKind::LocalOptimum,
        PolicyKind::GlobalOptimum,
    ];
}

/// A per-intersection lane scheduling policy.
///
/// The variant set is closed: policies are picked at configuration time and
/// share the `setup`/`update` interface.
pub enum Policy {
    Clock(Clock),
    FirstComeFirstServe(FirstComeFirstServe),
    LocalOptimum(LocalOptimum),
    GlobalOptimum(GlobalOptimum),
}

impl Policy {
    /// Creates the policy of the given kind.
    pub fn new(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::Clock => Policy::Clock(Clock::default()),
            PolicyKind::FirstComeFirstServe => {
                Policy::FirstComeFirstServe(FirstComeFirstServe::default())
            }
            PolicyKind::LocalOptimum => Policy::LocalOptimum(LocalOptimum),
            PolicyKind::GlobalOptimum => Policy::GlobalOptimum(GlobalOptimum),
        }
    }

    /// The kind of this policy.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Clock(_) => PolicyKind::Clock,
            Policy::FirstComeFirstServe(_) => PolicyKind::FirstComeFirstServe,
            Policy::LocalOptimum(_) => PolicyKind::LocalOptimum,
            Policy::GlobalOptimum(_) => PolicyKind::GlobalOptimum,
        }
    }

    /// One-time initialisation, called once before the first tick.
    pub fn setup(&mut self, network: &RoadNetwork, rng: &mut ChaCha8Rng) {
        match self {
            Policy::Clock(policy) => policy.setup(network, rng),
            Policy::FirstComeFirstServe(policy) => policy.setup(network),
            Policy::LocalOptimum(_) | Policy::GlobalOptimum(_) => {}
        }
    }

    /// Decides the green set for one light-controlled intersection.
    ///
    /// After this returns, no two green lanes at the intersection conflict.
    pub fn update(&mut self, network: &mut RoadNetwork, at: IntersectionId, rng: &mut ChaCha8Rng) {
        match self {
            Policy::Clock(policy) => policy.update(network, at),
            Policy::FirstComeFirstServe(policy) => policy.update(network, at, rng),
            Policy::LocalOptimum(policy) => policy.update(network, at),
            Policy::GlobalOptimum(policy) => policy.update(network, at),
        }
    }
}

/// Sets every light-controlled lane at the intersection to red.
fn all_lights_red(network: &mut RoadNetwork, at: IntersectionId) {
    for lane_id in network.lanes_at(at) {
        network.lane_mut(lane_id).set_light(LightState::Red);
    }
}

/// Drops the candidates that conflict with the newly green `reference` lane.
fn retain_compatible(network: &RoadNetwork, reference: LaneId, options: &mut ArrayVec<LaneId, 12>) {
    let reference = network.lane(reference).movement();
    options.retain(|id| compatible(reference, network.lane(*id).movement()));
}

/// Removes and returns the candidate with the highest priority.
///
/// Earlier candidates win ties, so priority order falls back to the lane
/// enumeration order.
fn take_highest(
    options: &mut ArrayVec<LaneId, 12>,
    mut priority: impl FnMut(LaneId) -> f64,
) -> LaneId {
    let mut best = 0;
    let mut best_score = priority(options[0]);
    for idx in 1..options.len() {
        let score = priority(options[idx]);
        if score > best_score {
            best = idx;
            best_score = score;
        }
    }
    options.remove(best)
}
