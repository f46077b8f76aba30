pub use builder::{BuildError, GridBuilder};
pub use config::SimConfig;
pub use conflict::{compatible, Movement};
pub use geom::{Direction, Turning};
pub use intersection::Intersection;
pub use lane::{Lane, LightState};
pub use network::RoadNetwork;
pub use policy::{Clock, FirstComeFirstServe, GlobalOptimum, LocalOptimum, Policy, PolicyKind};
pub use rand_chacha::ChaCha8Rng;
pub use road::Road;
pub use simulation::{RunSummary, Simulation};
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::{Vehicle, VehiclePosition};

use slotmap::{new_key_type, SlotMap};

mod builder;
mod config;
mod conflict;
mod geom;
mod intersection;
mod lane;
mod network;
mod policy;
mod road;
mod simulation;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of an [Intersection].
    pub struct IntersectionId;
    /// Unique ID of a [Road].
    pub struct RoadId;
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type IntersectionSet = SlotMap<IntersectionId, Intersection>;
type RoadSet = SlotMap<RoadId, Road>;
type LaneSet = SlotMap<LaneId, Lane>;

/// The arena holding every vehicle of a simulation, finished ones included.
pub type VehicleSet = SlotMap<VehicleId, Vehicle>;
