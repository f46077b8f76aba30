use crate::{LaneId, RoadId, VehicleId};

/// Where a vehicle currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehiclePosition {
    /// Travelling along a road's sections.
    OnRoad(RoadId),
    /// Waiting in a lane queue.
    Queued(LaneId),
    /// Trip complete; no longer on the network.
    Finished,
}

/// A simulated vehicle.
///
/// A vehicle drives a fixed number of roads, wandering the network at
/// random, and accumulates counters that the run summary is computed from.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    id: VehicleId,
    /// Roads left to drive before the trip ends.
    roads_to_drive: usize,
    /// The lane or road section currently occupied.
    position: VehiclePosition,
    /// Ticks spent moving.
    steps_driving: usize,
    /// Ticks spent waiting in lane queues.
    steps_waiting: usize,
    /// Light-controlled lanes encountered, the starting lane included.
    lights_encountered: usize,
    /// The tick the trip ended on.
    finished_at: Option<usize>,
}

impl Vehicle {
    /// Creates a vehicle queued in its starting lane.
    pub(crate) fn new(id: VehicleId, roads_to_drive: usize, lane: LaneId, lighted: bool) -> Self {
        Self {
            id,
            roads_to_drive,
            position: VehiclePosition::Queued(lane),
            steps_driving: 0,
            steps_waiting: 0,
            lights_encountered: lighted as usize,
            finished_at: None,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Roads left to drive before the trip ends.
    pub fn roads_to_drive(&self) -> usize {
        self.roads_to_drive
    }

    /// The lane or road section currently occupied.
    pub fn position(&self) -> VehiclePosition {
        self.position
    }

    /// Ticks spent moving.
    pub fn steps_driving(&self) -> usize {
        self.steps_driving
    }

    /// Ticks spent waiting in lane queues.
    pub fn steps_waiting(&self) -> usize {
        self.steps_waiting
    }

    /// The number of light-controlled lanes encountered.
    pub fn lights_encountered(&self) -> usize {
        self.lights_encountered
    }

    /// The tick the trip ended on, once it has.
    pub fn finished_at(&self) -> Option<usize> {
        self.finished_at
    }

    /// True if the vehicle has finished its trip.
    pub fn is_finished(&self) -> bool {
        self.roads_to_drive == 0
    }

    /// Total ticks spent on the network.
    pub fn total_steps(&self) -> usize {
        self.steps_driving + self.steps_waiting
    }

    /// Counts a driving step.
    pub(crate) fn drive_step(&mut self) {
        self.steps_driving += 1;
    }

    /// Counts a waiting step.
    pub(crate) fn wait_step(&mut self) {
        self.steps_waiting += 1;
    }

    /// Leaves the current lane and starts down a road, counting the crossing
    /// as a driving step.
    pub(crate) fn cross_into(&mut self, road: RoadId) {
        self.position = VehiclePosition::OnRoad(road);
        self.steps_driving += 1;
    }

    /// Joins a lane queue at the end of a road.
    pub(crate) fn enter_lane(&mut self, lane: LaneId, lighted: bool) {
        self.position = VehiclePosition::Queued(lane);
        if lighted {
            self.lights_encountered += 1;
        }
    }

    /// Marks one road as driven. Returns true if the trip is now complete.
    pub(crate) fn complete_road(&mut self) -> bool {
        self.roads_to_drive -= 1;
        self.roads_to_drive == 0
    }

    /// Removes the vehicle from the network, freezing its counters.
    pub(crate) fn finish(&mut self, now: usize) {
        self.position = VehiclePosition::Finished;
        self.finished_at = Some(now);
    }
}
