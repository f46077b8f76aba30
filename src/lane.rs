use crate::conflict::Movement;
use crate::geom::{Direction, Turning};
use crate::{IntersectionId, LaneId, RoadId, RoadSet, VehicleId, VehicleSet};
use std::collections::VecDeque;

/// The state of a lane's traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightState {
    Red,
    Green,
}

/// A turning-specific queue at the end of a road.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane ID.
    id: LaneId,
    /// The road this lane ends.
    road_in: RoadId,
    /// The road entered after making the turn.
    road_out: RoadId,
    /// The intersection the lane crosses.
    intersection: IntersectionId,
    /// The side of the intersection the lane enters at.
    direction: Direction,
    /// The turn made when leaving the lane.
    turning: Turning,
    /// Vehicles waiting to cross; the front of the queue leaves first.
    queue: VecDeque<VehicleId>,
    /// Whether the lane is light controlled.
    has_traffic_light: bool,
    /// The current light state; meaningless without a traffic light.
    light: LightState,
}

impl Lane {
    pub(crate) fn new(
        id: LaneId,
        road_in: RoadId,
        road_out: RoadId,
        intersection: IntersectionId,
        direction: Direction,
        turning: Turning,
    ) -> Self {
        Self {
            id,
            road_in,
            road_out,
            intersection,
            direction,
            turning,
            queue: VecDeque::new(),
            has_traffic_light: false,
            light: LightState::Red,
        }
    }

    /// Gets the lane's ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// The road this lane ends.
    pub fn road_in(&self) -> RoadId {
        self.road_in
    }

    /// The road entered after making the turn.
    pub fn road_out(&self) -> RoadId {
        self.road_out
    }

    /// The intersection the lane crosses.
    pub fn intersection(&self) -> IntersectionId {
        self.intersection
    }

    /// The side of the intersection the lane enters at.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The turn made when leaving the lane.
    pub fn turning(&self) -> Turning {
        self.turning
    }

    /// The lane's movement, used for conflict lookups.
    pub fn movement(&self) -> Movement {
        (self.direction, self.turning)
    }

    /// Whether the lane is light controlled.
    pub fn has_traffic_light(&self) -> bool {
        self.has_traffic_light
    }

    /// The current light state.
    pub fn light(&self) -> LightState {
        self.light
    }

    /// The number of vehicles waiting in the lane.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Iterates over the waiting vehicles, front of the queue first.
    pub fn queue(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.queue.iter().copied()
    }

    /// True if vehicles may leave the lane this tick.
    pub fn is_open(&self) -> bool {
        !self.has_traffic_light || self.light == LightState::Green
    }

    /// Sets the light state. Does nothing on a lane without a traffic light.
    pub(crate) fn set_light(&mut self, state: LightState) {
        if self.has_traffic_light {
            self.light = state;
        }
    }

    pub(crate) fn mark_traffic_light(&mut self) {
        self.has_traffic_light = true;
    }

    /// Appends a vehicle to the back of the queue.
    pub(crate) fn enter(&mut self, vehicle: VehicleId) {
        self.queue.push_back(vehicle);
    }

    /// Advances the lane by one tick.
    ///
    /// If the lane is open, up to `flow` vehicles leave the front of the
    /// queue and start down the lane's outgoing road. Everyone still queued
    /// afterwards counts a waiting step.
    pub(crate) fn update(&mut self, roads: &mut RoadSet, vehicles: &mut VehicleSet, flow: usize) {
        if self.is_open() {
            for _ in 0..flow {
                let Some(vehicle_id) = self.queue.pop_front() else {
                    break;
                };
                vehicles[vehicle_id].cross_into(self.road_out);
                roads[self.road_out].enter(vehicle_id);
            }
        }
        for vehicle_id in &self.queue {
            vehicles[*vehicle_id].wait_step();
        }
    }
}
