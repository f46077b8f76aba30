use crate::geom::{Direction, Turning};
use crate::{IntersectionId, LaneId, LaneSet, RoadId, VehicleId, VehicleSet};
use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// The vehicles occupying one unit of travel distance.
type Section = SmallVec<[VehicleId; 4]>;

/// A directed road between two intersections.
#[derive(Clone, Debug)]
pub struct Road {
    /// The road ID.
    id: RoadId,
    /// The intersection the road leaves from.
    origin: IntersectionId,
    /// The intersection the road arrives at.
    destination: IntersectionId,
    /// The side of the destination the road enters at.
    end_direction: Direction,
    /// The turn-specific lanes at the end of the road.
    lanes: [Option<LaneId>; 3],
    /// The travel distance, divided into sections; the last section is the
    /// one about to reach the destination.
    sections: VecDeque<Section>,
}

impl Road {
    pub(crate) fn new(
        id: RoadId,
        origin: IntersectionId,
        destination: IntersectionId,
        end_direction: Direction,
        length: usize,
    ) -> Self {
        Self {
            id,
            origin,
            destination,
            end_direction,
            lanes: [None; 3],
            sections: (0..length.max(1)).map(|_| Section::new()).collect(),
        }
    }

    /// Gets the road's ID.
    pub fn id(&self) -> RoadId {
        self.id
    }

    /// The intersection the road leaves from.
    pub fn origin(&self) -> IntersectionId {
        self.origin
    }

    /// The intersection the road arrives at.
    pub fn destination(&self) -> IntersectionId {
        self.destination
    }

    /// The side of the destination the road enters at.
    pub fn end_direction(&self) -> Direction {
        self.end_direction
    }

    /// The lane for the given turning, if there is one.
    pub fn lane(&self, turning: Turning) -> Option<LaneId> {
        self.lanes[turning.index()]
    }

    /// Iterates over the road's lanes in turning order.
    pub fn lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.lanes.iter().flatten().copied()
    }

    /// The number of lanes at the end of the road.
    pub fn num_lanes(&self) -> usize {
        self.lanes.iter().flatten().count()
    }

    /// The length of the road in sections.
    pub fn length(&self) -> usize {
        self.sections.len()
    }

    /// Iterates over the sections, least advanced first.
    pub fn sections(&self) -> impl Iterator<Item = &[VehicleId]> {
        self.sections.iter().map(|section| section.as_slice())
    }

    /// The number of vehicles in the section about to reach the destination.
    pub fn last_section_len(&self) -> usize {
        self.sections.back().map_or(0, |section| section.len())
    }

    pub(crate) fn set_lane(&mut self, turning: Turning, lane: LaneId) {
        debug_assert!(self.lanes[turning.index()].is_none());
        self.lanes[turning.index()] = Some(lane);
    }

    /// Puts a vehicle on the first section of the road.
    pub(crate) fn enter(&mut self, vehicle: VehicleId) {
        self.sections
            .front_mut()
            .expect("road has no sections")
            .push(vehicle);
    }

    /// Advances the road by one tick.
    ///
    /// Vehicles on the last section have finished this road: each decrements
    /// its remaining-roads counter and either leaves the network or queues
    /// into one of the road's lanes, chosen uniformly at random. Everyone
    /// else moves one section ahead and counts a driving step.
    ///
    /// Returns the number of vehicles that completed their trip.
    pub(crate) fn update(
        &mut self,
        lanes: &mut LaneSet,
        vehicles: &mut VehicleSet,
        rng: &mut ChaCha8Rng,
        now: usize,
    ) -> usize {
        let arrived = self.sections.pop_back().expect("road has no sections");
        let options: ArrayVec<LaneId, 3> = self.lanes.iter().flatten().copied().collect();
        let mut finished = 0;

        for vehicle_id in arrived {
            let vehicle = &mut vehicles[vehicle_id];
            if vehicle.complete_road() {
                vehicle.finish(now);
                finished += 1;
                continue;
            }
            let lane_id = *options.choose(rng).expect("road has no lanes");
            let lane = &mut lanes[lane_id];
            vehicle.enter_lane(lane_id, lane.has_traffic_light());
            lane.enter(vehicle_id);
        }

        for section in &self.sections {
            for vehicle_id in section {
                vehicles[*vehicle_id].drive_step();
            }
        }
        self.sections.push_front(Section::new());

        finished
    }
}
