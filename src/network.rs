use crate::conflict::compatible;
use crate::geom::{Direction, Turning};
use crate::intersection::Intersection;
use crate::lane::{Lane, LightState};
use crate::road::Road;
use crate::{
    IntersectionId, IntersectionSet, LaneId, LaneSet, RoadId, RoadSet, VehicleSet,
};
use arrayvec::ArrayVec;
use itertools::Itertools;
use rand_chacha::ChaCha8Rng;

/// A rectangular grid of intersections connected by roads.
///
/// The network owns every intersection, road and lane in arenas; the
/// entities refer to one another by ID, so the incoming-road back-references
/// never form ownership cycles.
#[derive(Debug)]
pub struct RoadNetwork {
    /// The intersections in the network.
    intersections: IntersectionSet,
    /// The roads in the network.
    roads: RoadSet,
    /// The lanes in the network.
    lanes: LaneSet,
    /// Row-major intersection lookup.
    grid: Vec<IntersectionId>,
    /// The number of intersection columns.
    width: usize,
    /// The number of intersection rows.
    height: usize,
}

impl RoadNetwork {
    /// Creates a network of unconnected intersections.
    pub(crate) fn new(width: usize, height: usize, light_period: usize) -> Self {
        let mut intersections = IntersectionSet::default();
        let grid = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| intersections.insert(Intersection::new(x, y, light_period)))
            .collect();
        Self {
            intersections,
            roads: RoadSet::default(),
            lanes: LaneSet::default(),
            grid,
            width,
            height,
        }
    }

    /// The number of intersection columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of intersection rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The intersection at the given grid position.
    ///
    /// # Panics
    /// Panics if the position is outside the grid.
    pub fn intersection_at(&self, x: usize, y: usize) -> IntersectionId {
        assert!(x < self.width && y < self.height, "position off the grid");
        self.grid[y * self.width + x]
    }

    /// Gets a reference to the intersection with the given ID.
    pub fn intersection(&self, id: IntersectionId) -> &Intersection {
        &self.intersections[id]
    }

    /// Gets a reference to the road with the given ID.
    pub fn road(&self, id: RoadId) -> &Road {
        &self.roads[id]
    }

    /// Gets a reference to the lane with the given ID.
    pub fn lane(&self, id: LaneId) -> &Lane {
        &self.lanes[id]
    }

    /// Returns an iterator over all the intersections in the network.
    pub fn iter_intersections(&self) -> impl Iterator<Item = (IntersectionId, &Intersection)> {
        self.intersections.iter()
    }

    /// Returns an iterator over all the roads in the network.
    pub fn iter_roads(&self) -> impl Iterator<Item = (RoadId, &Road)> {
        self.roads.iter()
    }

    /// Returns an iterator over all the lanes in the network.
    pub fn iter_lanes(&self) -> impl Iterator<Item = (LaneId, &Lane)> {
        self.lanes.iter()
    }

    /// The number of roads in the network.
    pub fn num_roads(&self) -> usize {
        self.roads.len()
    }

    /// The number of lanes in the network.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// The neighbouring intersection in the given direction, if the grid
    /// extends that far.
    pub fn neighbour(&self, id: IntersectionId, direction: Direction) -> Option<IntersectionId> {
        let (x, y) = self.intersections[id].position();
        let (dx, dy) = direction.delta();
        let x = x.checked_add_signed(dx)?;
        let y = y.checked_add_signed(dy)?;
        (x < self.width && y < self.height).then(|| self.grid[y * self.width + x])
    }

    /// All lanes at an intersection, in approach and turning order.
    pub fn lanes_at(&self, id: IntersectionId) -> ArrayVec<LaneId, 12> {
        let mut lanes = ArrayVec::new();
        for road_id in self.intersections[id].incoming_roads() {
            lanes.extend(self.roads[road_id].lanes());
        }
        lanes
    }

    /// The light-controlled lanes at an intersection.
    pub fn lighted_lanes_at(&self, id: IntersectionId) -> ArrayVec<LaneId, 12> {
        self.lanes_at(id)
            .into_iter()
            .filter(|lane| self.lanes[*lane].has_traffic_light())
            .collect()
    }

    /// The number of vehicles waiting in lane queues at an intersection.
    pub fn num_vehicles_waiting(&self, id: IntersectionId) -> usize {
        self.lanes_at(id)
            .into_iter()
            .map(|lane| self.lanes[lane].queue_len())
            .sum()
    }

    /// True if no two green lanes at the intersection conflict.
    pub fn greens_compatible(&self, id: IntersectionId) -> bool {
        self.lanes_at(id)
            .into_iter()
            .map(|lane| &self.lanes[lane])
            .filter(|lane| lane.has_traffic_light() && lane.light() == LightState::Green)
            .tuple_combinations()
            .all(|(a, b)| compatible(a.movement(), b.movement()))
    }

    /// Adds a road from `origin` towards its neighbour in `direction`.
    ///
    /// # Panics
    /// Panics if there is no neighbour in that direction.
    pub(crate) fn add_road(
        &mut self,
        origin: IntersectionId,
        direction: Direction,
        length: usize,
    ) -> RoadId {
        let destination = self
            .neighbour(origin, direction)
            .expect("no neighbour in that direction");
        let end_direction = direction.opposite();
        let road = self
            .roads
            .insert_with_key(|id| Road::new(id, origin, destination, end_direction, length));
        self.intersections[origin].set_outgoing(direction, road);
        self.intersections[destination].set_incoming(end_direction, road);
        road
    }

    /// The road a vehicle would enter by taking `turning` at the end of the
    /// given road, if that turning is legal.
    pub(crate) fn turn_target(&self, road_id: RoadId, turning: Turning) -> Option<RoadId> {
        let road = &self.roads[road_id];
        self.intersections[road.destination()].outgoing(road.end_direction().turn(turning))
    }

    /// Adds a lane for the given turning at the end of a road.
    ///
    /// # Panics
    /// Panics if the turning is not legal at the road's destination.
    pub(crate) fn add_lane(&mut self, road_id: RoadId, turning: Turning) -> LaneId {
        let road_out = self
            .turn_target(road_id, turning)
            .expect("no outgoing road for that turning");
        let road = &self.roads[road_id];
        let (destination, direction) = (road.destination(), road.end_direction());
        let lane = self
            .lanes
            .insert_with_key(|id| Lane::new(id, road_id, road_out, destination, direction, turning));
        self.roads[road_id].set_lane(turning, lane);
        lane
    }

    pub(crate) fn intersection_mut(&mut self, id: IntersectionId) -> &mut Intersection {
        &mut self.intersections[id]
    }

    pub(crate) fn lane_mut(&mut self, id: LaneId) -> &mut Lane {
        &mut self.lanes[id]
    }

    #[cfg(test)]
    pub(crate) fn road_mut(&mut self, id: RoadId) -> &mut Road {
        &mut self.roads[id]
    }

    /// Advances one road by a tick; see [Road::update].
    pub(crate) fn update_road(
        &mut self,
        id: RoadId,
        vehicles: &mut VehicleSet,
        rng: &mut ChaCha8Rng,
        now: usize,
    ) -> usize {
        let RoadNetwork { roads, lanes, .. } = self;
        roads[id].update(lanes, vehicles, rng, now)
    }

    /// Advances one lane by a tick; see [Lane::update].
    pub(crate) fn update_lane(&mut self, id: LaneId, vehicles: &mut VehicleSet, flow: usize) {
        let RoadNetwork { roads, lanes, .. } = self;
        lanes[id].update(roads, vehicles, flow)
    }
}
