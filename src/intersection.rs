use crate::geom::Direction;
use crate::RoadId;

/// A grid node where roads meet.
#[derive(Clone, Debug)]
pub struct Intersection {
    /// Column on the grid.
    x: usize,
    /// Row on the grid.
    y: usize,
    /// The roads leaving this intersection, by the direction they head in.
    outgoing: [Option<RoadId>; 4],
    /// The roads arriving here, by the side of the intersection they enter
    /// at. These are back-references; each road is owned by its origin.
    incoming: [Option<RoadId>; 4],
    /// Whether any lane at this intersection is light controlled.
    has_traffic_lights: bool,
    /// The number of ticks between scheduling decisions.
    light_period: usize,
}

impl Intersection {
    pub(crate) fn new(x: usize, y: usize, light_period: usize) -> Self {
        Self {
            x,
            y,
            outgoing: [None; 4],
            incoming: [None; 4],
            has_traffic_lights: false,
            light_period,
        }
    }

    /// The `(x, y)` position on the grid.
    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// The road heading in the given direction, if there is one.
    pub fn outgoing(&self, direction: Direction) -> Option<RoadId> {
        self.outgoing[direction.index()]
    }

    /// The road entering at the given side, if there is one.
    pub fn incoming(&self, direction: Direction) -> Option<RoadId> {
        self.incoming[direction.index()]
    }

    /// Iterates over the roads leaving this intersection.
    pub fn outgoing_roads(&self) -> impl Iterator<Item = RoadId> + '_ {
        self.outgoing.iter().flatten().copied()
    }

    /// Iterates over the roads arriving at this intersection.
    pub fn incoming_roads(&self) -> impl Iterator<Item = RoadId> + '_ {
        self.incoming.iter().flatten().copied()
    }

    /// Whether any lane at this intersection is light controlled.
    pub fn has_traffic_lights(&self) -> bool {
        self.has_traffic_lights
    }

    /// The number of ticks between scheduling decisions.
    pub fn light_period(&self) -> usize {
        self.light_period
    }

    /// True if a road leaves from any side other than `except`.
    pub(crate) fn has_outgoing_besides(&self, except: Direction) -> bool {
        Direction::ALL
            .into_iter()
            .any(|d| d != except && self.outgoing(d).is_some())
    }

    /// True if a road arrives at any side other than `except`.
    pub(crate) fn has_incoming_besides(&self, except: Direction) -> bool {
        Direction::ALL
            .into_iter()
            .any(|d| d != except && self.incoming(d).is_some())
    }

    pub(crate) fn set_outgoing(&mut self, direction: Direction, road: RoadId) {
        debug_assert!(self.outgoing[direction.index()].is_none());
        self.outgoing[direction.index()] = Some(road);
    }

    pub(crate) fn set_incoming(&mut self, direction: Direction, road: RoadId) {
        debug_assert!(self.incoming[direction.index()].is_none());
        self.incoming[direction.index()] = Some(road);
    }

    pub(crate) fn mark_traffic_lights(&mut self) {
        self.has_traffic_lights = true;
    }
}
