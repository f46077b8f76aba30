use super::{all_lights_red, retain_compatible, take_highest};
use crate::lane::LightState;
use crate::network::RoadNetwork;
use crate::IntersectionId;

/// Greedy scheduling on queue length: the longest waiting queue is granted
/// first, then the longest of whatever remains conflict-free, and so on.
#[derive(Default)]
pub struct LocalOptimum;

impl LocalOptimum {
    pub(crate) fn update(&self, network: &mut RoadNetwork, at: IntersectionId) {
        all_lights_red(network, at);
        let mut options = network.lighted_lanes_at(at);
        while !options.is_empty() {
            let lane_id = take_highest(&mut options, |id| network.lane(id).queue_len() as f64);
            network.lane_mut(lane_id).set_light(LightState::Green);
            retain_compatible(network, lane_id, &mut options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::Movement;
    use crate::geom::{Direction, Turning};
    use crate::policy::test_support::{dense_grid, fill_lane};
    use crate::LaneId;

    fn lane_at(network: &RoadNetwork, at: IntersectionId, movement: Movement) -> LaneId {
        network
            .lanes_at(at)
            .into_iter()
            .find(|id| network.lane(*id).movement() == movement)
            .unwrap()
    }

    #[test]
    fn longest_queue_beats_its_conflicts() {
        let (mut network, mut vehicles, centre) = dense_grid();

        // Four pairwise compatible movements, except that the two straights
        // cross: queue lengths 5, 3, 0 and 2.
        let a = lane_at(&network, centre, (Direction::North, Turning::Straight));
        let b = lane_at(&network, centre, (Direction::East, Turning::Straight));
        let c = lane_at(&network, centre, (Direction::East, Turning::Right));
        let d = lane_at(&network, centre, (Direction::South, Turning::Right));
        fill_lane(&mut network, &mut vehicles, a, 5);
        fill_lane(&mut network, &mut vehicles, b, 3);
        fill_lane(&mut network, &mut vehicles, d, 2);

        LocalOptimum.update(&mut network, centre);

        assert_eq!(network.lane(a).light(), LightState::Green);
        assert_eq!(network.lane(b).light(), LightState::Red);
        assert_eq!(network.lane(c).light(), LightState::Green);
        assert_eq!(network.lane(d).light(), LightState::Green);
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn resolution_covers_every_lane() {
        let (mut network, mut vehicles, centre) = dense_grid();
        for (index, lane_id) in network.lanes_at(centre).into_iter().enumerate() {
            fill_lane(&mut network, &mut vehicles, lane_id, index % 4);
        }

        LocalOptimum.update(&mut network, centre);

        // Every lane ends up decided: green, or red because a conflicting
        // green beat it.
        assert!(network.greens_compatible(centre));
        let any_green = network
            .lanes_at(centre)
            .into_iter()
            .any(|id| network.lane(id).light() == LightState::Green);
        assert!(any_green);
    }
}
