use super::{all_lights_red, retain_compatible, take_highest};
use crate::lane::LightState;
use crate::network::RoadNetwork;
use crate::IntersectionId;

/// Greedy scheduling on queue length plus the backlog about to arrive.
///
/// Each incoming road's last section is about to reach the intersection, so
/// its occupancy is split evenly across that road's lanes and added to the
/// queue lengths before comparison. The split covers all of a road's lanes,
/// light controlled or not.
#[derive(Default)]
pub struct GlobalOptimum;

impl GlobalOptimum {
    pub(crate) fn update(&self, network: &mut RoadNetwork, at: IntersectionId) {
        all_lights_red(network, at);
        let mut options = network.lighted_lanes_at(at);
        while !options.is_empty() {
            let lane_id = take_highest(&mut options, |id| {
                let lane = network.lane(id);
                let road = network.road(lane.road_in());
                lane.queue_len() as f64
                    + road.last_section_len() as f64 / road.num_lanes() as f64
            });
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
    use crate::vehicle::Vehicle;
    use crate::LaneId;

    fn lane_at(network: &RoadNetwork, at: IntersectionId, movement: Movement) -> LaneId {
        network
            .lanes_at(at)
            .into_iter()
            .find(|id| network.lane(*id).movement() == movement)
            .unwrap()
    }

    #[test]
    fn backlog_outweighs_a_longer_queue() {
        let (mut network, mut vehicles, centre) = dense_grid();

        // Two crossing straights: one has the longer queue, the other has a
        // full section about to arrive on its road.
        let a = lane_at(&network, centre, (Direction::North, Turning::Straight));
        let b = lane_at(&network, centre, (Direction::East, Turning::Straight));
        fill_lane(&mut network, &mut vehicles, a, 2);
        fill_lane(&mut network, &mut vehicles, b, 1);

        let road_b = network.lane(b).road_in();
        for _ in 0..9 {
            let id = vehicles.insert_with_key(|id| Vehicle::new(id, 5, b, false));
            network.road_mut(road_b).enter(id);
        }

        GlobalOptimum.update(&mut network, centre);

        // Lane b scores 1 + 9/3 = 4 against lane a's 2, so the backlog
        // flips the decision LocalOptimum would have made.
        assert_eq!(network.lane(b).light(), LightState::Green);
        assert_eq!(network.lane(a).light(), LightState::Red);
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn without_backlog_it_matches_local_optimum() {
        let (mut network, mut vehicles, centre) = dense_grid();
        let a = lane_at(&network, centre, (Direction::North, Turning::Straight));
        let b = lane_at(&network, centre, (Direction::East, Turning::Straight));
        fill_lane(&mut network, &mut vehicles, a, 3);
        fill_lane(&mut network, &mut vehicles, b, 1);

        GlobalOptimum.update(&mut network, centre);
        assert_eq!(network.lane(a).light(), LightState::Green);
        assert_eq!(network.lane(b).light(), LightState::Red);
    }
}
