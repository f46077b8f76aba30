use super::{all_lights_red, retain_compatible};
use crate::lane::LightState;
use crate::network::RoadNetwork;
use crate::{IntersectionId, LaneId};
use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use slotmap::SecondaryMap;

/// Grants green in order of arrival at the intersection.
///
/// Each tick the earliest-arrived lane is granted first, then as many later
/// arrivals as remain conflict-free with everything already green.
#[derive(Default)]
pub struct FirstComeFirstServe {
    /// Per intersection: the lanes with waiting vehicles, earliest first.
    arrivals: SecondaryMap<IntersectionId, Vec<LaneId>>,
}

impl FirstComeFirstServe {
    /// Creates an empty arrival queue per light-controlled intersection.
    pub(crate) fn setup(&mut self, network: &RoadNetwork) {
        self.arrivals.clear();
        for (id, intersection) in network.iter_intersections() {
            if intersection.has_traffic_lights() {
                self.arrivals.insert(id, Vec::new());
            }
        }
    }

    pub(crate) fn update(
        &mut self,
        network: &mut RoadNetwork,
        at: IntersectionId,
        rng: &mut ChaCha8Rng,
    ) {
        let Some(queue) = self.arrivals.get_mut(at) else {
            return;
        };

        // Lane update order would otherwise decide ties between same-tick
        // arrivals, so newcomers are appended in a shuffled order.
        let mut occupied: ArrayVec<LaneId, 12> = network
            .lanes_at(at)
            .into_iter()
            .filter(|id| network.lane(*id).queue_len() > 0)
            .collect();
        occupied.shuffle(rng);
        for lane_id in occupied {
            if !queue.contains(&lane_id) {
                queue.push(lane_id);
            }
        }

        all_lights_red(network, at);

        let mut options: ArrayVec<LaneId, 12> = queue.iter().copied().collect();
        while !options.is_empty() {
            let lane_id = options.remove(0);
            network.lane_mut(lane_id).set_light(LightState::Green);
            retain_compatible(network, lane_id, &mut options);
            queue.retain(|id| *id != lane_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::{dense_grid, fill_lane};
    use rand::SeedableRng;

    /// Picks the lane entering at `direction` making `turning` at the centre.
    fn lane_at(
        network: &RoadNetwork,
        at: IntersectionId,
        movement: crate::conflict::Movement,
    ) -> LaneId {
        network
            .lanes_at(at)
            .into_iter()
            .find(|id| network.lane(*id).movement() == movement)
            .unwrap()
    }

    #[test]
    fn lone_arrival_is_granted_at_once() {
        use crate::geom::{Direction, Turning};

        let (mut network, mut vehicles, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut policy = FirstComeFirstServe::default();
        policy.setup(&network);

        let lane = lane_at(&network, centre, (Direction::South, Turning::Straight));
        fill_lane(&mut network, &mut vehicles, lane, 1);
        policy.update(&mut network, centre, &mut rng);
        assert_eq!(network.lane(lane).light(), LightState::Green);
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn conflicting_queues_alternate() {
        use crate::geom::{Direction, Turning};

        let (mut network, mut vehicles, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut policy = FirstComeFirstServe::default();
        policy.setup(&network);

        // Two crossing straight queues form in the same tick. One of them is
        // granted; the loser stays at the head of the arrival queue, so it
        // must be granted the following tick while the winner, re-appended
        // behind it, goes red. With no discharge the two keep alternating.
        let a = lane_at(&network, centre, (Direction::South, Turning::Straight));
        let b = lane_at(&network, centre, (Direction::West, Turning::Straight));
        fill_lane(&mut network, &mut vehicles, a, 1);
        fill_lane(&mut network, &mut vehicles, b, 1);

        policy.update(&mut network, centre, &mut rng);
        let (winner, loser) = if network.lane(a).light() == LightState::Green {
            (a, b)
        } else {
            (b, a)
        };
        assert_eq!(network.lane(winner).light(), LightState::Green);
        assert_eq!(network.lane(loser).light(), LightState::Red);

        for _ in 0..3 {
            policy.update(&mut network, centre, &mut rng);
            assert_eq!(network.lane(loser).light(), LightState::Green);
            assert_eq!(network.lane(winner).light(), LightState::Red);
            policy.update(&mut network, centre, &mut rng);
            assert_eq!(network.lane(winner).light(), LightState::Green);
            assert_eq!(network.lane(loser).light(), LightState::Red);
        }
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn grants_every_compatible_waiting_lane() {
        use crate::geom::{Direction, Turning};

        let (mut network, mut vehicles, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut policy = FirstComeFirstServe::default();
        policy.setup(&network);

        let a = lane_at(&network, centre, (Direction::South, Turning::Straight));
        let b = lane_at(&network, centre, (Direction::North, Turning::Straight));
        fill_lane(&mut network, &mut vehicles, a, 2);
        fill_lane(&mut network, &mut vehicles, b, 2);
        policy.update(&mut network, centre, &mut rng);

        // Opposing straights are compatible, so both go green together.
        assert_eq!(network.lane(a).light(), LightState::Green);
        assert_eq!(network.lane(b).light(), LightState::Green);
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn empty_intersection_stays_red() {
        let (mut network, _, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut policy = FirstComeFirstServe::default();
        policy.setup(&network);

        policy.update(&mut network, centre, &mut rng);
        for lane_id in network.lanes_at(centre) {
            assert_eq!(network.lane(lane_id).light(), LightState::Red);
        }
    }
}
