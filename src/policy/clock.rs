use crate::geom::{Direction, Turning};
use crate::lane::LightState;
use crate::network::RoadNetwork;
use crate::{IntersectionId, LaneId};
use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use slotmap::SecondaryMap;

/// Round-robin scheduling: the approaches take turns holding the green, in
/// an order shuffled once at setup.
#[derive(Default)]
pub struct Clock {
    rotations: SecondaryMap<IntersectionId, Rotation>,
}

/// The rotation state of one intersection.
struct Rotation {
    /// The lanes granted green together, one group per lighted approach.
    groups: Vec<ArrayVec<LaneId, 4>>,
    /// The group currently holding the green.
    current: usize,
    /// Whether the first grant has happened.
    started: bool,
}

impl Clock {
    /// Precomputes the lane groups for every light-controlled intersection.
    pub(crate) fn setup(&mut self, network: &RoadNetwork, rng: &mut ChaCha8Rng) {
        self.rotations.clear();
        for (id, intersection) in network.iter_intersections() {
            if !intersection.has_traffic_lights() {
                continue;
            }
            let mut groups = Vec::new();
            for direction in Direction::ALL {
                let Some(road_id) = intersection.incoming(direction) else {
                    continue;
                };
                let mut group: ArrayVec<LaneId, 4> = network
                    .road(road_id)
                    .lanes()
                    .filter(|lane| network.lane(*lane).has_traffic_light())
                    .collect();
                if group.is_empty() {
                    continue;
                }
                // Right turns merge without crossing anything the main
                // approach crosses, so the next approach's right lane is
                // granted alongside.
                if let Some(road_id) = intersection.incoming(direction.next()) {
                    if let Some(lane_id) = network.road(road_id).lane(Turning::Right) {
                        if network.lane(lane_id).has_traffic_light() {
                            group.push(lane_id);
                        }
                    }
                }
                groups.push(group);
            }
            groups.shuffle(rng);
            self.rotations.insert(
                id,
                Rotation {
                    groups,
                    current: 0,
                    started: false,
                },
            );
        }
    }

    /// Turns the current group red and the next group green.
    pub(crate) fn update(&mut self, network: &mut RoadNetwork, at: IntersectionId) {
        let Some(rotation) = self.rotations.get_mut(at) else {
            return;
        };
        if rotation.groups.is_empty() {
            return;
        }
        if rotation.started {
            for &lane_id in &rotation.groups[rotation.current] {
                network.lane_mut(lane_id).set_light(LightState::Red);
            }
            rotation.current = (rotation.current + 1) % rotation.groups.len();
        } else {
            rotation.started = true;
        }
        for &lane_id in &rotation.groups[rotation.current] {
            network.lane_mut(lane_id).set_light(LightState::Green);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::dense_grid;
    use rand::SeedableRng;

    fn green_lanes(network: &RoadNetwork, at: IntersectionId) -> Vec<LaneId> {
        network
            .lanes_at(at)
            .into_iter()
            .filter(|id| network.lane(*id).light() == LightState::Green)
            .collect()
    }

    /// The approach holding the green, i.e. the direction most greens share.
    fn main_direction(network: &RoadNetwork, greens: &[LaneId]) -> Direction {
        Direction::ALL
            .into_iter()
            .max_by_key(|d| {
                greens
                    .iter()
                    .filter(|id| network.lane(**id).direction() == *d)
                    .count()
            })
            .unwrap()
    }

    #[test]
    fn grants_one_approach_plus_the_next_right_turn() {
        let (mut network, _, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut clock = Clock::default();
        clock.setup(&network, &mut rng);

        clock.update(&mut network, centre);
        let greens = green_lanes(&network, centre);
        assert_eq!(greens.len(), 4);

        // Three of the greens share an approach; the fourth is the right
        // lane of the next approach clockwise.
        let direction = main_direction(&network, &greens);
        let own: Vec<_> = greens
            .iter()
            .filter(|id| network.lane(**id).direction() == direction)
            .collect();
        assert_eq!(own.len(), 3);
        let extra = greens
            .iter()
            .find(|id| network.lane(**id).direction() != direction)
            .unwrap();
        assert_eq!(network.lane(*extra).direction(), direction.next());
        assert_eq!(network.lane(*extra).turning(), Turning::Right);
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn rotates_one_approach_per_update() {
        let (mut network, _, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut clock = Clock::default();
        clock.setup(&network, &mut rng);

        clock.update(&mut network, centre);
        let first = green_lanes(&network, centre);
        let first_direction = main_direction(&network, &first);

        clock.update(&mut network, centre);
        let second = green_lanes(&network, centre);
        assert_eq!(second.len(), 4);
        let second_direction = main_direction(&network, &second);
        assert_ne!(first_direction, second_direction);

        // The previous approach's own lanes went back to red, unless one of
        // them doubles as the new group's right-turn grant.
        for lane_id in first {
            let lane = network.lane(lane_id);
            if lane.direction() == first_direction && !second.contains(&lane_id) {
                assert_eq!(lane.light(), LightState::Red);
            }
        }
        assert!(network.greens_compatible(centre));
    }

    #[test]
    fn cycles_through_all_four_approaches() {
        let (mut network, _, centre) = dense_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut clock = Clock::default();
        clock.setup(&network, &mut rng);

        let mut seen = Vec::new();
        for _ in 0..4 {
            clock.update(&mut network, centre);
            let greens = green_lanes(&network, centre);
            seen.push(main_direction(&network, &greens));
        }
        for direction in Direction::ALL {
            assert!(seen.contains(&direction), "{direction:?} never got green");
        }
    }
}
