use crate::util::Interval;

/// Parameters for network construction and simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// The number of intersection columns.
    pub grid_width: usize,
    /// The number of intersection rows.
    pub grid_height: usize,
    /// The probability of a road towards each neighbouring intersection.
    pub road_probability: f64,
    /// The probability of a lane for each legal turning at the end of a road.
    pub lane_probability: f64,
    /// The number of ticks it takes to travel a road.
    pub road_length: usize,
    /// Bounds on the initial vehicle population.
    pub vehicle_count: Interval<usize>,
    /// Bounds on the number of roads a vehicle drives before finishing.
    pub trip_roads: Interval<usize>,
    /// The number of ticks between scheduling decisions at an intersection.
    pub light_period: usize,
    /// The base number of vehicles a green lane discharges per tick.
    pub flow_capacity: usize,
    /// Standard deviation of the per-tick perturbation of the discharge rate.
    pub flow_jitter: f64,
    /// Seed for the simulation RNG.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 10,
            grid_height: 10,
            road_probability: 0.9,
            lane_probability: 0.9,
            road_length: 1,
            vehicle_count: Interval::new(1500, 1500),
            trip_roads: Interval::new(20, 25),
            light_period: 1,
            flow_capacity: 5,
            flow_jitter: 0.0,
            seed: 42,
        }
    }
}
