use crate::geom::{Direction, Turning};

/// A lane's movement through an intersection: the side it enters at and the
/// turn it makes.
pub type Movement = (Direction, Turning);

/// Whether two lanes may be green at once, indexed by the reference lane's
/// turning, the other lane's approach relative to the reference (clockwise
/// steps) and the other lane's turning.
///
/// Encodes standard right-of-way rules: same-approach lanes never conflict,
/// a left turn crosses the opposing straight and right flows, and right
/// turns get along with most movements from the adjacent approaches.
const COMPATIBLE: [[[bool; 3]; 4]; 3] = [
    // reference turns left
    [
        [true, true, true],   // same approach
        [false, false, true], // one step clockwise
        [true, false, false], // opposite approach
        [false, false, true], // one step anticlockwise
    ],
    // reference goes straight
    [
        [true, true, true],
        [false, false, true],
        [false, true, true],
        [false, false, false],
    ],
    // reference turns right
    [
        [true, true, true],
        [true, false, true],
        [false, true, true],
        [true, true, true],
    ],
];

/// Returns true if both movements can safely be green at the same time.
///
/// The relation is symmetric: swapping the arguments never changes the
/// answer.
pub fn compatible(reference: Movement, other: Movement) -> bool {
    let offset = other.0.offset_from(reference.0);
    COMPATIBLE[reference.1.index()][offset][other.1.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Direction, Turning};

    fn movements() -> impl Iterator<Item = Movement> {
        Direction::ALL
            .into_iter()
            .flat_map(|d| Turning::ALL.into_iter().map(move |t| (d, t)))
    }

    #[test]
    fn symmetric() {
        for a in movements() {
            for b in movements() {
                assert_eq!(
                    compatible(a, b),
                    compatible(b, a),
                    "asymmetric for {:?} vs {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn same_approach_never_conflicts() {
        for direction in Direction::ALL {
            for a in Turning::ALL {
                for b in Turning::ALL {
                    assert!(compatible((direction, a), (direction, b)));
                }
            }
        }
    }

    #[test]
    fn left_turn_crosses_opposing_traffic() {
        let left = (Direction::North, Turning::Left);
        assert!(!compatible(left, (Direction::South, Turning::Straight)));
        assert!(!compatible(left, (Direction::South, Turning::Right)));
        // Two opposing left turns pass in front of each other.
        assert!(compatible(left, (Direction::South, Turning::Left)));
    }

    #[test]
    fn right_turn_joins_adjacent_flows() {
        let right = (Direction::East, Turning::Right);
        assert!(compatible(right, (Direction::North, Turning::Straight)));
        assert!(compatible(right, (Direction::North, Turning::Left)));
        assert!(compatible(right, (Direction::South, Turning::Right)));
    }

    #[test]
    fn crossing_straights_conflict() {
        let straight = (Direction::North, Turning::Straight);
        assert!(!compatible(straight, (Direction::East, Turning::Straight)));
        assert!(!compatible(straight, (Direction::West, Turning::Straight)));
        assert!(compatible(straight, (Direction::South, Turning::Straight)));
    }
}
