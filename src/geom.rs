/// The four orthogonal directions, in clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

/// The turn a vehicle makes when it leaves a road.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Turning {
    Left = 0,
    Straight = 1,
    Right = 2,
}

impl Direction {
    /// All directions, in ordinal order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The ordinal of the direction, `0..4`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The direction with the given ordinal, wrapping modulo 4.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// The next direction clockwise.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The direction pointing the opposite way.
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// The direction a vehicle heads in after turning.
    ///
    /// `self` is the side of the intersection the vehicle enters at, so going
    /// straight comes out two steps around, a left turn one step short of
    /// that and a right turn one step past it.
    pub fn turn(self, turning: Turning) -> Self {
        Self::from_index(self.index() + 1 + turning.index())
    }

    /// Clockwise steps from `reference` around to `self`, `0..4`.
    pub fn offset_from(self, reference: Direction) -> usize {
        (self.index() + 4 - reference.index()) % 4
    }

    /// The grid-coordinate step taken when travelling in this direction.
    pub(crate) fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

impl Turning {
    /// All turnings, in ordinal order.
    pub const ALL: [Turning; 3] = [Turning::Left, Turning::Straight, Turning::Right];

    /// The ordinal of the turning, `0..3`.
    pub fn index(self) -> usize {
        self as usize
    }
}
