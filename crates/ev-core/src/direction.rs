//! Approach directions at an intersection.

use std::str::FromStr;

use crate::{EvError, GeoPoint};

/// The side of an intersection a vehicle arrives from.
///
/// A vehicle heading north arrives on the **south** approach.  Signals in the
/// multi-direction model control exactly one approach each; simple four-state
/// lights have no approach (`Option<Approach>::None`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Approach {
    North,
    East,
    South,
    West,
}

impl Approach {
    pub const ALL: [Approach; 4] = [Approach::North, Approach::East, Approach::South, Approach::West];

    /// The approach used by a vehicle travelling from `from` to `to`.
    ///
    /// The dominant axis of the displacement decides; exact diagonals resolve
    /// to the east/west axis.  Returns `None` if the points coincide.
    pub fn of_travel(from: GeoPoint, to: GeoPoint) -> Option<Approach> {
        let d_north = to.lat - from.lat;
        let d_east = (to.lon - from.lon) * from.lat.to_radians().cos();
        if d_north == 0.0 && d_east == 0.0 {
            return None;
        }
        Some(if d_north.abs() > d_east.abs() {
            if d_north > 0.0 { Approach::South } else { Approach::North }
        } else if d_east > 0.0 {
            Approach::West
        } else {
            Approach::East
        })
    }

    /// Bit used by [`ApproachSet`] masks.
    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Approach::North => 0b0001,
            Approach::East  => 0b0010,
            Approach::South => 0b0100,
            Approach::West  => 0b1000,
        }
    }

    /// `true` if the two approaches carry crossing traffic.
    #[inline]
    pub fn conflicts_with(self, other: Approach) -> bool {
        self.is_north_south() != other.is_north_south()
    }

    #[inline]
    pub fn is_north_south(self) -> bool {
        matches!(self, Approach::North | Approach::South)
    }

    /// Single-letter label (`"N"`, `"E"`, …) used in CSV files.
    pub fn as_str(self) -> &'static str {
        match self {
            Approach::North => "N",
            Approach::East  => "E",
            Approach::South => "S",
            Approach::West  => "W",
        }
    }
}

/// Accepts the single letter or the full word, any case.
impl FromStr for Approach {
    type Err = EvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" | "NORTH" => Ok(Approach::North),
            "E" | "EAST"  => Ok(Approach::East),
            "S" | "SOUTH" => Ok(Approach::South),
            "W" | "WEST"  => Ok(Approach::West),
            _ => Err(EvError::UnknownApproach(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Approach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compact set of approaches, stored as a 4-bit mask.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApproachSet(u8);

impl ApproachSet {
    pub const EMPTY: ApproachSet = ApproachSet(0);

    #[inline]
    pub fn insert(&mut self, approach: Approach) {
        self.0 |= approach.bit();
    }

    #[inline]
    pub fn contains(self, approach: Approach) -> bool {
        self.0 & approach.bit() != 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in N, E, S, W order.
    pub fn iter(self) -> impl Iterator<Item = Approach> {
        Approach::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl FromIterator<Approach> for ApproachSet {
    fn from_iter<I: IntoIterator<Item = Approach>>(iter: I) -> Self {
        let mut set = ApproachSet::EMPTY;
        for a in iter {
            set.insert(a);
        }
        set
    }
}
