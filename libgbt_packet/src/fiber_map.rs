// Each region reads four fibers, one per plane slot of the packet. Even and odd
// regions are wired to different detector layers, so the label of the fiber that
// lands in a given slot depends only on the parity of the region number:
//
// even -> [x0, x1, u0, v0]
// odd  -> [u1, v1, x0, x2]
use std::fmt;

use super::constants::NUMBER_OF_PLANES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiberLabel {
    X0,
    X1,
    X2,
    U0,
    U1,
    V0,
    V1,
}

impl fmt::Display for FiberLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X0 => "x0",
            Self::X1 => "x1",
            Self::X2 => "x2",
            Self::U0 => "u0",
            Self::U1 => "u1",
            Self::V0 => "v0",
            Self::V1 => "v1",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionParity {
    Even,
    Odd,
}

impl RegionParity {
    pub fn from_region(region: u32) -> Self {
        if region % 2 == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }
}

const EVEN_FIBERS: [FiberLabel; NUMBER_OF_PLANES as usize] =
    [FiberLabel::X0, FiberLabel::X1, FiberLabel::U0, FiberLabel::V0];
const ODD_FIBERS: [FiberLabel; NUMBER_OF_PLANES as usize] =
    [FiberLabel::U1, FiberLabel::V1, FiberLabel::X0, FiberLabel::X2];

/// The fiber labels of the four plane slots for a region parity
pub fn fiber_labels(parity: RegionParity) -> [FiberLabel; NUMBER_OF_PLANES as usize] {
    match parity {
        RegionParity::Even => EVEN_FIBERS,
        RegionParity::Odd => ODD_FIBERS,
    }
}

/// The fiber label at a slot of a region's table.
///
/// Slots past the fourth have no label and give None.
pub fn fiber_for_slot(region: u32, slot: usize) -> Option<FiberLabel> {
    fiber_labels(RegionParity::from_region(region))
        .get(slot)
        .copied()
}

//Unit tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_tables() {
        let even: Vec<String> = fiber_labels(RegionParity::from_region(20))
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(even, vec!["x0", "x1", "u0", "v0"]);
        let odd: Vec<String> = fiber_labels(RegionParity::from_region(21))
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(odd, vec!["u1", "v1", "x0", "x2"]);
    }

    #[test]
    fn test_fiber_for_slot() {
        assert_eq!(fiber_for_slot(22, 3), Some(FiberLabel::V0));
        assert_eq!(fiber_for_slot(23, 2), Some(FiberLabel::X0));
        assert_eq!(fiber_for_slot(23, 4), None);
    }
}
