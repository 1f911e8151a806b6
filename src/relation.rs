//! Relation vocabulary: topological relations and compass directions.

/// Topological relation between an ordered pair of shapes (R, S).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyRelation {
    Disjoint,
    Equal,
    Inside,
    Contains,
    Meet,
    Covers,
    CoveredBy,
    Intersect,
}

impl TopologyRelation {
    /// The verb phrase used when rendering `R <verb> S`.
    pub fn verb(&self) -> &'static str {
        match self {
            TopologyRelation::Intersect => "intersects with",
            TopologyRelation::Contains => "contains",
            TopologyRelation::Disjoint => "is disjoint with",
            TopologyRelation::Equal => "is equal with",
            TopologyRelation::Covers => "covers",
            TopologyRelation::Meet => "is adjacent to",
            TopologyRelation::CoveredBy => "is covered by",
            TopologyRelation::Inside => "is inside of",
        }
    }

    /// The relation seen from the other side of the pair: rendering (S, R)
    /// with the swapped relation is equivalent to (R, S) with the original.
    pub fn swapped(&self) -> Self {
        match self {
            TopologyRelation::Inside => TopologyRelation::Contains,
            TopologyRelation::Contains => TopologyRelation::Inside,
            TopologyRelation::Covers => TopologyRelation::CoveredBy,
            TopologyRelation::CoveredBy => TopologyRelation::Covers,
            TopologyRelation::Meet
            | TopologyRelation::Equal
            | TopologyRelation::Intersect
            | TopologyRelation::Disjoint => *self,
        }
    }

    /// True when the pair has no interior overlap, which is when a cardinal
    /// direction is worth reporting.
    pub fn is_directional(&self) -> bool {
        matches!(self, TopologyRelation::Meet | TopologyRelation::Disjoint)
    }
}

/// One of the eight compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalDirection {
    North,
    South,
    East,
    West,
    Northwest,
    Northeast,
    Southwest,
    Southeast,
}

impl CardinalDirection {
    /// Lower-case direction name as it appears in rendered text.
    pub fn name(&self) -> &'static str {
        match self {
            CardinalDirection::North => "north",
            CardinalDirection::South => "south",
            CardinalDirection::West => "west",
            CardinalDirection::East => "east",
            CardinalDirection::Northwest => "northwest",
            CardinalDirection::Northeast => "northeast",
            CardinalDirection::Southwest => "southwest",
            CardinalDirection::Southeast => "southeast",
        }
    }

    /// Maps an angle in degrees, normalized to `[0, 360)`, onto its sector.
    /// Sectors are 45 degrees wide and centred on the cardinals, so east
    /// wraps around zero: `[337.5, 360) ∪ [0, 22.5)`.
    pub fn from_angle(angle: f64) -> Self {
        if !(22.5..337.5).contains(&angle) {
            CardinalDirection::East
        } else if angle < 67.5 {
            CardinalDirection::Northeast
        } else if angle < 112.5 {
            CardinalDirection::North
        } else if angle < 157.5 {
            CardinalDirection::Northwest
        } else if angle < 202.5 {
            CardinalDirection::West
        } else if angle < 247.5 {
            CardinalDirection::Southwest
        } else if angle < 292.5 {
            CardinalDirection::South
        } else {
            CardinalDirection::Southeast
        }
    }

    /// The direction after a 180 degree rotation, used for the reverse
    /// rendering of a pair.
    pub fn opposite(&self) -> Self {
        match self {
            CardinalDirection::East => CardinalDirection::West,
            CardinalDirection::West => CardinalDirection::East,
            CardinalDirection::North => CardinalDirection::South,
            CardinalDirection::South => CardinalDirection::North,
            CardinalDirection::Northeast => CardinalDirection::Southwest,
            CardinalDirection::Northwest => CardinalDirection::Southeast,
            CardinalDirection::Southeast => CardinalDirection::Northwest,
            CardinalDirection::Southwest => CardinalDirection::Northeast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped_relations() {
        assert_eq!(
            TopologyRelation::Inside.swapped(),
            TopologyRelation::Contains
        );
        assert_eq!(
            TopologyRelation::Covers.swapped(),
            TopologyRelation::CoveredBy
        );
        assert_eq!(TopologyRelation::Meet.swapped(), TopologyRelation::Meet);
        assert_eq!(TopologyRelation::Equal.swapped(), TopologyRelation::Equal);
        for relation in [
            TopologyRelation::Disjoint,
            TopologyRelation::Equal,
            TopologyRelation::Inside,
            TopologyRelation::Contains,
            TopologyRelation::Meet,
            TopologyRelation::Covers,
            TopologyRelation::CoveredBy,
            TopologyRelation::Intersect,
        ] {
            assert_eq!(relation.swapped().swapped(), relation);
        }
    }

    #[test]
    fn test_sector_boundaries() {
        assert_eq!(CardinalDirection::from_angle(0.0), CardinalDirection::East);
        assert_eq!(
            CardinalDirection::from_angle(22.4),
            CardinalDirection::East
        );
        assert_eq!(
            CardinalDirection::from_angle(22.5),
            CardinalDirection::Northeast
        );
        assert_eq!(
            CardinalDirection::from_angle(90.0),
            CardinalDirection::North
        );
        assert_eq!(
            CardinalDirection::from_angle(180.0),
            CardinalDirection::West
        );
        assert_eq!(
            CardinalDirection::from_angle(270.0),
            CardinalDirection::South
        );
        assert_eq!(
            CardinalDirection::from_angle(337.5),
            CardinalDirection::East
        );
        assert_eq!(
            CardinalDirection::from_angle(359.99),
            CardinalDirection::East
        );
    }

    #[test]
    fn test_from_angle_total_and_opposite_consistent() {
        // Sweep the whole circle: every angle maps to a sector, and the
        // sector of the rotated angle is the opposite sector.
        let mut angle = 0.0;
        while angle < 360.0 {
            let direction = CardinalDirection::from_angle(angle);
            let rotated = (angle + 180.0) % 360.0;
            assert_eq!(
                direction.opposite(),
                CardinalDirection::from_angle(rotated),
                "angle {angle}"
            );
            angle += 0.25;
        }
    }
}
