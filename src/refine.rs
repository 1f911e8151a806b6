//! Topological refinement: DE-9IM mask matching dispatched by MBR case,
//! plus the cardinal-direction and common-area computations that hang off
//! the refined relation.

use crate::relation::{CardinalDirection, TopologyRelation};
use crate::shape::Shape;

/// How the two MBRs of a candidate pair relate; decides which refinement
/// table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbrCase {
    /// R's MBR lies within S's.
    RInS,
    /// S's MBR lies within R's.
    SInR,
    /// The MBRs coincide (within epsilon).
    Equal,
    /// The MBRs form a strict "+" cross.
    Cross,
    /// The MBRs overlap some other way.
    Intersect,
}

// DE-9IM masks, one string per alternative. A relation matches when any of
// its masks matches the pair's matrix code.
const DISJOINT_MASKS: [&str; 1] = ["FF*FF****"];
const INSIDE_MASKS: [&str; 1] = ["T*F**F***"];
const COVERED_BY_MASKS: [&str; 4] = ["T*F**F***", "*TF**F***", "**FT*F***", "**F*TF***"];
const CONTAINS_MASKS: [&str; 1] = ["T*****FF*"];
const COVERS_MASKS: [&str; 4] = ["T*****FF*", "*T****FF*", "***T**FF*", "****T*FF*"];
const MEET_MASKS: [&str; 3] = ["FT*******", "F**T*****", "F***T****"];
const EQUAL_MASKS: [&str; 1] = ["T*F**FFF*"];
const INTERSECT_MASKS: [&str; 4] = ["T********", "*T*******", "***T*****", "****T****"];

/// The mask alternatives for a relation, as used by the refiners.
pub fn masks_for(relation: TopologyRelation) -> &'static [&'static str] {
    match relation {
        TopologyRelation::Disjoint => &DISJOINT_MASKS,
        TopologyRelation::Inside => &INSIDE_MASKS,
        TopologyRelation::CoveredBy => &COVERED_BY_MASKS,
        TopologyRelation::Contains => &CONTAINS_MASKS,
        TopologyRelation::Covers => &COVERS_MASKS,
        TopologyRelation::Meet => &MEET_MASKS,
        TopologyRelation::Equal => &EQUAL_MASKS,
        TopologyRelation::Intersect => &INTERSECT_MASKS,
    }
}

fn char_matches(code: u8, mask: u8) -> bool {
    match mask {
        b'*' => true,
        b'T' => code != b'F',
        b'F' => code == b'F',
        _ => false,
    }
}

/// Match a nine-character DE-9IM code against one mask.
pub fn mask_matches(code: &str, mask: &str) -> bool {
    debug_assert_eq!(code.len(), 9);
    debug_assert_eq!(mask.len(), 9);
    code.bytes()
        .zip(mask.bytes())
        .all(|(c, m)| char_matches(c, m))
}

fn matches_any(code: &str, masks: &[&str]) -> bool {
    masks.iter().any(|mask| mask_matches(code, mask))
}

fn matches_relation(code: &str, relation: TopologyRelation) -> bool {
    matches_any(code, masks_for(relation))
}

/// R's MBR inside S's: R can only be within or on the border of S.
fn refine_disjoint_inside_coveredby_meet_intersect(code: &str) -> TopologyRelation {
    if matches_relation(code, TopologyRelation::Disjoint) {
        return TopologyRelation::Disjoint;
    }
    if matches_relation(code, TopologyRelation::CoveredBy) {
        // inside is the border-free subset of covered by
        if matches_relation(code, TopologyRelation::Inside) {
            return TopologyRelation::Inside;
        }
        return TopologyRelation::CoveredBy;
    }
    if matches_relation(code, TopologyRelation::Meet) {
        return TopologyRelation::Meet;
    }
    TopologyRelation::Intersect
}

/// S's MBR inside R's: mirrored containment candidates.
fn refine_disjoint_contains_covers_meet_intersect(code: &str) -> TopologyRelation {
    if matches_relation(code, TopologyRelation::Disjoint) {
        return TopologyRelation::Disjoint;
    }
    if matches_relation(code, TopologyRelation::Covers) {
        if matches_relation(code, TopologyRelation::Contains) {
            return TopologyRelation::Contains;
        }
        return TopologyRelation::Covers;
    }
    if matches_relation(code, TopologyRelation::Meet) {
        return TopologyRelation::Meet;
    }
    TopologyRelation::Intersect
}

/// Equal MBRs: equality first (it is a subset of both covers and covered
/// by), then the cover relations collapsed onto contains/inside so the
/// rendered output stays consistent.
fn refine_equal_covers_coveredby_intersect(code: &str) -> TopologyRelation {
    if matches_relation(code, TopologyRelation::Equal) {
        return TopologyRelation::Equal;
    }
    if matches_relation(code, TopologyRelation::Covers) {
        return TopologyRelation::Contains;
    }
    if matches_relation(code, TopologyRelation::CoveredBy) {
        return TopologyRelation::Inside;
    }
    TopologyRelation::Intersect
}

/// Generic MBR overlap: no containment is possible.
fn refine_disjoint_meet_intersect(code: &str) -> TopologyRelation {
    if matches_relation(code, TopologyRelation::Disjoint) {
        return TopologyRelation::Disjoint;
    }
    if matches_relation(code, TopologyRelation::Meet) {
        return TopologyRelation::Meet;
    }
    TopologyRelation::Intersect
}

/// Refine a candidate pair under its MBR case. The CROSS case skips the
/// matrix entirely: crossing MBRs always intersect.
pub fn refine(r: &Shape, s: &Shape, case: MbrCase) -> TopologyRelation {
    if case == MbrCase::Cross {
        return TopologyRelation::Intersect;
    }
    let code = r.de9im_code(s);
    match case {
        MbrCase::RInS => refine_disjoint_inside_coveredby_meet_intersect(&code),
        MbrCase::SInR => refine_disjoint_contains_covers_meet_intersect(&code),
        MbrCase::Equal => refine_equal_covers_coveredby_intersect(&code),
        MbrCase::Intersect => refine_disjoint_meet_intersect(&code),
        MbrCase::Cross => unreachable!("handled above"),
    }
}

/// Compass direction from S towards R, from the centroid-to-centroid angle.
pub fn cardinal_direction_between(r: &Shape, s: &Shape) -> CardinalDirection {
    let centroid_r = r.centroid();
    let centroid_s = s.centroid();
    let dx = centroid_r.x() - centroid_s.x();
    let dy = centroid_r.y() - centroid_s.y();
    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    CardinalDirection::from_angle(angle)
}

/// Common area of the pair in square kilometers, decided by the relation:
/// containment takes the contained shape's area, true overlap is clipped.
pub fn common_area_km2(r: &Shape, s: &Shape, relation: TopologyRelation) -> f64 {
    match relation {
        TopologyRelation::Disjoint | TopologyRelation::Meet => 0.0,
        TopologyRelation::Contains | TopologyRelation::Covers | TopologyRelation::Equal => {
            s.area_km2()
        }
        TopologyRelation::Inside | TopologyRelation::CoveredBy => r.area_km2(),
        TopologyRelation::Intersect => r.intersection_area_km2(s),
    }
}
