//! Text generation for rendered relations.
//!
//! Every generator returns a sentence fragment ending in `". "` so callers
//! can concatenate them into sentence groups or entity paragraphs.

use crate::relation::{CardinalDirection, TopologyRelation};
use crate::EPS;

/// `"<R> is <direction> of <S>. "`
pub fn directional_relation(name_r: &str, name_s: &str, direction: CardinalDirection) -> String {
    format!("{name_r} is {} of {name_s}. ", direction.name())
}

/// `"<R> <verb> <S>. "`
pub fn topological_relation(name_r: &str, name_s: &str, relation: TopologyRelation) -> String {
    format!("{name_r} {} {name_s}. ", relation.verb())
}

/// `"<R> and <S> have approximately <area> square kilometers of common
/// area. "`, or the empty string for areas below [`EPS`].
pub fn area_in_sqkm(name_r: &str, name_s: &str, area: f64) -> String {
    if area < EPS {
        String::new()
    } else {
        format!(
            "{name_r} and {name_s} have approximately {area:.2} square kilometers of common area. "
        )
    }
}

/// Two-decimal area literal used inside combined sentences.
pub fn format_area(area: f64) -> String {
    format!("{area:.2}")
}

/// The compressed single-sentence form:
/// `"<R> <verb> [and <direction> of ]<S>[, and they have <area> square km
/// of area in common]. "`
pub fn combined_relation(
    name_r: &str,
    name_s: &str,
    relation: TopologyRelation,
    direction: Option<CardinalDirection>,
    area_text: &str,
) -> String {
    let mut text = format!("{name_r} {}", relation.verb());
    match direction {
        Some(direction) => {
            text.push_str(&format!(" and {} of {name_s}", direction.name()));
        }
        None => {
            text.push_str(&format!(" {name_s}"));
        }
    }
    if !area_text.is_empty() {
        text.push_str(&format!(
            " and they have {area_text} square km of area in common"
        ));
    }
    text.push_str(". ");
    text
}
