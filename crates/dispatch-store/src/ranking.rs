use std::cmp::Ordering;

use dispatch_core::models::{Driver, Point, RankedDriver};

/// Measure every driver against `center`, keep those within `radius_meters`
/// and return them nearest first. Ties are broken by ID so the order is
/// deterministic. A `limit` of 0 keeps every match.
pub(crate) fn rank_within<I>(
    drivers: I,
    center: &Point,
    radius_meters: f64,
    limit: usize,
) -> Vec<RankedDriver>
where
    I: IntoIterator<Item = Driver>,
{
    let mut ranked: Vec<RankedDriver> = drivers
        .into_iter()
        .map(|driver| {
            let distance = center.distance_to(&driver.location);
            RankedDriver { driver, distance }
        })
        .filter(|candidate| candidate.distance <= radius_meters)
        .collect();

    ranked.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.driver.id.cmp(&b.driver.id))
    });

    if limit > 0 {
        ranked.truncate(limit);
    }
    ranked
}
