use geo::Point;
use itertools::{Either, Itertools};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    distance::CrowDistance, fingerprint::Fingerprint, listing::VendorRecord, visits::Visits,
};

pub const KIND_OF_INTEREST: &str = "Truck";
pub const APPROVED: &str = "APPROVED";

/// Miles added per previous visit. Must exceed any distance inside the city so
/// that visit count always dominates, with distance only breaking ties.
pub const VISIT_WEIGHT: f64 = 200.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub fingerprint: Fingerprint,
    pub visits: u32,
    // miles
    pub distance: f64,
    pub name: String,
    pub address: String,
    pub food: String,
    pub location: String,
}

impl Candidate {
    pub fn rank_key(&self) -> f64 {
        VISIT_WEIGHT * self.visits as f64 + self.distance
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Skip {
    #[error("not a truck: {0:?}")]
    Kind(String),
    #[error("empty latitude or longitude")]
    MissingCoordinates,
    #[error("cannot read coordinates {lat:?}, {lon:?}")]
    BadCoordinates { lat: String, lon: String },
    #[error("coordinates unset")]
    Unset,
    #[error("coordinates out of range: {0}, {1}")]
    OutOfRange(f64, f64),
    #[error("permit not approved: {0:?}")]
    NotApproved(String),
}

impl Skip {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Kind(_) => "kind",
            Self::MissingCoordinates => "missing-coordinates",
            Self::BadCoordinates { .. } => "bad-coordinates",
            Self::Unset => "unset",
            Self::OutOfRange(..) => "out-of-range",
            Self::NotApproved(_) => "not-approved",
        }
    }
}

#[derive(Debug, Default)]
pub struct Ranking {
    pub candidates: Vec<Candidate>,
    // (row index, reason)
    pub skipped: Vec<(usize, Skip)>,
}

pub fn screen(row: &VendorRecord) -> Result<Point, Skip> {
    if row.kind != KIND_OF_INTEREST {
        return Err(Skip::Kind(row.kind.clone()));
    }

    if row.lat.is_empty() || row.lon.is_empty() {
        return Err(Skip::MissingCoordinates);
    }
    let (lat, lon) = match (row.lat.parse::<f64>(), row.lon.parse::<f64>()) {
        (Ok(lat), Ok(lon)) => (lat, lon),
        _ => {
            return Err(Skip::BadCoordinates {
                lat: row.lat.clone(),
                lon: row.lon.clone(),
            })
        }
    };

    if lat == 0.0 && lon == 0.0 {
        return Err(Skip::Unset);
    }
    if !valid_degrees(lat) || !valid_degrees(lon) {
        return Err(Skip::OutOfRange(lat, lon));
    }

    if row.status != APPROVED {
        return Err(Skip::NotApproved(row.status.clone()));
    }

    Ok(Point::new(lat, lon))
}

pub fn valid_degrees(x: f64) -> bool {
    x.is_finite() && (-180.0..=180.0).contains(&x)
}

pub fn rank(rows: &[VendorRecord], position: Point, visits: &Visits) -> Ranking {
    let (mut candidates, skipped): (Vec<_>, Vec<_>) =
        rows.iter().enumerate().partition_map(|(i, row)| match screen(row) {
            Ok(point) => Either::Left(Candidate {
                fingerprint: Fingerprint::of(row),
                visits: 0,
                distance: position.crow_distance(&point),
                name: row.name.clone(),
                address: row.address.clone(),
                food: row.food.clone(),
                location: row.location.clone(),
            }),
            Err(skip) => {
                match skip {
                    Skip::MissingCoordinates | Skip::BadCoordinates { .. } => {
                        warn!(line = row.line, ?row, "skipping: {skip}")
                    }
                    _ => debug!(line = row.line, name = %row.name, "skipping: {skip}"),
                }
                Either::Right((i, skip))
            }
        });

    for x in candidates.iter_mut() {
        x.visits = visits.get(&x.fingerprint).copied().unwrap_or(0);
        if x.distance >= VISIT_WEIGHT {
            warn!(
                name = %x.name,
                distance = x.distance,
                "truck is further than {VISIT_WEIGHT} miles, visit ordering may be off"
            );
        }
    }
    // stable, equal keys keep listing order
    candidates.sort_by(|a, b| a.rank_key().total_cmp(&b.rank_key()));

    Ranking {
        candidates,
        skipped,
    }
}
