use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use ureq::AgentBuilder;

use crate::utils::spinner;

pub const LISTING_URL: &str = "https://data.sfgov.org/api/views/rqzj-sfat/rows.csv";

// canned listing for --test
pub const EXAMPLE: &str = include_str!("../example.csv");

pub const EXPECTED_LABELS: [&str; 29] = [
    "locationid",
    "Applicant",
    "FacilityType",
    "cnn",
    "LocationDescription",
    "Address",
    "blocklot",
    "block",
    "lot",
    "permit",
    "Status",
    "FoodItems",
    "X",
    "Y",
    "Latitude",
    "Longitude",
    "Schedule",
    "dayshours",
    "NOISent",
    "Approved",
    "Received",
    "PriorPermit",
    "ExpirationDate",
    "Location",
    "Fire Prevention Districts",
    "Police Districts",
    "Supervisor Districts",
    "Zip Codes",
    "Neighborhoods (old)",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("listing header changed: expected [{expected}], found [{found}]")]
    Header { expected: String, found: String },
    #[error("line {line} has {found} fields, header has {expected}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
}

// coordinates stay as the source text, they feed the fingerprint verbatim
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VendorRecord {
    // csv line, for finding the raw row again
    #[serde(skip)]
    pub line: u64,
    #[serde(rename = "Applicant")]
    pub name: String,
    #[serde(rename = "FacilityType")]
    pub kind: String,
    #[serde(rename = "LocationDescription")]
    pub location: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "FoodItems")]
    pub food: String,
    #[serde(rename = "Latitude")]
    pub lat: String,
    #[serde(rename = "Longitude")]
    pub lon: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Remote(String),
    Bundled,
}

pub fn fetch(source: &Source) -> Result<String> {
    match source {
        Source::Remote(url) => {
            let pb = spinner(format!("Fetching {url}"));
            let agent = AgentBuilder::new()
                .user_agent(concat!("food-trucker/", env!("CARGO_PKG_VERSION")))
                .build();
            let text = agent
                .get(url)
                .call()
                .with_context(|| format!("failed to fetch {url}"))?
                .into_string()?;
            pb.finish_and_clear();
            info!(url, bytes = text.len(), "fetched listing");
            Ok(text)
        }
        Source::Bundled => Ok(EXAMPLE.to_string()),
    }
}

pub fn decode(text: &str) -> Result<Vec<VendorRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if !headers.iter().eq(EXPECTED_LABELS) {
        return Err(SchemaError::Header {
            expected: EXPECTED_LABELS.iter().join(", "),
            found: headers.iter().join(", "),
        }
        .into());
    }

    let mut output = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|x| x.line()).unwrap_or_default();
        if record.len() != headers.len() {
            return Err(SchemaError::FieldCount {
                line,
                expected: headers.len(),
                found: record.len(),
            }
            .into());
        }
        let mut row: VendorRecord = record
            .deserialize(Some(&headers))
            .with_context(|| format!("failed to decode row: {record:?}"))?;
        row.line = line;
        output.push(row);
    }

    Ok(output)
}
