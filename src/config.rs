use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use geo::Point;
use tracing::{debug, info};

use crate::{
    listing::{Source, LISTING_URL},
    ranking::valid_degrees,
};

// Union Square
pub const DEFAULT_POSITION: (f64, f64) = (37.78240, -122.40705);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Production,
    Testing,
}

impl Mode {
    pub fn store_file(&self) -> &'static str {
        match self {
            Self::Production => "database.db",
            Self::Testing => "testing.db",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub position: Point,
    pub mode: Mode,
    pub data_dir: PathBuf,
    pub listing_url: String,
}

impl Config {
    pub fn load(position: Option<Point>, mode: Mode) -> Result<Self> {
        let data_dir = match var("FOOD_TRUCKER_HOME") {
            Some(x) => PathBuf::from(x),
            None => install_dir()?,
        };
        let listing_url = var("FOOD_TRUCKER_URL").unwrap_or_else(|| LISTING_URL.to_string());
        let position =
            position.unwrap_or_else(|| Point::new(DEFAULT_POSITION.0, DEFAULT_POSITION.1));

        Ok(Self {
            position,
            mode,
            data_dir,
            listing_url,
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(self.mode.store_file())
    }

    pub fn source(&self) -> Source {
        match self.mode {
            Mode::Production => Source::Remote(self.listing_url.clone()),
            Mode::Testing => Source::Bundled,
        }
    }
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(x) if !x.is_empty() => {
            info!("{key} set: {x}");
            Some(x)
        }
        _ => {
            debug!("{key} not set, using default");
            None
        }
    }
}

fn install_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to locate executable")?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
}

// `latitude,longitude` with no spaces, e.g. `37.7824,-122.40705`
pub fn parse_position(raw: &str) -> Result<Point, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected latitude,longitude but got {raw:?}"))?;
    let lat: f64 = lat
        .parse()
        .map_err(|e| format!("invalid latitude {lat:?}: {e}"))?;
    let lon: f64 = lon
        .parse()
        .map_err(|e| format!("invalid longitude {lon:?}: {e}"))?;
    if !valid_degrees(lat) || !valid_degrees(lon) {
        return Err(format!("position out of range: {lat},{lon}"));
    }
    if lat == 0.0 && lon == 0.0 {
        return Err("position 0,0 is unset".to_string());
    }
    Ok(Point::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: Mode) -> Config {
        Config {
            position: Point::new(DEFAULT_POSITION.0, DEFAULT_POSITION.1),
            mode,
            data_dir: PathBuf::from("/opt/food-trucker"),
            listing_url: LISTING_URL.to_string(),
        }
    }

    #[test]
    fn position() {
        assert_eq!(
            parse_position("37.7824,-122.40705"),
            Ok(Point::new(37.7824, -122.40705))
        );
        assert_eq!(parse_position("-33.87,151.21"), Ok(Point::new(-33.87, 151.21)));
        assert!(parse_position("37.7824").is_err());
        assert!(parse_position("37.7824, -122.40705").is_err());
        assert!(parse_position("north,west").is_err());
        assert!(parse_position("37.7824,-122.4,1").is_err());
        assert!(parse_position("200,-122.4").is_err());
        assert!(parse_position("0,0").is_err());
        assert!(parse_position("0.0,-0.0").is_err());
        assert_eq!(parse_position("0,-122.4"), Ok(Point::new(0.0, -122.4)));
    }

    #[test]
    fn production_paths() {
        let config = config(Mode::Production);
        assert_eq!(
            config.store_path(),
            PathBuf::from("/opt/food-trucker/database.db")
        );
        assert_eq!(config.source(), Source::Remote(LISTING_URL.to_string()));
    }

    #[test]
    fn testing_paths() {
        let config = config(Mode::Testing);
        assert_eq!(
            config.store_path(),
            PathBuf::from("/opt/food-trucker/testing.db")
        );
        // canned listing ships inside the binary, only the store sits beside it
        assert_eq!(config.source(), Source::Bundled);
    }
}
