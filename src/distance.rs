use geo::Point;

// statute miles per degree, measured around downtown San Francisco
// 0.1 degree of latitude = 6.9048 miles
// 0.1 degree of longitude = 5.4751 miles
pub const MILES_PER_DEGREE_LAT: f64 = 69.048;
pub const MILES_PER_DEGREE_LON: f64 = 54.751;

// miles, flat earth, only meaningful within the city
pub trait CrowDistance {
    fn crow_distance(&self, rhs: &Self) -> f64;
}

impl CrowDistance for Point {
    fn crow_distance(&self, rhs: &Self) -> f64 {
        let lat = (self.x() - rhs.x()).abs() * MILES_PER_DEGREE_LAT;
        let lon = (self.y() - rhs.y()).abs() * MILES_PER_DEGREE_LON;
        (lat * lat + lon * lon).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point() {
        let a = Point::new(37.7824, -122.40705);
        assert_eq!(a.crow_distance(&a), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (Point::new(37.7824, -122.40705), Point::new(37.78, -122.41)),
            (Point::new(37.70, -122.50), Point::new(37.81, -122.36)),
            (Point::new(-33.87, 151.21), Point::new(37.7824, -122.40705)),
        ];
        for (a, b) in pairs {
            assert_eq!(a.crow_distance(&b), b.crow_distance(&a));
        }
    }

    #[test]
    fn axis_conversions() {
        let origin = Point::new(37.7, -122.4);
        let north = Point::new(37.8, -122.4);
        let west = Point::new(37.7, -122.5);
        assert!((origin.crow_distance(&north) - 6.9048).abs() < 1e-9);
        assert!((origin.crow_distance(&west) - 5.4751).abs() < 1e-9);
    }

    #[test]
    fn hypotenuse() {
        let a = Point::new(37.7824, -122.40705);
        let b = Point::new(37.78, -122.41);
        let lat = 0.0024 * MILES_PER_DEGREE_LAT;
        let lon = 0.00295 * MILES_PER_DEGREE_LON;
        let expected = (lat * lat + lon * lon).sqrt();
        assert!((a.crow_distance(&b) - expected).abs() < 1e-9);
        // about a quarter mile
        assert!(a.crow_distance(&b) > 0.2 && a.crow_distance(&b) < 0.3);
    }
}
