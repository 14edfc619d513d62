//! Planar region predicates over raw latitude/longitude degrees.
//!
//! Distances are Euclidean in degree space. There is no geodesic correction and no
//! anti-meridian handling.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lon: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
	pub min_lat: f64,
	pub max_lat: f64,
	pub min_lon: f64,
	pub max_lon: f64,
}
impl BoundingBox {
	/// Box enclosing every point [`in_radius`] accepts for `radius` around `center`.
	///
	/// Each side is pushed out by a few ulps of its magnitude, since `center ± radius` rounds and
	/// can land just inside a point on the circle.
	pub fn around(center: GeoPoint, radius: f64) -> Self {
		let lat_pad = rounding_pad(center.lat, radius);
		let lon_pad = rounding_pad(center.lon, radius);

		Self {
			min_lat: center.lat - radius - lat_pad,
			max_lat: center.lat + radius + lat_pad,
			min_lon: center.lon - radius - lon_pad,
			max_lon: center.lon + radius + lon_pad,
		}
	}
}

/// Raw location parameters as they arrive from a caller; any subset may be present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct LocationQuery {
	pub lat: Option<f64>,
	pub lon: Option<f64>,
	pub radius: Option<f64>,
	pub min_lat: Option<f64>,
	pub max_lat: Option<f64>,
	pub min_lon: Option<f64>,
	pub max_lon: Option<f64>,
}
impl LocationQuery {
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LocationError {
	#[error("Must specify radius or full bounding box.")]
	Incomplete,
	#[error("A radius search requires both lat and lon.")]
	MissingCenter,
	#[error("{field} must be a finite number.")]
	NonFinite { field: &'static str },
	#[error("radius must be zero or greater.")]
	NegativeRadius,
	#[error("min_{axis} must not exceed max_{axis}.")]
	InvertedBounds { axis: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocationFilter {
	Radius { center: GeoPoint, radius: f64 },
	Box(BoundingBox),
}
impl LocationFilter {
	/// Picks the radius form when `radius` is present, otherwise requires all four bounds.
	pub fn from_query(query: &LocationQuery) -> Result<Self, LocationError> {
		for (field, value) in [
			("lat", query.lat),
			("lon", query.lon),
			("radius", query.radius),
			("min_lat", query.min_lat),
			("max_lat", query.max_lat),
			("min_lon", query.min_lon),
			("max_lon", query.max_lon),
		] {
			if value.is_some_and(|value| !value.is_finite()) {
				return Err(LocationError::NonFinite { field });
			}
		}

		if let Some(radius) = query.radius {
			let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
				return Err(LocationError::MissingCenter);
			};

			if radius < 0.0 {
				return Err(LocationError::NegativeRadius);
			}

			return Ok(Self::Radius { center: GeoPoint { lat, lon }, radius });
		}

		let (Some(min_lat), Some(max_lat), Some(min_lon), Some(max_lon)) =
			(query.min_lat, query.max_lat, query.min_lon, query.max_lon)
		else {
			return Err(LocationError::Incomplete);
		};

		if min_lat > max_lat {
			return Err(LocationError::InvertedBounds { axis: "lat" });
		}
		if min_lon > max_lon {
			return Err(LocationError::InvertedBounds { axis: "lon" });
		}

		Ok(Self::Box(BoundingBox { min_lat, max_lat, min_lon, max_lon }))
	}

	pub fn contains(&self, point: GeoPoint) -> bool {
		match self {
			Self::Radius { center, radius } => in_radius(point, *center, *radius),
			Self::Box(bounds) => in_box(point, bounds),
		}
	}

	/// Box that contains every matching point; usable as an index-friendly prefilter.
	pub fn envelope(&self) -> BoundingBox {
		match self {
			Self::Radius { center, radius } => BoundingBox::around(*center, *radius),
			Self::Box(bounds) => *bounds,
		}
	}
}

pub fn in_radius(point: GeoPoint, center: GeoPoint, radius: f64) -> bool {
	let d_lat = point.lat - center.lat;
	let d_lon = point.lon - center.lon;

	d_lat * d_lat + d_lon * d_lon <= radius * radius
}

fn rounding_pad(coordinate: f64, radius: f64) -> f64 {
	(coordinate.abs() + radius.abs()) * f64::EPSILON * 4.0 + f64::MIN_POSITIVE
}

pub fn in_box(point: GeoPoint, bounds: &BoundingBox) -> bool {
	point.lat >= bounds.min_lat
		&& point.lat <= bounds.max_lat
		&& point.lon >= bounds.min_lon
		&& point.lon <= bounds.max_lon
}
