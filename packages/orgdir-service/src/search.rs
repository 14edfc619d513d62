//! Organization lookups across building, name, category and location.
//!
//! Every lookup resolves to one [`OrganizationFilter`] query ordered by organization id. Location
//! predicates are prefiltered in SQL by their bounding envelope and refined in memory, so those
//! pages are cut after refinement; all other pages are cut in SQL.

use orgdir_domain::{
	geo::{GeoPoint, LocationFilter, LocationQuery},
	hierarchy,
};
use orgdir_storage::{
	categories,
	organizations::{self, OrganizationFilter},
};

use crate::{DirectoryService, Error, OrganizationView, Result, organizations::hydrate};

/// Any combination of filters; present filters are AND-ed together.
#[derive(Clone, Debug, Default)]
pub struct OrganizationQuery {
	pub building_id: Option<i64>,
	pub name: Option<String>,
	pub category_id: Option<i64>,
	/// Widens `category_id` to its descendant closure.
	pub tree: bool,
	pub location: LocationQuery,
	pub offset: Option<u32>,
	pub limit: Option<u32>,
}

impl DirectoryService {
	pub async fn organizations_by_building(
		&self,
		building_id: i64,
		offset: Option<u32>,
		limit: Option<u32>,
	) -> Result<Vec<OrganizationView>> {
		self.search_organizations(OrganizationQuery {
			building_id: Some(building_id),
			offset,
			limit,
			..Default::default()
		})
		.await
	}

	/// Exact category match, or the category with its descendants when `tree` is set.
	pub async fn organizations_by_category(
		&self,
		category_id: i64,
		tree: bool,
		offset: Option<u32>,
		limit: Option<u32>,
	) -> Result<Vec<OrganizationView>> {
		self.search_organizations(OrganizationQuery {
			category_id: Some(category_id),
			tree,
			offset,
			limit,
			..Default::default()
		})
		.await
	}

	pub async fn organizations_by_location(
		&self,
		location: LocationQuery,
		offset: Option<u32>,
		limit: Option<u32>,
	) -> Result<Vec<OrganizationView>> {
		// An empty query would otherwise mean "no location filter".
		LocationFilter::from_query(&location)?;

		self.search_organizations(OrganizationQuery {
			location,
			offset,
			limit,
			..Default::default()
		})
		.await
	}

	pub async fn organizations_by_name(
		&self,
		name: &str,
		offset: Option<u32>,
		limit: Option<u32>,
	) -> Result<Vec<OrganizationView>> {
		self.search_organizations(OrganizationQuery {
			name: Some(name.to_string()),
			offset,
			limit,
			..Default::default()
		})
		.await
	}

	pub async fn search_organizations(
		&self,
		query: OrganizationQuery,
	) -> Result<Vec<OrganizationView>> {
		let page = self.page(query.offset, query.limit);
		let name_contains = match query.name.as_deref().map(str::trim) {
			Some("") => {
				return Err(Error::InvalidArgument {
					message: "name must not be empty.".to_string(),
				});
			},
			other => other.map(str::to_string),
		};
		let location = if query.location.is_empty() {
			None
		} else {
			Some(LocationFilter::from_query(&query.location)?)
		};
		let mut conn = self.db.pool.acquire().await?;
		let category_ids = match query.category_id {
			Some(category_id) if query.tree => {
				let edges = categories::list_category_edges(&mut conn).await?;
				let closure = hierarchy::resolve_descendants(
					&edges,
					category_id,
					self.cfg.categories.max_depth,
				);

				if closure.is_empty() {
					return Ok(vec![]);
				}

				Some(closure.into_iter().collect::<Vec<_>>())
			},
			Some(category_id) => Some(vec![category_id]),
			None => None,
		};
		let filter = OrganizationFilter {
			building_id: query.building_id,
			name_contains,
			category_ids,
			envelope: location.map(|location| location.envelope()),
		};
		let ids = match location {
			Some(location) => {
				let candidates =
					organizations::search_organizations(&mut conn, &filter, None).await?;
				let matched = candidates
					.into_iter()
					.filter(|row| {
						location.contains(GeoPoint { lat: row.latitude, lon: row.longitude })
					})
					.map(|row| row.id)
					.collect::<Vec<_>>();

				page.slice(matched)
			},
			None => {
				let window = Some(crate::window(page));

				organizations::search_organizations(&mut conn, &filter, window)
					.await?
					.into_iter()
					.map(|row| row.id)
					.collect()
			},
		};

		tracing::debug!(
			matched = ids.len(),
			offset = page.offset,
			limit = page.limit,
			"Resolved organization page."
		);

		hydrate(&mut conn, &ids).await
	}
}
