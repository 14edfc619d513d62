pub mod buildings;
pub mod categories;
pub mod organizations;
pub mod search;
pub mod seed;

mod error;

pub use buildings::{BuildingView, CreateBuildingRequest, UpdateBuildingRequest};
pub use categories::{CategoryItem, CategoryView, CreateCategoryRequest, UpdateCategoryRequest};
pub use error::{Error, Result};
pub use organizations::{
	CreateOrganizationRequest, OrganizationView, PhoneView, UpdateOrganizationRequest,
};
pub use search::OrganizationQuery;
pub use seed::SeedReport;

use serde::{Deserialize, Deserializer};

use orgdir_config::Config;
use orgdir_domain::page::Page;
use orgdir_storage::db::Db;

pub struct DirectoryService {
	pub cfg: Config,
	pub db: Db,
}
impl DirectoryService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}

	pub(crate) fn page(&self, offset: Option<u32>, limit: Option<u32>) -> Page {
		Page::resolve(
			offset,
			limit,
			self.cfg.service.default_page_limit,
			self.cfg.service.max_page_limit,
		)
	}
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`).
pub(crate) fn nullable<'de, D, T>(
	deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::validation(format!("{field} must not be empty.")));
	}

	Ok(trimmed.to_string())
}

pub(crate) fn finite(field: &str, value: f64) -> Result<f64> {
	if !value.is_finite() {
		return Err(Error::validation(format!("{field} must be a finite number.")));
	}

	Ok(value)
}

fn window(page: Page) -> (i64, i64) {
	(i64::from(page.offset), i64::from(page.limit))
}
