use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::{BuildingView, CategoryItem, DirectoryService, Error, Result};
use orgdir_storage::{buildings, categories, organizations};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhoneView {
	pub id: i64,
	pub number: String,
}

/// An organization with its building, phones and categories attached.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrganizationView {
	pub id: i64,
	pub name: String,
	pub building: BuildingView,
	pub phones: Vec<PhoneView>,
	pub categories: Vec<CategoryItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateOrganizationRequest {
	pub name: String,
	pub building_id: i64,
	#[serde(default)]
	pub phone_numbers: Vec<String>,
	#[serde(default, alias = "activity_ids")]
	pub category_ids: Vec<i64>,
}

/// Present list fields replace the whole association set; an empty list clears it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateOrganizationRequest {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub building_id: Option<i64>,
	#[serde(default)]
	pub phone_numbers: Option<Vec<String>>,
	#[serde(default, alias = "activity_ids")]
	pub category_ids: Option<Vec<i64>>,
}

impl DirectoryService {
	pub async fn get_organization(&self, id: i64) -> Result<OrganizationView> {
		let mut conn = self.db.pool.acquire().await?;

		hydrate(&mut conn, &[id])
			.await?
			.pop()
			.ok_or_else(|| Error::not_found("Organization", id))
	}

	pub async fn create_organization(
		&self,
		req: CreateOrganizationRequest,
	) -> Result<OrganizationView> {
		let name = crate::required_text("name", &req.name)?;
		let phone_numbers = normalize_phones(&req.phone_numbers)?;
		let category_ids = dedup(&req.category_ids);
		let mut tx = self.db.pool.begin().await?;

		ensure_building(&mut tx, req.building_id).await?;
		ensure_categories(&mut tx, &category_ids).await?;

		let row = organizations::insert_organization(&mut tx, &name, req.building_id).await?;

		attach_phones(&mut tx, row.id, &phone_numbers).await?;
		organizations::replace_organization_categories(&mut tx, row.id, &category_ids).await?;

		let view = hydrate(&mut tx, &[row.id])
			.await?
			.pop()
			.ok_or_else(|| Error::not_found("Organization", row.id))?;

		tx.commit().await?;

		tracing::info!(
			organization_id = row.id,
			building_id = row.building_id,
			phones = phone_numbers.len(),
			categories = category_ids.len(),
			"Created organization."
		);

		Ok(view)
	}

	pub async fn update_organization(
		&self,
		id: i64,
		req: UpdateOrganizationRequest,
	) -> Result<OrganizationView> {
		let mut tx = self.db.pool.begin().await?;
		let mut row = organizations::get_organization(&mut tx, id)
			.await?
			.ok_or_else(|| Error::not_found("Organization", id))?;

		if let Some(name) = req.name.as_deref() {
			row.name = crate::required_text("name", name)?;
		}
		if let Some(building_id) = req.building_id {
			ensure_building(&mut tx, building_id).await?;

			row.building_id = building_id;
		}

		organizations::update_organization(&mut tx, &row).await?;

		if let Some(numbers) = req.phone_numbers.as_deref() {
			let numbers = normalize_phones(numbers)?;

			attach_phones(&mut tx, id, &numbers).await?;
		}
		if let Some(category_ids) = req.category_ids.as_deref() {
			let category_ids = dedup(category_ids);

			ensure_categories(&mut tx, &category_ids).await?;
			organizations::replace_organization_categories(&mut tx, id, &category_ids).await?;
		}

		let view = hydrate(&mut tx, &[id])
			.await?
			.pop()
			.ok_or_else(|| Error::not_found("Organization", id))?;

		tx.commit().await?;

		tracing::info!(organization_id = id, "Updated organization.");

		Ok(view)
	}

	pub async fn delete_organization(&self, id: i64) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		if !organizations::delete_organization(&mut tx, id).await? {
			return Err(Error::not_found("Organization", id));
		}

		tx.commit().await?;

		tracing::info!(organization_id = id, "Deleted organization.");

		Ok(())
	}
}

/// Loads full views for `ids`, preserving their order. Ids without a row are skipped.
pub(crate) async fn hydrate(
	conn: &mut PgConnection,
	ids: &[i64],
) -> Result<Vec<OrganizationView>> {
	let rows = organizations::load_organizations(conn, ids).await?;

	if rows.is_empty() {
		return Ok(vec![]);
	}

	let building_ids = rows.iter().map(|row| row.building_id).collect::<BTreeSet<_>>();
	let building_ids = building_ids.into_iter().collect::<Vec<_>>();
	let building_map = organizations::load_buildings(conn, &building_ids)
		.await?
		.into_iter()
		.map(|row| (row.id, BuildingView::from(row)))
		.collect::<HashMap<_, _>>();
	let mut phone_map: HashMap<i64, Vec<PhoneView>> = HashMap::new();
	let mut category_map: HashMap<i64, Vec<CategoryItem>> = HashMap::new();

	for row in organizations::load_organization_phones(conn, ids).await? {
		phone_map
			.entry(row.organization_id)
			.or_default()
			.push(PhoneView { id: row.id, number: row.number });
	}
	for row in organizations::load_organization_categories(conn, ids).await? {
		category_map.entry(row.organization_id).or_default().push(CategoryItem {
			id: row.id,
			name: row.name,
			parent_id: row.parent_id,
			level: row.level,
		});
	}

	let mut by_id = rows.into_iter().map(|row| (row.id, row)).collect::<HashMap<_, _>>();
	let mut out = Vec::with_capacity(by_id.len());

	for id in ids {
		let Some(row) = by_id.remove(id) else {
			continue;
		};
		let building = building_map.get(&row.building_id).cloned().ok_or_else(|| Error::Storage {
			message: format!(
				"Organization {} references missing building {}.",
				row.id, row.building_id
			),
		})?;

		out.push(OrganizationView {
			id: row.id,
			name: row.name,
			building,
			phones: phone_map.remove(&row.id).unwrap_or_default(),
			categories: category_map.remove(&row.id).unwrap_or_default(),
		});
	}

	Ok(out)
}

async fn ensure_building(conn: &mut PgConnection, building_id: i64) -> Result<()> {
	if buildings::get_building(conn, building_id).await?.is_none() {
		return Err(Error::validation(format!("building_id {building_id} does not exist.")));
	}

	Ok(())
}

async fn ensure_categories(conn: &mut PgConnection, category_ids: &[i64]) -> Result<()> {
	let existing = categories::existing_category_ids(conn, category_ids).await?;

	if existing.len() == category_ids.len() {
		return Ok(());
	}

	let missing = category_ids.iter().filter(|id| !existing.contains(id)).collect::<Vec<_>>();

	Err(Error::validation(format!("Unknown category ids: {missing:?}.")))
}

async fn attach_phones(
	conn: &mut PgConnection,
	organization_id: i64,
	numbers: &[String],
) -> Result<()> {
	let phone_ids = organizations::upsert_phones(conn, numbers)
		.await?
		.into_iter()
		.map(|phone| phone.id)
		.collect::<Vec<_>>();

	organizations::replace_organization_phones(conn, organization_id, &phone_ids).await?;

	Ok(())
}

fn normalize_phones(numbers: &[String]) -> Result<Vec<String>> {
	let mut out: Vec<String> = Vec::with_capacity(numbers.len());

	for number in numbers {
		let number = number.trim();

		if number.is_empty() {
			return Err(Error::validation("phone_numbers must not contain blank entries."));
		}
		if !out.iter().any(|existing| existing == number) {
			out.push(number.to_string());
		}
	}

	Ok(out)
}

fn dedup(ids: &[i64]) -> Vec<i64> {
	ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}
