use serde::{Deserialize, Serialize};

use crate::{DirectoryService, Error, Result};
use orgdir_storage::{buildings, models::Building};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildingView {
	pub id: i64,
	pub address: String,
	pub latitude: f64,
	pub longitude: f64,
}
impl From<Building> for BuildingView {
	fn from(row: Building) -> Self {
		Self { id: row.id, address: row.address, latitude: row.latitude, longitude: row.longitude }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateBuildingRequest {
	pub address: String,
	pub latitude: f64,
	pub longitude: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateBuildingRequest {
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
}

impl DirectoryService {
	pub async fn list_buildings(
		&self,
		offset: Option<u32>,
		limit: Option<u32>,
	) -> Result<Vec<BuildingView>> {
		let (offset, limit) = crate::window(self.page(offset, limit));
		let mut conn = self.db.pool.acquire().await?;
		let rows = buildings::list_buildings(&mut conn, offset, limit).await?;

		Ok(rows.into_iter().map(BuildingView::from).collect())
	}

	pub async fn get_building(&self, id: i64) -> Result<BuildingView> {
		let mut conn = self.db.pool.acquire().await?;

		buildings::get_building(&mut conn, id)
			.await?
			.map(BuildingView::from)
			.ok_or_else(|| Error::not_found("Building", id))
	}

	pub async fn create_building(&self, req: CreateBuildingRequest) -> Result<BuildingView> {
		let address = crate::required_text("address", &req.address)?;
		let latitude = crate::finite("latitude", req.latitude)?;
		let longitude = crate::finite("longitude", req.longitude)?;
		let mut tx = self.db.pool.begin().await?;
		let row = buildings::insert_building(&mut tx, &address, latitude, longitude).await?;

		tx.commit().await?;

		tracing::info!(building_id = row.id, "Created building.");

		Ok(row.into())
	}

	pub async fn update_building(
		&self,
		id: i64,
		req: UpdateBuildingRequest,
	) -> Result<BuildingView> {
		let mut tx = self.db.pool.begin().await?;
		let mut row = buildings::get_building_for_update(&mut tx, id)
			.await?
			.ok_or_else(|| Error::not_found("Building", id))?;

		if let Some(address) = req.address.as_deref() {
			row.address = crate::required_text("address", address)?;
		}
		if let Some(latitude) = req.latitude {
			row.latitude = crate::finite("latitude", latitude)?;
		}
		if let Some(longitude) = req.longitude {
			row.longitude = crate::finite("longitude", longitude)?;
		}

		buildings::update_building(&mut tx, &row).await?;

		tx.commit().await?;

		tracing::info!(building_id = id, "Updated building.");

		Ok(row.into())
	}

	/// Fails with [`Error::Conflict`] while any organization still occupies the building.
	pub async fn delete_building(&self, id: i64) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		if buildings::get_building_for_update(&mut tx, id).await?.is_none() {
			return Err(Error::not_found("Building", id));
		}

		let occupants = buildings::count_building_organizations(&mut tx, id).await?;

		if occupants > 0 {
			return Err(Error::Conflict {
				message: format!("Building {id} is occupied by {occupants} organization(s)."),
			});
		}
		if !buildings::delete_building(&mut tx, id).await? {
			return Err(Error::not_found("Building", id));
		}

		tx.commit().await?;

		tracing::info!(building_id = id, "Deleted building.");

		Ok(())
	}
}
