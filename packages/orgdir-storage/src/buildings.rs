use sqlx::PgConnection;

use crate::{Error, Result, models::Building};

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub async fn list_buildings(
	executor: &mut PgConnection,
	offset: i64,
	limit: i64,
) -> Result<Vec<Building>> {
	let rows = sqlx::query_as::<_, Building>(
		"\
SELECT id, address, latitude, longitude
FROM buildings
ORDER BY id
OFFSET $1
LIMIT $2",
	)
	.bind(offset)
	.bind(limit)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn get_building(executor: &mut PgConnection, id: i64) -> Result<Option<Building>> {
	let row = sqlx::query_as::<_, Building>(
		"\
SELECT id, address, latitude, longitude
FROM buildings
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_building_for_update(
	executor: &mut PgConnection,
	id: i64,
) -> Result<Option<Building>> {
	let row = sqlx::query_as::<_, Building>(
		"\
SELECT id, address, latitude, longitude
FROM buildings
WHERE id = $1
FOR UPDATE",
	)
	.bind(id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_building_by_address(
	executor: &mut PgConnection,
	address: &str,
) -> Result<Option<Building>> {
	let row = sqlx::query_as::<_, Building>(
		"\
SELECT id, address, latitude, longitude
FROM buildings
WHERE address = $1
ORDER BY id
LIMIT 1",
	)
	.bind(address)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn insert_building(
	executor: &mut PgConnection,
	address: &str,
	latitude: f64,
	longitude: f64,
) -> Result<Building> {
	let row = sqlx::query_as::<_, Building>(
		"\
INSERT INTO buildings (address, latitude, longitude)
VALUES ($1, $2, $3)
RETURNING id, address, latitude, longitude",
	)
	.bind(address)
	.bind(latitude)
	.bind(longitude)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn update_building(executor: &mut PgConnection, building: &Building) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE buildings
SET
	address = $1,
	latitude = $2,
	longitude = $3
WHERE id = $4",
	)
	.bind(building.address.as_str())
	.bind(building.latitude)
	.bind(building.longitude)
	.bind(building.id)
	.execute(&mut *executor)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Building {} not found.", building.id)));
	}

	Ok(())
}

pub async fn count_building_organizations(executor: &mut PgConnection, id: i64) -> Result<i64> {
	let count = sqlx::query_scalar::<_, i64>(
		"\
SELECT COUNT(*)
FROM organizations
WHERE building_id = $1",
	)
	.bind(id)
	.fetch_one(&mut *executor)
	.await?;

	Ok(count)
}

/// Returns whether a row was removed. A building still referenced by an organization is a
/// [`Error::Conflict`].
pub async fn delete_building(executor: &mut PgConnection, id: i64) -> Result<bool> {
	let result = sqlx::query("DELETE FROM buildings WHERE id = $1")
		.bind(id)
		.execute(&mut *executor)
		.await
		.map_err(|err| match err {
			sqlx::Error::Database(db_err)
				if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
				Error::Conflict(format!("Building {id} is still referenced by organizations.")),
			other => Error::Sqlx(other),
		})?;

	Ok(result.rows_affected() > 0)
}
