use sqlx::{PgConnection, QueryBuilder, postgres::Postgres};

use orgdir_domain::geo::BoundingBox;

use crate::{
	Error, Result,
	models::{
		Building, Organization, OrganizationCategory, OrganizationLocation, OrganizationPhone,
		Phone,
	},
};

/// Conjunction of optional predicates over organizations. An empty filter matches everything.
#[derive(Clone, Debug, Default)]
pub struct OrganizationFilter {
	pub building_id: Option<i64>,
	/// Case-insensitive substring, matched literally.
	pub name_contains: Option<String>,
	/// Matches organizations linked to at least one of these categories.
	pub category_ids: Option<Vec<i64>>,
	/// Inclusive coordinate envelope on the organization's building.
	pub envelope: Option<BoundingBox>,
}

pub async fn get_organization(
	executor: &mut PgConnection,
	id: i64,
) -> Result<Option<Organization>> {
	let row = sqlx::query_as::<_, Organization>(
		"\
SELECT id, name, building_id
FROM organizations
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_organization(
	executor: &mut PgConnection,
	name: &str,
	building_id: i64,
) -> Result<Option<Organization>> {
	let row = sqlx::query_as::<_, Organization>(
		"\
SELECT id, name, building_id
FROM organizations
WHERE name = $1 AND building_id = $2
ORDER BY id
LIMIT 1",
	)
	.bind(name)
	.bind(building_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn insert_organization(
	executor: &mut PgConnection,
	name: &str,
	building_id: i64,
) -> Result<Organization> {
	let row = sqlx::query_as::<_, Organization>(
		"\
INSERT INTO organizations (name, building_id)
VALUES ($1, $2)
RETURNING id, name, building_id",
	)
	.bind(name)
	.bind(building_id)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn update_organization(
	executor: &mut PgConnection,
	organization: &Organization,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE organizations
SET
	name = $1,
	building_id = $2
WHERE id = $3",
	)
	.bind(organization.name.as_str())
	.bind(organization.building_id)
	.bind(organization.id)
	.execute(&mut *executor)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Organization {} not found.", organization.id)));
	}

	Ok(())
}

/// Returns whether a row was removed. Phone and category links cascade.
pub async fn delete_organization(executor: &mut PgConnection, id: i64) -> Result<bool> {
	let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
		.bind(id)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Get-or-create by number. Returns one row per distinct number, ordered by id.
pub async fn upsert_phones(executor: &mut PgConnection, numbers: &[String]) -> Result<Vec<Phone>> {
	if numbers.is_empty() {
		return Ok(vec![]);
	}

	sqlx::query(
		"\
INSERT INTO phones (number)
SELECT * FROM UNNEST($1::text[])
ON CONFLICT (number) DO NOTHING",
	)
	.bind(numbers)
	.execute(&mut *executor)
	.await?;

	let rows = sqlx::query_as::<_, Phone>(
		"\
SELECT id, number
FROM phones
WHERE number = ANY($1)
ORDER BY id",
	)
	.bind(numbers)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Replaces the full phone set of an organization.
pub async fn replace_organization_phones(
	executor: &mut PgConnection,
	organization_id: i64,
	phone_ids: &[i64],
) -> Result<()> {
	sqlx::query("DELETE FROM organization_phones WHERE organization_id = $1")
		.bind(organization_id)
		.execute(&mut *executor)
		.await?;
	sqlx::query(
		"\
INSERT INTO organization_phones (organization_id, phone_id)
SELECT $1, phone_id FROM UNNEST($2::bigint[]) AS t (phone_id)
ON CONFLICT DO NOTHING",
	)
	.bind(organization_id)
	.bind(phone_ids)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

/// Replaces the full category set of an organization.
pub async fn replace_organization_categories(
	executor: &mut PgConnection,
	organization_id: i64,
	category_ids: &[i64],
) -> Result<()> {
	sqlx::query("DELETE FROM organization_categories WHERE organization_id = $1")
		.bind(organization_id)
		.execute(&mut *executor)
		.await?;
	sqlx::query(
		"\
INSERT INTO organization_categories (organization_id, category_id)
SELECT $1, category_id FROM UNNEST($2::bigint[]) AS t (category_id)
ON CONFLICT DO NOTHING",
	)
	.bind(organization_id)
	.bind(category_ids)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

/// Organization ids (with building coordinates) matching `filter`, ordered by id.
///
/// `window` is `(offset, limit)`; `None` returns every match so the caller can refine and page
/// in memory.
pub async fn search_organizations(
	executor: &mut PgConnection,
	filter: &OrganizationFilter,
	window: Option<(i64, i64)>,
) -> Result<Vec<OrganizationLocation>> {
	let mut builder = QueryBuilder::<Postgres>::new(
		"\
SELECT o.id, b.latitude, b.longitude
FROM organizations o
JOIN buildings b ON b.id = o.building_id
WHERE TRUE",
	);

	if let Some(building_id) = filter.building_id {
		builder.push(" AND o.building_id = ");
		builder.push_bind(building_id);
	}
	if let Some(name) = filter.name_contains.as_deref() {
		builder.push(" AND o.name ILIKE ");
		builder.push_bind(format!("%{}%", escape_like(name)));
		builder.push(" ESCAPE '\\'");
	}
	if let Some(category_ids) = filter.category_ids.as_ref() {
		builder.push(
			" AND EXISTS (SELECT 1 FROM organization_categories oc \
			WHERE oc.organization_id = o.id AND oc.category_id = ANY(",
		);
		builder.push_bind(category_ids.clone());
		builder.push("))");
	}
	if let Some(envelope) = filter.envelope {
		builder.push(" AND b.latitude BETWEEN ");
		builder.push_bind(envelope.min_lat);
		builder.push(" AND ");
		builder.push_bind(envelope.max_lat);
		builder.push(" AND b.longitude BETWEEN ");
		builder.push_bind(envelope.min_lon);
		builder.push(" AND ");
		builder.push_bind(envelope.max_lon);
	}

	builder.push(" ORDER BY o.id");

	if let Some((offset, limit)) = window {
		builder.push(" OFFSET ");
		builder.push_bind(offset);
		builder.push(" LIMIT ");
		builder.push_bind(limit);
	}

	let rows = builder.build_query_as::<OrganizationLocation>().fetch_all(&mut *executor).await?;

	Ok(rows)
}

pub async fn load_organizations(
	executor: &mut PgConnection,
	ids: &[i64],
) -> Result<Vec<Organization>> {
	if ids.is_empty() {
		return Ok(vec![]);
	}

	let rows = sqlx::query_as::<_, Organization>(
		"\
SELECT id, name, building_id
FROM organizations
WHERE id = ANY($1)
ORDER BY id",
	)
	.bind(ids)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn load_buildings(executor: &mut PgConnection, ids: &[i64]) -> Result<Vec<Building>> {
	if ids.is_empty() {
		return Ok(vec![]);
	}

	let rows = sqlx::query_as::<_, Building>(
		"\
SELECT id, address, latitude, longitude
FROM buildings
WHERE id = ANY($1)
ORDER BY id",
	)
	.bind(ids)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn load_organization_phones(
	executor: &mut PgConnection,
	organization_ids: &[i64],
) -> Result<Vec<OrganizationPhone>> {
	if organization_ids.is_empty() {
		return Ok(vec![]);
	}

	let rows = sqlx::query_as::<_, OrganizationPhone>(
		"\
SELECT op.organization_id, p.id, p.number
FROM organization_phones op
JOIN phones p ON p.id = op.phone_id
WHERE op.organization_id = ANY($1)
ORDER BY op.organization_id, p.id",
	)
	.bind(organization_ids)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn load_organization_categories(
	executor: &mut PgConnection,
	organization_ids: &[i64],
) -> Result<Vec<OrganizationCategory>> {
	if organization_ids.is_empty() {
		return Ok(vec![]);
	}

	let rows = sqlx::query_as::<_, OrganizationCategory>(
		"\
SELECT oc.organization_id, c.id, c.name, c.parent_id, c.level
FROM organization_categories oc
JOIN categories c ON c.id = oc.category_id
WHERE oc.organization_id = ANY($1)
ORDER BY oc.organization_id, c.id",
	)
	.bind(organization_ids)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Escapes `LIKE` metacharacters so `value` matches literally.
pub fn escape_like(value: &str) -> String {
	let mut out = String::with_capacity(value.len());

	for ch in value.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
