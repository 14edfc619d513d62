use sqlx::PgConnection;

use crate::{Error, Result, models::Category};

pub async fn list_categories(
	executor: &mut PgConnection,
	offset: i64,
	limit: i64,
) -> Result<Vec<Category>> {
	let rows = sqlx::query_as::<_, Category>(
		"\
SELECT id, name, parent_id, level
FROM categories
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

/// Whole table in id order; the snapshot every hierarchy traversal runs over.
pub async fn list_all_categories(executor: &mut PgConnection) -> Result<Vec<Category>> {
	let rows = sqlx::query_as::<_, Category>(
		"\
SELECT id, name, parent_id, level
FROM categories
ORDER BY id",
	)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn list_category_edges(executor: &mut PgConnection) -> Result<Vec<(i64, Option<i64>)>> {
	let rows = sqlx::query_as::<_, (i64, Option<i64>)>(
		"\
SELECT id, parent_id
FROM categories
ORDER BY id",
	)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn get_category(executor: &mut PgConnection, id: i64) -> Result<Option<Category>> {
	let row = sqlx::query_as::<_, Category>(
		"\
SELECT id, name, parent_id, level
FROM categories
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_category_for_update(
	executor: &mut PgConnection,
	id: i64,
) -> Result<Option<Category>> {
	let row = sqlx::query_as::<_, Category>(
		"\
SELECT id, name, parent_id, level
FROM categories
WHERE id = $1
FOR UPDATE",
	)
	.bind(id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_category_by_name(
	executor: &mut PgConnection,
	name: &str,
) -> Result<Option<Category>> {
	let row = sqlx::query_as::<_, Category>(
		"\
SELECT id, name, parent_id, level
FROM categories
WHERE name = $1
ORDER BY id
LIMIT 1",
	)
	.bind(name)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Subset of `ids` that exist, in ascending order.
pub async fn existing_category_ids(executor: &mut PgConnection, ids: &[i64]) -> Result<Vec<i64>> {
	if ids.is_empty() {
		return Ok(vec![]);
	}

	let rows = sqlx::query_scalar::<_, i64>(
		"\
SELECT id
FROM categories
WHERE id = ANY($1)
ORDER BY id",
	)
	.bind(ids)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn insert_category(
	executor: &mut PgConnection,
	name: &str,
	parent_id: Option<i64>,
	level: i32,
) -> Result<Category> {
	let row = sqlx::query_as::<_, Category>(
		"\
INSERT INTO categories (name, parent_id, level)
VALUES ($1, $2, $3)
RETURNING id, name, parent_id, level",
	)
	.bind(name)
	.bind(parent_id)
	.bind(level)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn update_category(executor: &mut PgConnection, category: &Category) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE categories
SET
	name = $1,
	parent_id = $2,
	level = $3
WHERE id = $4",
	)
	.bind(category.name.as_str())
	.bind(category.parent_id)
	.bind(category.level)
	.bind(category.id)
	.execute(&mut *executor)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Category {} not found.", category.id)));
	}

	Ok(())
}

pub async fn set_category_levels(
	executor: &mut PgConnection,
	levels: &[(i64, i32)],
) -> Result<()> {
	if levels.is_empty() {
		return Ok(());
	}

	let (ids, values): (Vec<i64>, Vec<i32>) = levels.iter().copied().unzip();

	sqlx::query(
		"\
UPDATE categories AS c
SET level = v.level
FROM UNNEST($1::bigint[], $2::integer[]) AS v (id, level)
WHERE c.id = v.id",
	)
	.bind(ids)
	.bind(values)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

/// Returns whether a row was removed. Descendants and associations go with it through
/// `ON DELETE CASCADE`.
pub async fn delete_category(executor: &mut PgConnection, id: i64) -> Result<bool> {
	let result = sqlx::query("DELETE FROM categories WHERE id = $1")
		.bind(id)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected() > 0)
}
