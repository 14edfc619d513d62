use serde::{Deserialize, Serialize};

use crate::{DirectoryService, Error, Result};
use orgdir_domain::hierarchy::{self, ChildIndex, HierarchyNode, TreeNode};
use orgdir_storage::{categories, models::Category};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryItem {
	pub id: i64,
	pub name: String,
	pub parent_id: Option<i64>,
	pub level: i32,
}
impl HierarchyNode for CategoryItem {
	fn node_id(&self) -> i64 {
		self.id
	}

	fn parent_id(&self) -> Option<i64> {
		self.parent_id
	}
}
impl From<Category> for CategoryItem {
	fn from(row: Category) -> Self {
		Self { id: row.id, name: row.name, parent_id: row.parent_id, level: row.level }
	}
}

/// A category with its children nested below it.
pub type CategoryView = TreeNode<CategoryItem>;

#[derive(Clone, Debug, Deserialize)]
pub struct CreateCategoryRequest {
	pub name: String,
	#[serde(default)]
	pub parent_id: Option<i64>,
	/// Optional; when present it must equal the level derived from the parent.
	#[serde(default)]
	pub level: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
	#[serde(default)]
	pub name: Option<String>,
	/// `Some(None)` detaches the category into a root; `None` keeps the current parent.
	#[serde(default, deserialize_with = "crate::nullable")]
	pub parent_id: Option<Option<i64>>,
	#[serde(default)]
	pub level: Option<i32>,
}

impl DirectoryService {
	pub async fn list_categories(
		&self,
		offset: Option<u32>,
		limit: Option<u32>,
	) -> Result<Vec<CategoryItem>> {
		let (offset, limit) = crate::window(self.page(offset, limit));
		let mut conn = self.db.pool.acquire().await?;
		let rows = categories::list_categories(&mut conn, offset, limit).await?;

		Ok(rows.into_iter().map(CategoryItem::from).collect())
	}

	/// Every root category with descendants nested down to `max_level` levels.
	pub async fn category_tree(&self, max_level: Option<u32>) -> Result<Vec<CategoryView>> {
		let max_level = max_level.unwrap_or(self.cfg.categories.max_depth);

		if max_level == 0 {
			return Err(Error::InvalidArgument {
				message: "max_level must be at least 1.".to_string(),
			});
		}

		let nodes = self.category_snapshot().await?;

		Ok(hierarchy::build_tree(&nodes, max_level))
	}

	/// The category as level 1 of its own subtree, capped at `categories.max_depth`.
	pub async fn get_category(&self, id: i64) -> Result<CategoryView> {
		let nodes = self.category_snapshot().await?;

		ChildIndex::new(&nodes)
			.subtree(id, self.cfg.categories.max_depth)
			.ok_or_else(|| Error::not_found("Category", id))
	}

	pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<CategoryItem> {
		let name = crate::required_text("name", &req.name)?;
		let mut tx = self.db.pool.begin().await?;
		let parent_level = match req.parent_id {
			Some(parent_id) => Some(
				categories::get_category_for_update(&mut tx, parent_id)
					.await?
					.ok_or_else(|| {
						Error::validation(format!("parent_id {parent_id} does not exist."))
					})?
					.level,
			),
			None => None,
		};
		let level = hierarchy::level_under(parent_level);

		check_level(req.level, level)?;

		let row = categories::insert_category(&mut tx, &name, req.parent_id, level).await?;

		tx.commit().await?;

		tracing::info!(
			category_id = row.id,
			parent_id = ?row.parent_id,
			category_level = level,
			"Created category."
		);

		Ok(row.into())
	}

	pub async fn update_category(
		&self,
		id: i64,
		req: UpdateCategoryRequest,
	) -> Result<CategoryItem> {
		if req.parent_id == Some(Some(id)) {
			return Err(hierarchy::HierarchyError::SelfParent { id }.into());
		}

		let mut tx = self.db.pool.begin().await?;
		let mut row = categories::get_category_for_update(&mut tx, id)
			.await?
			.ok_or_else(|| Error::not_found("Category", id))?;

		if let Some(name) = req.name.as_deref() {
			row.name = crate::required_text("name", name)?;
		}

		let mut relevel = Vec::new();

		match req.parent_id {
			Some(parent_id) if parent_id != row.parent_id => {
				let edges = categories::list_category_edges(&mut tx).await?;
				let index = ChildIndex::new(&edges);

				index.check_reparent(id, parent_id)?;

				let parent_level = match parent_id {
					Some(parent_id) => Some(
						categories::get_category(&mut tx, parent_id)
							.await?
							.ok_or_else(|| {
								Error::validation(format!("parent_id {parent_id} does not exist."))
							})?
							.level,
					),
					None => None,
				};
				let level = hierarchy::level_under(parent_level);

				check_level(req.level, level)?;

				if level != row.level {
					relevel = index.relevel(id, level);
				}

				row.parent_id = parent_id;
				row.level = level;
			},
			_ => check_level(req.level, row.level)?,
		}

		categories::update_category(&mut tx, &row).await?;
		categories::set_category_levels(&mut tx, &relevel).await?;

		tx.commit().await?;

		tracing::info!(
			category_id = id,
			parent_id = ?row.parent_id,
			category_level = row.level,
			relevelled = relevel.len(),
			"Updated category."
		);

		Ok(row.into())
	}

	/// Removes the category; its descendants and their organization links cascade.
	pub async fn delete_category(&self, id: i64) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		if !categories::delete_category(&mut tx, id).await? {
			return Err(Error::not_found("Category", id));
		}

		tx.commit().await?;

		tracing::info!(category_id = id, "Deleted category.");

		Ok(())
	}

	async fn category_snapshot(&self) -> Result<Vec<CategoryItem>> {
		let mut conn = self.db.pool.acquire().await?;
		let rows = categories::list_all_categories(&mut conn).await?;

		Ok(rows.into_iter().map(CategoryItem::from).collect())
	}
}

fn check_level(supplied: Option<i32>, derived: i32) -> Result<()> {
	match supplied {
		Some(level) if level != derived => Err(Error::validation(format!(
			"level must be {derived} for this parent, got {level}."
		))),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn patch_distinguishes_null_from_absent_parent() {
		let detach: UpdateCategoryRequest =
			serde_json::from_str(r#"{"parent_id": null}"#).expect("Patch must parse.");
		let keep: UpdateCategoryRequest =
			serde_json::from_str(r#"{"name": "Dairy"}"#).expect("Patch must parse.");
		let move_under: UpdateCategoryRequest =
			serde_json::from_str(r#"{"parent_id": 7}"#).expect("Patch must parse.");

		assert_eq!(detach.parent_id, Some(None));
		assert_eq!(keep.parent_id, None);
		assert_eq!(move_under.parent_id, Some(Some(7)));
	}

	#[test]
	fn supplied_level_must_match_derived_level() {
		assert!(check_level(None, 2).is_ok());
		assert!(check_level(Some(2), 2).is_ok());
		assert!(matches!(check_level(Some(1), 2), Err(Error::Validation { .. })));
	}
}
