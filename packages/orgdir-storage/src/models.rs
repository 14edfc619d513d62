#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Category {
	pub id: i64,
	pub name: String,
	pub parent_id: Option<i64>,
	pub level: i32,
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Building {
	pub id: i64,
	pub address: String,
	pub latitude: f64,
	pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Phone {
	pub id: i64,
	pub number: String,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Organization {
	pub id: i64,
	pub name: String,
	pub building_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrganizationPhone {
	pub organization_id: i64,
	pub id: i64,
	pub number: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrganizationCategory {
	pub organization_id: i64,
	pub id: i64,
	pub name: String,
	pub parent_id: Option<i64>,
	pub level: i32,
}

/// Organization id paired with the coordinates of its building.
#[derive(Clone, Copy, Debug, PartialEq, sqlx::FromRow)]
pub struct OrganizationLocation {
	pub id: i64,
	pub latitude: f64,
	pub longitude: f64,
}
