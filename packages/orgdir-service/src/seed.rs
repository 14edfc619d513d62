//! Demo dataset. Every row is looked up by its natural key first, so reseeding is a no-op.

use sqlx::PgConnection;

use crate::{DirectoryService, Result};
use orgdir_domain::hierarchy;
use orgdir_storage::{
	buildings, categories,
	models::{Building, Category},
	organizations,
};

const BUILDINGS: [(&str, f64, f64); 2] = [
	("Moscow, Lenina st. 1, office 3", 55.7558, 37.6176),
	("Novosibirsk, Bluchera st. 32/1", 55.0415, 82.9346),
];

/// `(name, parent name)` in creation order; parents precede their children.
const CATEGORIES: [(&str, Option<&str>); 8] = [
	("Food", None),
	("Meat products", Some("Food")),
	("Dairy products", Some("Food")),
	("Automobiles", None),
	("Trucks", Some("Automobiles")),
	("Passenger cars", Some("Automobiles")),
	("Parts", Some("Passenger cars")),
	("Accessories", Some("Passenger cars")),
];

struct DemoOrganization {
	name: &'static str,
	building: usize,
	phones: &'static [&'static str],
	categories: &'static [&'static str],
}

const ORGANIZATIONS: [DemoOrganization; 2] = [
	DemoOrganization {
		name: "Horns and Hooves LLC",
		building: 1,
		phones: &["2-222-222", "3-333-333", "8-923-666-13-13"],
		categories: &["Meat products", "Food"],
	},
	DemoOrganization {
		name: "Milk LLC",
		building: 0,
		phones: &["3-333-333"],
		categories: &["Dairy products"],
	},
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
	pub buildings_created: usize,
	pub categories_created: usize,
	pub organizations_created: usize,
}

impl DirectoryService {
	pub async fn seed_demo_data(&self) -> Result<SeedReport> {
		let mut report = SeedReport::default();
		let mut tx = self.db.pool.begin().await?;
		let mut seeded_buildings = Vec::with_capacity(BUILDINGS.len());

		for (address, latitude, longitude) in BUILDINGS {
			let building = match buildings::find_building_by_address(&mut tx, address).await? {
				Some(building) => building,
				None => {
					report.buildings_created += 1;

					buildings::insert_building(&mut tx, address, latitude, longitude).await?
				},
			};

			seeded_buildings.push(building);
		}

		let mut seeded_categories: Vec<Category> = Vec::with_capacity(CATEGORIES.len());

		for (name, parent) in CATEGORIES {
			let parent = parent.and_then(|parent| {
				seeded_categories.iter().find(|category| category.name == parent)
			});
			let (parent_id, parent_level) =
				(parent.map(|parent| parent.id), parent.map(|parent| parent.level));
			let category = match categories::find_category_by_name(&mut tx, name).await? {
				Some(category) => category,
				None => {
					report.categories_created += 1;

					categories::insert_category(
						&mut tx,
						name,
						parent_id,
						hierarchy::level_under(parent_level),
					)
					.await?
				},
			};

			seeded_categories.push(category);
		}

		for demo in &ORGANIZATIONS {
			if seed_organization(&mut tx, demo, &seeded_buildings, &seeded_categories).await? {
				report.organizations_created += 1;
			}
		}

		tx.commit().await?;

		tracing::info!(
			buildings_created = report.buildings_created,
			categories_created = report.categories_created,
			organizations_created = report.organizations_created,
			"Demo data seeded."
		);

		Ok(report)
	}
}

async fn seed_organization(
	conn: &mut PgConnection,
	demo: &DemoOrganization,
	seeded_buildings: &[Building],
	seeded_categories: &[Category],
) -> Result<bool> {
	let building_id = seeded_buildings[demo.building].id;

	if organizations::find_organization(conn, demo.name, building_id).await?.is_some() {
		return Ok(false);
	}

	let row = organizations::insert_organization(conn, demo.name, building_id).await?;
	let numbers = demo.phones.iter().map(|number| number.to_string()).collect::<Vec<_>>();
	let phone_ids = organizations::upsert_phones(conn, &numbers)
		.await?
		.into_iter()
		.map(|phone| phone.id)
		.collect::<Vec<_>>();
	let category_ids = seeded_categories
		.iter()
		.filter(|category| demo.categories.iter().any(|name| *name == category.name))
		.map(|category| category.id)
		.collect::<Vec<_>>();

	organizations::replace_organization_phones(conn, row.id, &phone_ids).await?;
	organizations::replace_organization_categories(conn, row.id, &category_ids).await?;

	Ok(true)
}
