use orgdir_config::{Categories, Config, Postgres, Security, Seed, Service, Storage};
use orgdir_domain::geo::LocationQuery;
use orgdir_service::{
	CategoryItem, CreateBuildingRequest, CreateCategoryRequest, CreateOrganizationRequest,
	DirectoryService, Error, OrganizationQuery, SeedReport, UpdateCategoryRequest,
	UpdateOrganizationRequest,
};
use orgdir_storage::db::Db;
use orgdir_testkit::TestDatabase;

fn test_config(dsn: String) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			default_page_limit: 100,
			max_page_limit: 1_000,
		},
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2 } },
		security: Security { bind_localhost_only: true, api_key: "secret".to_string() },
		categories: Categories { max_depth: 3 },
		seed: Seed { demo_data: false },
	}
}

async fn test_service(test_db: &TestDatabase) -> DirectoryService {
	let cfg = test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	DirectoryService::new(cfg, db)
}

async fn category(
	service: &DirectoryService,
	name: &str,
	parent: Option<&CategoryItem>,
) -> CategoryItem {
	service
		.create_category(CreateCategoryRequest {
			name: name.to_string(),
			parent_id: parent.map(|parent| parent.id),
			level: None,
		})
		.await
		.expect("Failed to create category.")
}

async fn building(service: &DirectoryService, address: &str, lat: f64, lon: f64) -> i64 {
	service
		.create_building(CreateBuildingRequest {
			address: address.to_string(),
			latitude: lat,
			longitude: lon,
		})
		.await
		.expect("Failed to create building.")
		.id
}

async fn organization(
	service: &DirectoryService,
	name: &str,
	building_id: i64,
	category_ids: Vec<i64>,
) -> i64 {
	service
		.create_organization(CreateOrganizationRequest {
			name: name.to_string(),
			building_id,
			phone_numbers: vec!["2-222-222".to_string()],
			category_ids,
		})
		.await
		.expect("Failed to create organization.")
		.id
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
	items.iter().map(id).collect()
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn self_parent_rejection_leaves_category_unmodified() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping self_parent_rejection_leaves_category_unmodified; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let food = category(&service, "Food", None).await;
	let dairy = category(&service, "Dairy", Some(&food)).await;
	let err = service
		.update_category(
			dairy.id,
			UpdateCategoryRequest {
				name: Some("Renamed".to_string()),
				parent_id: Some(Some(dairy.id)),
				level: None,
			},
		)
		.await
		.expect_err("Self-parent must be rejected.");

	assert!(matches!(err, Error::InvalidOperation { .. }), "Unexpected error: {err:?}");

	let stored = service.get_category(dairy.id).await.expect("Category must still exist.");

	assert_eq!(stored.node, dairy);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn reparenting_relevels_subtree_and_rejects_cycles() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping reparenting_relevels_subtree_and_rejects_cycles; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let food = category(&service, "Food", None).await;
	let dairy = category(&service, "Dairy", Some(&food)).await;
	let cheese = category(&service, "Cheese", Some(&dairy)).await;

	assert_eq!((food.level, dairy.level, cheese.level), (1, 2, 3));

	let err = service
		.update_category(
			food.id,
			UpdateCategoryRequest { parent_id: Some(Some(cheese.id)), ..Default::default() },
		)
		.await
		.expect_err("Cycle must be rejected.");

	assert!(matches!(err, Error::InvalidOperation { .. }), "Unexpected error: {err:?}");

	let detached = service
		.update_category(
			dairy.id,
			UpdateCategoryRequest { parent_id: Some(None), ..Default::default() },
		)
		.await
		.expect("Detaching must succeed.");

	assert_eq!((detached.parent_id, detached.level), (None, 1));

	let cheese_view = service.get_category(cheese.id).await.expect("Cheese must exist.");

	assert_eq!(cheese_view.node.level, 2);

	let err = service
		.create_category(CreateCategoryRequest {
			name: "Butter".to_string(),
			parent_id: Some(dairy.id),
			level: Some(3),
		})
		.await
		.expect_err("Mismatched level must be rejected.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn subtree_lookup_includes_descendants_and_exact_does_not() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!(
			"Skipping subtree_lookup_includes_descendants_and_exact_does_not; set ORGDIR_PG_DSN."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let food = category(&service, "Food", None).await;
	let dairy = category(&service, "Dairy", Some(&food)).await;
	let cheese = category(&service, "Cheese", Some(&dairy)).await;
	let building_id = building(&service, "Lenina 1", 55.0, 37.0).await;
	let org = organization(&service, "Milk LLC", building_id, vec![dairy.id]).await;
	let by_tree = service
		.organizations_by_category(food.id, true, None, None)
		.await
		.expect("Tree lookup failed.");
	let by_exact_food = service
		.organizations_by_category(food.id, false, None, None)
		.await
		.expect("Exact lookup failed.");
	let by_exact_cheese = service
		.organizations_by_category(cheese.id, false, None, None)
		.await
		.expect("Exact lookup failed.");
	let by_unknown = service
		.organizations_by_category(9_999, true, None, None)
		.await
		.expect("Unknown root must not fail.");

	assert_eq!(ids(&by_tree, |view| view.id), vec![org]);
	assert!(by_exact_food.is_empty());
	assert!(by_exact_cheese.is_empty());
	assert!(by_unknown.is_empty());
	assert_eq!(by_tree[0].categories, vec![dairy]);
	assert_eq!(by_tree[0].building.id, building_id);
	assert_eq!(by_tree[0].phones.len(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn empty_category_list_clears_associations() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping empty_category_list_clears_associations; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let food = category(&service, "Food", None).await;
	let meat = category(&service, "Meat", Some(&food)).await;
	let building_id = building(&service, "Lenina 1", 55.0, 37.0).await;
	let org = organization(&service, "Horns", building_id, vec![food.id, meat.id]).await;
	let updated = service
		.update_organization(
			org,
			UpdateOrganizationRequest { category_ids: Some(vec![]), ..Default::default() },
		)
		.await
		.expect("Update failed.");

	assert!(updated.categories.is_empty());
	assert_eq!(updated.phones.len(), 1, "Absent phone list must be left untouched.");

	let err = service
		.update_organization(
			org,
			UpdateOrganizationRequest { category_ids: Some(vec![9_999]), ..Default::default() },
		)
		.await
		.expect_err("Unknown category must be rejected.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn building_delete_guard() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping building_delete_guard; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let occupied = building(&service, "Lenina 1", 55.0, 37.0).await;
	let empty = building(&service, "Lenina 2", 55.0, 37.0).await;
	let org = organization(&service, "Milk LLC", occupied, vec![]).await;
	let err = service.delete_building(occupied).await.expect_err("Occupied building must stay.");

	assert!(matches!(err, Error::Conflict { .. }), "Unexpected error: {err:?}");

	service.delete_building(empty).await.expect("Empty building must be deleted.");

	let err = service.delete_building(empty).await.expect_err("Building is already gone.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");

	service.delete_organization(org).await.expect("Failed to delete organization.");
	service.delete_building(occupied).await.expect("Vacated building must be deleted.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn pages_are_stable_and_location_is_refined() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping pages_are_stable_and_location_is_refined; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let center = building(&service, "Center", 0.0, 0.0).await;
	// Inside the radius-1 envelope but outside the circle.
	let corner = building(&service, "Corner", 0.9, 0.9).await;
	let mut at_center = Vec::new();

	for index in 0..5 {
		at_center.push(organization(&service, &format!("Org {index}"), center, vec![]).await);
	}

	let cornered = organization(&service, "Cornered", corner, vec![]).await;
	let query = || OrganizationQuery {
		building_id: Some(center),
		offset: Some(1),
		limit: Some(2),
		..Default::default()
	};
	let first = service.search_organizations(query()).await.expect("Search failed.");
	let second = service.search_organizations(query()).await.expect("Search failed.");

	assert_eq!(first, second);
	assert_eq!(ids(&first, |view| view.id), at_center[1..3].to_vec());

	let radius =
		LocationQuery { lat: Some(0.0), lon: Some(0.0), radius: Some(1.0), ..Default::default() };
	let in_circle = service
		.organizations_by_location(radius, Some(4), Some(10))
		.await
		.expect("Radius search failed.");

	assert_eq!(ids(&in_circle, |view| view.id), vec![at_center[4]]);

	let bounds = LocationQuery {
		min_lat: Some(0.5),
		max_lat: Some(1.0),
		min_lon: Some(0.5),
		max_lon: Some(1.0),
		..Default::default()
	};
	let in_box = service
		.organizations_by_location(bounds, None, None)
		.await
		.expect("Box search failed.");

	assert_eq!(ids(&in_box, |view| view.id), vec![cornered]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn radius_search_keeps_buildings_on_the_circle() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping radius_search_keeps_buildings_on_the_circle; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let edge = building(&service, "Edge", 0.9936, 0.0).await;
	let on_edge = organization(&service, "On edge", edge, vec![]).await;
	let radius = LocationQuery {
		lat: Some(-0.8959),
		lon: Some(0.0),
		radius: Some(1.8895),
		..Default::default()
	};
	let found = service
		.organizations_by_location(radius, None, None)
		.await
		.expect("Radius search failed.");

	assert_eq!(ids(&found, |view| view.id), vec![on_edge]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ORGDIR_PG_DSN to run."]
async fn demo_seed_is_idempotent() {
	let Some(base_dsn) = orgdir_testkit::env_dsn() else {
		eprintln!("Skipping demo_seed_is_idempotent; set ORGDIR_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = test_service(&test_db).await;
	let first = service.seed_demo_data().await.expect("First seed failed.");
	let second = service.seed_demo_data().await.expect("Second seed failed.");

	assert_eq!(
		(first.buildings_created, first.categories_created, first.organizations_created),
		(2, 8, 2)
	);
	assert_eq!(second, SeedReport::default());

	let tree = service.category_tree(None).await.expect("Tree failed.");
	let roots = tree.iter().map(|root| root.node.name.as_str()).collect::<Vec<_>>();

	assert_eq!(roots, vec!["Food", "Automobiles"]);

	let milk = service.organizations_by_name("milk", None, None).await.expect("Search failed.");

	assert_eq!(milk.len(), 1);
	assert_eq!(milk[0].name, "Milk LLC");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
