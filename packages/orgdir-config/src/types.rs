use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub security: Security,
	#[serde(default)]
	pub categories: Categories,
	#[serde(default)]
	pub seed: Seed,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_page_limit")]
	pub default_page_limit: u32,
	#[serde(default = "default_max_page_limit")]
	pub max_page_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Static credential expected in the `X-API-KEY` header of every `/api/v1` request.
	pub api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Categories {
	/// Traversal cap for the category tree, descendant closure, and single-category views.
	/// The root of a traversal counts as level 1.
	pub max_depth: u32,
}
impl Default for Categories {
	fn default() -> Self {
		Self { max_depth: 3 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
	pub demo_data: bool,
}

fn default_page_limit() -> u32 {
	100
}

fn default_max_page_limit() -> u32 {
	1_000
}
