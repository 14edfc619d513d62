mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Categories, Config, Postgres, Security, Seed, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.security.api_key.is_empty() {
		return Err(Error::Validation {
			message: "security.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.service.default_page_limit == 0 {
		return Err(Error::Validation {
			message: "service.default_page_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.service.default_page_limit > cfg.service.max_page_limit {
		return Err(Error::Validation {
			message: "service.default_page_limit must not exceed service.max_page_limit."
				.to_string(),
		});
	}
	if cfg.categories.max_depth == 0 {
		return Err(Error::Validation {
			message: "categories.max_depth must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.http_bind = cfg.service.http_bind.trim().to_string();
	cfg.storage.postgres.dsn = cfg.storage.postgres.dsn.trim().to_string();
	cfg.security.api_key = cfg.security.api_key.trim().to_string();
}
