mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Facets, Postgres, Service, Storage};

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
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, codes) in [
		("facets.excluded_district_codes", &cfg.facets.excluded_district_codes),
		("facets.excluded_access_codes", &cfg.facets.excluded_access_codes),
		("facets.excluded_resource_type_codes", &cfg.facets.excluded_resource_type_codes),
	] {
		if codes.iter().any(|code| code.is_empty()) {
			return Err(Error::Validation {
				message: format!("{label} must not contain empty codes."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let facets = &mut cfg.facets;

	for codes in [
		&mut facets.excluded_district_codes,
		&mut facets.excluded_access_codes,
		&mut facets.excluded_resource_type_codes,
	] {
		normalize_codes(codes);
	}

	facets.excluded_activity_codes.sort_unstable();
	facets.excluded_activity_codes.dedup();
}

fn normalize_codes(codes: &mut Vec<String>) {
	for code in codes.iter_mut() {
		let trimmed = code.trim();

		if trimmed.len() != code.len() {
			*code = trimmed.to_string();
		}
	}

	codes.sort();
	codes.dedup();
}
