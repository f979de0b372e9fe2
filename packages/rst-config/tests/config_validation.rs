use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use rst_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("System time must be valid.");
	let seq = COUNTER.fetch_add(1, Ordering::SeqCst);
	let path = env::temp_dir().join(format!(
		"rst_config_test_{}_{}_{seq}.toml",
		std::process::id(),
		nanos.as_nanos()
	));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_value(value: &Value) -> rst_config::Result<Config> {
	let payload = toml::to_string(value).expect("Failed to render test config.");
	let path = write_temp_config(payload);
	let result = rst_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn table_mut<'a>(value: &'a mut Value, key: &str) -> &'a mut toml::Table {
	value
		.as_table_mut()
		.and_then(|root| root.get_mut(key))
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{key}]."))
}

#[test]
fn sample_config_loads() {
	let cfg = load_value(&sample_value()).expect("Expected sample config to load.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8080");
	assert_eq!(cfg.storage.postgres.pool_max_conns, 10);
	assert_eq!(cfg.facets.excluded_activity_codes, vec![26]);
	assert_eq!(cfg.facets.excluded_district_codes, vec!["NULL".to_string(), "RDRM".to_string()]);
	assert!(cfg.facets.excluded_access_codes.is_empty());
}

#[test]
fn facets_section_is_optional() {
	let mut value = sample_value();

	value.as_table_mut().expect("Template config must be a table.").remove("facets");

	let cfg = load_value(&value).expect("Expected config without [facets] to load.");

	assert!(cfg.facets.excluded_activity_codes.is_empty());
	assert!(cfg.facets.excluded_district_codes.is_empty());
	assert!(cfg.facets.excluded_resource_type_codes.is_empty());
}

#[test]
fn exclusion_lists_are_trimmed_and_deduplicated() {
	let mut value = sample_value();
	let facets = table_mut(&mut value, "facets");

	facets.insert(
		"excluded_district_codes".to_string(),
		Value::Array(vec![
			Value::String(" RDRM ".to_string()),
			Value::String("NULL".to_string()),
			Value::String("RDRM".to_string()),
		]),
	);
	facets.insert(
		"excluded_activity_codes".to_string(),
		Value::Array(vec![Value::Integer(26), Value::Integer(3), Value::Integer(26)]),
	);

	let cfg = load_value(&value).expect("Expected config to load.");

	assert_eq!(cfg.facets.excluded_district_codes, vec!["NULL".to_string(), "RDRM".to_string()]);
	assert_eq!(cfg.facets.excluded_activity_codes, vec![3, 26]);
}

#[test]
fn blank_exclusion_code_is_rejected() {
	let mut value = sample_value();
	let facets = table_mut(&mut value, "facets");

	facets.insert(
		"excluded_access_codes".to_string(),
		Value::Array(vec![Value::String("   ".to_string())]),
	);

	let err = load_value(&value).expect_err("Expected blank code to be rejected.");

	assert!(
		matches!(err, Error::Validation { ref message } if message.contains("facets.excluded_access_codes")),
		"Unexpected error: {err:?}"
	);
}

#[test]
fn zero_pool_size_is_rejected() {
	let mut value = sample_value();
	let storage = table_mut(&mut value, "storage");
	let postgres = storage
		.get_mut("postgres")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [storage.postgres].");

	postgres.insert("pool_max_conns".to_string(), Value::Integer(0));

	let err = load_value(&value).expect_err("Expected zero pool size to be rejected.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");
}

#[test]
fn empty_dsn_is_rejected() {
	let mut value = sample_value();
	let storage = table_mut(&mut value, "storage");
	let postgres = storage
		.get_mut("postgres")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [storage.postgres].");

	postgres.insert("dsn".to_string(), Value::String(" ".to_string()));

	let err = load_value(&value).expect_err("Expected empty dsn to be rejected.");

	assert!(
		matches!(err, Error::Validation { ref message } if message == "storage.postgres.dsn must be non-empty."),
		"Unexpected error: {err:?}"
	);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("rst_config_test_missing_file.toml");
	let err = rst_config::load(&path).expect_err("Expected missing file to fail.");

	assert!(matches!(err, Error::ReadConfig { path: ref reported, .. } if reported == &path));
}

#[test]
fn log_level_defaults_to_info() {
	let mut value = sample_value();

	table_mut(&mut value, "service").remove("log_level");

	let cfg = load_value(&value).expect("Expected config to load.");

	assert_eq!(cfg.service.log_level, "info");
}
