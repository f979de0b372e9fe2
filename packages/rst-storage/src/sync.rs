//! Reconciles a many-to-many association table toward a desired set of keys.
//!
//! A sync always issues one delete (every scoped row whose key is not desired) followed by one
//! insert of every desired row that skips rows already present. Unchanged rows are never touched,
//! and running the same sync twice leaves the table in the same state.

use std::{
	collections::{HashMap, HashSet},
	fmt::Display,
	hash::Hash,
};

use sqlx::{PgConnection, Postgres, QueryBuilder, query_builder::Separated};

use crate::{Error, Result};

pub const RECREATION_ACTIVITY: JoinTable = JoinTable {
	name: "recreation_activity",
	columns: &["rec_resource_id", "recreation_activity_code"],
};
pub const RECREATION_RESOURCE_FEATURE: JoinTable = JoinTable {
	name: "recreation_resource_feature",
	columns: &["rec_resource_id", "feature_code"],
};
pub const RECREATION_ACCESS: JoinTable = JoinTable {
	name: "recreation_access",
	columns: &["rec_resource_id", "access_code", "sub_access_code"],
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyValue {
	Int(Option<i32>),
	Text(Option<String>),
}
impl KeyValue {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Int(None) | Self::Text(None))
	}
}
impl From<i32> for KeyValue {
	fn from(value: i32) -> Self {
		Self::Int(Some(value))
	}
}
impl From<Option<i32>> for KeyValue {
	fn from(value: Option<i32>) -> Self {
		Self::Int(value)
	}
}
impl From<String> for KeyValue {
	fn from(value: String) -> Self {
		Self::Text(Some(value))
	}
}
impl From<&str> for KeyValue {
	fn from(value: &str) -> Self {
		Self::Text(Some(value.to_string()))
	}
}
impl From<Option<String>> for KeyValue {
	fn from(value: Option<String>) -> Self {
		Self::Text(value)
	}
}

/// Ordered column/value pairs. Used for sync scopes, composite key tuples, and rows to insert.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Columns(Vec<(&'static str, KeyValue)>);
impl Columns {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, column: &'static str, value: impl Into<KeyValue>) -> Self {
		self.0.push((column, value.into()));

		self
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.0.iter().map(|(column, _)| *column)
	}

	pub fn iter(&self) -> impl Iterator<Item = &(&'static str, KeyValue)> {
		self.0.iter()
	}

	fn into_values(self) -> impl Iterator<Item = KeyValue> {
		self.0.into_iter().map(|(_, value)| value)
	}
}

/// An association table the reconciler may write to, with the columns it may reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinTable {
	pub name: &'static str,
	pub columns: &'static [&'static str],
}
impl JoinTable {
	fn check_column(&self, column: &str) -> Result<()> {
		if self.columns.contains(&column) {
			Ok(())
		} else {
			Err(Error::InvalidArgument(format!(
				"Column {column:?} is not declared for table {:?}.",
				self.name
			)))
		}
	}

	fn check_columns<'c>(&self, columns: impl IntoIterator<Item = &'c str>) -> Result<()> {
		for column in columns {
			self.check_column(column)?;
		}

		Ok(())
	}
}

#[derive(Clone, Debug, Default)]
pub struct JoinTableRegistry {
	tables: HashMap<&'static str, JoinTable>,
}
impl JoinTableRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Association tables edited through the admin layer.
	pub fn catalog() -> Self {
		Self::new()
			.with_table(RECREATION_ACTIVITY)
			.with_table(RECREATION_RESOURCE_FEATURE)
			.with_table(RECREATION_ACCESS)
	}

	pub fn with_table(mut self, table: JoinTable) -> Self {
		self.tables.insert(table.name, table);

		self
	}

	pub fn resolve(&self, name: &str) -> Result<JoinTable> {
		self.tables.get(name).copied().ok_or_else(|| Error::UnknownTable(name.to_string()))
	}
}

/// Sync keyed by a single column, scoped to the rows matching `scope`.
pub struct SyncRequest<'a, K, F> {
	pub table: &'a str,
	pub scope: Columns,
	pub key_column: &'static str,
	pub desired_keys: Vec<K>,
	pub create_row: F,
}

/// Sync keyed by whole column tuples rather than one key column.
pub struct CompositeSyncRequest<'a, F> {
	pub table: &'a str,
	pub scope: Columns,
	pub desired_rows: Vec<Columns>,
	pub create_row: F,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
	pub deleted: u64,
	pub inserted: u64,
}

/// The statements a sync will run, built before anything touches the database.
pub struct SyncPlan {
	delete: QueryBuilder<'static, Postgres>,
	insert: Option<QueryBuilder<'static, Postgres>>,
	insert_rows: usize,
}
impl SyncPlan {
	pub fn delete_sql(&self) -> &str {
		self.delete.sql()
	}

	pub fn insert_sql(&self) -> Option<&str> {
		self.insert.as_ref().map(QueryBuilder::sql)
	}

	pub fn insert_row_count(&self) -> usize {
		self.insert_rows
	}

	pub async fn execute(mut self, conn: &mut PgConnection) -> Result<SyncOutcome> {
		let deleted = self.delete.build().execute(&mut *conn).await?.rows_affected();
		let inserted = match self.insert.as_mut() {
			Some(insert) => insert.build().execute(&mut *conn).await?.rows_affected(),
			None => 0,
		};

		Ok(SyncOutcome { deleted, inserted })
	}
}

pub fn plan_sync<K, F>(registry: &JoinTableRegistry, req: SyncRequest<'_, K, F>) -> Result<SyncPlan>
where
	K: Clone + Eq + Hash + Into<KeyValue>,
	F: Fn(&K) -> Columns,
{
	let table = registry.resolve(req.table)?;

	check_scope(&table, &req.scope)?;
	table.check_column(req.key_column)?;

	let keys = dedup(req.desired_keys);
	let key_values = keys.iter().cloned().map(Into::into).collect::<Vec<KeyValue>>();

	if key_values.iter().any(KeyValue::is_null) {
		return Err(Error::InvalidArgument(format!(
			"Sync keys for {}.{} must not be null.",
			table.name, req.key_column
		)));
	}

	let mut delete = QueryBuilder::new(format!("DELETE FROM {} WHERE ", table.name));

	push_scope(&mut delete, &req.scope);

	if !key_values.is_empty() {
		delete.push(" AND ").push(req.key_column).push(" NOT IN (");

		let mut list = delete.separated(", ");

		for value in key_values {
			push_bind_separated(&mut list, value);
		}

		list.push_unseparated(")");
	}

	let rows = keys.iter().map(&req.create_row).collect::<Vec<_>>();
	let insert_rows = rows.len();
	let insert = build_insert(&table, rows)?;

	Ok(SyncPlan { delete, insert, insert_rows })
}

pub fn plan_sync_composite<F>(
	registry: &JoinTableRegistry,
	req: CompositeSyncRequest<'_, F>,
) -> Result<SyncPlan>
where
	F: Fn(&Columns) -> Columns,
{
	let table = registry.resolve(req.table)?;

	check_scope(&table, &req.scope)?;

	let tuples = dedup(req.desired_rows);

	for tuple in &tuples {
		if tuple.is_empty() {
			return Err(Error::InvalidArgument(format!(
				"Composite sync keys for {} must name at least one column.",
				table.name
			)));
		}

		table.check_columns(tuple.names())?;
	}

	let mut delete = QueryBuilder::new(format!("DELETE FROM {} WHERE ", table.name));

	push_scope(&mut delete, &req.scope);

	if !tuples.is_empty() {
		delete.push(" AND NOT (");

		for (index, tuple) in tuples.iter().enumerate() {
			if index > 0 {
				delete.push(" OR ");
			}

			delete.push("(");
			push_tuple_match(&mut delete, tuple);
			delete.push(")");
		}

		delete.push(")");
	}

	let rows = tuples.iter().map(&req.create_row).collect::<Vec<_>>();
	let insert_rows = rows.len();
	let insert = build_insert(&table, rows)?;

	Ok(SyncPlan { delete, insert, insert_rows })
}

pub async fn sync<K, F>(
	conn: &mut PgConnection,
	registry: &JoinTableRegistry,
	req: SyncRequest<'_, K, F>,
) -> Result<SyncOutcome>
where
	K: Clone + Eq + Hash + Into<KeyValue>,
	F: Fn(&K) -> Columns,
{
	plan_sync(registry, req)?.execute(conn).await
}

pub async fn sync_composite<F>(
	conn: &mut PgConnection,
	registry: &JoinTableRegistry,
	req: CompositeSyncRequest<'_, F>,
) -> Result<SyncOutcome>
where
	F: Fn(&Columns) -> Columns,
{
	plan_sync_composite(registry, req)?.execute(conn).await
}

fn dedup<K>(keys: Vec<K>) -> Vec<K>
where
	K: Clone + Eq + Hash,
{
	let mut seen = HashSet::with_capacity(keys.len());

	keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}

fn check_scope(table: &JoinTable, scope: &Columns) -> Result<()> {
	// An empty scope would turn the delete into a whole-table wipe.
	if scope.is_empty() {
		return Err(Error::InvalidArgument(format!(
			"Sync scope for {} must name at least one column.",
			table.name
		)));
	}

	table.check_columns(scope.names())
}

fn build_insert(
	table: &JoinTable,
	rows: Vec<Columns>,
) -> Result<Option<QueryBuilder<'static, Postgres>>> {
	let Some(first) = rows.first() else {
		return Ok(None);
	};
	let columns = first.names().collect::<Vec<_>>();

	if columns.is_empty() {
		return Err(Error::InvalidArgument(format!(
			"Rows created for {} must name at least one column.",
			table.name
		)));
	}

	table.check_columns(columns.iter().copied())?;

	if rows.iter().any(|row| !row.names().eq(columns.iter().copied())) {
		return Err(Error::InvalidArgument(format!(
			"Rows created for {} must share one column layout.",
			table.name
		)));
	}

	let mut insert =
		QueryBuilder::new(format!("INSERT INTO {} ({}) ", table.name, columns.join(", ")));

	insert.push_values(rows, |mut tuple, row| {
		for value in row.into_values() {
			push_bind_separated(&mut tuple, value);
		}
	});
	insert.push(" ON CONFLICT DO NOTHING");

	Ok(Some(insert))
}

fn push_scope(builder: &mut QueryBuilder<'static, Postgres>, scope: &Columns) {
	push_conjunction(builder, scope, " = ");
}

// A tuple match is never NULL, so stored NULL columns compare false against bound values.
fn push_tuple_match(builder: &mut QueryBuilder<'static, Postgres>, tuple: &Columns) {
	push_conjunction(builder, tuple, " IS NOT DISTINCT FROM ");
}

fn push_conjunction(
	builder: &mut QueryBuilder<'static, Postgres>,
	columns: &Columns,
	comparison: &str,
) {
	for (index, (column, value)) in columns.iter().enumerate() {
		if index > 0 {
			builder.push(" AND ");
		}

		builder.push(column);

		if value.is_null() {
			builder.push(" IS NULL");

			continue;
		}

		builder.push(comparison);

		match value.clone() {
			KeyValue::Int(value) => builder.push_bind(value),
			KeyValue::Text(value) => builder.push_bind(value),
		};
	}
}

fn push_bind_separated<Sep>(list: &mut Separated<'_, 'static, Postgres, Sep>, value: KeyValue)
where
	Sep: Display,
{
	match value {
		KeyValue::Int(value) => list.push_bind(value),
		KeyValue::Text(value) => list.push_bind(value),
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	fn activity_request(keys: Vec<i32>) -> SyncRequest<'static, i32, impl Fn(&i32) -> Columns> {
		SyncRequest {
			table: "recreation_activity",
			scope: Columns::new().with("rec_resource_id", "REC0001"),
			key_column: "recreation_activity_code",
			desired_keys: keys,
			create_row: |code: &i32| {
				Columns::new()
					.with("rec_resource_id", "REC0001")
					.with("recreation_activity_code", *code)
			},
		}
	}

	fn access_tuple(access_code: &str, sub_access_code: Option<&str>) -> Columns {
		Columns::new()
			.with("access_code", access_code)
			.with("sub_access_code", sub_access_code.map(str::to_string))
	}

	fn access_row(tuple: &Columns) -> Columns {
		let mut row = Columns::new().with("rec_resource_id", "REC0001");

		for (column, value) in tuple.iter() {
			row = row.with(*column, value.clone());
		}

		row
	}

	#[test]
	fn scalar_plan_deletes_keys_outside_desired_set() {
		let plan = plan_sync(&JoinTableRegistry::catalog(), activity_request(vec![1, 2, 3]))
			.expect("Expected plan.");

		assert_eq!(
			plan.delete_sql(),
			"DELETE FROM recreation_activity WHERE rec_resource_id = $1 AND recreation_activity_code NOT IN ($2, $3, $4)"
		);

		let insert = plan.insert_sql().expect("Expected insert statement.");

		assert!(insert.starts_with(
			"INSERT INTO recreation_activity (rec_resource_id, recreation_activity_code) VALUES"
		));
		assert!(insert.ends_with(" ON CONFLICT DO NOTHING"));
	}

	#[test]
	fn scalar_plan_deduplicates_desired_keys() {
		let plan = plan_sync(&JoinTableRegistry::catalog(), activity_request(vec![1, 2, 2, 3]))
			.expect("Expected plan.");

		assert_eq!(plan.insert_row_count(), 3);
		assert!(plan.delete_sql().ends_with("NOT IN ($2, $3, $4)"));
	}

	#[test]
	fn empty_desired_set_deletes_whole_scope_and_skips_insert() {
		let plan = plan_sync(&JoinTableRegistry::catalog(), activity_request(Vec::new()))
			.expect("Expected plan.");

		assert_eq!(plan.delete_sql(), "DELETE FROM recreation_activity WHERE rec_resource_id = $1");
		assert!(plan.insert_sql().is_none());
		assert_eq!(plan.insert_row_count(), 0);
	}

	#[test]
	fn repeated_plans_issue_both_statements() {
		let registry = JoinTableRegistry::catalog();
		let first = plan_sync(&registry, activity_request(vec![4, 5])).expect("Expected plan.");
		let second = plan_sync(&registry, activity_request(vec![4, 5])).expect("Expected plan.");

		assert_eq!(first.delete_sql(), second.delete_sql());
		assert_eq!(first.insert_sql(), second.insert_sql());
		assert!(second.insert_sql().is_some());
	}

	#[test]
	fn unknown_table_is_reported_by_name() {
		let mut req = activity_request(vec![1]);

		req.table = "recreation_activities";

		let err = plan_sync(&JoinTableRegistry::catalog(), req).err().expect("Expected error.");

		assert!(matches!(err, Error::UnknownTable(ref name) if name == "recreation_activities"));
		assert!(err.to_string().contains("recreation_activities"));
	}

	#[test]
	fn empty_registry_resolves_nothing() {
		let err = plan_sync(&JoinTableRegistry::new(), activity_request(vec![1]))
			.err()
			.expect("Expected error.");

		assert!(matches!(err, Error::UnknownTable(_)));
	}

	#[test]
	fn undeclared_columns_are_rejected() {
		let mut req = activity_request(vec![1]);

		req.key_column = "recreation_activity_code; DROP TABLE recreation_activity";

		let err = plan_sync(&JoinTableRegistry::catalog(), req).err().expect("Expected error.");

		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn empty_scope_is_rejected() {
		let mut req = activity_request(vec![1]);

		req.scope = Columns::new();

		let err = plan_sync(&JoinTableRegistry::catalog(), req).err().expect("Expected error.");

		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn null_scalar_key_is_rejected() {
		let req = SyncRequest {
			table: "recreation_resource_feature",
			scope: Columns::new().with("rec_resource_id", "REC0001"),
			key_column: "feature_code",
			desired_keys: vec![None::<String>],
			create_row: |code: &Option<String>| {
				Columns::new()
					.with("rec_resource_id", "REC0001")
					.with("feature_code", code.clone())
			},
		};
		let err = plan_sync(&JoinTableRegistry::catalog(), req).err().expect("Expected error.");

		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn mismatched_row_layouts_are_rejected() {
		let req = SyncRequest {
			table: "recreation_activity",
			scope: Columns::new().with("rec_resource_id", "REC0001"),
			key_column: "recreation_activity_code",
			desired_keys: vec![1, 2],
			create_row: |code: &i32| {
				if *code == 1 {
					Columns::new()
						.with("rec_resource_id", "REC0001")
						.with("recreation_activity_code", *code)
				} else {
					Columns::new()
						.with("recreation_activity_code", *code)
						.with("rec_resource_id", "REC0001")
				}
			},
		};
		let err = plan_sync(&JoinTableRegistry::catalog(), req).err().expect("Expected error.");

		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn composite_plan_excludes_desired_tuples() {
		let req = CompositeSyncRequest {
			table: "recreation_access",
			scope: Columns::new().with("rec_resource_id", "REC0001"),
			desired_rows: vec![access_tuple("R", Some("4W")), access_tuple("B", None)],
			create_row: access_row,
		};
		let plan = plan_sync_composite(&JoinTableRegistry::catalog(), req).expect("Expected plan.");

		assert_eq!(
			plan.delete_sql(),
			"DELETE FROM recreation_access WHERE rec_resource_id = $1 AND NOT ((access_code IS NOT DISTINCT FROM $2 AND sub_access_code IS NOT DISTINCT FROM $3) OR (access_code IS NOT DISTINCT FROM $4 AND sub_access_code IS NULL))"
		);
		assert_eq!(plan.insert_row_count(), 2);
		assert!(
			plan.insert_sql()
				.expect("Expected insert statement.")
				.starts_with("INSERT INTO recreation_access (rec_resource_id, access_code, sub_access_code) VALUES")
		);
	}

	#[test]
	fn composite_plan_with_no_rows_deletes_by_scope_alone() {
		let req = CompositeSyncRequest {
			table: "recreation_access",
			scope: Columns::new().with("rec_resource_id", "REC0001"),
			desired_rows: Vec::new(),
			create_row: access_row,
		};
		let plan = plan_sync_composite(&JoinTableRegistry::catalog(), req).expect("Expected plan.");

		assert_eq!(plan.delete_sql(), "DELETE FROM recreation_access WHERE rec_resource_id = $1");
		assert!(plan.insert_sql().is_none());
	}

	#[test]
	fn composite_plan_deduplicates_tuples() {
		let req = CompositeSyncRequest {
			table: "recreation_access",
			scope: Columns::new().with("rec_resource_id", "REC0001"),
			desired_rows: vec![
				access_tuple("R", Some("4W")),
				access_tuple("R", Some("4W")),
				access_tuple("R", None),
			],
			create_row: access_row,
		};
		let plan = plan_sync_composite(&JoinTableRegistry::catalog(), req).expect("Expected plan.");

		assert_eq!(plan.insert_row_count(), 2);
	}
}
