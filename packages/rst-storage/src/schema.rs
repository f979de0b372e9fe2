pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_code_tables.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_code_tables.sql")),
				"tables/002_recreation_resource.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_recreation_resource.sql")),
				"tables/003_recreation_resource_type.sql" => out
					.push_str(include_str!("../../../sql/tables/003_recreation_resource_type.sql")),
				"tables/004_recreation_activity.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_recreation_activity.sql")),
				"tables/005_recreation_status.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_recreation_status.sql")),
				"tables/006_recreation_access.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_recreation_access.sql")),
				"tables/007_recreation_resource_feature.sql" => out.push_str(include_str!(
					"../../../sql/tables/007_recreation_resource_feature.sql"
				)),
				"tables/008_recreation_structure.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_recreation_structure.sql")),
				"tables/009_recreation_resource_images.sql" => out.push_str(include_str!(
					"../../../sql/tables/009_recreation_resource_images.sql"
				)),
				"views/010_recreation_resource_search_view.sql" => out.push_str(include_str!(
					"../../../sql/views/010_recreation_resource_search_view.sql"
				)),
				"views/011_recreation_resource_count_views.sql" => out.push_str(include_str!(
					"../../../sql/views/011_recreation_resource_count_views.sql"
				)),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
