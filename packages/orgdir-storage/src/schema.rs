pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_buildings.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_buildings.sql")),
				"tables/002_categories.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_categories.sql")),
				"tables/003_phones.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_phones.sql")),
				"tables/004_organizations.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_organizations.sql")),
				"tables/005_organization_phones.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_organization_phones.sql")),
				"tables/006_organization_categories.sql" => out
					.push_str(include_str!("../../../sql/tables/006_organization_categories.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
