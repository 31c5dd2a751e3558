use anyhow::{Context, Result};
use ip2loc::{AddressFamily, Database, FieldKind};
use serde_json::json;
use std::path::PathBuf;

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let db = Database::open_path(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let meta = db.meta();
    let fields: Vec<&str> = db.schema().supported().iter().map(FieldKind::name).collect();

    if json_output {
        let table_json = |family: AddressFamily| {
            let table = meta.table(family);
            json!({
                "rows": table.row_count,
                "base_address": table.base_address,
                "index_address": table.index_address,
                "row_width": meta.row_width(family),
            })
        };
        let output = json!({
            "file": database.display().to_string(),
            "schema": meta.schema_id,
            "columns": meta.column_count,
            "build_date": meta.build_date.to_string(),
            "ipv4": table_json(AddressFamily::V4),
            "ipv6": table_json(AddressFamily::V6),
            "fields": fields,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Database:   {}", database.display());
        println!("Schema:     DB{}", meta.schema_id);
        println!("Columns:    {}", meta.column_count);
        println!("Build date: {}", meta.build_date);
        println!();
        for family in [AddressFamily::V4, AddressFamily::V6] {
            let table = meta.table(family);
            if table.is_present() {
                println!(
                    "{}: {} ranges, {} bytes per row, index {}",
                    family,
                    table.row_count,
                    meta.row_width(family),
                    if table.has_index() { "✓" } else { "✗" }
                );
            } else {
                println!("{}: ✗", family);
            }
        }
        println!();
        println!("Fields:");
        for name in fields {
            println!("  {}", name);
        }
    }

    Ok(())
}
