use anyhow::{Context, Result};
use ip2loc::{Database, LookupSource, QueryMask};
use serde_json::json;
use std::path::PathBuf;

pub fn cmd_query(
    database: PathBuf,
    ips: Vec<String>,
    fields: String,
    json_output: bool,
    no_mmap: bool,
) -> Result<()> {
    let mask = fields
        .parse::<QueryMask>()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid --fields value: {}", fields))?;

    // Load database (file or directory) using fluent API
    let db = Database::from(&database)
        .mmap(!no_mmap)
        .open()
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let mut failed = false;
    let mut results = Vec::with_capacity(ips.len());
    for ip in &ips {
        match db.query(ip, mask) {
            Ok(record) => {
                if json_output {
                    results.push(json!({ "ip": ip, "result": record }));
                } else {
                    println!("{}", ip);
                    print!("{}", record);
                    println!();
                }
            }
            Err(e) => {
                failed = true;
                if json_output {
                    results.push(json!({ "ip": ip, "error": e.to_string() }));
                } else {
                    eprintln!("{}: {}", ip, e);
                }
            }
        }
    }
    db.close();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
