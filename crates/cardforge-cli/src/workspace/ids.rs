use chrono::Utc;

/// Unique, date-prefixed id for per-request output files.
pub fn new_artifact_id(kind: &str) -> String {
    let date = Utc::now().format("%Y-%m-%d").to_string();
    let short = short_id();
    format!("{date}__{kind}_{short}")
}

fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..12].to_string()
}
