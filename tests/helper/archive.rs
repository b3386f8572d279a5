//! Chart archive test utilities

use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Write a packaged chart whose `Chart.yaml` declares `name` and `version`.
pub fn write_chart_archive(path: &Path, name: &str, version: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let chart_yaml = format!("apiVersion: v2\nname: {name}\nversion: {version}\n");

    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let mut header = tar::Header::new_gnu();
    header.set_size(chart_yaml.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, format!("{name}/Chart.yaml"), chart_yaml.as_bytes())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}
