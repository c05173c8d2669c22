// src/notebook.rs
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Countries that get their own analysis notebook.
pub const COUNTRIES: [&str; 10] = [
    "france",
    "italy",
    "japan",
    "mexico",
    "south-korea",
    "spain",
    "uk",
    "usa",
    "argentina",
    "world",
];

/// Country the template notebook was written for.
const TEMPLATE_COUNTRY: &str = "france";

/// `"south-korea"` → `"South-korea"`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn localize_text(text: &str, country: &str) -> String {
    text.replace(&capitalize(TEMPLATE_COUNTRY), &capitalize(country))
        .replace(TEMPLATE_COUNTRY, country)
}

/// Copy of `template` with the template country swapped for `country`
/// in every markdown and code cell.
pub fn localize(template: &Value, country: &str) -> Result<Value> {
    let mut nb = template.clone();
    let Some(cells) = nb.get_mut("cells").and_then(Value::as_array_mut) else {
        bail!("notebook has no `cells` array");
    };
    for cell in cells.iter_mut() {
        let kind = cell.get("cell_type").and_then(Value::as_str);
        if !matches!(kind, Some("markdown") | Some("code")) {
            continue;
        }
        match cell.get_mut("source") {
            Some(Value::String(s)) => *s = localize_text(s, country),
            Some(Value::Array(lines)) => {
                for line in lines.iter_mut() {
                    if let Value::String(s) = line {
                        *s = localize_text(s, country);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(nb)
}

/// Notebook JSON layout: sorted keys, one-space indent, trailing newline.
pub fn to_notebook_string(nb: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    nb.serialize(&mut ser).context("serializing notebook")?;
    buf.push(b'\n');
    String::from_utf8(buf).context("notebook is not UTF-8")
}

/// Write one notebook per country into `out_dir` as `EDA_{country}.ipynb`.
pub fn clone_for_countries(
    template: &Path,
    out_dir: &Path,
    countries: &[&str],
) -> Result<Vec<PathBuf>> {
    let raw = fs::read_to_string(template)
        .with_context(|| format!("reading template {}", template.display()))?;
    let nb: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing notebook {}", template.display()))?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(countries.len());
    for country in countries {
        let copy = localize(&nb, country)?;
        let out = out_dir.join(format!("EDA_{}.ipynb", country));
        fs::write(&out, to_notebook_string(&copy)?)
            .with_context(|| format!("writing {}", out.display()))?;
        info!(path = %out.display(), "created notebook");
        written.push(out);
    }
    Ok(written)
}
