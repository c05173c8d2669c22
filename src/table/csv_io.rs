// src/table/csv_io.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::{
    fs,
    io::{BufWriter, Read, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{is_na, ExtraColumn, MetaColumn, MetaTable, Text};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Load a chart metadata CSV from disk. A leading BOM is ignored.
pub fn read_table(path: &Path) -> Result<MetaTable> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let table = read_from(bytes.as_slice())
        .with_context(|| format!("parsing CSV {}", path.display()))?;
    debug!(path = %path.display(), rows = table.len, "loaded table");
    Ok(table)
}

/// Parse a table from any reader; header row first.
pub fn read_from<R: Read>(mut reader: R) -> Result<MetaTable> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("reading CSV bytes")?;
    let data = buf.strip_prefix(UTF8_BOM).unwrap_or(&buf[..]);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows are padded with missing values
        .from_reader(data);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut raw: Vec<Vec<Text>> = vec![Vec::new(); headers.len()];
    let mut len = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        if record.len() > headers.len() {
            warn!(
                record = idx,
                fields = record.len(),
                columns = headers.len(),
                "dropping fields beyond the header"
            );
        }
        for (i, column) in raw.iter_mut().enumerate() {
            let cell = record
                .get(i)
                .filter(|s| !is_na(s))
                .map(str::to_string);
            column.push(cell);
        }
        len += 1;
    }

    let mut table = MetaTable {
        len,
        ..Default::default()
    };
    for (name, values) in headers.into_iter().zip(raw) {
        let leftover = match MetaColumn::from_name(&name) {
            Some(col) => table.set_column(col, values),
            None => Some(values),
        };
        if let Some(values) = leftover {
            table.extra.push(ExtraColumn { name, values });
        }
    }
    Ok(table)
}

/// Serialize a table: BOM, header row, then one record per row.
/// Missing cells are written as empty fields.
pub fn write_to<W: Write>(table: &MetaTable, mut writer: W) -> Result<()> {
    writer.write_all(UTF8_BOM).context("writing BOM")?;

    let columns = table.columns();
    if columns.is_empty() {
        return writer.flush().context("flushing CSV");
    }

    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.write_record(columns.iter().map(|(name, _)| *name))
        .context("writing CSV header")?;
    for row in 0..table.len {
        let record: Vec<_> = columns
            .iter()
            .map(|(_, col)| col.cell(row).unwrap_or_default())
            .collect();
        wtr.write_record(record.iter().map(|c| c.as_bytes()))
            .with_context(|| format!("writing CSV record {}", row))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// Write a table to `path`, replacing any existing file atomically.
pub fn write_table(table: &MetaTable, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    write_to(table, BufWriter::new(tmp.as_file()))
        .with_context(|| format!("writing {}", path.display()))?;
    // The temp file is created 0600; keep the destination's mode instead.
    match fs::metadata(path) {
        Ok(meta) => tmp
            .as_file()
            .set_permissions(meta.permissions())
            .with_context(|| format!("copying permissions of {}", path.display()))?,
        #[cfg(unix)]
        Err(_) => {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .with_context(|| format!("setting permissions for {}", path.display()))?
        }
        #[cfg(not(unix))]
        Err(_) => {}
    }
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
