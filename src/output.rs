//! Output formatting for CLI commands
//!
//! Renders resources as aligned tables (list), field/value dictionaries
//! (show), or raw JSON behind `--json`. Column sets come from the
//! resource registry, so output follows the definition files rather than
//! per-command code.

use serde_json::Value;
use std::io::{self, Write};

use crate::resource::{ColumnDef, Resource, ResourceDef};

/// Gap between table columns
const COLUMN_GAP: usize = 2;

/// Render resources as an aligned table, one row per resource
pub fn write_list<W: Write>(
    writer: &mut W,
    resources: &[Resource],
    columns: &[ColumnDef],
) -> io::Result<()> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.header.len()).collect();

    let rows: Vec<Vec<String>> = resources
        .iter()
        .map(|resource| {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let cell = resource.display(&column.json_path);
                    widths[i] = widths[i].max(cell.len());
                    cell
                })
                .collect()
        })
        .collect();

    let separators: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    write_row(writer, &widths, columns.iter().map(|c| c.header.as_str()))?;
    write_row(writer, &widths, separators.iter().map(String::as_str))?;
    for row in &rows {
        write_row(writer, &widths, row.iter().map(String::as_str))?;
    }
    Ok(())
}

fn write_row<'a, W: Write>(
    writer: &mut W,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> io::Result<()> {
    let mut line = String::new();
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            line.push_str(&" ".repeat(COLUMN_GAP));
        }
        line.push_str(cell);
        if i + 1 < widths.len() {
            let pad = widths[i].saturating_sub(cell.len());
            line.push_str(&" ".repeat(pad));
        }
    }
    writeln!(writer, "{}", line.trim_end())
}

/// Render one resource as a field/value dictionary
pub fn write_dict<W: Write>(
    writer: &mut W,
    resource: &Resource,
    columns: &[ColumnDef],
) -> io::Result<()> {
    let field_width = columns
        .iter()
        .map(|c| c.header.len())
        .max()
        .unwrap_or(0)
        .max("Field".len());

    writeln!(writer, "{:<field_width$}{}Value", "Field", " ".repeat(COLUMN_GAP))?;
    writeln!(
        writer,
        "{}{}{}",
        "-".repeat(field_width),
        " ".repeat(COLUMN_GAP),
        "-".repeat("Value".len())
    )?;
    for column in columns {
        writeln!(
            writer,
            "{:<field_width$}{}{}",
            column.header,
            " ".repeat(COLUMN_GAP),
            resource.display(&column.json_path)
        )?;
    }
    Ok(())
}

/// Render a value as pretty JSON
pub fn write_json<W: Write>(writer: &mut W, value: &Value) -> io::Result<()> {
    writeln!(
        writer,
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    )
}

/// JSON array of the raw field mappings
pub fn resources_to_json(resources: &[Resource]) -> Value {
    Value::Array(
        resources
            .iter()
            .map(|r| Value::Object(r.fields().clone()))
            .collect(),
    )
}

/// JSON object of one resource's raw field mapping
pub fn resource_to_json(resource: &Resource) -> Value {
    Value::Object(resource.fields().clone())
}

/// Column set for an explicit field subset.
///
/// Reuses the registry's header for fields that have a detail column and
/// falls back to the raw field name otherwise.
pub fn columns_for_fields(def: &ResourceDef, fields: &[String]) -> Vec<ColumnDef> {
    fields
        .iter()
        .map(|field| {
            def.detail_columns
                .iter()
                .find(|c| &c.json_path == field)
                .cloned()
                .unwrap_or_else(|| ColumnDef {
                    header: field.clone(),
                    json_path: field.clone(),
                })
        })
        .collect()
}
