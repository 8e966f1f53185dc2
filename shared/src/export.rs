use crate::ExportError;
use crate::columns::ColumnKey;
use crate::permissions::{AccessLevel, GuardedAction};
use crate::tag::tag_key;
use crate::view_model::RosterRow;

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Tabs and newlines would break the pasted table; collapse them to spaces.
fn tsv_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

fn header(columns: &[ColumnKey]) -> Vec<String> {
    ["Player", "Tag"]
        .into_iter()
        .map(str::to_string)
        .chain(columns.iter().map(|c| c.label().to_string()))
        .collect()
}

fn record(row: &RosterRow, columns: &[ColumnKey]) -> Vec<String> {
    [row.member.name.clone(), format!("#{}", row.key)]
        .into_iter()
        .chain(columns.iter().map(|c| c.cell_text(row)))
        .collect()
}

fn guard(access: AccessLevel, rows: &[RosterRow]) -> Result<(), ExportError> {
    access
        .check(GuardedAction::Export)
        .map_err(|denied| ExportError::PermissionDenied {
            required: denied.action.required().label(),
        })?;
    if rows.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    Ok(())
}

/// CSV of the visible rows in projected column order, CRLF line endings.
pub fn export_csv(
    access: AccessLevel,
    rows: &[RosterRow],
    columns: &[ColumnKey],
) -> Result<String, ExportError> {
    guard(access, rows)?;
    let mut out = String::new();
    let lines = std::iter::once(header(columns)).chain(rows.iter().map(|r| record(r, columns)));
    for line in lines {
        let fields: Vec<String> = line.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    Ok(out)
}

/// Tab-separated table for pasting into chat or a spreadsheet.
pub fn clipboard_summary(
    access: AccessLevel,
    rows: &[RosterRow],
    columns: &[ColumnKey],
) -> Result<String, ExportError> {
    guard(access, rows)?;
    let lines: Vec<String> = std::iter::once(header(columns))
        .chain(rows.iter().map(|r| record(r, columns)))
        .map(|line| {
            line.iter()
                .map(|f| tsv_field(f))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn export_filename(clan_tag: &str, date: Option<&str>) -> String {
    let tag = tag_key(clan_tag).to_ascii_lowercase();
    match date.map(|d| d.get(..10).unwrap_or(d)) {
        Some(date) if !date.is_empty() => format!("roster-{tag}-{date}.csv"),
        _ => format!("roster-{tag}.csv"),
    }
}
