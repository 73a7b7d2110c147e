use color_eyre::Result;

pub const NO_DATA_PLACEHOLDER: &str = "No CSV uploaded.";
pub const UNREADABLE_PLACEHOLDER: &str = "Could not read CSV.";
pub const PREVIEW_ROWS: usize = 10;

/// Renders the uploaded table for the prompt. Never fails: a missing payload
/// and an unreadable one both map to fixed placeholders.
#[must_use]
pub fn preview(payload: Option<&str>) -> String {
    let Some(text) = payload.filter(|text| !text.is_empty()) else {
        return NO_DATA_PLACEHOLDER.to_string();
    };

    match render_markdown_preview(text, PREVIEW_ROWS) {
        Ok(table) => table,
        Err(error) => {
            tracing::warn!(%error, "could not decode tabular payload");
            UNREADABLE_PLACEHOLDER.to_string()
        }
    }
}

/// Parses comma-delimited text with a header row and renders at most
/// `max_rows` records as a Markdown pipe table
pub fn render_markdown_preview(text: &str, max_rows: usize) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(escape_cell).collect();
    if headers.iter().all(String::is_empty) {
        return Err(color_eyre::eyre::eyre!("No columns to parse from file"));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Every record is validated even past the preview window
        let record = record?;
        if record.len() > headers.len() {
            return Err(color_eyre::eyre::eyre!(
                "Expected {} fields in line {}, saw {}",
                headers.len(),
                index + 2,
                record.len()
            ));
        }
        if rows.len() < max_rows {
            // Short rows are padded with empty cells
            let mut cells: Vec<String> = record.iter().map(escape_cell).collect();
            cells.resize(headers.len(), String::new());
            rows.push(cells);
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(table_row(&headers));
    lines.push(table_row(&vec!["---".to_string(); headers.len()]));
    for row in &rows {
        lines.push(table_row(row));
    }
    Ok(lines.join("\n"))
}

fn table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}
