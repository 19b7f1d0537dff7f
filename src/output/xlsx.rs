use crate::output::SinkError;
use crate::parsers::text::truncate_chars;
use crate::results::PageRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

/// Most characters a spreadsheet cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

const URL_COLUMN_WIDTH: f64 = 60.0;
const CONTENT_COLUMN_WIDTH: f64 = 120.0;

/// Writes one `URL, Content` row per page. Nothing is written for zero pages.
pub fn write_contents(pages: &[PageRecord], path: &Path) -> Result<usize, SinkError> {
    if pages.is_empty() {
        return Ok(0);
    }
    build_workbook(pages, path).map_err(|source| SinkError::Xlsx {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(pages.len())
}

fn build_workbook(pages: &[PageRecord], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string_with_format(0, 0, "URL", &header)?;
    worksheet.write_string_with_format(0, 1, "Content", &header)?;
    worksheet.set_column_width(0, URL_COLUMN_WIDTH)?;
    worksheet.set_column_width(1, CONTENT_COLUMN_WIDTH)?;

    for (row, page) in (1u32..).zip(pages) {
        let content = if page.text.chars().count() > MAX_CELL_CHARS {
            ::log::warn!(
                "Content of {} exceeds {} characters, truncating cell",
                page.url,
                MAX_CELL_CHARS
            );
            truncate_chars(&page.text, MAX_CELL_CHARS)
        } else {
            page.text.clone()
        };
        worksheet.write_string(row, 0, &page.url)?;
        worksheet.write_string(row, 1, content)?;
    }

    workbook.save(path)
}
