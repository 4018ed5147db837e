//! Table-cell parsing for scraped reference pages
//!
//! Scraped formatting is not guaranteed, so the cell parsers never fail:
//! malformed text degrades to a sentinel value instead.

use crate::model::Dimension;
use crate::{Error, Result};
use scraper::{Html, Selector};

/// Runs of ASCII digits in `text`, with the byte offset each starts at.
fn digit_runs(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut rest = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while let Some(&(_, c)) = rest.peek() {
            if c.is_ascii_digit() {
                break;
            }
            rest.next();
        }
        let (start, _) = *rest.peek()?;
        let mut end = start;
        while let Some(&(i, c)) = rest.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            end = i + c.len_utf8();
            rest.next();
        }
        Some((start, &text[start..end]))
    })
}

fn positive(run: &str) -> Option<u32> {
    run.parse::<u32>().ok().filter(|v| *v > 0)
}

/// Parse a `W × H` cell into a [`Dimension`].
///
/// Takes the first two integer runs; returns [`Dimension::SENTINEL`] when
/// there are fewer than two or either is zero.
///
/// ```
/// use pwa_assets::parse::parse_dimension;
/// let d = parse_dimension("640×1136px");
/// assert_eq!((d.width, d.height), (640, 1136));
/// ```
pub fn parse_dimension(text: &str) -> Dimension {
    let mut runs = digit_runs(text).map(|(_, run)| positive(run));
    match (runs.next(), runs.next()) {
        (Some(Some(width)), Some(Some(height))) => Dimension { width, height },
        _ => Dimension::SENTINEL,
    }
}

/// Parse a scale-factor cell such as `@3x`.
///
/// Takes the first integer run preceded by at least one non-digit character;
/// returns `1` when there is none.
pub fn parse_scale_factor(text: &str) -> u32 {
    digit_runs(text)
        .find(|(start, _)| *start > 0)
        .and_then(|(_, run)| positive(run))
        .unwrap_or(1)
}

/// Extract the cell texts of every row matched by `row_selector`.
///
/// Cell text is whitespace-collapsed. Rows without `td` cells (header rows)
/// are skipped.
pub fn table_rows(html: &str, row_selector: &str) -> Result<Vec<Vec<String>>> {
    let rows = Selector::parse(row_selector)
        .map_err(|e| Error::Other(format!("Invalid row selector '{}': {:?}", row_selector, e)))?;
    let cells = Selector::parse("td")
        .map_err(|e| Error::Other(format!("Invalid cell selector: {:?}", e)))?;

    let document = Html::parse_document(html);
    let parsed = document
        .select(&rows)
        .map(|row| {
            row.select(&cells)
                .map(|cell| {
                    cell.text()
                        .collect::<String>()
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_defaults_on_malformed_text() {
        assert_eq!(parse_dimension("abcx"), Dimension::new(1, 1));
        assert_eq!(parse_dimension(""), Dimension::new(1, 1));
        assert_eq!(parse_dimension("only 42"), Dimension::new(1, 1));
        assert_eq!(parse_dimension("0 x 100"), Dimension::new(1, 1));
    }

    #[test]
    fn dimension_reads_first_two_runs() {
        assert_eq!(parse_dimension("640×1136px"), Dimension::new(640, 1136));
        assert_eq!(parse_dimension("2048px × 2732px"), Dimension::new(2048, 2732));
        assert_eq!(parse_dimension("1242 x 2688 (@3x) 12"), Dimension::new(1242, 2688));
    }

    #[test]
    fn scale_factor_defaults_to_one() {
        assert_eq!(parse_scale_factor("no digits"), 1);
        assert_eq!(parse_scale_factor(""), 1);
        assert_eq!(parse_scale_factor("3x"), 1);
        assert_eq!(parse_scale_factor("@0x"), 1);
    }

    #[test]
    fn scale_factor_reads_prefixed_run() {
        assert_eq!(parse_scale_factor("@3x"), 3);
        assert_eq!(parse_scale_factor("@2x"), 2);
        assert_eq!(parse_scale_factor(" @2x (retina)"), 2);
    }

    #[test]
    fn table_rows_collects_cells_and_skips_headers() {
        let html = r#"<html><body><table>
            <thead><tr><th>Device</th><th>Portrait</th></tr></thead>
            <tbody>
              <tr><td>iPhone   SE</td><td>640px × 1136px</td><td>1136px × 640px</td></tr>
              <tr><td>iPad</td><td>1536px × 2048px</td></tr>
            </tbody>
        </table></body></html>"#;

        let rows = table_rows(html, "table tbody tr").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["iPhone SE", "640px × 1136px", "1136px × 640px"]);
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn table_rows_empty_without_table() {
        let rows = table_rows("<p>nothing here</p>", "table tbody tr").unwrap();
        assert!(rows.is_empty());
    }
}
