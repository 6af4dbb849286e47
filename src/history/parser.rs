//! Horse race-history table parser (db.netkeiba.com)
//!
//! The results table layout varies between page versions, so column
//! positions are detected from the header text with fixed fallbacks.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::HistoryError;
use crate::models::PastResult;

/// Header keywords per column, first match wins
const RANKING_KEYWORDS: &[&str] = &["着順", "着"];
const FIELD_SIZE_KEYWORDS: &[&str] = &["頭数", "頭"];
const LAST_3F_KEYWORDS: &[&str] = &["上り", "上がり"];
const BODY_WEIGHT_KEYWORDS: &[&str] = &["馬体重", "体重"];

/// Rows with fewer cells are layout rows, not results
const MIN_CELLS: usize = 5;

/// Column positions of the fields we read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub ranking: usize,
    pub field_size: usize,
    pub last_3f: usize,
    pub body_weight: usize,
}

impl Default for ColumnIndex {
    /// Typical netkeiba column layout
    fn default() -> Self {
        Self {
            ranking: 10,
            field_size: 6,
            last_3f: 19,
            body_weight: 20,
        }
    }
}

impl ColumnIndex {
    /// Detect column positions from header texts, falling back per column
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let defaults = Self::default();
        let find = |keywords: &[&str]| {
            headers
                .iter()
                .position(|h| keywords.iter().any(|kw| h.as_ref().contains(kw)))
        };

        Self {
            ranking: find(RANKING_KEYWORDS).unwrap_or(defaults.ranking),
            field_size: find(FIELD_SIZE_KEYWORDS).unwrap_or(defaults.field_size),
            last_3f: find(LAST_3F_KEYWORDS).unwrap_or(defaults.last_3f),
            body_weight: find(BODY_WEIGHT_KEYWORDS).unwrap_or(defaults.body_weight),
        }
    }
}

/// Parser with precompiled selectors and patterns
pub struct HistoryParser {
    table_selector: Selector,
    row_selector: Selector,
    header_selector: Selector,
    cell_selector: Selector,
    weight_pattern: Regex,
}

impl HistoryParser {
    pub fn new() -> Result<Self, HistoryError> {
        let selector = |s: &str| Selector::parse(s).map_err(|e| HistoryError::ParseError(e.to_string()));

        Ok(Self {
            table_selector: selector("table.db_h_race_results, table.race_table_01")?,
            row_selector: selector("tr")?,
            header_selector: selector("th, td")?,
            cell_selector: selector("td")?,
            // "480(-4)" -> body weight 480, change -4
            weight_pattern: Regex::new(r"(\d+)\(([+-]?\d+)\)")
                .map_err(|e| HistoryError::ParseError(e.to_string()))?,
        })
    }

    /// Parse every result row, most recent first as listed on the page
    pub fn parse(&self, html: &str) -> Result<Vec<PastResult>, HistoryError> {
        let document = Html::parse_document(html);

        let table = document
            .select(&self.table_selector)
            .next()
            .ok_or(HistoryError::NoResultsTable)?;

        let mut rows = table.select(&self.row_selector);
        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };

        let headers: Vec<String> = header_row
            .select(&self.header_selector)
            .map(|cell| cell_text(&cell))
            .collect();
        let index = ColumnIndex::from_headers(&headers);

        let results = rows
            .filter_map(|row| {
                let cells: Vec<String> = row.select(&self.cell_selector).map(|c| cell_text(&c)).collect();
                if cells.len() < MIN_CELLS {
                    return None;
                }
                self.parse_row(&cells, &index)
            })
            .collect();

        Ok(results)
    }

    /// Parse one row; None when it has neither a ranking nor a field size
    fn parse_row(&self, cells: &[String], index: &ColumnIndex) -> Option<PastResult> {
        let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

        // Non-numeric ranking = scratched / did not finish
        let ranking = cell(index.ranking).parse::<u32>().ok();
        let field_size = cell(index.field_size).parse::<u32>().unwrap_or(0);
        let last_3f = cell(index.last_3f).parse::<f64>().unwrap_or(0.0);
        let weight_change = self.parse_weight_change(cell(index.body_weight));

        if ranking.is_none() && field_size == 0 {
            return None;
        }

        Some(PastResult {
            ranking,
            field_size,
            last_3f,
            weight_change,
        })
    }

    /// Weight change from a "480(-4)" style cell
    pub fn parse_weight_change(&self, text: &str) -> Option<i32> {
        let caps = self.weight_pattern.captures(text)?;
        caps.get(2)?.as_str().parse::<i32>().ok()
    }
}

fn cell_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse a horse page's results table with a fresh parser
pub fn parse_history(html: &str) -> Result<Vec<PastResult>, HistoryError> {
    HistoryParser::new()?.parse(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY_PAGE: &str = r#"
        <html><body>
        <table class="db_h_race_results nk_tb_common">
          <thead>
            <tr>
              <th>日付</th><th>開催</th><th>R</th><th>レース名</th><th>頭数</th>
              <th>馬番</th><th>オッズ</th><th>着順</th><th>騎手</th><th>着差</th>
              <th>上り</th><th>馬体重</th>
            </tr>
          </thead>
          <tbody>
            <tr>
              <td>2025/05/04</td><td>2東京4</td><td>11</td><td>NHKマイルC</td><td>18</td>
              <td>7</td><td>5.4</td><td>2</td><td>ルメール</td><td>0.1</td>
              <td>33.8</td><td>486(+4)</td>
            </tr>
            <tr>
              <td>2025/04/06</td><td>2阪神4</td><td>11</td><td>桜花賞</td><td>16</td>
              <td>3</td><td>12.1</td><td>中止</td><td>ルメール</td><td></td>
              <td></td><td>482(-6)</td>
            </tr>
            <tr>
              <td colspan="4">出走取消</td>
            </tr>
            <tr>
              <td>2025/03/01</td><td>1中山2</td><td>11</td><td>オープン</td><td></td>
              <td></td><td></td><td>除外</td><td></td><td></td>
              <td></td><td>計不</td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_column_index_from_headers() {
        let headers = ["日付", "頭数", "着順", "上り", "馬体重"];
        let index = ColumnIndex::from_headers(&headers);
        assert_eq!(
            index,
            ColumnIndex {
                ranking: 2,
                field_size: 1,
                last_3f: 3,
                body_weight: 4,
            }
        );
    }

    #[test]
    fn test_column_index_fallbacks() {
        let headers = ["日付", "開催"];
        assert_eq!(ColumnIndex::from_headers(&headers), ColumnIndex::default());
    }

    #[test]
    fn test_column_index_alternate_keywords() {
        let headers = ["着", "頭", "上がり3F", "体重"];
        let index = ColumnIndex::from_headers(&headers);
        assert_eq!(index.ranking, 0);
        assert_eq!(index.field_size, 1);
        assert_eq!(index.last_3f, 2);
        assert_eq!(index.body_weight, 3);
    }

    #[test]
    fn test_parse_history_page() {
        let results = parse_history(HISTORY_PAGE).unwrap();
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].ranking, Some(2));
        assert_eq!(results[0].field_size, 18);
        assert!((results[0].last_3f - 33.8).abs() < 1e-9);
        assert_eq!(results[0].weight_change, Some(4));

        // Did not finish: ranking absent, field size kept
        assert_eq!(results[1].ranking, None);
        assert_eq!(results[1].field_size, 16);
        assert_eq!(results[1].last_3f, 0.0);
        assert_eq!(results[1].weight_change, Some(-6));
    }

    #[test]
    fn test_parse_without_table() {
        let result = parse_history("<html><body><p>no data</p></body></html>");
        assert!(matches!(result, Err(HistoryError::NoResultsTable)));
    }

    #[test]
    fn test_parse_weight_change() {
        let parser = HistoryParser::new().unwrap();
        assert_eq!(parser.parse_weight_change("480(-4)"), Some(-4));
        assert_eq!(parser.parse_weight_change("512(+12)"), Some(12));
        assert_eq!(parser.parse_weight_change("470(0)"), Some(0));
        assert_eq!(parser.parse_weight_change("計不"), None);
    }
}
