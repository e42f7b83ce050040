//! Document download and the fetch → decode → measure sequence.

use std::future::Future;

use log::info;

use crate::error::{FetchError, LoadError};
use crate::table::{SheetTable, TableData};
use crate::workbook::Workbook;

/// Where the spreadsheet bytes come from.
pub trait DocumentSource: Send + Sync {
    fn fetch_document(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Plain HTTP GET with no retry and the client's default timeouts.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSource for HttpSource {
    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("Downloading spreadsheet from {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        info!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Decode a workbook and measure every sheet, in tab order.
pub fn parse_workbook(bytes: &[u8]) -> Result<TableData, LoadError> {
    let workbook = Workbook::read(bytes)?;
    Ok(workbook
        .sheets()
        .iter()
        .map(|sheet| SheetTable::new(sheet.name.clone(), sheet.to_rows()))
        .collect())
}

/// Download and decode the document into one snapshot of all sheets.
pub async fn load_tables<S: DocumentSource>(source: &S, url: &str) -> Result<TableData, LoadError> {
    let bytes = source.fetch_document(url).await?;
    let tables = tokio::task::spawn_blocking(move || parse_workbook(&bytes)).await??;
    info!(
        "Loaded {} sheet(s): {}",
        tables.len(),
        tables.names().collect::<Vec<_>>().join(", ")
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use crate::testutil::{build_xlsx, sheet_xml};
    use pretty_assertions::assert_eq;

    struct StaticSource(Vec<u8>);

    impl DocumentSource for StaticSource {
        async fn fetch_document(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn loads_and_measures_each_sheet() {
        let bytes = build_xlsx(
            &[("Sheet1", sheet_xml(r#"
                <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
                <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2" t="s"><v>3</v></c></row>
            "#))],
            &["A", "B", "x", "yy"],
        );

        let tables = load_tables(&StaticSource(bytes), "mem://doc").await.expect("load");

        let sheet = tables.get("Sheet1").expect("Sheet1 present");
        assert_eq!(sheet.width_arr, vec![20, 30]);
        assert_eq!(
            sheet.rows,
            vec![
                vec![CellValue::text("A"), CellValue::text("B")],
                vec![CellValue::text("x"), CellValue::text("yy")],
            ]
        );
        assert_eq!(tables.len(), 1);
    }

    #[tokio::test]
    async fn malformed_document_is_a_workbook_error() {
        let result = load_tables(&StaticSource(b"not a zip".to_vec()), "mem://doc").await;
        assert!(matches!(result, Err(LoadError::Workbook(_))));
    }
}
