use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::SheetsError;
use crate::google_auth::{SHEETS_SCOPE, ServiceAccountKey, fetch_access_token};
use crate::http_client::http_client;
use crate::sheets::{SheetStore, a1_notation};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets v4 store for one spreadsheet.
pub struct SheetsApiClient {
    client: &'static Client,
    spreadsheet_id: String,
    token: String,
}

impl std::fmt::Debug for SheetsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsApiClient")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SheetsApiClient {
    /// Authenticate with the service account key at `key_path`.
    pub fn connect(spreadsheet_id: &str, key_path: &Path) -> Result<Self> {
        let client = http_client()?;
        let key = ServiceAccountKey::from_file(key_path)?;
        let token = fetch_access_token(client, &key, SHEETS_SCOPE)
            .context("authenticate with google sheets")?;
        Ok(Self::with_token(client, spreadsheet_id, token))
    }

    pub fn with_token(client: &'static Client, spreadsheet_id: &str, token: String) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.to_string(),
            token,
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `.../spreadsheets/<id>` followed by `segments`, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE).context("invalid sheets api base url")?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("sheets api base url cannot take a path"))?;
            path.push(&self.spreadsheet_id);
            path.extend(segments);
        }
        Ok(url)
    }

    fn send(&self, req: RequestBuilder) -> Result<String> {
        let resp = req.bearer_auth(&self.token).send().context("sheets request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading sheets response")?;
        if !status.is_success() {
            return Err(SheetsError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(body)
    }
}

/// A range read on a tab that does not exist fails with 400 "Unable to parse range".
pub fn is_missing_tab_error(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<SheetsError>() {
        Some(SheetsError::Http { status, body }) => {
            *status == 400 && body.contains("Unable to parse range")
        }
        _ => false,
    }
}

/// Unformatted cell → string: numbers without decoration, booleans as
/// `TRUE`/`FALSE`, null as empty.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetStore for SheetsApiClient {
    fn list_tabs(&self) -> Result<BTreeSet<String>> {
        let url = self.url(&[])?;
        let body = self.send(
            self.client
                .get(url)
                .query(&[("fields", "sheets.properties.title")]),
        )?;
        let meta: SpreadsheetMeta =
            serde_json::from_str(&body).context("invalid spreadsheet metadata")?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    fn create_tab(&mut self, tab: &str) -> Result<()> {
        let url = self.url(&[])?;
        // `:batchUpdate` is a method suffix on the spreadsheet id, not a path segment.
        let url = Url::parse(&format!("{url}:batchUpdate")).context("batchUpdate url")?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": tab } } }]
        });
        self.send(self.client.post(url).json(&body))?;
        Ok(())
    }

    fn write_range(&mut self, tab: &str, range: &str, values: &[Vec<String>]) -> Result<()> {
        let target = a1_notation(tab, range);
        let url = self.url(&["values", target.as_str()])?;
        let body = json!({ "values": values });
        self.send(
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )?;
        Ok(())
    }

    fn read_range(&self, tab: &str, range: &str) -> Result<Option<Vec<Vec<String>>>> {
        let target = a1_notation(tab, range);
        let url = self.url(&["values", target.as_str()])?;
        let body = match self.send(
            self.client
                .get(url)
                .query(&[("valueRenderOption", "UNFORMATTED_VALUE")]),
        ) {
            Ok(body) => body,
            Err(err) if is_missing_tab_error(&err) => return Ok(None),
            Err(err) => return Err(err),
        };
        let parsed: ValueRange = serde_json::from_str(&body).context("invalid value range")?;
        let rows: Vec<Vec<String>> = parsed
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
            .collect();
        Ok(Some(rows))
    }

    fn append_rows(&mut self, tab: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        let target = a1_notation(tab, range);
        let url = self.url(&["values", format!("{target}:append").as_str()])?;
        let body = json!({ "values": rows });
        self.send(
            self.client
                .post(url)
                .query(&[
                    ("valueInputOption", "RAW"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&body),
        )?;
        Ok(())
    }
}
