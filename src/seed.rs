//! Seed rows
//!
//! Seeds come from a CSV sheet with the columns `type`, `id_tripadvisor`,
//! `url_tripadvisor` and optionally `id_datatourisme` and `rowId`, read from
//! a local file or a Google Sheets CSV export.

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::http::Session;
use crate::listing::detail_id;
use crate::types::{ContentType, LocationId};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{info, warn};

static SHEET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*/spreadsheets/d/[^/]+/)").unwrap());

/// One unit of work taken from the seed sheet or a location listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRow {
    /// Caller-side identifier echoed into the output record
    pub row_id: Option<String>,
    pub content_type: ContentType,
    /// Upstream location id
    pub external_id: Option<LocationId>,
    /// Site URL of the entity (required for vacation rentals)
    pub source_url: Option<String>,
    pub id_datatourisme: Option<String>,
}

impl SeedRow {
    /// Seed for a location found through a listing
    pub fn from_location(content_type: ContentType, location_id: LocationId) -> Self {
        Self {
            row_id: None,
            content_type,
            external_id: Some(location_id),
            source_url: None,
            id_datatourisme: None,
        }
    }

    /// Seed for a site URL
    pub fn from_url(content_type: ContentType, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            row_id: None,
            content_type,
            external_id: detail_id(&url),
            source_url: Some(url),
            id_datatourisme: None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> String {
        match (&self.row_id, self.external_id, &self.source_url) {
            (Some(row), _, _) => format!("row {row}"),
            (None, Some(id), _) => format!("{} {id}", self.content_type),
            (None, None, Some(url)) => url.clone(),
            (None, None, None) => self.content_type.to_string(),
        }
    }
}

/// Load the seeds named by the config (seed file first, then sheet link)
pub async fn load_seeds(config: &ScrapeConfig, session: &Session) -> Result<Vec<SeedRow>> {
    let csv = if let Some(ref path) = config.seed_file {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!("Failed to read seed file {}: {e}", path.display()))
        })?
    } else if let Some(ref link) = config.googlesheet_link {
        let url = sheet_export_url(link)?;
        session
            .client()
            .get_text(&url, crate::http::RequestConfig::new())
            .await?
    } else {
        return Ok(Vec::new());
    };

    let seeds = parse_seeds(&csv, &config.language);
    info!(count = seeds.len(), "Loaded seed rows");
    Ok(seeds)
}

/// CSV export URL for a Google Sheets link
pub fn sheet_export_url(link: &str) -> Result<String> {
    let prefix = SHEET_PREFIX
        .captures(link.trim())
        .map(|c| c[1].to_string())
        .ok_or_else(|| {
            Error::invalid_value("googlesheetLink", format!("not a spreadsheet link: {link}"))
        })?;
    Ok(format!("{prefix}gviz/tq?tqx=out:csv"))
}

/// Point a site URL at the domain of the requested language
pub fn localize_url(url: &str, language: &str) -> String {
    let tld = match language {
        "fr" => "fr",
        "de" => "de",
        "it" => "it",
        "es" => "es",
        "nl" => "nl",
        _ => return url.to_string(),
    };

    for domain in [".co.uk", ".com"] {
        if url.contains(domain) {
            return url.replacen(domain, &format!(".{tld}"), 1);
        }
    }
    url.to_string()
}

/// Parse seed CSV; malformed rows are skipped with a warning
pub fn parse_seeds(csv: &str, language: &str) -> Vec<SeedRow> {
    let mut records = split_records(csv).into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };

    let columns: HashMap<String, usize> = parse_csv_line(&header, ',')
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    let mut seeds = Vec::new();
    for (index, record) in records.enumerate() {
        let line = index + 2;
        if record.trim().is_empty() {
            continue;
        }
        let fields = parse_csv_line(&record, ',');
        let get = |name: &str| {
            columns
                .get(name)
                .and_then(|&i| fields.get(i))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };

        match seed_from_fields(&get, index + 1, language) {
            Ok(seed) => seeds.push(seed),
            Err(e) => warn!("Skipping seed row at line {line}: {e}"),
        }
    }

    seeds
}

fn seed_from_fields<'a, F>(get: &F, row_number: usize, language: &str) -> Result<SeedRow>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let content_type: ContentType = get("type")
        .ok_or_else(|| Error::parse("type", "missing"))?
        .parse()?;

    let source_url = get("url_tripadvisor").map(|url| localize_url(url, language));
    let external_id = match get("id_tripadvisor") {
        Some(raw) => Some(
            raw.parse::<LocationId>()
                .map_err(|_| Error::parse("id_tripadvisor", format!("not a number: {raw}")))?,
        ),
        None => source_url.as_deref().and_then(detail_id),
    };

    match content_type {
        ContentType::VacationRental if source_url.is_none() => {
            return Err(Error::parse("url_tripadvisor", "required for vacation rentals"));
        }
        ContentType::VacationRental => {}
        _ if external_id.is_none() => {
            return Err(Error::parse("id_tripadvisor", "missing and not in the URL"));
        }
        _ => {}
    }

    Ok(SeedRow {
        row_id: Some(
            get("rowid")
                .map(str::to_string)
                .unwrap_or_else(|| row_number.to_string()),
        ),
        content_type,
        external_id,
        source_url,
        id_datatourisme: get("id_datatourisme").map(str::to_string),
    })
}

/// Split CSV text into records, keeping newlines inside quoted fields
fn split_records(csv: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for line in csv.lines() {
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
        in_quotes ^= line.matches('"').count() % 2 == 1;

        if !in_quotes {
            records.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        records.push(current);
    }

    records
}

/// Split one CSV record into trimmed fields
fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}
