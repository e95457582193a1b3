//! Publishing the endpoint catalog as documentation, and checking it.

use crate::domain::endpoint::{ApiBase, Category, Endpoint, Host};
use crate::utils::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const EXPECTED_ACTIVE: usize = 30;
pub const EXPECTED_DISABLED: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    #[default]
    #[serde(alias = "md")]
    #[cfg_attr(feature = "cli", value(alias = "md"))]
    Markdown,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow {
    pub name: &'static str,
    pub method: &'static str,
    pub url: String,
    pub category: Category,
    pub disabled: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub active: usize,
    pub disabled: usize,
    pub by_category: BTreeMap<Category, usize>,
}

pub fn rows(base: &ApiBase) -> Vec<CatalogRow> {
    Endpoint::ALL
        .iter()
        .map(|endpoint| {
            let spec = endpoint.spec();
            CatalogRow {
                name: spec.name,
                method: spec.method.as_str(),
                url: endpoint.url_template(base),
                category: spec.category,
                disabled: spec.disabled,
                description: spec.description,
            }
        })
        .collect()
}

pub fn summary() -> CatalogSummary {
    let mut by_category = BTreeMap::new();
    for endpoint in Endpoint::ALL {
        *by_category.entry(endpoint.spec().category).or_insert(0) += 1;
    }
    CatalogSummary {
        active: Endpoint::active().count(),
        disabled: Endpoint::disabled().count(),
        by_category,
    }
}

/// Consistency problems in the catalog; empty when it is sound.
pub fn check() -> Vec<String> {
    let mut problems = Vec::new();
    let totals = summary();

    if totals.active != EXPECTED_ACTIVE {
        problems.push(format!(
            "expected {} active endpoints, found {}",
            EXPECTED_ACTIVE, totals.active
        ));
    }
    if totals.disabled != EXPECTED_DISABLED {
        problems.push(format!(
            "expected {} disabled endpoints, found {}",
            EXPECTED_DISABLED, totals.disabled
        ));
    }

    let mut seen = HashSet::new();
    for endpoint in Endpoint::ALL {
        let spec = endpoint.spec();
        if !seen.insert(spec.name) {
            problems.push(format!("duplicate endpoint name '{}'", spec.name));
        }
        if !spec.path.starts_with('/') {
            problems.push(format!("{}: path '{}' must start with '/'", spec.name, spec.path));
        }
        match (spec.host, spec.version) {
            (Host::Identity, Some(_)) => {
                problems.push(format!("{}: identity endpoints carry no API version", spec.name))
            }
            (Host::Api, None) => {
                problems.push(format!("{}: API endpoints need a version", spec.name))
            }
            _ => {}
        }
        if spec.query.iter().any(|(key, _)| key.is_empty()) {
            problems.push(format!("{}: empty query parameter name", spec.name));
        }
    }
    problems
}

pub fn render(format: CatalogFormat, base: &ApiBase) -> Result<String> {
    match format {
        CatalogFormat::Markdown => Ok(render_markdown(base)),
        CatalogFormat::Csv => render_csv(base),
        CatalogFormat::Json => Ok(serde_json::to_string_pretty(&rows(base))?),
    }
}

fn render_markdown(base: &ApiBase) -> String {
    let rows = rows(base);
    let mut out = String::from("# MySkoda API endpoints\n");

    for category in Category::ALL {
        let in_category: Vec<&CatalogRow> =
            rows.iter().filter(|row| row.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n\n", category.title()));
        out.push_str("| Method | URL | Description |\n");
        out.push_str("|--------|-----|-------------|\n");
        for row in in_category {
            let description = if row.disabled {
                format!("**Disabled.** {}", row.description)
            } else {
                row.description.to_string()
            };
            out.push_str(&format!(
                "| {} | `{}` | {} |\n",
                row.method, row.url, description
            ));
        }
    }

    let totals = summary();
    out.push_str(&format!(
        "\nTotal: {} active + {} disabled\n",
        totals.active, totals.disabled
    ));
    out
}

fn render_csv(base: &ApiBase) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "method", "url", "category", "disabled", "description"])?;
    for row in rows(base) {
        let category = serde_json::to_value(row.category)?;
        writer.write_record([
            row.name,
            row.method,
            row.url.as_str(),
            category.as_str().unwrap_or_default(),
            if row.disabled { "true" } else { "false" },
            row.description,
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConnectorError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ConnectorError::ValidationError {
        message: format!("catalog CSV is not UTF-8: {}", e),
    })
}
