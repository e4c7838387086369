//! Snapshot feeds and their filename date extraction.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Pulls a forecast date out of a snapshot filename.
///
/// The pattern must have a named `date` group; its text is parsed with the
/// chrono `format`. Filenames that don't match, or whose date doesn't
/// parse (e.g. `2023-02-30`), have no date.
#[derive(Debug, Clone)]
pub struct DateExtractor {
    pattern: Regex,
    format: String,
}

impl DateExtractor {
    pub fn new(pattern: &str, format: impl Into<String>) -> CatalogResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        if !regex.capture_names().any(|name| name == Some("date")) {
            return Err(CatalogError::MissingDateGroup(pattern.to_string()));
        }
        Ok(Self {
            pattern: regex,
            format: format.into(),
        })
    }

    pub fn extract(&self, filename: &str) -> Option<NaiveDate> {
        let caps = self.pattern.captures(filename)?;
        let date = caps.name("date")?.as_str();
        NaiveDate::parse_from_str(date, &self.format).ok()
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Feed definition as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Identifier used in URLs (e.g. `combinado`).
    pub name: String,
    /// Page title.
    pub title: String,
    /// Regex with a named `date` group, matched against the whole filename.
    pub pattern: String,
    /// chrono format of the `date` group.
    pub date_format: String,
    /// Intro text shown above the selector; `**bold**` is honored.
    #[serde(default)]
    pub description: String,
    /// Footer line.
    #[serde(default)]
    pub caption: String,
    /// Shown when the directory has no dated files for this feed.
    #[serde(default = "default_empty_message")]
    pub empty_message: String,
}

fn default_empty_message() -> String {
    "No hay mapas HTML disponibles.".to_string()
}

impl FeedConfig {
    pub fn build(&self) -> CatalogResult<Feed> {
        Ok(Feed {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            caption: self.caption.clone(),
            empty_message: self.empty_message.clone(),
            extractor: DateExtractor::new(&self.pattern, self.date_format.clone())?,
        })
    }
}

/// Combined wind and wave maps plus the wind-only 00Z maps.
pub fn builtin_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "combinado".to_string(),
            title: "🌊 Panel de Pronóstico Marítimo (KSTM)".to_string(),
            pattern: r"^mapa_combinado_(?P<date>\d{4}-\d{2}-\d{2})\.html$".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            description: "Visualización combinada de **altura significativa de ola** (Copernicus) \
                          y **viento máximo pronosticado** (GFS) en los principales puertos del \
                          Atlántico Sur."
                .to_string(),
            caption: "Desarrollado por KSTM — Datos GFS & Copernicus".to_string(),
            empty_message: default_empty_message(),
        },
        FeedConfig {
            name: "viento-00z".to_string(),
            title: "💧 Panel de Pronóstico Fluvial (KSTM)".to_string(),
            pattern: r"^mapa_viento_00z_output_(?P<date>\d{8})\.html$".to_string(),
            date_format: "%Y%m%d".to_string(),
            description: "Visualización de **viento pronosticado** (GFS) en los principales puertos \
                          y localidades del sistema fluvial argentino. Los mapas muestran el \
                          pronóstico correspondiente a las **00Z** de cada día."
                .to_string(),
            caption: "Desarrollado por KSTM — Datos GFS (viento fluvial)".to_string(),
            empty_message: "No hay mapas de viento disponibles.".to_string(),
        },
    ]
}

/// A named feed with its compiled extractor.
#[derive(Debug, Clone)]
pub struct Feed {
    pub name: String,
    pub title: String,
    pub description: String,
    pub caption: String,
    pub empty_message: String,
    pub extractor: DateExtractor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combinado() -> DateExtractor {
        builtin_feeds()[0].build().unwrap().extractor
    }

    #[test]
    fn test_extract_iso_date() {
        assert_eq!(
            combinado().extract("mapa_combinado_2024-03-10.html"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
    }

    #[test]
    fn test_rejects_undated_and_invalid() {
        let ex = combinado();
        assert_eq!(ex.extract("mapa_combinado_latest.html"), None);
        assert_eq!(ex.extract("mapa_combinado_2023-02-30.html"), None);
        assert_eq!(ex.extract("mapa_combinado_2024-03-10.html.bak"), None);
        assert_eq!(ex.extract("notes.txt"), None);
    }

    #[test]
    fn test_compact_date_feed() {
        let ex = builtin_feeds()[1].build().unwrap().extractor;
        assert_eq!(
            ex.extract("mapa_viento_00z_output_20240229.html"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(ex.extract("mapa_viento_00z_output_20230229.html"), None);
    }

    #[test]
    fn test_pattern_needs_date_group() {
        assert!(matches!(
            DateExtractor::new(r"^mapa_(\d+)\.html$", "%Y"),
            Err(CatalogError::MissingDateGroup(_))
        ));
        assert!(matches!(
            DateExtractor::new(r"^mapa_(?P<date>[", "%Y"),
            Err(CatalogError::InvalidPattern { .. })
        ));
    }
}
