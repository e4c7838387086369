//! Server-rendered HTML pages.

use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use renderer::LEAFLET_HEAD;
use snapshot_catalog::{CatalogStatus, Feed, SnapshotCatalog, SnapshotEntry};

use crate::config::LinkConfig;
use crate::forecast::Forecast;

const STYLE: &str = r#"<style>
body { font-family: "Source Sans Pro", sans-serif; margin: 0; padding: 0 2rem 2rem; color: #262730; }
.top-buttons { display: flex; justify-content: flex-end; gap: 10px; margin: 12px 0; }
.top-buttons a { color: white; padding: 8px 16px; border-radius: 8px; text-decoration: none; font-weight: bold; }
.top-buttons a.satelite { background-color: #0066cc; }
.top-buttons a.satelite:hover { background-color: #004c99; }
.top-buttons a.fluvial { background-color: #009688; }
.top-buttons a.fluvial:hover { background-color: #00796b; }
.top-buttons a.maritimo { background-color: #1565c0; }
.top-buttons a.maritimo:hover { background-color: #0d47a1; }
.layout { display: flex; gap: 2rem; }
.sidebar { min-width: 220px; }
.content { flex: 1; }
.error { background: #ffe3e3; color: #7d1a1a; padding: 10px 14px; border-radius: 6px; }
.warning { background: #fff5d6; color: #6b4e00; padding: 10px 14px; border-radius: 6px; }
.info { background: #e3f0ff; color: #0b3d75; padding: 10px 14px; border-radius: 6px; }
.caption { color: #808495; font-size: 0.85rem; margin-top: 1rem; }
table.muestras { border-collapse: collapse; margin: 1rem 0; }
table.muestras th, table.muestras td { border: 1px solid #ddd; padding: 4px 10px; text-align: right; }
table.muestras th:first-child, table.muestras td:first-child { text-align: left; }
.leyenda { margin-top: 8px; font-size: 13px; }
.muestra { display: inline-block; width: 12px; height: 12px; border-radius: 50%; vertical-align: middle; }
iframe.snapshot { width: 100%; height: 700px; border: none; }
</style>"#;

/// Escape `s` and turn `**bold**` spans into `<b>`.
pub fn inline_markdown(s: &str) -> String {
    s.split("**")
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 1 {
                format!("<b>{}</b>", text(part))
            } else {
                text(part).into_owned()
            }
        })
        .collect()
}

fn header_buttons(links: &LinkConfig, show_maritime: bool, show_fluvial: bool) -> String {
    let mut html = String::from(r#"<div class="top-buttons">"#);
    if show_maritime {
        html.push_str(&format!(
            r#"<a class="maritimo" href="{}">PRONÓSTICO MARÍTIMO</a>"#,
            attr(&links.maritime)
        ));
    }
    if show_fluvial {
        html.push_str(&format!(
            r#"<a class="fluvial" href="{}">PRONÓSTICO FLUVIAL</a>"#,
            attr(&links.fluvial)
        ));
    }
    html.push_str(&format!(
        r#"<a class="satelite" href="{}" target="_blank" rel="noopener">SATÉLITE</a></div>"#,
        attr(&links.satellite)
    ));
    html
}

fn document(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
{}
{}
</head>
<body>
{}
</body>
</html>
"#,
        text(title),
        STYLE,
        head_extra,
        body
    )
}

/// Links to every dashboard.
pub fn landing_page(links: &LinkConfig, feeds: &[Feed]) -> String {
    let mut body = header_buttons(links, false, false);
    body.push_str("<h1>🌊 Pronóstico Marítimo y Fluvial (KSTM)</h1><ul>");
    body.push_str(r#"<li><a href="/maritimo">Pronóstico integrado de viento y olas (en vivo)</a></li>"#);
    for feed in feeds {
        body.push_str(&format!(
            r#"<li><a href="/snapshots/{}">{}</a></li>"#,
            attr(&feed.name),
            text(&feed.title)
        ));
    }
    body.push_str("</ul>");
    document("Pronóstico KSTM", "", &body)
}

/// Content of the live dashboard for the selected day.
pub struct MaritimeView<'a> {
    pub forecast: &'a Forecast,
    pub day: Option<NaiveDate>,
    /// Map container and script.
    pub map_html: Option<String>,
    pub legend_html: Option<String>,
    pub render_error: Option<String>,
}

fn samples_table(forecast: &Forecast, day: NaiveDate) -> String {
    let samples = forecast.samples_for_day(day);
    let unit = samples.first().map(|s| s.unit.symbol()).unwrap_or("kt");
    let mut html = format!(
        r#"<table class="muestras"><tr><th>Ciudad</th><th>Velocidad ({})</th><th>Dirección (°)</th><th>Hora (UTC)</th></tr>"#,
        text(unit)
    );
    for s in samples {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.1}</td><td>{:.0}</td><td>{}</td></tr>",
            text(&s.location),
            s.wind_speed,
            s.wind_direction,
            s.timestamp.format("%Y-%m-%d %H:%M")
        ));
    }
    html.push_str("</table>");
    html
}

fn day_selector(days: &[NaiveDate], selected: Option<NaiveDate>) -> String {
    let mut html = String::from(
        r#"<h3>🗓️ Día del pronóstico</h3><form method="get" action="/maritimo"><label for="day">Elegí el día a visualizar:</label><br><select id="day" name="day" onchange="this.form.submit()">"#,
    );
    for day in days {
        let value = day.format("%Y-%m-%d").to_string();
        let sel = if Some(*day) == selected { " selected" } else { "" };
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            value,
            sel,
            day.format("%d %b %Y")
        ));
    }
    html.push_str(r#"</select> <noscript><button type="submit">Ver</button></noscript></form>"#);
    html
}

pub fn maritime_page(links: &LinkConfig, view: &MaritimeView<'_>) -> String {
    let forecast = view.forecast;
    let mut body = header_buttons(links, true, true);
    body.push_str("<h1>🌊 Pronóstico Marítimo Integrado — Viento y Olas (KS-TM)</h1>");
    body.push_str(&format!(
        "<p>{}</p>",
        inline_markdown(
            "Tablero integrado con pronóstico de **viento GFS (00Z)** y **altura significativa \
             de ola (Copernicus Marine)** para los principales puertos del litoral argentino."
        )
    ));

    let days = forecast.days();
    body.push_str(r#"<div class="layout"><div class="sidebar">"#);
    body.push_str(&day_selector(&days, view.day));
    body.push_str(r#"</div><div class="content">"#);

    if let Some(err) = &forecast.wind_error {
        body.push_str(&format!(
            r#"<div class="error">No se pudo abrir el dataset GFS. Error: {}</div>"#,
            text(err)
        ));
    } else if days.is_empty() {
        body.push_str(r#"<div class="error">No se pudieron procesar datos GFS válidos.</div>"#);
    }
    if let Some(err) = &forecast.wave_error {
        body.push_str(&format!(
            r#"<div class="warning">No se pudo abrir el archivo de olas: {}</div>"#,
            text(err)
        ));
    }
    if let Some(err) = &view.render_error {
        body.push_str(&format!(r#"<div class="error">{}</div>"#, text(err)));
    }

    if let Some(day) = view.day {
        body.push_str(&format!(
            "<h3>Pronóstico para {}</h3>",
            day.format("%d %b %Y")
        ));
        if let Some(map) = &view.map_html {
            body.push_str(map);
        }
        if let Some(legend) = &view.legend_html {
            body.push_str(legend);
        }
        body.push_str(&samples_table(forecast, day));
    }

    body.push_str(&format!(
        r#"<p class="caption">Ciclo {} — Datos GFS &amp; Copernicus</p></div></div>"#,
        text(&forecast.cycle.to_string())
    ));
    document("🌊 Dashboard Marítimo KS-TM", LEAFLET_HEAD, &body)
}

/// Catalog browser with the selected snapshot embedded.
pub fn snapshot_page(
    links: &LinkConfig,
    feed: &Feed,
    catalog: &SnapshotCatalog,
    selected: Option<&SnapshotEntry>,
) -> String {
    let is_fluvial = feed.name.starts_with("viento");
    let mut body = header_buttons(links, is_fluvial, !is_fluvial);
    body.push_str(&format!("<h1>{}</h1>", text(&feed.title)));
    if !feed.description.is_empty() {
        body.push_str(&format!("<p>{}</p>", inline_markdown(&feed.description)));
    }

    match catalog.status() {
        CatalogStatus::MissingDirectory => body.push_str(
            r#"<div class="error">❌ No se encontró la carpeta con los mapas HTML.</div>"#,
        ),
        CatalogStatus::Empty => body.push_str(&format!(
            r#"<div class="warning">{}</div>"#,
            text(&feed.empty_message)
        )),
        CatalogStatus::Ready => {
            let feed_path = format!("/snapshots/{}", urlencoding::encode(&feed.name));
            body.push_str(&format!(
                r#"<form method="get" action="{}"><label for="file">Seleccioná el día a visualizar:</label><br><select id="file" name="file" onchange="this.form.submit()">"#,
                attr(&feed_path)
            ));
            for entry in catalog.entries() {
                let sel = if selected.map(|s| s.filename == entry.filename).unwrap_or(false) {
                    " selected"
                } else {
                    ""
                };
                body.push_str(&format!(
                    r#"<option value="{}"{}>{}</option>"#,
                    attr(&entry.filename),
                    sel,
                    text(&entry.label)
                ));
            }
            body.push_str(r#"</select> <noscript><button type="submit">Ver</button></noscript></form>"#);

            if let Some(entry) = selected {
                body.push_str(&format!("<h3>🗓️ {}</h3>", text(&entry.label)));
                body.push_str(&format!(
                    r#"<iframe class="snapshot" src="{}/raw/{}"></iframe>"#,
                    attr(&feed_path),
                    urlencoding::encode(&entry.filename)
                ));
            }
        }
    }

    if !feed.caption.is_empty() {
        body.push_str(&format!(r#"<p class="caption">{}</p>"#, text(&feed.caption)));
    }
    document(&feed.title, "", &body)
}

/// Minimal page for errors outside the dashboards' own banners.
pub fn error_page(links: &LinkConfig, message: &str) -> String {
    let body = format!(
        r#"{}<div class="error">{}</div><p><a href="/">Volver al inicio</a></p>"#,
        header_buttons(links, true, true),
        text(message)
    );
    document("Pronóstico KSTM", "", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_markdown() {
        assert_eq!(
            inline_markdown("con **viento GFS** y <olas>"),
            "con <b>viento GFS</b> y &lt;olas&gt;"
        );
        assert_eq!(inline_markdown("sin negrita"), "sin negrita");
    }

    #[test]
    fn test_header_buttons() {
        let html = header_buttons(&LinkConfig::default(), false, true);
        assert!(html.contains("PRONÓSTICO FLUVIAL"));
        assert!(html.contains("zoom.earth"));
        assert!(!html.contains("PRONÓSTICO MARÍTIMO"));
    }
}
