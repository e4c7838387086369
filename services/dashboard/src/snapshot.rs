//! One-shot generation of the combined-map snapshots.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use marine_common::{MarineError, MarineResult};
use tracing::info;

use crate::state::AppState;

/// Filename read back by the `combinado` feed.
pub fn snapshot_filename(day: NaiveDate) -> String {
    format!("mapa_combinado_{}.html", day.format("%Y-%m-%d"))
}

/// Fetch the forecast of `now` and write one standalone map per forecast
/// day into `out_dir`, replacing files of the same day.
pub async fn write_snapshots(
    state: &AppState,
    now: DateTime<Utc>,
    out_dir: &Path,
) -> MarineResult<Vec<PathBuf>> {
    let forecast = state.forecast.forecast(now).await?;
    if let Some(err) = &forecast.wind_error {
        return Err(MarineError::DataNotAvailable(format!(
            "wind for {}: {}",
            forecast.cycle, err
        )));
    }
    let days = forecast.days();
    if days.is_empty() {
        return Err(MarineError::DataNotAvailable(format!(
            "no valid wind samples for {}",
            forecast.cycle
        )));
    }

    tokio::fs::create_dir_all(out_dir).await?;

    let mut written = Vec::with_capacity(days.len());
    for day in days {
        let html = state.forecast.day_map(&forecast, day)?.render_standalone()?;
        let path = out_dir.join(snapshot_filename(day));
        tokio::fs::write(&path, html).await?;
        info!(path = %path.display(), "Wrote snapshot");
        written.push(path);
    }
    Ok(written)
}
