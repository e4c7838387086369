//! HTTP client for OPeNDAP ASCII requests.

use std::time::Duration;

use grid_sampler::GriddedField;
use marine_common::BoundingBox;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::ascii::{parse_ascii, AsciiResponse};
use crate::error::{OpendapError, OpendapResult};
use crate::subset::{plan_subset, DatasetAxes, SubsetPlan, TimeSelection};
use crate::time::TimeUnits;
use crate::url::{ascii_url, Hyperslab};

/// Environment variable holding the Copernicus Marine user name.
pub const USERNAME_ENV: &str = "COPERNICUS_USERNAME";
/// Environment variable holding the Copernicus Marine password.
pub const PASSWORD_ENV: &str = "COPERNICUS_PASSWORD";

/// HTTP basic-auth credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `COPERNICUS_USERNAME` / `COPERNICUS_PASSWORD`.
    pub fn from_env() -> OpendapResult<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| OpendapError::MissingCredentials(format!("{} is not set", name)))
        };
        Ok(Self::new(var(USERNAME_ENV)?, var(PASSWORD_ENV)?))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Names of the coordinate variables in a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisNames {
    pub time: String,
    pub lat: String,
    pub lon: String,
}

impl AxisNames {
    pub fn new(time: &str, lat: &str, lon: &str) -> Self {
        Self {
            time: time.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }
}

impl Default for AxisNames {
    fn default() -> Self {
        Self::new("time", "lat", "lon")
    }
}

/// How raw values become physical values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Packing {
    /// Raw value marking a missing cell.
    pub fill_value: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

impl Packing {
    /// Physical value, NaN for fill or non-finite raw values.
    pub fn unpack(&self, raw: f64) -> f32 {
        if !raw.is_finite() || self.fill_value.map_or(false, |fill| raw == fill) {
            return f32::NAN;
        }
        (raw * self.scale_factor.unwrap_or(1.0) + self.add_offset.unwrap_or(0.0)) as f32
    }
}

/// One request for gridded variables over an area and a set of times.
#[derive(Debug, Clone)]
pub struct GridRequest {
    pub variables: Vec<String>,
    pub axes: AxisNames,
    pub time_units: TimeUnits,
    pub times: TimeSelection,
    /// Area of interest, signed longitudes.
    pub bbox: BoundingBox,
    /// Extra grid cells fetched around `bbox`.
    pub margin_cells: usize,
    pub packing: Packing,
}

/// OPeNDAP client speaking the ASCII response form.
#[derive(Debug, Clone)]
pub struct OpendapClient {
    client: Client,
    credentials: Option<Credentials>,
}

impl OpendapClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> OpendapResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            client,
            credentials: None,
        })
    }

    /// Send HTTP basic auth with every request.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// GET an `.ascii?` URL and parse the body.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_ascii(&self, url: &str) -> OpendapResult<AsciiResponse> {
        let mut request = self.client.get(url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => {}
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(OpendapError::Unauthorized {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            status => {
                return Err(OpendapError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Received ASCII response");
        parse_ascii(&body)
    }

    /// Fetch the full coordinate axes of a dataset.
    pub async fn fetch_axes(
        &self,
        dataset_url: &str,
        names: &AxisNames,
        time_units: &TimeUnits,
    ) -> OpendapResult<DatasetAxes> {
        let url = ascii_url(dataset_url, &[&names.time, &names.lat, &names.lon]);
        let mut response = self.fetch_ascii(&url).await?;

        let times = time_units.decode_axis(&response.take(&names.time)?.values)?;
        let lats = response.take(&names.lat)?.values;
        let lons = response.take(&names.lon)?.values;

        Ok(DatasetAxes { times, lats, lons })
    }

    /// Fetch every requested variable over the planned subset.
    ///
    /// When none of the requested times exist, the fields come back with an
    /// empty time axis rather than an error.
    #[instrument(skip(self, request), fields(dataset = %dataset_url, variables = ?request.variables))]
    pub async fn fetch_grids(
        &self,
        dataset_url: &str,
        request: &GridRequest,
    ) -> OpendapResult<Vec<GriddedField>> {
        let axes = self
            .fetch_axes(dataset_url, &request.axes, &request.time_units)
            .await?;
        let plan = plan_subset(&axes, &request.times, &request.bbox, request.margin_cells)?;

        info!(
            times = plan.times.len(),
            lats = plan.lats.len(),
            lons = plan.lons.len(),
            "Fetching subset"
        );

        let mut fields = Vec::with_capacity(request.variables.len());
        for variable in &request.variables {
            fields.push(self.fetch_variable(dataset_url, variable, &plan, &request.packing).await?);
        }
        Ok(fields)
    }

    async fn fetch_variable(
        &self,
        dataset_url: &str,
        variable: &str,
        plan: &SubsetPlan,
        packing: &Packing,
    ) -> OpendapResult<GriddedField> {
        let Some(time) = plan.time else {
            return to_field(variable, plan, Vec::new());
        };

        let slab = Hyperslab::new(variable, vec![time, plan.lat, plan.lon]);
        let url = ascii_url(dataset_url, &[&slab]);
        let mut response = self.fetch_ascii(&url).await?;
        let array = response.take(variable)?;

        let expected = vec![time.len(), plan.lat.len(), plan.lon.len()];
        if array.dims != expected {
            return Err(OpendapError::Malformed(format!(
                "{}: requested shape {:?}, server returned {:?}",
                variable, expected, array.dims
            )));
        }

        let plane = plan.lat.len() * plan.lon.len();
        let mut values = Vec::with_capacity(plan.keep.len() * plane);
        for &pos in &plan.keep {
            values.extend(
                array.values[pos * plane..(pos + 1) * plane]
                    .iter()
                    .map(|raw| packing.unpack(*raw)),
            );
        }
        to_field(variable, plan, values)
    }
}

fn to_field(variable: &str, plan: &SubsetPlan, values: Vec<f32>) -> OpendapResult<GriddedField> {
    GriddedField::new(
        variable,
        plan.times.clone(),
        plan.lats.clone(),
        plan.lons.clone(),
        values,
    )
    .map_err(|e| OpendapError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_unpack() {
        let packing = Packing {
            fill_value: Some(-32767.0),
            scale_factor: Some(0.01),
            add_offset: Some(0.0),
        };
        assert!((packing.unpack(325.0) - 3.25).abs() < 1e-6);
        assert!(packing.unpack(-32767.0).is_nan());
        assert!(packing.unpack(f64::NAN).is_nan());
        assert_eq!(Packing::default().unpack(4.5), 4.5);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("user", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_default_axis_names() {
        let names = AxisNames::default();
        assert_eq!((names.time.as_str(), names.lat.as_str(), names.lon.as_str()), ("time", "lat", "lon"));
    }
}
