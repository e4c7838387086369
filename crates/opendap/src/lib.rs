//! OPeNDAP access to the remote forecast datasets.
//!
//! Remote grids are read through the OPeNDAP ASCII response form: the
//! coordinate axes are fetched first, then one hyperslab per variable
//! covering only the area of interest.
//!
//! - [`gfs`]: GFS 0.25° 10 m wind from NOMADS
//! - [`waves`]: Copernicus Marine significant wave height, with a cache file

pub mod ascii;
pub mod client;
pub mod error;
pub mod gfs;
pub mod subset;
pub mod time;
pub mod url;
pub mod waves;

pub use ascii::{parse_ascii, AsciiArray, AsciiResponse};
pub use client::{AxisNames, Credentials, GridRequest, OpendapClient, Packing};
pub use error::{OpendapError, OpendapResult};
pub use gfs::{GfsWindSource, WindSourceConfig, GRADS_TIME_UNITS};
pub use subset::{plan_subset, DatasetAxes, SubsetPlan, TimeSelection};
pub use time::TimeUnits;
pub use url::{gfs_dataset_url, Hyperslab, IndexRange};
pub use waves::{wave_window, CopernicusWaveSource, WaveSourceConfig};
