//! Common test fixtures for the marine dashboards.
//!
//! Plain tuples and strings only, so that every workspace crate can use
//! them without a dependency cycle.

/// Named locations as `(name, lat, lon)`.
pub mod ports {
    pub const MAR_DEL_PLATA: (&str, f64, f64) = ("Mar del Plata", -38.03, -57.5);

    /// A coordinate well outside any South Atlantic subset.
    pub const FAR_AWAY: (&str, f64, f64) = ("Tokyo", 35.68, 139.69);
}

/// Common time values for testing.
pub mod time {
    /// 2024-03-15T00:00:00Z in GrADS "days since 1-1-1 00:00:0.0".
    pub const REFERENCE_GRADS_DAYS: f64 = 738961.0;

    /// Wind forecast offsets used by the live dashboard.
    pub const FORECAST_HOURS: [u32; 4] = [0, 24, 48, 72];
}

/// Snapshot filenames as written by the snapshot generator.
pub mod snapshots {
    pub const COMBINADO_MAR_10: &str = "mapa_combinado_2024-03-10.html";
    pub const COMBINADO_MAR_09: &str = "mapa_combinado_2024-03-09.html";
    pub const COMBINADO_FEB_29: &str = "mapa_combinado_2024-02-29.html";
    pub const VIENTO_MAR_09: &str = "mapa_viento_00z_output_20240309.html";

    /// Names that must never be listed by the combined feed.
    pub const UNDATED: [&str; 4] = [
        "mapa_combinado_latest.html",
        "mapa_combinado_2023-02-30.html",
        "notes.txt",
        "mapa_combinado_2024-03-10.html.bak",
    ];
}

/// Recorded-shape OPeNDAP ASCII responses.
pub mod opendap {
    /// GrADS Data Server answer to `.ascii?time[0:1],lat[0:2],lon[0:3]`.
    pub const GRADS_AXES: &str = "\
time, [2]
738961.0, 738962.0
lat, [3]
-38.25, -38.0, -37.75
lon, [4]
302.0, 302.25, 302.5, 302.75
";

    /// GrADS Data Server answer for a `ugrd10m[0:1][0:2][0:3]` hyperslab.
    pub const GRADS_UGRD: &str = "\
ugrd10m, [2][3][4]
[0][0], 1.0, 2.0, 3.0, 4.0
[0][1], 5.0, 5.0, 5.0, 5.0
[0][2], 9.999E20, 6.0, 7.0, 8.0
[1][0], -1.0, -2.0, -3.0, -4.0
[1][1], -5.0, -5.0, -5.0, -5.0
[1][2], -6.0, -7.0, -8.0, 9.999E20

time, [2]
738961.0, 738962.0
lat, [3]
-38.25, -38.0, -37.75
lon, [4]
302.0, 302.25, 302.5, 302.75
";

    /// THREDDS answer for a grid hyperslab with a DDS preamble.
    pub const THREDDS_VHM0: &str = "\
Dataset {
    Grid {
      ARRAY:
        Float32 VHM0[time = 1][latitude = 2][longitude = 2];
      MAPS:
        Float64 time[time = 1];
        Float32 latitude[latitude = 2];
        Float32 longitude[longitude = 2];
    } VHM0;
} cmems_mod_glo_wav_anfc_0.083deg_PT3H-i;
---------------------------------------------
VHM0.VHM0[1][2][2]
[0][0], 2.5, NaN
[0][1], 4.25, 6.5

VHM0.time[1]
1710460800.0

VHM0.latitude[2]
-40.0, -39.916668

VHM0.longitude[2]
-60.0, -59.916668
";

    /// Body returned when a GrADS dataset does not exist (yet).
    pub const GRADS_MISSING_DATASET: &str =
        "<html><body><b>GrADS Data Server - error</b><p>Invalid dataset</p></body></html>";
}
