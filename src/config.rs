//! Dashboard configuration.
//!
//! Endpoints, parser limits, and timing constants for the tracking and
//! risk-visualization pipeline. Everything that is tunable lives here.

#[derive(Clone)]
pub struct DashboardConfig {
    /// Primary element-set source (CelesTrak active satellites).
    pub tle_primary_url: String,
    /// Bundled fallback used when the primary source is unreachable.
    pub tle_fallback_path: String,
    /// Base URL of the risk analysis API.
    pub api_base: String,
    /// Hard cap on accepted element-set records per load.
    pub max_records: usize,
    /// Wall-clock seconds between propagation passes.
    pub tick_interval_s: f64,
    /// Orbit-track sampling window and step, in seconds.
    pub track_window_s: i64,
    pub track_step_s: i64,
    /// Line-chart animation duration, in seconds.
    pub chart_anim_duration_s: f64,
    /// Seconds between risk-curve/density refreshes.
    pub risk_refresh_s: f64,
    /// Risk-curve query range.
    pub curve_alt_min_km: f64,
    pub curve_alt_max_km: f64,
    pub curve_step_km: f64,
    /// Density sample query.
    pub density_samples: usize,
    pub density_alt_min_km: f64,
    pub density_alt_max_km: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tle_primary_url:
                "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=tle"
                    .to_string(),
            tle_fallback_path: "assets/tle_fallback.txt".to_string(),
            api_base: "http://127.0.0.1:8000".to_string(),
            max_records: 350,
            tick_interval_s: 1.2,
            track_window_s: 90 * 60,
            track_step_s: 60,
            chart_anim_duration_s: 0.65,
            risk_refresh_s: 45.0,
            curve_alt_min_km: 200.0,
            curve_alt_max_km: 1200.0,
            curve_step_km: 10.0,
            density_samples: 900,
            density_alt_min_km: 300.0,
            density_alt_max_km: 900.0,
        }
    }
}
