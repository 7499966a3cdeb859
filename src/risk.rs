//! Risk analysis API client.
//!
//! Fetches the risk-curve and orbital-density endpoints and extracts their
//! point arrays. The API is an opaque producer: responses are not retried or
//! cached, and a failed fetch only degrades the surfaces that depend on it.

use crate::config::DashboardConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskPoint {
    pub altitude_km: f64,
    pub risk: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub altitude_km: f64,
}

pub fn risk_curve_url(config: &DashboardConfig, inclination_deg: f64) -> String {
    format!(
        "{}/risk_curve?inclination={}&alt_min={}&alt_max={}&step={}",
        config.api_base,
        inclination_deg,
        config.curve_alt_min_km,
        config.curve_alt_max_km,
        config.curve_step_km,
    )
}

pub fn density_url(config: &DashboardConfig) -> String {
    format!(
        "{}/density?n={}&alt_min={}&alt_max={}",
        config.api_base,
        config.density_samples,
        config.density_alt_min_km,
        config.density_alt_max_km,
    )
}

pub fn parse_risk_curve(json: &str) -> Result<Vec<RiskPoint>, String> {
    let v: serde_json::Value = serde_json::from_str(json).map_err(|e| format!("{}", e))?;
    let points = v["points"].as_array().ok_or("no points")?;
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let (Some(altitude_km), Some(risk)) = (p["altitude"].as_f64(), p["risk"].as_f64())
        else {
            continue;
        };
        out.push(RiskPoint { altitude_km, risk });
    }
    Ok(out)
}

pub fn parse_density(json: &str) -> Result<Vec<DensityPoint>, String> {
    let v: serde_json::Value = serde_json::from_str(json).map_err(|e| format!("{}", e))?;
    let points = v["points"].as_array().ok_or("no points")?;
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let (Some(lat_deg), Some(lon_deg), Some(altitude_km)) = (
            p["lat"].as_f64(),
            p["lon"].as_f64(),
            p["altitude"].as_f64(),
        ) else {
            continue;
        };
        out.push(DensityPoint {
            lat_deg,
            lon_deg,
            altitude_km,
        });
    }
    Ok(out)
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_text(url: &str) -> Result<String, String> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| format!("HTTP error: {}", e))?;
    response
        .into_string()
        .map_err(|e| format!("Read error: {}", e))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_risk_curve(url: &str) -> Result<Vec<RiskPoint>, String> {
    parse_risk_curve(&fetch_text(url)?)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_density(url: &str) -> Result<Vec<DensityPoint>, String> {
    parse_density(&fetch_text(url)?)
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    pub(crate) static RISK_CURVE_RESULT:
        std::cell::RefCell<Option<Result<Vec<RiskPoint>, String>>> =
        const { std::cell::RefCell::new(None) };
    pub(crate) static DENSITY_RESULT:
        std::cell::RefCell<Option<Result<Vec<DensityPoint>, String>>> =
        const { std::cell::RefCell::new(None) };
}

#[cfg(target_arch = "wasm32")]
pub(crate) async fn fetch_risk_curve_async(url: String) -> Result<Vec<RiskPoint>, String> {
    parse_risk_curve(&crate::tle::fetch_text_async(&url).await?)
}

#[cfg(target_arch = "wasm32")]
pub(crate) async fn fetch_density_async(url: String) -> Result<Vec<DensityPoint>, String> {
    parse_density(&crate::tle::fetch_text_async(&url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_curve_points_are_extracted() {
        let json = r#"{"points":[{"altitude":200.0,"risk":0.12},{"altitude":210.0,"risk":0.14}]}"#;
        let points = parse_risk_curve(json).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], RiskPoint { altitude_km: 200.0, risk: 0.12 });
        assert_eq!(points[1].altitude_km, 210.0);
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let json = r#"{"points":[{"altitude":200.0},{"altitude":210.0,"risk":0.5}]}"#;
        let points = parse_risk_curve(json).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].risk, 0.5);
    }

    #[test]
    fn missing_points_array_is_an_error() {
        assert!(parse_risk_curve(r#"{"detail":"boom"}"#).is_err());
        assert!(parse_risk_curve("not json").is_err());
    }

    #[test]
    fn density_points_are_extracted() {
        let json = r#"{"points":[{"lat":-45.5,"lon":120.0,"altitude":550.0}]}"#;
        let points = parse_density(json).unwrap();
        assert_eq!(
            points[0],
            DensityPoint { lat_deg: -45.5, lon_deg: 120.0, altitude_km: 550.0 }
        );
    }

    #[test]
    fn urls_carry_the_query_parameters() {
        let config = crate::config::DashboardConfig::default();
        let url = risk_curve_url(&config, 97.0);
        assert!(url.starts_with("http://127.0.0.1:8000/risk_curve?"));
        assert!(url.contains("inclination=97"));
        assert!(url.contains("alt_min=200"));
        assert!(url.contains("alt_max=1200"));
        assert!(url.contains("step=10"));
        let url = density_url(&config);
        assert!(url.contains("n=900"));
    }
}
