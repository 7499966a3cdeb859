//! Dashboard application state and frame loop.
//!
//! Owns the tracker, the 3D scene, and the chart surfaces, and wires the
//! async loads into the egui update loop. Native loads run on worker threads
//! polled through mpsc channels; on wasm the futures park their results in
//! thread-local slots drained here. The loop repaints unconditionally so the
//! globe keeps spinning and the propagation tick keeps firing.

use chrono::Utc;
use eframe::egui;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc;

use crate::chart::{self, ChartPoint, SurfaceAnimation};
use crate::config::DashboardConfig;
use crate::risk::{self, DensityPoint, RiskPoint};
use crate::scene::SceneState;
use crate::tle::{self, LoadFailure, TleSource};
use crate::track::{SatelliteTracker, SelectionStatus, TrackerState};
use crate::transform::{altitude_scale, grid_to_scene};

pub struct App {
    config: DashboardConfig,
    tracker: TrackerState,
    scene: SceneState,
    status: String,
    search_input: String,
    selected_id: Option<String>,
    altitude_km: f64,
    inclination_deg: f64,
    last_inclination_deg: f64,
    /// egui clock time of the last propagation pass.
    last_tick: Option<f64>,
    last_risk_fetch: Option<f64>,
    risk_fetch_in_flight: bool,
    risk_error: Option<String>,
    chart_points: Vec<ChartPoint>,
    chart_anim: SurfaceAnimation,
    #[cfg(not(target_arch = "wasm32"))]
    tle_rx: Option<mpsc::Receiver<Result<(String, TleSource), LoadFailure>>>,
    #[cfg(not(target_arch = "wasm32"))]
    risk_rx: Option<mpsc::Receiver<Result<Vec<RiskPoint>, String>>>,
    #[cfg(not(target_arch = "wasm32"))]
    density_rx: Option<mpsc::Receiver<Result<Vec<DensityPoint>, String>>>,
}

impl App {
    pub fn new() -> Self {
        let config = DashboardConfig::default();
        let chart_anim = SurfaceAnimation::new(config.chart_anim_duration_s);
        let mut app = Self {
            config,
            tracker: TrackerState::Loading,
            scene: SceneState::new(),
            status: "Fetching TLE (CelesTrak)...".to_string(),
            search_input: String::new(),
            selected_id: None,
            altitude_km: 550.0,
            inclination_deg: 53.0,
            last_inclination_deg: 53.0,
            last_tick: None,
            last_risk_fetch: None,
            risk_fetch_in_flight: false,
            risk_error: None,
            chart_points: Vec::new(),
            chart_anim,
            #[cfg(not(target_arch = "wasm32"))]
            tle_rx: None,
            #[cfg(not(target_arch = "wasm32"))]
            risk_rx: None,
            #[cfg(not(target_arch = "wasm32"))]
            density_rx: None,
        };
        app.spawn_tle_load();
        app.spawn_density_fetch();
        app.spawn_risk_curve(0.0);
        app
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_tle_load(&mut self) {
        let config = self.config.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(tle::load_element_sets(
                &config.tle_primary_url,
                &config.tle_fallback_path,
            ));
        });
        self.tle_rx = Some(rx);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_tle_load(&mut self) {
        let config = self.config.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = tle::load_element_sets_async(
                &config.tle_primary_url,
                &config.tle_fallback_path,
            )
            .await;
            tle::TLE_LOAD_RESULT.with(|cell| {
                *cell.borrow_mut() = Some(result);
            });
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_risk_curve(&mut self, now: f64) {
        let url = risk::risk_curve_url(&self.config, self.inclination_deg);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(risk::fetch_risk_curve(&url));
        });
        self.risk_rx = Some(rx);
        self.risk_fetch_in_flight = true;
        self.last_risk_fetch = Some(now);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_risk_curve(&mut self, now: f64) {
        let url = risk::risk_curve_url(&self.config, self.inclination_deg);
        wasm_bindgen_futures::spawn_local(async move {
            let result = risk::fetch_risk_curve_async(url).await;
            risk::RISK_CURVE_RESULT.with(|cell| {
                *cell.borrow_mut() = Some(result);
            });
        });
        self.risk_fetch_in_flight = true;
        self.last_risk_fetch = Some(now);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_density_fetch(&mut self) {
        let url = risk::density_url(&self.config);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(risk::fetch_density(&url));
        });
        self.density_rx = Some(rx);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_density_fetch(&mut self) {
        let url = risk::density_url(&self.config);
        wasm_bindgen_futures::spawn_local(async move {
            let result = risk::fetch_density_async(url).await;
            risk::DENSITY_RESULT.with(|cell| {
                *cell.borrow_mut() = Some(result);
            });
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn poll_loads(&mut self, now: f64) {
        if let Some(rx) = &self.tle_rx {
            if let Ok(result) = rx.try_recv() {
                self.tle_rx = None;
                self.finish_tle_load(result, now);
            }
        }
        if let Some(rx) = &self.risk_rx {
            if let Ok(result) = rx.try_recv() {
                self.risk_rx = None;
                self.finish_risk_curve(result, now);
            }
        }
        if let Some(rx) = &self.density_rx {
            if let Ok(result) = rx.try_recv() {
                self.density_rx = None;
                self.finish_density(result);
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_loads(&mut self, now: f64) {
        if let Some(result) = tle::TLE_LOAD_RESULT.with(|cell| cell.borrow_mut().take()) {
            self.finish_tle_load(result, now);
        }
        if let Some(result) = risk::RISK_CURVE_RESULT.with(|cell| cell.borrow_mut().take()) {
            self.finish_risk_curve(result, now);
        }
        if let Some(result) = risk::DENSITY_RESULT.with(|cell| cell.borrow_mut().take()) {
            self.finish_density(result);
        }
    }

    fn finish_tle_load(
        &mut self,
        result: Result<(String, TleSource), LoadFailure>,
        now: f64,
    ) {
        match result {
            Ok((text, source)) => {
                let records = tle::parse_element_sets(&text, self.config.max_records);
                if records.is_empty() {
                    let failure = LoadFailure::EmptyDataset { source };
                    self.status = failure.to_string();
                    self.tracker = TrackerState::Failed(failure);
                    return;
                }
                let mut tracker = SatelliteTracker::from_records(&records, source);
                tracker.tick(Utc::now());
                self.last_tick = Some(now);
                let skipped = if tracker.skipped() > 0 {
                    format!(", {} skipped", tracker.skipped())
                } else {
                    String::new()
                };
                self.status = format!(
                    "Tracking {} satellites from {}{}. Tip: type 25544 and press Find.",
                    tracker.len(),
                    source,
                    skipped,
                );
                self.tracker = TrackerState::Ready(tracker);
            }
            Err(failure) => {
                self.status = failure.to_string();
                self.tracker = TrackerState::Failed(failure);
            }
        }
    }

    fn finish_risk_curve(&mut self, result: Result<Vec<RiskPoint>, String>, now: f64) {
        self.risk_fetch_in_flight = false;
        match result {
            Ok(points) => {
                self.chart_points = points
                    .iter()
                    .map(|p| ChartPoint {
                        altitude_km: p.altitude_km,
                        risk: p.risk,
                    })
                    .collect();
                self.chart_points
                    .sort_by(|a, b| a.altitude_km.total_cmp(&b.altitude_km));
                self.chart_anim.restart(now);
                self.risk_error = None;
            }
            Err(e) => {
                log::warn!("risk curve fetch failed: {}", e);
                self.risk_error = Some(e);
            }
        }
    }

    fn finish_density(&mut self, result: Result<Vec<DensityPoint>, String>) {
        match result {
            Ok(points) => {
                self.scene.density = points
                    .iter()
                    .map(|p| grid_to_scene(p.lat_deg, p.lon_deg, p.altitude_km))
                    .collect();
            }
            Err(e) => {
                log::warn!("density fetch failed: {}", e);
            }
        }
    }

    fn run_search(&mut self) {
        let tracker = match &self.tracker {
            TrackerState::Ready(tracker) => tracker,
            other => {
                self.status = search_blocked_status(other);
                return;
            }
        };
        match tracker.select_by_id(&self.search_input) {
            SelectionStatus::Selected { name, id, position } => {
                self.scene.highlight = Some(position);
                self.scene.set_track(tracker.orbit_track(
                    &id,
                    Utc::now(),
                    self.config.track_window_s,
                    self.config.track_step_s,
                ));
                self.status = format!(
                    "Selected: {} (NORAD {}). Orbit track: {} min.",
                    name,
                    id,
                    self.config.track_window_s / 60,
                );
                self.selected_id = Some(id);
            }
            SelectionStatus::NotFound => {
                self.status = format!(
                    "NORAD {} not found (or not propagated yet).",
                    self.search_input.trim(),
                );
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("LEO Risk Dashboard");
            ui.separator();
            ui.label("Alt:");
            ui.add(
                egui::DragValue::new(&mut self.altitude_km)
                    .range(200.0..=1200.0)
                    .suffix(" km"),
            );
            ui.label("Inc:");
            ui.add(
                egui::DragValue::new(&mut self.inclination_deg)
                    .range(0.0..=180.0)
                    .suffix("\u{b0}"),
            );
            ui.separator();
            ui.label("NORAD:");
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.search_input).desired_width(80.0),
            );
            let submitted =
                edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Find").clicked() || submitted {
                self.run_search();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.weak(format!("build {}", env!("GIT_HASH")));
            });
        });
        ui.label(&self.status);
    }

    fn charts(&mut self, ui: &mut egui::Ui, now: f64) {
        let t = self.chart_anim.fraction(now);
        let width = ui.available_width();

        let (chart_rect, _) =
            ui.allocate_exact_size(egui::vec2(width, 240.0), egui::Sense::hover());
        chart::draw_line_chart(
            ui.painter(),
            chart_rect,
            &self.chart_points,
            self.altitude_km,
            t,
        );

        ui.add_space(8.0);

        let (heat_rect, _) =
            ui.allocate_exact_size(egui::vec2(width, 200.0), egui::Sense::hover());
        chart::draw_heatmap(
            ui.painter(),
            heat_rect,
            &self.chart_points,
            self.inclination_deg,
        );

        if let Some(e) = &self.risk_error {
            ui.add_space(4.0);
            ui.colored_label(
                egui::Color32::from_rgb(255, 77, 109),
                format!("Risk API unavailable: {}", e),
            );
        }
    }
}

/// Status shown when a search runs without a ready tracker. A terminal load
/// failure echoes its own message instead of a stale "loading" hint.
fn search_blocked_status(tracker: &TrackerState) -> String {
    match tracker {
        TrackerState::Failed(failure) => failure.to_string(),
        _ => "TLE data not loaded yet.".to_string(),
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        let now = ctx.input(|i| i.time);

        self.poll_loads(now);

        if let TrackerState::Ready(tracker) = &mut self.tracker {
            let due = self
                .last_tick
                .map_or(true, |t| now - t >= self.config.tick_interval_s);
            if due {
                tracker.tick(Utc::now());
                self.last_tick = Some(now);
            }
            if tracker.take_dirty() {
                self.scene.upload_points(tracker.positions());
                if let Some(id) = &self.selected_id {
                    if let SelectionStatus::Selected { position, .. } =
                        tracker.select_by_id(id)
                    {
                        self.scene.highlight = Some(position);
                    }
                }
            }
        }

        let refresh_due = self
            .last_risk_fetch
            .map_or(false, |t| now - t >= self.config.risk_refresh_s);
        let inclination_changed = self.inclination_deg != self.last_inclination_deg;
        if (refresh_due || inclination_changed) && !self.risk_fetch_in_flight {
            self.last_inclination_deg = self.inclination_deg;
            self.spawn_risk_curve(now);
        }

        self.scene.ring = Some((altitude_scale(self.altitude_km), self.inclination_deg));

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls(ui);
        });

        egui::SidePanel::right("charts")
            .default_width(380.0)
            .show(ctx, |ui| {
                self.charts(ui, now);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let TrackerState::Failed(failure) = &self.tracker {
                ui.centered_and_justified(|ui| {
                    ui.colored_label(
                        egui::Color32::from_rgb(255, 77, 109),
                        failure.to_string(),
                    );
                });
                return;
            }
            let size = ui.available_size();
            self.scene.draw(ui, size.x, size.y);
        });

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_search_echoes_a_terminal_failure() {
        let failed = TrackerState::Failed(LoadFailure::DataUnavailable(
            "offline".to_string(),
        ));
        let msg = search_blocked_status(&failed);
        assert!(msg.contains("Cannot load TLE data"));
        assert!(msg.contains("offline"));
        assert_ne!(msg, "TLE data not loaded yet.");
    }

    #[test]
    fn blocked_search_while_loading_says_so() {
        assert_eq!(
            search_blocked_status(&TrackerState::Loading),
            "TLE data not loaded yet."
        );
    }
}
