//! Live satellite set and propagation scheduling.
//!
//! Owns the tracked satellites and the shared position buffer. A fixed-interval
//! tick (driven by the app update loop) propagates every satellite to "now" and
//! writes scene-space coordinates into the buffer; the orbit track for a
//! selected satellite is recomputed on demand. Per-satellite propagation
//! failures are absorbed locally with a sentinel write and never abort a tick.

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;

use crate::time::greenwich_mean_sidereal_time;
use crate::tle::{ElementSetRecord, LoadFailure, TleSource};
use crate::transform::{geodetic_to_scene, teme_to_geodetic};

/// Out-of-view coordinate written when propagation fails for a tick, so the
/// point neither renders at the origin nor keeps a stale position.
pub const SENTINEL_COORD: f32 = 999.0;

pub struct TrackedSatellite {
    pub id: String,
    pub name: String,
    pub constants: sgp4::Constants,
    pub epoch_minutes: f64,
    pub last_position: Option<Vector3<f64>>,
    /// Stable slot into the shared position buffer.
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionStatus {
    Selected {
        name: String,
        id: String,
        position: Vector3<f64>,
    },
    NotFound,
}

pub enum TrackerState {
    Loading,
    Ready(SatelliteTracker),
    Failed(LoadFailure),
}

/// Exclusive owner of the live satellite set and its position buffer.
/// Single writer: only [`SatelliteTracker::tick`] mutates positions. Readers
/// (scene, search) take slices and statuses.
pub struct SatelliteTracker {
    satellites: Vec<TrackedSatellite>,
    positions: Vec<f32>,
    dirty: bool,
    source: TleSource,
    skipped: usize,
}

pub fn datetime_to_minutes(dt: &sgp4::chrono::NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 / 60.0
}

fn write_sentinel(positions: &mut [f32], index: usize) {
    positions[index * 3] = SENTINEL_COORD;
    positions[index * 3 + 1] = SENTINEL_COORD;
    positions[index * 3 + 2] = SENTINEL_COORD;
}

impl SatelliteTracker {
    /// Builds one propagator per record, best-effort: records sgp4 rejects are
    /// skipped and counted, never fatal to the batch. The position buffer is
    /// sized to the accepted count and never resized; a reload builds a whole
    /// new tracker instead.
    pub fn from_records(records: &[ElementSetRecord], source: TleSource) -> Self {
        let mut satellites = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            let text = format!("{}\n{}\n{}", record.name, record.line1, record.line2);
            let elements = match sgp4::parse_3les(&text) {
                Ok(mut v) if !v.is_empty() => v.remove(0),
                Ok(_) => {
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::warn!("skipping {}: {}", record.catalog_id, e);
                    skipped += 1;
                    continue;
                }
            };
            let constants = match sgp4::Constants::from_elements(&elements) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("skipping {}: {}", record.catalog_id, e);
                    skipped += 1;
                    continue;
                }
            };
            let index = satellites.len();
            satellites.push(TrackedSatellite {
                id: record.catalog_id.clone(),
                name: record.name.clone(),
                constants,
                epoch_minutes: datetime_to_minutes(&elements.datetime),
                last_position: None,
                index,
            });
        }

        let positions = vec![0.0f32; satellites.len() * 3];
        Self {
            satellites,
            positions,
            dirty: false,
            source,
            skipped,
        }
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn source(&self) -> TleSource {
        self.source
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Consumes the dirty flag set by the last tick. The renderer refreshes
    /// its point buffer only when this returns true.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// One propagation pass over every tracked satellite. Runs synchronously
    /// inside the update loop, so ticks cannot overlap.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let now_minutes = now.timestamp() as f64 / 60.0;
        let gmst = greenwich_mean_sidereal_time(now);

        for sat in &mut self.satellites {
            let minutes_since_epoch = now_minutes - sat.epoch_minutes;
            let prediction = match sat
                .constants
                .propagate(sgp4::MinutesSinceEpoch(minutes_since_epoch))
            {
                Ok(p) => p,
                Err(_) => {
                    write_sentinel(&mut self.positions, sat.index);
                    continue;
                }
            };
            let (lat, lon, height_km) = teme_to_geodetic(prediction.position, gmst);
            let p = geodetic_to_scene(lat, lon, height_km);
            self.positions[sat.index * 3] = p.x as f32;
            self.positions[sat.index * 3 + 1] = p.y as f32;
            self.positions[sat.index * 3 + 2] = p.z as f32;
            sat.last_position = Some(p);
        }

        self.dirty = true;
    }

    /// Samples the selected satellite's orbit over `window_s` seconds at
    /// `step_s` steps starting from `now`, skipping failed steps. A pull
    /// operation, independent of the periodic tick.
    pub fn orbit_track(
        &self,
        id: &str,
        now: DateTime<Utc>,
        window_s: i64,
        step_s: i64,
    ) -> Option<Vec<Vector3<f64>>> {
        let sat = self.satellites.iter().find(|s| s.id == id)?;
        let mut points = Vec::with_capacity((window_s / step_s) as usize + 1);
        let mut t = 0i64;
        while t <= window_s {
            let sample_time = now + Duration::seconds(t);
            t += step_s;
            let minutes = sample_time.timestamp() as f64 / 60.0 - sat.epoch_minutes;
            let prediction = match sat.constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
                Ok(p) => p,
                Err(_) => continue,
            };
            let gmst = greenwich_mean_sidereal_time(sample_time);
            let (lat, lon, height_km) = teme_to_geodetic(prediction.position, gmst);
            points.push(geodetic_to_scene(lat, lon, height_km));
        }
        Some(points)
    }

    /// Exact-match lookup by catalog id. Not-found (or never propagated) is a
    /// reported status, not an error, and mutates nothing.
    pub fn select_by_id(&self, raw: &str) -> SelectionStatus {
        let id = raw.trim();
        match self.satellites.iter().find(|s| s.id == id) {
            Some(sat) => match sat.last_position {
                Some(position) => SelectionStatus::Selected {
                    name: sat.name.clone(),
                    id: sat.id.clone(),
                    position,
                },
                None => SelectionStatus::NotFound,
            },
            None => SelectionStatus::NotFound,
        }
    }
}
