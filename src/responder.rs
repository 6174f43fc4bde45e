//! JSON rendering of the snapshot for the `/data` endpoint.

use serde::Serialize;

use crate::snapshot::Snapshot;
use crate::types::{Metric, Millis, Value};

/// The document served on `/data`.
///
/// `last_update` is the time the report was rendered, not the time of the
/// last reading. Clients compare it against their own clock to tell the
/// device is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Report {
    pub co2: Value,
    pub pm25: Value,
    pub o3: Value,
    #[serde(rename = "temp")]
    pub temperature: Value,
    #[serde(rename = "hum")]
    pub humidity: Value,
    pub tvoc: Value,
    #[serde(rename = "lastUpdate")]
    pub last_update: Millis,
}

pub fn render(snapshot: &Snapshot, now: Millis) -> Report {
    Report {
        co2: snapshot.get(Metric::Co2),
        pm25: snapshot.get(Metric::Pm25),
        o3: snapshot.get(Metric::O3),
        temperature: snapshot.get(Metric::Temperature),
        humidity: snapshot.get(Metric::Humidity),
        tvoc: snapshot.get(Metric::Tvoc),
        last_update: now,
    }
}

pub fn render_json(snapshot: &Snapshot, now: Millis) -> String {
    serde_json::to_string(&render(snapshot, now)).expect("BUG: Report is plain integers")
}
