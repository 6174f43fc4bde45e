//! Turns a completed frame into a snapshot update.

use log::{info, warn};

use crate::nom_parser::{parse_message, MessageToken};
use crate::snapshot::Snapshot;
use crate::types::{Error, Metric, Millis, Value};

/// What [`decode`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome<'a> {
    /// The value was stored and the snapshot stamped.
    Applied { metric: Metric, value: Value },
    /// A known key with a value outside its range. Nothing was changed.
    Rejected {
        metric: Metric,
        value: Value,
        reason: Error,
    },
    /// None of the known prefixes matched.
    Unrecognized(&'a str),
}

impl DecodeOutcome<'_> {
    pub fn metric(&self) -> Option<Metric> {
        match *self {
            DecodeOutcome::Applied { metric, .. } | DecodeOutcome::Rejected { metric, .. } => {
                Some(metric)
            }
            DecodeOutcome::Unrecognized(_) => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, DecodeOutcome::Applied { .. })
    }
}

/// Decode `message` and apply it to `snapshot`, stamping it with `now` on
/// success.
///
/// The payload after `=` is read as a leading integer; a payload without
/// digits counts as 0 and goes through the same range check as any other
/// value.
///
/// ```
/// use telemetry_bridge::decoder::{decode, DecodeOutcome};
/// use telemetry_bridge::{Metric, Snapshot};
///
/// let mut snapshot = Snapshot::new();
/// let outcome = decode("co2V.val=400", &mut snapshot, 1000);
/// assert_eq!(outcome, DecodeOutcome::Applied { metric: Metric::Co2, value: 400 });
/// assert_eq!(snapshot.get(Metric::Co2), 400);
/// assert_eq!(snapshot.last_update(), 1000);
/// ```
pub fn decode<'a>(message: &'a str, snapshot: &mut Snapshot, now: Millis) -> DecodeOutcome<'a> {
    let (metric, value) = match parse_message(message) {
        MessageToken::Reading(metric, value) => (metric, value),
        MessageToken::Unknown => {
            warn!("Unknown command: {}", message);
            return DecodeOutcome::Unrecognized(message);
        }
    };
    match snapshot.apply(metric, value, now) {
        Ok(value) => {
            info!("{} updated: {} {}", metric.label(), value, metric.unit());
            DecodeOutcome::Applied { metric, value }
        }
        Err(reason) => {
            warn!("{} reading rejected: {}", metric.label(), reason);
            DecodeOutcome::Rejected {
                metric,
                value,
                reason,
            }
        }
    }
}
