//! H02 position → Owntracks record

use chrono::{DateTime, Utc};

use crate::models::{
    ConnectionType, DecodedPosition, DeviceConfig, IgnitionBit, OutboundRecord, StatusBytes,
    Trigger,
};

/// 1 knot in km/h
pub const KNOTS_TO_KMH: f64 = 1.852;

/// Accuracy reported when the device has no valid fix
pub const NO_FIX_ACCURACY: u32 = 1000;

/// Build the location report for a resolved position.
///
/// `now` becomes `created_a`; everything else derives from the inputs, so two
/// calls with the same position and device differ only in that field.
pub fn transform(
    pos: &DecodedPosition,
    cfg: &DeviceConfig,
    now: DateTime<Utc>,
    ignition_bit: IgnitionBit,
) -> OutboundRecord {
    let acc = if pos.gps_valid { 0 } else { NO_FIX_ACCURACY };

    let ignition_on = pos
        .status
        .byte(StatusBytes::IGNITION_BYTE)
        .is_some_and(|byte| ignition_bit.is_set(byte));

    OutboundRecord {
        lat: pos.latitude,
        lon: pos.longitude,
        acc,
        vel: pos.speed_knots * KNOTS_TO_KMH,
        tst: pos.timestamp.timestamp(),
        created_at: now.timestamp(),
        conn: ConnectionType::Mobile,
        tid: cfg.tracking_id.clone(),
        t: if ignition_on {
            Trigger::IgnitionOn
        } else {
            Trigger::IgnitionOff
        },
    }
}
