//! H02 location frame parser
//!
//! Decodes the `*HQ,...,V1,...` location report sent by H02 trackers:
//!
//! ```text
//! *HQ,1234567890,V1,123456,A,2234.1234,N,11334.4321,E,12.3,45,010124,FFFFFBFF,...#
//!  |  |          |  |      | |         | |          | |    |  |      |
//!  |  id         |  hhmmss | latitude  | longitude  | |    |  ddmmyy status
//!  manufacturer  version   fix         N/S          E/W  speed  direction
//! ```
//!
//! Coordinates are transmitted as `DDMM.MMMM` / `DDDMM.MMMM` and are divided by
//! 100 as a whole, matching what deployed trackers and consumers expect.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::ParseError;
use crate::models::{DecodedPosition, StatusBytes};

/// Sentinel that terminates every frame on the wire
pub const FRAME_TERMINATOR: char = '#';

static LOCATION_FRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\*(?P<manufacturer>[0-9A-Za-z]{2}),(?P<id>[0-9]+),V[0-9],",
        r"(?P<hours>[0-9]{2})(?P<minutes>[0-9]{2})(?P<seconds>[0-9]{2}),(?P<gps_valid>[AV])?,",
        r"(?P<latitude>[0-9]{4}\.[0-9]{4}),(?P<latitude_symbol>[NS]),",
        r"(?P<longitude>[0-9]{5}\.[0-9]{4}),(?P<longitude_symbol>[EW]),",
        r"(?P<speed>[0-9]+\.?[0-9]*),(?P<direction>[0-9]+\.?[0-9]*),",
        r"(?P<day>[0-9]{2})(?P<month>[0-9]{2})(?P<year>[0-9]{2}),",
        r"(?P<status>[0-9A-Fa-f]{8})(?:,.*)?$",
    ))
    .expect("location frame pattern is valid")
});

/// Parse one H02 location frame.
///
/// The frame may still carry its `#` terminator and surrounding whitespace.
/// Either every field decodes or the whole frame is rejected.
pub fn parse(raw: &str) -> Result<DecodedPosition, ParseError> {
    let frame = raw.trim();
    let frame = frame.strip_suffix(FRAME_TERMINATOR).unwrap_or(frame);

    let caps = LOCATION_FRAME
        .captures(frame)
        .ok_or(ParseError::Malformed)?;

    let manufacturer = capture(&caps, "manufacturer")?.to_string();
    let device_id: u64 = number(&caps, "id")?;

    let year: i32 = number(&caps, "year")?;
    let month: u32 = number(&caps, "month")?;
    let day: u32 = number(&caps, "day")?;
    let date = NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or_else(|| {
        ParseError::invalid("date", &format!("{:02}{:02}{:02}", day, month, year))
    })?;

    let hours: u32 = number(&caps, "hours")?;
    let minutes: u32 = number(&caps, "minutes")?;
    let seconds: u32 = number(&caps, "seconds")?;
    let time = NaiveTime::from_hms_opt(hours, minutes, seconds).ok_or_else(|| {
        ParseError::invalid("time", &format!("{:02}{:02}{:02}", hours, minutes, seconds))
    })?;

    let gps_valid = caps.name("gps_valid").map(|m| m.as_str()) == Some("A");

    let mut latitude = decimal(&caps, "latitude")? / 100.0;
    if capture(&caps, "latitude_symbol")? == "S" {
        latitude = -latitude;
    }

    let mut longitude = decimal(&caps, "longitude")? / 100.0;
    if capture(&caps, "longitude_symbol")? == "W" {
        longitude = -longitude;
    }

    let speed_knots = decimal(&caps, "speed")?;
    let direction = (decimal(&caps, "direction")?.trunc() as u64 % 360) as u16;

    let status = parse_status(capture(&caps, "status")?)?;

    Ok(DecodedPosition {
        manufacturer,
        device_id,
        timestamp: date.and_time(time).and_utc(),
        gps_valid,
        latitude,
        longitude,
        speed_knots,
        direction,
        status,
    })
}

impl FromStr for DecodedPosition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn capture<'h>(caps: &Captures<'h>, name: &'static str) -> Result<&'h str, ParseError> {
    caps.name(name)
        .map(|m| m.as_str())
        .ok_or(ParseError::Malformed)
}

fn number<T: FromStr>(caps: &Captures<'_>, name: &'static str) -> Result<T, ParseError> {
    let value = capture(caps, name)?;
    value.parse().map_err(|_| ParseError::invalid(name, value))
}

/// Finite decimal; digit runs too long for `f64` parse to infinity
fn decimal(caps: &Captures<'_>, name: &'static str) -> Result<f64, ParseError> {
    let value: f64 = number(caps, name)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::invalid(name, capture(caps, name)?))
    }
}

/// Split the 8 hex digit status field into its 4 bytes, most significant first
fn parse_status(hex: &str) -> Result<StatusBytes, ParseError> {
    let word = u32::from_str_radix(hex, 16).map_err(|_| ParseError::invalid("status", hex))?;
    Ok(StatusBytes(word.to_be_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const FRAME: &str =
        "*HQ,1234567890,V1,123456,A,2234.1234,N,11334.4321,E,12.3,45,010124,00000000#";

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_parse_location_frame() {
        let pos = parse(FRAME).unwrap();
        assert_eq!(pos.manufacturer, "HQ");
        assert_eq!(pos.device_id, 1234567890);
        assert_eq!(
            pos.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 34, 56).unwrap()
        );
        assert!(pos.gps_valid);
        assert_close(pos.latitude, 22.341234);
        assert_close(pos.longitude, 113.344321);
        assert_close(pos.speed_knots, 12.3);
        assert_eq!(pos.direction, 45);
        assert_eq!(pos.status, StatusBytes([0, 0, 0, 0]));
    }

    #[test]
    fn test_terminator_is_optional() {
        let stripped = FRAME.trim_end_matches('#');
        assert_eq!(parse(stripped).unwrap(), parse(FRAME).unwrap());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let framed = format!("\r\n{}\r\n", FRAME);
        assert_eq!(parse(&framed).unwrap().device_id, 1234567890);
    }

    #[test]
    fn test_southern_western_hemispheres() {
        let pos = parse(
            "*HQ,1234567890,V1,123456,A,2234.1234,S,11334.4321,W,12.3,45,010124,00000000#",
        )
        .unwrap();
        assert_close(pos.latitude, -22.341234);
        assert_close(pos.longitude, -113.344321);

        let pos = parse(
            "*HQ,1234567890,V1,123456,A,2234.1234,S,11334.4321,E,12.3,45,010124,00000000#",
        )
        .unwrap();
        assert_close(pos.latitude, -22.341234);
        assert_close(pos.longitude, 113.344321);
    }

    #[test]
    fn test_fix_validity_flag() {
        let invalid =
            parse("*HQ,1,V1,123456,V,2234.1234,N,11334.4321,E,0,0,010124,00000000#").unwrap();
        assert!(!invalid.gps_valid);

        let absent =
            parse("*HQ,1,V1,123456,,2234.1234,N,11334.4321,E,0,0,010124,00000000#").unwrap();
        assert!(!absent.gps_valid);
    }

    #[test]
    fn test_status_bytes() {
        let pos =
            parse("*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,FFFFFBFF#").unwrap();
        assert_eq!(pos.status.bytes(), [0xFF, 0xFF, 0xFB, 0xFF]);
        assert_eq!(pos.status.byte(StatusBytes::IGNITION_BYTE), Some(0xFB));

        let lower =
            parse("*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,fffffbff#").unwrap();
        assert_eq!(lower.status, pos.status);
    }

    #[test]
    fn test_trailing_fields_ignored() {
        let pos = parse(
            "*HQ,4209917484,V1,024418,A,5036.7340,N,01956.3567,E,000.04,000,170219,FBFFBBFF,260,01,0,0,6#",
        )
        .unwrap();
        assert_eq!(pos.device_id, 4209917484);
        assert_eq!(
            pos.timestamp,
            Utc.with_ymd_and_hms(2019, 2, 17, 2, 44, 18).unwrap()
        );
        assert_close(pos.latitude, 50.36734);
        assert_close(pos.longitude, 19.563567);
        assert_close(pos.speed_knots, 0.04);
        assert_eq!(pos.direction, 0);
    }

    #[test]
    fn test_fractional_direction_truncated() {
        let pos =
            parse("*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,5.5,271.9,010124,00000000#")
                .unwrap();
        assert_eq!(pos.direction, 271);
        assert_close(pos.speed_knots, 5.5);
    }

    #[test]
    fn test_status_must_be_eight_hex_digits() {
        for frame in [
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,0000000#",
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,000000000#",
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,0000000G#",
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,#",
        ] {
            assert_eq!(parse(frame), Err(ParseError::Malformed), "{frame}");
        }
    }

    #[test]
    fn test_structural_mismatch() {
        for frame in [
            "",
            "#",
            "HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,00000000#",
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,010124,00000000#",
            "*HQ,abc,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,00000000#",
            "*HQ,1,XX,123456,A,2234.1234,N,11334.4321,E,0,0,010124,00000000#",
            "*HQ,1,V1,123456,A,2234.1234,X,11334.4321,E,0,0,010124,00000000#",
            "*HQ,1,V1,123456,A,234.1234,N,11334.4321,E,0,0,010124,00000000#",
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,-1,0,010124,00000000#",
            "*HQ,1,V1,123456,Z,2234.1234,N,11334.4321,E,0,0,010124,00000000#",
            "*HQ,1,V4,123456,A,2234.1234,N,11334.4321,E,0,0,0101,00000000#",
        ] {
            assert_eq!(parse(frame), Err(ParseError::Malformed), "{frame:?}");
        }
    }

    #[test]
    fn test_impossible_date_or_time_rejected() {
        let bad_date =
            parse("*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,0,310224,00000000#");
        assert!(matches!(
            bad_date,
            Err(ParseError::InvalidField { field: "date", .. })
        ));

        let bad_time =
            parse("*HQ,1,V1,256000,A,2234.1234,N,11334.4321,E,0,0,010124,00000000#");
        assert!(matches!(
            bad_time,
            Err(ParseError::InvalidField { field: "time", .. })
        ));
    }

    #[test]
    fn test_device_id_overflow_rejected() {
        let result = parse(
            "*HQ,99999999999999999999,V1,123456,A,2234.1234,N,11334.4321,E,0,0,010124,00000000#",
        );
        assert!(matches!(
            result,
            Err(ParseError::InvalidField { field: "id", .. })
        ));
    }

    #[test]
    fn test_overlong_speed_rejected() {
        let frame = format!(
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,{},0,010124,00000000#",
            "9".repeat(400)
        );
        assert!(matches!(
            parse(&frame),
            Err(ParseError::InvalidField { field: "speed", .. })
        ));
    }

    #[test]
    fn test_overlong_direction_rejected() {
        let frame = format!(
            "*HQ,1,V1,123456,A,2234.1234,N,11334.4321,E,0,{}.5,010124,00000000#",
            "9".repeat(400)
        );
        assert!(matches!(
            parse(&frame),
            Err(ParseError::InvalidField { field: "direction", .. })
        ));
    }

    #[test]
    fn test_status_byte_order() {
        assert_eq!(parse_status("0102a0FF"), Ok(StatusBytes([0x01, 0x02, 0xA0, 0xFF])));
    }

    #[test]
    fn test_from_str() {
        let pos: DecodedPosition = FRAME.parse().unwrap();
        assert_eq!(pos.device_id, 1234567890);
        assert!("garbage".parse::<DecodedPosition>().is_err());
    }
}
