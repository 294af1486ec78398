use foundation::latlng::LatLng;

use crate::config::CoordinatePolicy;
use crate::error::TrackerError;

/// Raw data read from one stop list item before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopItem {
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Element text content, used verbatim as the popup label.
    pub text: String,
}

impl StopItem {
    pub fn new(lat: impl Into<String>, lng: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lat: Some(lat.into()),
            lng: Some(lng.into()),
            text: text.into(),
        }
    }
}

/// A labeled geographic point sourced from markup. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct BusStop {
    position: LatLng,
    label: String,
    source_index: usize,
}

impl BusStop {
    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Index of the originating item in document order.
    pub fn source_index(&self) -> usize {
        self.source_index
    }
}

/// Result of reading the stop list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopReadout {
    pub stops: Vec<BusStop>,
    /// Items with a non-finite coordinate. Under `PassThrough` they are also in
    /// `stops`; under `Skip` they are not.
    pub invalid: Vec<TrackerError>,
}

/// Parses a number the way a browser's `parseFloat` does.
///
/// Leading whitespace is skipped and the longest decimal prefix is taken, so
/// `"28.70abc"` is `28.7`. `Infinity` (optionally signed) is accepted.
/// Anything else, including a missing attribute, yields NaN.
pub fn parse_float(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return f64::NAN;
    };
    let s = raw.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Reads every stop item in document order, applying `policy` to items whose
/// coordinate is not finite.
pub fn read_stops(items: &[StopItem], policy: CoordinatePolicy) -> Result<StopReadout, TrackerError> {
    let mut out = StopReadout::default();

    for (index, item) in items.iter().enumerate() {
        let lat = parse_float(item.lat.as_deref());
        let lng = parse_float(item.lng.as_deref());

        let problem = if !lat.is_finite() {
            Some(TrackerError::InvalidCoordinate {
                index,
                field: "lat",
                raw: item.lat.clone(),
            })
        } else if !lng.is_finite() {
            Some(TrackerError::InvalidCoordinate {
                index,
                field: "lng",
                raw: item.lng.clone(),
            })
        } else {
            None
        };

        if let Some(err) = problem {
            match policy {
                CoordinatePolicy::Reject => return Err(err),
                CoordinatePolicy::Skip => {
                    out.invalid.push(err);
                    continue;
                }
                CoordinatePolicy::PassThrough => out.invalid.push(err),
            }
        }

        out.stops.push(BusStop {
            position: LatLng::new(lat, lng),
            label: item.text.clone(),
            source_index: index,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{StopItem, parse_float, read_stops};
    use crate::config::CoordinatePolicy;
    use crate::error::TrackerError;
    use foundation::latlng::LatLng;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_float_plain_numbers() {
        assert_eq!(parse_float(Some("28.70")), 28.7);
        assert_eq!(parse_float(Some("-77.1025")), -77.1025);
        assert_eq!(parse_float(Some("+5")), 5.0);
        assert_eq!(parse_float(Some(".5")), 0.5);
        assert_eq!(parse_float(Some("5.")), 5.0);
        assert_eq!(parse_float(Some("1e3")), 1000.0);
    }

    #[test]
    fn parse_float_takes_the_longest_prefix() {
        assert_eq!(parse_float(Some("  28.70abc")), 28.7);
        assert_eq!(parse_float(Some("12.5.6")), 12.5);
        assert_eq!(parse_float(Some("3e")), 3.0);
        assert_eq!(parse_float(Some("3e+")), 3.0);
        assert_eq!(parse_float(Some("\n\t7")), 7.0);
    }

    #[test]
    fn parse_float_infinity_and_garbage() {
        assert_eq!(parse_float(Some("Infinity")), f64::INFINITY);
        assert_eq!(parse_float(Some("-Infinityx")), f64::NEG_INFINITY);
        assert!(parse_float(Some("north")).is_nan());
        assert!(parse_float(Some("")).is_nan());
        assert!(parse_float(Some(".")).is_nan());
        assert!(parse_float(Some("-")).is_nan());
        assert!(parse_float(None).is_nan());
    }

    #[test]
    fn reads_stops_in_document_order() {
        let items = vec![
            StopItem::new("28.70", "77.10", "Route 5"),
            StopItem::new("28.61", "77.20", "Route 9"),
        ];
        let out = read_stops(&items, CoordinatePolicy::PassThrough).unwrap();
        assert_eq!(out.stops.len(), 2);
        assert_eq!(out.stops[0].position(), LatLng::new(28.70, 77.10));
        assert_eq!(out.stops[0].label(), "Route 5");
        assert_eq!(out.stops[1].source_index(), 1);
        assert!(out.invalid.is_empty());
    }

    #[test]
    fn label_is_text_content_verbatim() {
        let items = vec![StopItem::new("1", "2", "  Route 5 \n")];
        let out = read_stops(&items, CoordinatePolicy::PassThrough).unwrap();
        assert_eq!(out.stops[0].label(), "  Route 5 \n");
    }

    #[test]
    fn pass_through_keeps_invalid_stops() {
        let items = vec![
            StopItem::new("abc", "77.10", "Broken"),
            StopItem::new("28.70", "77.10", "Fine"),
        ];
        let out = read_stops(&items, CoordinatePolicy::PassThrough).unwrap();
        assert_eq!(out.stops.len(), 2);
        assert!(out.stops[0].position().lat.is_nan());
        assert_eq!(out.invalid.len(), 1);
    }

    #[test]
    fn skip_drops_invalid_stops() {
        let items = vec![
            StopItem {
                lat: Some("28.7".to_string()),
                lng: None,
                text: "No lng".to_string(),
            },
            StopItem::new("28.70", "77.10", "Fine"),
        ];
        let out = read_stops(&items, CoordinatePolicy::Skip).unwrap();
        assert_eq!(out.stops.len(), 1);
        assert_eq!(out.stops[0].label(), "Fine");
        assert_eq!(out.stops[0].source_index(), 1);
        assert_eq!(
            out.invalid,
            vec![TrackerError::InvalidCoordinate {
                index: 0,
                field: "lng",
                raw: None
            }]
        );
    }

    #[test]
    fn reject_fails_on_first_invalid_stop() {
        let items = vec![
            StopItem::new("28.70", "77.10", "Fine"),
            StopItem::new("x", "y", "Broken"),
        ];
        let err = read_stops(&items, CoordinatePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            TrackerError::InvalidCoordinate {
                index: 1,
                field: "lat",
                raw: Some("x".to_string())
            }
        );
    }
}
