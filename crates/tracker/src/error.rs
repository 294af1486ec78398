use foundation::ids::MarkerId;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// A stop item carried a coordinate that does not parse to a finite number.
    InvalidCoordinate {
        index: usize,
        field: &'static str,
        raw: Option<String>,
    },
    UnknownMarker(MarkerId),
    Config(String),
    /// The map collaborator rejected a call.
    Backend(String),
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::InvalidCoordinate { index, field, raw } => match raw {
                Some(raw) => write!(f, "stop #{index}: invalid {field} {raw:?}"),
                None => write!(f, "stop #{index}: missing {field}"),
            },
            TrackerError::UnknownMarker(id) => write!(f, "unknown marker #{}", id.index()),
            TrackerError::Config(msg) => write!(f, "invalid map config: {msg}"),
            TrackerError::Backend(msg) => write!(f, "map backend error: {msg}"),
        }
    }
}

impl std::error::Error for TrackerError {}

#[cfg(test)]
mod tests {
    use super::TrackerError;
    use foundation::ids::MarkerId;

    #[test]
    fn display_messages() {
        let e = TrackerError::InvalidCoordinate {
            index: 2,
            field: "lat",
            raw: Some("north".to_string()),
        };
        assert_eq!(e.to_string(), "stop #2: invalid lat \"north\"");

        let e = TrackerError::InvalidCoordinate {
            index: 0,
            field: "lng",
            raw: None,
        };
        assert_eq!(e.to_string(), "stop #0: missing lng");

        assert_eq!(
            TrackerError::UnknownMarker(MarkerId::new(9)).to_string(),
            "unknown marker #9"
        );
    }
}
