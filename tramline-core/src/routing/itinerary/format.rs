use super::{RouteResult, SegmentKind};
use crate::{Miles, Minutes};

const FEET_PER_MILE: f64 = 5280.0;

/// `"<1 min"`, `"12 min"` or `"1 h 5 min"`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(minutes: Minutes) -> String {
    if !minutes.is_finite() || minutes < 1.0 {
        return "<1 min".to_string();
    }
    let rounded = minutes.round() as u64;
    match (rounded / 60, rounded % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

/// Feet below a tenth of a mile, miles with one decimal above
pub fn format_distance(miles: Miles) -> String {
    if miles < 0.1 {
        format!("{:.0} ft", (miles * FEET_PER_MILE).max(0.0))
    } else {
        format!("{miles:.1} mi")
    }
}

impl RouteResult {
    /// One-line description such as `"39 min, 10.2 mi via A, B (1 transfer)"`
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}, {}",
            format_duration(self.total_time_minutes),
            format_distance(self.total_distance_miles)
        );
        if self.lines_used.is_empty() {
            summary.push_str(" on foot");
        } else {
            summary.push_str(" via ");
            summary.push_str(&self.lines_used.join(", "));
        }
        match self.transfers {
            0 => {}
            1 => summary.push_str(" (1 transfer)"),
            n => summary.push_str(&format!(" ({n} transfers)")),
        }
        summary
    }

    /// Human readable instruction per consolidated segment, walks included
    pub fn segment_descriptions(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|segment| {
                let from = stop_label(segment.from_name.as_deref(), segment.from);
                let to = stop_label(segment.to_name.as_deref(), segment.to);
                let span = format!(
                    "{}, {}",
                    format_duration(segment.time_minutes),
                    format_distance(segment.distance_miles)
                );
                match &segment.kind {
                    SegmentKind::Ride { line_name, .. } => {
                        let stops = segment.hops;
                        let plural = if stops == 1 { "stop" } else { "stops" };
                        format!("Take {line_name} from {from} to {to}, {stops} {plural} ({span})")
                    }
                    SegmentKind::Walk => format!("Walk from {from} to {to} ({span})"),
                }
            })
            .collect()
    }
}

fn stop_label(name: Option<&str>, id: usize) -> String {
    name.map_or_else(|| format!("stop {id}"), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.2), "<1 min");
        assert_eq!(format_duration(12.4), "12 min");
        assert_eq!(format_duration(59.6), "1 h");
        assert_eq!(format_duration(65.0), "1 h 5 min");
        assert_eq!(format_duration(f64::NAN), "<1 min");
    }

    #[test]
    fn distances() {
        assert_eq!(format_distance(0.05), "264 ft");
        assert_eq!(format_distance(0.0), "0 ft");
        assert_eq!(format_distance(10.24), "10.2 mi");
    }
}
