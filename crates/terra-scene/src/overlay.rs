//! Read-only summary of the planet being shown.

use std::fmt;

use terra_planets::PlanetRecord;

pub const INTERACTION_HINT: &str = "Drag to rotate • Scroll to zoom";

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRow {
    pub label: &'static str,
    pub value: String,
}

/// Planet name, its key statistics, and an interaction hint.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPanel {
    pub title: String,
    pub rows: Vec<OverlayRow>,
    pub hint: &'static str,
}

impl OverlayPanel {
    pub fn from_record(record: &PlanetRecord) -> Self {
        let mut rows = vec![
            row("Mass", record.mass, "M⊕"),
            row("Radius", record.radius, "R⊕"),
            row("Period", record.period, "days"),
            row("Temperature", record.temperature, "K"),
        ];
        // A zero star mass is as good as unknown.
        if let Some(mass) = record.host_star_mass
            && mass != 0.0
        {
            rows.push(row("Star Mass", Some(mass), "M☉"));
        }

        Self {
            title: record.name.clone(),
            rows,
            hint: INTERACTION_HINT,
        }
    }

    /// Single-line form for a window title.
    pub fn summary_line(&self) -> String {
        let mut line = self.title.clone();
        for r in &self.rows {
            line.push_str(" | ");
            line.push_str(r.label);
            line.push_str(": ");
            line.push_str(&r.value);
        }
        line
    }
}

fn row(label: &'static str, value: Option<f64>, unit: &str) -> OverlayRow {
    let value = match value {
        Some(v) => format!("{v} {unit}"),
        None => "unknown".to_string(),
    };
    OverlayRow { label, value }
}

impl fmt::Display for OverlayPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for r in &self.rows {
            writeln!(f, "  {:<12} {}", format!("{}:", r.label), r.value)?;
        }
        write!(f, "  {}", self.hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earth_panel() {
        let panel = OverlayPanel::from_record(&PlanetRecord::earth());
        assert_eq!(panel.title, "Earth");
        let labels: Vec<&str> = panel.rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Mass", "Radius", "Period", "Temperature", "Star Mass"]);
        assert_eq!(panel.rows[0].value, "0.00315 M⊕");
        assert_eq!(panel.rows[1].value, "0.0892 R⊕");
        assert_eq!(panel.rows[2].value, "365.2 days");
        assert_eq!(panel.rows[3].value, "288 K");
        assert_eq!(panel.rows[4].value, "1 M☉");
        assert_eq!(panel.hint, "Drag to rotate • Scroll to zoom");
    }

    #[test]
    fn test_star_mass_row_omitted_when_absent() {
        let record = PlanetRecord {
            host_star_mass: None,
            ..PlanetRecord::earth()
        };
        let panel = OverlayPanel::from_record(&record);
        assert_eq!(panel.rows.len(), 4);

        let zero = PlanetRecord {
            host_star_mass: Some(0.0),
            ..PlanetRecord::earth()
        };
        assert_eq!(OverlayPanel::from_record(&zero).rows.len(), 4);
    }

    #[test]
    fn test_missing_values_marked_unknown() {
        let panel = OverlayPanel::from_record(&PlanetRecord::named("Kepler-22b"));
        assert!(panel.rows.iter().all(|r| r.value == "unknown"));
    }

    #[test]
    fn test_summary_line() {
        let panel = OverlayPanel::from_record(&PlanetRecord::earth());
        let line = panel.summary_line();
        assert!(line.starts_with("Earth | Mass: 0.00315 M⊕ | Radius: 0.0892 R⊕"));
        assert!(line.ends_with("Star Mass: 1 M☉"));
    }

    #[test]
    fn test_display_includes_hint() {
        let text = OverlayPanel::from_record(&PlanetRecord::earth()).to_string();
        assert!(text.starts_with("Earth\n"));
        assert!(text.contains("Temperature: 288 K"));
        assert!(text.ends_with(INTERACTION_HINT));
    }
}
