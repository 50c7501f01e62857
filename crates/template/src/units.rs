use crate::error::TemplateError;

/// Length units accepted in template files. Internal lengths are points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Point,
    Inch,
    Mm,
    Cm,
    Pica,
}

impl Units {
    pub const ALL: [Units; 5] = [Units::Point, Units::Inch, Units::Mm, Units::Cm, Units::Pica];

    pub fn id(self) -> &'static str {
        match self {
            Units::Point => "pt",
            Units::Inch => "in",
            Units::Mm => "mm",
            Units::Cm => "cm",
            Units::Pica => "pc",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|units| units.id() == id)
    }

    pub fn points_per_unit(self) -> f64 {
        match self {
            Units::Point => 1.0,
            Units::Inch => 72.0,
            Units::Mm => 72.0 / 25.4,
            Units::Cm => 720.0 / 25.4,
            Units::Pica => 12.0,
        }
    }

    pub fn to_points(self, value: f64) -> f64 {
        value * self.points_per_unit()
    }

    pub fn from_points(self, points: f64) -> f64 {
        points / self.points_per_unit()
    }
}

/// Parses a length such as `"2.625in"`, `"12 mm"` or `"72"` into points.
/// A bare number is taken as points.
pub fn parse_length(value: &str) -> Result<f64, TemplateError> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|ch: char| ch.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    let number: f64 = number
        .trim()
        .parse()
        .map_err(|_| TemplateError::InvalidLength(value.to_string()))?;
    let suffix = suffix.trim();
    if suffix.is_empty() {
        return Ok(number);
    }
    let units = Units::from_id(suffix).ok_or_else(|| TemplateError::InvalidLength(value.to_string()))?;
    Ok(units.to_points(number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn parses_every_unit() {
        assert!(close(parse_length("1in").unwrap(), 72.0));
        assert!(close(parse_length("25.4mm").unwrap(), 72.0));
        assert!(close(parse_length("2.54 cm").unwrap(), 72.0));
        assert!(close(parse_length("1pc").unwrap(), 12.0));
        assert!(close(parse_length("9pt").unwrap(), 9.0));
        assert!(close(parse_length(" 36 ").unwrap(), 36.0));
    }

    #[test]
    fn rejects_unknown_suffix_and_garbage() {
        assert!(matches!(
            parse_length("3furlongs"),
            Err(TemplateError::InvalidLength(_))
        ));
        assert!(parse_length("in").is_err());
    }

    #[test]
    fn points_convert_back_to_units() {
        assert!(close(Units::Mm.from_points(Units::Mm.to_points(12.5)), 12.5));
    }
}
