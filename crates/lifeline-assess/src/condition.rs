use std::fmt;

/// A threshold predicate over a single reading.
///
/// Conditions are plain data so rule tables can be declared as `static` arrays and rendered
/// back to text when explaining which rule fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// `value < limit`
    Below(f64),
    /// `value > limit`
    Above(f64),
    /// `value >= limit`
    AtLeast(f64),
    /// `value <= limit`
    AtMost(f64),
    /// Every inner condition holds.
    All(&'static [Condition]),
    /// At least one inner condition holds.
    Any(&'static [Condition]),
}

impl Condition {
    #[must_use]
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Self::Below(limit) => value < limit,
            Self::Above(limit) => value > limit,
            Self::AtLeast(limit) => value >= limit,
            Self::AtMost(limit) => value <= limit,
            Self::All(inner) => inner.iter().all(|c| c.matches(value)),
            Self::Any(inner) => inner.iter().any(|c| c.matches(value)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Below(limit) => write!(f, "< {limit}"),
            Self::Above(limit) => write!(f, "> {limit}"),
            Self::AtLeast(limit) => write!(f, ">= {limit}"),
            Self::AtMost(limit) => write!(f, "<= {limit}"),
            Self::All(inner) => write_joined(f, inner, " and "),
            Self::Any(inner) => write_joined(f, inner, " or "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, inner: &[Condition], sep: &str) -> fmt::Result {
    for (i, c) in inner.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match c {
            Condition::All(_) | Condition::Any(_) => write!(f, "({c})")?,
            _ => write!(f, "{c}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW_BAND: Condition = Condition::All(&[Condition::AtLeast(18.0), Condition::Below(19.5)]);

    #[test]
    fn test_bounds_are_strict_where_named() {
        assert!(Condition::Below(18.0).matches(17.9));
        assert!(!Condition::Below(18.0).matches(18.0));
        assert!(Condition::AtLeast(18.0).matches(18.0));
        assert!(!Condition::Above(25.0).matches(25.0));
        assert!(Condition::AtMost(25.0).matches(25.0));
    }

    #[test]
    fn test_combinators() {
        assert!(LOW_BAND.matches(18.0));
        assert!(!LOW_BAND.matches(19.5));
        let either = Condition::Any(&[Condition::Below(18.0), Condition::Above(25.0)]);
        assert!(either.matches(10.0));
        assert!(either.matches(26.0));
        assert!(!either.matches(21.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(LOW_BAND.to_string(), ">= 18 and < 19.5");
        let nested = Condition::Any(&[LOW_BAND, Condition::Above(25.0)]);
        assert_eq!(nested.to_string(), "(>= 18 and < 19.5) or > 25");
    }
}
