//! Segment and palette types shared by the capture engine and the decoder.

use morse_traits::Color;

/// What a timed segment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Primary color under the sensor: a dot or a dash.
    Signal,
    /// Secondary color under the sensor: the pause between marks.
    Gap,
    /// Time spent recovering after leaving the track; not part of the message.
    BoundaryArtifact,
}

/// Which kind of mark a segment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    DotBearing,
    SpaceBearing,
    None,
}

/// One interval of the traversal with its measured duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSegment {
    pub category: Category,
    /// Seconds, never negative.
    pub duration_s: f64,
}

impl TimedSegment {
    pub fn signal(duration_s: f64) -> Self {
        Self::new(Category::Signal, duration_s)
    }

    pub fn gap(duration_s: f64) -> Self {
        Self::new(Category::Gap, duration_s)
    }

    pub fn boundary(duration_s: f64) -> Self {
        Self::new(Category::BoundaryArtifact, duration_s)
    }

    /// Negative or NaN durations are clamped to zero.
    pub fn new(category: Category, duration_s: f64) -> Self {
        Self {
            category,
            duration_s: if duration_s > 0.0 { duration_s } else { 0.0 },
        }
    }

    pub fn color_class(&self) -> ColorClass {
        match self.category {
            Category::Signal => ColorClass::DotBearing,
            Category::Gap => ColorClass::SpaceBearing,
            Category::BoundaryArtifact => ColorClass::None,
        }
    }
}

/// Colors that make up the track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Carries dots and dashes.
    pub primary: Color,
    /// Carries the pauses between marks.
    pub secondary: Color,
    /// On the track but without meaning (lead-in, lead-out).
    pub background: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color::Red,
            secondary: Color::White,
            background: vec![Color::Brown],
        }
    }
}

impl Palette {
    pub fn is_signal(&self, color: Color) -> bool {
        color == self.primary || color == self.secondary
    }

    /// True for every color that belongs to the track.
    pub fn contains(&self, color: Color) -> bool {
        self.is_signal(color) || self.background.contains(&color)
    }

    /// Category of a segment timed over `color`, if it carries meaning.
    pub fn category_of(&self, color: Color) -> Option<Category> {
        if color == self.primary {
            Some(Category::Signal)
        } else if color == self.secondary {
            Some(Category::Gap)
        } else {
            None
        }
    }

    /// The colors a recovery maneuver should steer back to.
    pub fn signal_colors(&self) -> Vec<Color> {
        vec![self.primary, self.secondary]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_eq!(TimedSegment::signal(-0.5).duration_s, 0.0);
        assert_eq!(TimedSegment::gap(f64::NAN).duration_s, 0.0);
        assert_eq!(TimedSegment::boundary(0.3).duration_s, 0.3);
    }

    #[test]
    fn palette_membership() {
        let p = Palette::default();
        assert!(p.is_signal(Color::Red));
        assert!(!p.is_signal(Color::Brown));
        assert!(p.contains(Color::Brown));
        assert!(!p.contains(Color::Yellow));
        assert_eq!(p.category_of(Color::White), Some(Category::Gap));
        assert_eq!(p.category_of(Color::Brown), None);
    }
}
