/// Confidence bar for the result card
/// Draws the prediction confidence as a filled horizontal gauge
use iced::widget::canvas;
use iced::{Color, Point, Rectangle, Size};

use crate::Message;

const TRACK_COLOR: Color = Color::from_rgb(0.86, 0.90, 0.86);
const HIGH_COLOR: Color = Color::from_rgb(0.13, 0.55, 0.25);
const MEDIUM_COLOR: Color = Color::from_rgb(0.85, 0.62, 0.12);
const LOW_COLOR: Color = Color::from_rgb(0.80, 0.25, 0.20);

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceBar {
    /// Confidence in percent
    pub confidence: f64,
}

impl ConfidenceBar {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }

    /// Fraction of the bar to fill, clamped to [0, 1]
    pub fn fill_ratio(&self) -> f32 {
        if !self.confidence.is_finite() {
            return 0.0;
        }
        (self.confidence / 100.0).clamp(0.0, 1.0) as f32
    }

    fn fill_color(&self) -> Color {
        match self.confidence {
            c if c >= 75.0 => HIGH_COLOR,
            c if c >= 50.0 => MEDIUM_COLOR,
            _ => LOW_COLOR,
        }
    }
}

impl canvas::Program<Message> for ConfidenceBar {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), TRACK_COLOR);

        let filled_width = bounds.width * self.fill_ratio();
        if filled_width > 0.0 {
            frame.fill_rectangle(
                Point::ORIGIN,
                Size::new(filled_width, bounds.height),
                self.fill_color(),
            );
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_ratio_is_clamped() {
        assert_eq!(ConfidenceBar::new(50.0).fill_ratio(), 0.5);
        assert_eq!(ConfidenceBar::new(140.0).fill_ratio(), 1.0);
        assert_eq!(ConfidenceBar::new(-5.0).fill_ratio(), 0.0);
        assert_eq!(ConfidenceBar::new(f64::NAN).fill_ratio(), 0.0);
    }
}
