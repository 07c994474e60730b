// Magic Wand — Gesture Output
//
// Sinks receive every real gesture the pipeline emits.  Each gesture has a
// small star glyph: W for wing, O for ring, and L for slope.  `LogSink`
// prints it over the serial log; `DisplaySink` draws it on any monochrome
// embedded-graphics target.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use crate::events::{GestureClass, GestureEvent};

pub trait GestureSink {
    fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()>;
}

impl<S: GestureSink + ?Sized> GestureSink for &mut S {
    fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()> {
        (**self).emit(event)
    }
}

/// Fan one event out to two sinks; both run even if the first fails.
impl<A: GestureSink, B: GestureSink> GestureSink for (A, B) {
    fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()> {
        let first = self.0.emit(event);
        self.1.emit(event)?;
        first
    }
}

// ---------------------------------------------------------------------------
// Glyphs
// ---------------------------------------------------------------------------
const WING_GLYPH: &[&str] = &[
    "*         *         *",
    " *       * *       *",
    "  *     *   *     *",
    "   *   *     *   *",
    "    * *       * *",
    "     *         *",
];

const RING_GLYPH: &[&str] = &[
    "          *",
    "       *     *",
    "     *         *",
    "    *           *",
    "     *         *",
    "       *     *",
    "          *",
];

const SLOPE_GLYPH: &[&str] = &[
    "        *",
    "       *",
    "      *",
    "     *",
    "    *",
    "   *",
    "  *",
    " * * * * * * * *",
];

/// Star art for a gesture. No-gesture has none.
pub fn glyph(class: GestureClass) -> Option<&'static [&'static str]> {
    match class {
        GestureClass::Wing => Some(WING_GLYPH),
        GestureClass::Ring => Some(RING_GLYPH),
        GestureClass::Slope => Some(SLOPE_GLYPH),
        GestureClass::NoGesture => None,
    }
}

fn glyph_size(rows: &[&str]) -> (u32, u32) {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    (cols as u32, rows.len() as u32)
}

// ---------------------------------------------------------------------------
// Serial log sink
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct LogSink;

impl GestureSink for LogSink {
    fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()> {
        let Some(class) = event.gesture else {
            return Ok(());
        };
        log::info!("{}:", class.label().to_ascii_uppercase());
        for line in glyph(class).unwrap_or(&[]) {
            log::info!("{}", line);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Monochrome display sink
// ---------------------------------------------------------------------------
pub struct DisplaySink<D> {
    target: D,
}

impl<D> DisplaySink<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: core::fmt::Debug,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    /// Clear the target and draw the glyph scaled to fit, centred.
    pub fn draw_glyph(&mut self, class: GestureClass) -> Result<(), D::Error> {
        self.target.clear(BinaryColor::Off)?;
        let Some(rows) = glyph(class) else {
            return Ok(());
        };

        let area = self.target.bounding_box();
        let (cols, lines) = glyph_size(rows);
        let cell = (area.size.width / cols).min(area.size.height / lines).max(1);
        let origin = area.top_left
            + Point::new(
                (area.size.width.saturating_sub(cols * cell) / 2) as i32,
                (area.size.height.saturating_sub(lines * cell) / 2) as i32,
            );

        let style = PrimitiveStyle::with_fill(BinaryColor::On);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch != '*' {
                    continue;
                }
                let top_left = origin + Point::new((col as u32 * cell) as i32, (row as u32 * cell) as i32);
                Rectangle::new(top_left, Size::new_equal(cell))
                    .into_styled(style)
                    .draw(&mut self.target)?;
            }
        }
        Ok(())
    }
}

impl<D> GestureSink for DisplaySink<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: core::fmt::Debug,
{
    fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()> {
        // Keep the last glyph on screen between gestures.
        let Some(class) = event.gesture else {
            return Ok(());
        };
        self.draw_glyph(class)
            .map_err(|e| anyhow::anyhow!("display draw failed: {:?}", e))
    }
}
