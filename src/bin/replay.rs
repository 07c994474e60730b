// Magic Wand — CSV Replay
//
// Feeds a recorded accelerometer stream through the gesture pipeline on the
// host and prints every decision.
//
//   replay [--threshold <f32>] [--refractory <ticks>] [--gravity] [--all]
//          [--expect <label>] [--draw] <file.csv>
//
// Rows are `x,y,z` in milli-g, one per 25 Hz tick.  Rows whose third field is
// `-` separate recordings and are skipped; any other row must have exactly
// three numeric fields.
//
// `--expect` takes a training label (wing, ring, slope, or anything else for
// negatives) and reports how many detections matched it.  `--draw` renders
// each detected gesture's glyph as text.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use magic_wand::assembler::Normalization;
use magic_wand::classifier::HeuristicClassifier;
use magic_wand::config::{DeciderConfig, PipelineConfig, FIRMWARE_CONFIDENCE_THRESHOLD, TARGET_HZ};
use magic_wand::events::{GestureClass, Sample};
use magic_wand::output::{DisplaySink, GestureSink};
use magic_wand::pipeline::PipelineController;

const USAGE: &str = "Usage: replay [--threshold <f32>] [--refractory <ticks>] [--gravity] [--all] \
                     [--expect <label>] [--draw] <file.csv>";

struct ReplayOptions {
    csv_path: PathBuf,
    threshold: f32,
    refractory: u32,
    gravity: bool,
    print_all: bool,
    expect: Option<GestureClass>,
    draw: bool,
}

fn parse_args() -> Result<ReplayOptions> {
    let mut threshold = FIRMWARE_CONFIDENCE_THRESHOLD;
    let mut refractory = TARGET_HZ;
    let mut gravity = false;
    let mut print_all = false;
    let mut expect = None;
    let mut draw = false;
    let mut csv_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--threshold" => {
                let v = args.next().ok_or_else(|| anyhow!("--threshold needs a value"))?;
                threshold = v.parse().with_context(|| format!("invalid threshold {:?}", v))?;
            }
            "--refractory" => {
                let v = args.next().ok_or_else(|| anyhow!("--refractory needs a value"))?;
                refractory = v.parse().with_context(|| format!("invalid refractory {:?}", v))?;
            }
            "--expect" => {
                let v = args.next().ok_or_else(|| anyhow!("--expect needs a label"))?;
                expect = Some(GestureClass::from_label(&v));
            }
            "--gravity" => gravity = true,
            "--all" => print_all = true,
            "--draw" => draw = true,
            _ => {
                if csv_path.is_some() {
                    bail!(USAGE);
                }
                csv_path = Some(PathBuf::from(arg));
            }
        }
    }

    let csv_path = csv_path.ok_or_else(|| anyhow!(USAGE))?;
    Ok(ReplayOptions {
        csv_path,
        threshold,
        refractory,
        gravity,
        print_all,
        expect,
        draw,
    })
}

fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let file = std::fs::File::open(path).with_context(|| format!("cannot open {:?}", path))?;
    read_samples(file).with_context(|| format!("while reading {:?}", path))
}

fn read_samples<R: io::Read>(input: R) -> Result<Vec<Sample>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut samples = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.with_context(|| format!("invalid row {}", row))?;
        if let Some(sample) = parse_row(row, &record)? {
            samples.push(sample);
        }
    }
    Ok(samples)
}

/// `None` for a recording separator, otherwise the row's sample.
fn parse_row(row: usize, record: &StringRecord) -> Result<Option<Sample>> {
    if record.len() != 3 {
        bail!("row {}: expected 3 fields (x,y,z), found {}", row, record.len());
    }
    if &record[2] == "-" {
        return Ok(None);
    }
    let axis = |i: usize| -> Result<f32> {
        record[i]
            .parse()
            .with_context(|| format!("row {}: invalid value {:?}", row, &record[i]))
    };
    Ok(Some(Sample::new(axis(0)?, axis(1)?, axis(2)?)))
}

// ---------------------------------------------------------------------------
// Text canvas — a monochrome draw target printed with `#`
// ---------------------------------------------------------------------------
const CANVAS_WIDTH: usize = 44;
const CANVAS_HEIGHT: usize = 14;

struct TextCanvas {
    pixels: [[bool; CANVAS_WIDTH]; CANVAS_HEIGHT],
}

impl TextCanvas {
    fn new() -> Self {
        Self {
            pixels: [[false; CANVAS_WIDTH]; CANVAS_HEIGHT],
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.pixels {
            let line: String = row.iter().map(|&on| if on { '#' } else { ' ' }).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl OriginDimensions for TextCanvas {
    fn size(&self) -> Size {
        Size::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32)
    }
}

impl DrawTarget for TextCanvas {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if x < CANVAS_WIDTH && y < CANVAS_HEIGHT {
                self.pixels[y][x] = color.is_on();
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let opts = parse_args()?;

    let decider = DeciderConfig::new(opts.threshold, opts.refractory)?;
    let normalization = if opts.gravity {
        Normalization::GravityRemoval
    } else {
        Normalization::None
    };
    let config = PipelineConfig::new(decider).with_normalization(normalization);

    let samples = load_samples(&opts.csv_path)?;
    println!(
        "Replaying {} samples ({:.1} s) from {:?}",
        samples.len(),
        samples.len() as f32 / TARGET_HZ as f32,
        opts.csv_path
    );

    let mut pipeline = PipelineController::new(config, HeuristicClassifier);
    let mut display = opts.draw.then(|| DisplaySink::new(TextCanvas::new()));
    let mut gestures = 0usize;
    let mut matching = 0usize;
    for sample in samples {
        let Some(event) = pipeline.tick(sample) else {
            continue;
        };
        match event.gesture {
            Some(class) => {
                gestures += 1;
                if opts.expect == Some(class) {
                    matching += 1;
                }
                println!(
                    "tick {:>6}  {:<5} {:>5.1}%",
                    event.tick,
                    class.label(),
                    event.confidence * 100.0
                );
                if let Some(display) = display.as_mut() {
                    display.emit(&event)?;
                    print!("{}", display.target().render());
                }
            }
            None if opts.print_all => println!("tick {:>6}  none", event.tick),
            None => {}
        }
    }

    if !pipeline.buffer().is_full() {
        println!(
            "Only {} samples — a full window needs {}",
            pipeline.buffer().pushed(),
            magic_wand::config::INPUT_SAMPLE_COUNT
        );
        return Ok(());
    }

    println!("{} gesture(s) over {} ticks", gestures, pipeline.tick_index());
    match opts.expect {
        Some(GestureClass::NoGesture) => {
            println!("Expected no gestures: {} false positive(s)", gestures);
        }
        Some(class) => println!(
            "Expected {}: {} matching, {} other",
            class.label(),
            matching,
            gestures - matching
        ),
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_and_skips_separators() {
        let data = "1,2,3\n-,-,-\n 4 , 5 , -6.5 \n";
        let samples = read_samples(data.as_bytes()).unwrap();
        assert_eq!(samples, vec![Sample::new(1.0, 2.0, 3.0), Sample::new(4.0, 5.0, -6.5)]);
    }

    #[test]
    fn test_short_row_is_an_error_with_its_number() {
        let data = "1,2,3\n-,-,-\n4,5\n7,8,9\n";
        let err = read_samples(data.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 3"), "{:#}", err);
    }

    #[test]
    fn test_long_row_is_an_error() {
        let err = read_samples("1,2,3,4\n".as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 1"), "{:#}", err);
    }

    #[test]
    fn test_non_numeric_value_is_an_error() {
        let err = read_samples("1,2,3\n1,x,3\n".as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 2"), "{:#}", err);
    }

    #[test]
    fn test_text_canvas_shows_glyph() {
        let mut sink = DisplaySink::new(TextCanvas::new());
        sink.draw_glyph(GestureClass::Ring).unwrap();
        let text = sink.target().render();
        assert_eq!(text.lines().count(), CANVAS_HEIGHT);
        assert!(text.contains('#'));

        sink.draw_glyph(GestureClass::NoGesture).unwrap();
        assert!(!sink.target().render().contains('#'));
    }

    #[test]
    fn test_canvas_ignores_out_of_bounds_pixels() {
        let mut canvas = TextCanvas::new();
        canvas
            .draw_iter([
                Pixel(Point::new(-1, 0), BinaryColor::On),
                Pixel(Point::new(CANVAS_WIDTH as i32, 0), BinaryColor::On),
                Pixel(Point::new(0, 0), BinaryColor::On),
            ])
            .unwrap();
        assert!(canvas.pixels[0][0]);
        assert_eq!(canvas.pixels.iter().flatten().filter(|&&on| on).count(), 1);
    }
}
