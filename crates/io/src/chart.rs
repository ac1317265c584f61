//! SVG chart of a completed run using the `plotters` crate
//!
//! Training curves are drawn as lines, raw test points as red circles and
//! mapped test points as green squares.

use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;

use idealfit_engine::MatchResult;

use crate::csv::NumericCsv;
use crate::error::IoError;

/// One named line.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Everything drawn on the chart.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub title: String,
    pub training: Vec<Series>,
    pub test: Vec<(f64, f64)>,
    pub mapped: Vec<(f64, f64)>,
}

impl ChartData {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// One line per value column of the training table. Undefined cells
    /// break nothing; they are simply skipped.
    pub fn with_training(mut self, train: &NumericCsv) -> Self {
        self.training = train
            .value_columns()
            .iter()
            .enumerate()
            .map(|(j, name)| Series {
                name: name.clone(),
                points: train
                    .rows
                    .iter()
                    .filter_map(|row| Some((row.first().copied()??, row.get(j + 1).copied()??)))
                    .collect(),
            })
            .collect();
        self
    }

    pub fn with_test(mut self, test: &NumericCsv) -> Self {
        self.test = test
            .rows
            .iter()
            .filter_map(|row| Some((row.first().copied()??, row.get(1).copied()??)))
            .collect();
        self
    }

    pub fn with_results(mut self, results: &[MatchResult]) -> Self {
        self.mapped = results.iter().map(|r| (r.x, r.y)).collect();
        self
    }

    /// Axis ranges covering every drawn point, padded by 5%.
    pub fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let all = self
            .training
            .iter()
            .flat_map(|s| s.points.iter())
            .chain(&self.test)
            .chain(&self.mapped);

        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        for &(px, py) in all {
            x = (x.0.min(px), x.1.max(px));
            y = (y.0.min(py), y.1.max(py));
        }
        (padded(x), padded(y))
    }
}

fn padded((lo, hi): (f64, f64)) -> Range<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

fn chart_err<E: std::fmt::Display>(e: E) -> IoError {
    IoError::Chart(e.to_string())
}

/// Render `data` as an SVG file of the given pixel size.
pub fn render_svg(data: &ChartData, path: &Path, size: (u32, u32)) -> Result<(), IoError> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let (x_range, y_range) = data.bounds();
    let mut chart = ChartBuilder::on(&root)
        .caption(&data.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc("y")
        .draw()
        .map_err(chart_err)?;

    for (i, series) in data.training.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(series.points.iter().copied(), color.stroke_width(2)))
            .map_err(chart_err)?
            .label(format!("train {}", series.name))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    let test_style = RED.mix(0.5).filled();
    chart
        .draw_series(data.test.iter().map(|&p| Circle::new(p, 4, test_style)))
        .map_err(chart_err)?
        .label("test data")
        .legend(move |(x, y)| Circle::new((x + 10, y), 4, test_style));

    let mapped_style = GREEN.mix(0.5).filled();
    chart
        .draw_series(
            data.mapped
                .iter()
                .map(|&p| EmptyElement::at(p) + Rectangle::new([(-4, -4), (4, 4)], mapped_style)),
        )
        .map_err(chart_err)?
        .label("mapped")
        .legend(move |(x, y)| Rectangle::new([(x + 6, y - 4), (x + 14, y + 4)], mapped_style));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    log::info!("chart written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_numeric;
    use tempfile::tempdir;

    #[test]
    fn bounds_cover_all_points() {
        let data = ChartData {
            title: "t".into(),
            training: vec![Series { name: "y1".into(), points: vec![(0.0, 0.0), (10.0, 5.0)] }],
            test: vec![(-10.0, 1.0)],
            mapped: vec![(2.0, 20.0)],
        };
        let (x, y) = data.bounds();
        assert!(x.start < -10.0 && x.end > 10.0);
        assert!(y.start < 0.0 && y.end > 20.0);
    }

    #[test]
    fn empty_chart_has_unit_bounds() {
        let (x, y) = ChartData::new("empty").bounds();
        assert_eq!(x, 0.0..1.0);
        assert_eq!(y, 0.0..1.0);
    }

    #[test]
    fn training_columns_become_series() {
        let train = parse_numeric("x,y1,y2\n1,2,\n2,3,4\n", b',', "train.csv").unwrap();
        let data = ChartData::new("run").with_training(&train);
        assert_eq!(data.training.len(), 2);
        assert_eq!(data.training[0].points, vec![(1.0, 2.0), (2.0, 3.0)]);
        assert_eq!(data.training[1].points, vec![(2.0, 4.0)]);
    }

    #[test]
    fn renders_svg_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.svg");

        let train = parse_numeric("x,y1\n0,0\n1,1\n2,4\n", b',', "train.csv").unwrap();
        let test = parse_numeric("x,y\n1,1.1\n5,2\n", b',', "test.csv").unwrap();
        let results = vec![MatchResult {
            x: 1.0,
            y: 1.1,
            chosen_function: "y1".into(),
            deviation: 0.1,
        }];
        let data = ChartData::new("Ideal function mapping")
            .with_training(&train)
            .with_test(&test)
            .with_results(&results);

        render_svg(&data, &path, (640, 480)).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
    }
}
