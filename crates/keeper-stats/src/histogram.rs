/// A fixed-resolution two-dimensional histogram.
///
/// Each axis is divided into evenly spaced bins between its minimum and
/// maximum. Bins are half-open (`[start, end)`) except the last bin on each
/// axis, which also includes its right edge, so an observation sitting on the
/// axis maximum is still counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    /// Observation counts indexed as `counts[x_bin][y_bin]`.
    pub counts: Vec<Vec<u64>>,
    /// Bin boundaries along the x axis (`bins_x + 1` ascending values).
    pub x_edges: Vec<f64>,
    /// Bin boundaries along the y axis (`bins_y + 1` ascending values).
    pub y_edges: Vec<f64>,
    /// Observations that fell outside an explicitly requested range.
    ///
    /// Always zero when the range is derived from the data.
    pub outside: u64,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum HistogramError {
    #[display("histogram needs at least one bin per axis (got {bins_x}x{bins_y})")]
    ZeroBins { bins_x: usize, bins_y: usize },
    #[display("invalid histogram range {min}..={max}")]
    InvalidRange { min: f64, max: f64 },
}

impl Histogram2d {
    /// Bins `(x, y)` observations into a `bins_x × bins_y` grid.
    ///
    /// # Arguments
    ///
    /// * `points` - The observations. Pairs with a NaN coordinate are skipped.
    /// * `bins_x` - Number of bins along the x axis.
    /// * `bins_y` - Number of bins along the y axis.
    /// * `x_range` - If provided, overrides the observed x range.
    /// * `y_range` - If provided, overrides the observed y range.
    ///
    /// When a range is derived from the data and every observation shares one
    /// value, the range is widened to `value ± 0.5`. Without any observations
    /// the derived range is `0.0..=1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use keeper_stats::histogram::Histogram2d;
    /// let points = [(0.0, 0.0), (0.5, 1.0), (1.0, 1.0)];
    /// let hist = Histogram2d::new(points, 2, 2, None, None).unwrap();
    /// assert_eq!(hist.x_edges, vec![0.0, 0.5, 1.0]);
    /// assert_eq!(hist.counts, vec![vec![1, 0], vec![0, 2]]);
    /// assert_eq!(hist.total(), 3);
    /// ```
    pub fn new<I>(
        points: I,
        bins_x: usize,
        bins_y: usize,
        x_range: Option<(f64, f64)>,
        y_range: Option<(f64, f64)>,
    ) -> Result<Self, HistogramError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        if bins_x == 0 || bins_y == 0 {
            return Err(HistogramError::ZeroBins { bins_x, bins_y });
        }
        let points = points
            .into_iter()
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .collect::<Vec<_>>();

        let (x_min, x_max) = resolve_range(x_range, points.iter().map(|p| p.0))?;
        let (y_min, y_max) = resolve_range(y_range, points.iter().map(|p| p.1))?;
        let x_edges = linspace(x_min, x_max, bins_x + 1);
        let y_edges = linspace(y_min, y_max, bins_y + 1);

        let mut counts = vec![vec![0; bins_y]; bins_x];
        let mut outside = 0;
        for (x, y) in points {
            match (bin_index(&x_edges, x), bin_index(&y_edges, y)) {
                (Some(ix), Some(iy)) => counts[ix][iy] += 1,
                _ => outside += 1,
            }
        }

        Ok(Self {
            counts,
            x_edges,
            y_edges,
            outside,
        })
    }

    /// Sum of all bin counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// The most populated cell as `(x_bin, y_bin, count)`.
    ///
    /// Ties resolve to the first cell in x-major order. Returns `None` when
    /// every cell is empty.
    #[must_use]
    pub fn peak(&self) -> Option<(usize, usize, u64)> {
        let mut best: Option<(usize, usize, u64)> = None;
        for (ix, column) in self.counts.iter().enumerate() {
            for (iy, &count) in column.iter().enumerate() {
                if count > 0 && best.is_none_or(|(_, _, c)| count > c) {
                    best = Some((ix, iy, count));
                }
            }
        }
        best
    }
}

fn resolve_range<I>(explicit: Option<(f64, f64)>, values: I) -> Result<(f64, f64), HistogramError>
where
    I: Iterator<Item = f64>,
{
    if let Some((min, max)) = explicit {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(HistogramError::InvalidRange { min, max });
        }
        return Ok((min, max));
    }

    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        // no observations
        return Ok((0.0, 1.0));
    }
    if !min.is_finite() || !max.is_finite() {
        return Err(HistogramError::InvalidRange { min, max });
    }
    if min == max {
        return Ok((min - 0.5, max + 0.5));
    }
    Ok((min, max))
}

/// `count` evenly spaced values from `start` to `end`, both inclusive.
///
/// ```
/// # use keeper_stats::histogram::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    // Pin the last value so rounding never moves the upper bound
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let bins = edges.len() - 1;
    let (first, last) = (edges[0], edges[bins]);
    if value < first || value > last {
        return None;
    }
    if value == last {
        return Some(bins - 1);
    }
    let mut idx = (((value - first) / (last - first)) * bins as f64).floor() as usize;
    idx = idx.min(bins - 1);
    // The estimate can be off by one near an edge; settle it against the edges
    while idx > 0 && value < edges[idx] {
        idx -= 1;
    }
    while idx + 1 < bins && value >= edges[idx + 1] {
        idx += 1;
    }
    Some(idx)
}
