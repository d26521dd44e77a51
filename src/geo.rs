use std::collections::BTreeMap;

/// A point on the projected map plane: `[x, y]`.
pub type PlanePoint = [f64; 2];

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Equirectangular projection centred on a reference latitude, so one unit
/// of x covers about the same ground distance as one unit of y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    cos_lat0: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self { cos_lat0: 1.0 }
    }
}

impl Projection {
    /// Centre on the mean latitude of `(lat, lon)` pairs.
    pub fn for_points<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (sum, n) = coords
            .into_iter()
            .fold((0.0, 0usize), |(s, n), (lat, _)| (s + lat, n + 1));
        if n == 0 {
            return Self::default();
        }
        let lat0 = sum / n as f64;
        Self {
            cos_lat0: lat0.to_radians().cos().max(0.01),
        }
    }

    pub fn project(&self, lat: f64, lon: f64) -> PlanePoint {
        [lon * self.cos_lat0, lat]
    }

    /// Inverse of [`Projection::project`]: returns `(lat, lon)`.
    pub fn unproject(&self, p: PlanePoint) -> (f64, f64) {
        (p[1], p[0] / self.cos_lat0)
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: PlanePoint,
    pub max: PlanePoint,
}

impl Bounds {
    pub fn of(points: &[PlanePoint]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, p| Bounds {
                min: [b.min[0].min(p[0]), b.min[1].min(p[1])],
                max: [b.max[0].max(p[0]), b.max[1].max(p[1])],
            },
        ))
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Grow each side by `margin` (absolute, plane units).
    pub fn expanded(&self, margin: f64) -> Self {
        Bounds {
            min: [self.min[0] - margin, self.min[1] - margin],
            max: [self.max[0] + margin, self.max[1] + margin],
        }
    }
}

// ---------------------------------------------------------------------------
// Grid clustering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Centroid of the members.
    pub center: PlanePoint,
    /// Indices into the input slice.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Bucket points into square cells of side `cell_size`.
///
/// A non-positive or non-finite `cell_size` puts every point in its own
/// cluster. Output order is deterministic (by cell).
pub fn cluster(points: &[PlanePoint], cell_size: f64) -> Vec<Cluster> {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return points
            .iter()
            .enumerate()
            .map(|(i, p)| Cluster {
                center: *p,
                members: vec![i],
            })
            .collect();
    }

    let mut cells: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (i, p) in points.iter().enumerate() {
        let key = (
            (p[0] / cell_size).floor() as i64,
            (p[1] / cell_size).floor() as i64,
        );
        cells.entry(key).or_default().push(i);
    }

    cells
        .into_values()
        .map(|members| {
            let n = members.len() as f64;
            let (sx, sy) = members
                .iter()
                .fold((0.0, 0.0), |(sx, sy), &i| (sx + points[i][0], sy + points[i][1]));
            Cluster {
                center: [sx / n, sy / n],
                members,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Heat density grid
// ---------------------------------------------------------------------------

/// Cells with less intensity than this are not drawn.
const HEAT_EPSILON: f64 = 0.02;

/// Blurred point density on a regular grid, normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeatGrid {
    pub origin: PlanePoint,
    pub cell: f64,
    pub cols: usize,
    pub rows: usize,
    values: Vec<f64>,
}

/// One drawable heat cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub min: PlanePoint,
    pub max: PlanePoint,
    pub intensity: f64,
}

impl HeatGrid {
    /// `resolution` cells span the longer side of the data; the grid is
    /// padded by `radius` cells so the blur is not clipped at the edges.
    pub fn build(points: &[PlanePoint], resolution: usize, radius: f64) -> Self {
        let Some(bounds) = Bounds::of(points) else {
            return Self::default();
        };
        let resolution = resolution.max(1);
        let span = bounds.width().max(bounds.height());
        let cell = if span > 0.0 { span / resolution as f64 } else { 0.01 };
        let pad = radius.max(0.0).ceil() as usize;

        let origin = [
            bounds.min[0] - pad as f64 * cell,
            bounds.min[1] - pad as f64 * cell,
        ];
        let cols = (bounds.width() / cell).floor() as usize + 1 + 2 * pad;
        let rows = (bounds.height() / cell).floor() as usize + 1 + 2 * pad;

        let mut values = vec![0.0; cols * rows];
        for p in points {
            let c = (((p[0] - origin[0]) / cell).floor() as usize).min(cols - 1);
            let r = (((p[1] - origin[1]) / cell).floor() as usize).min(rows - 1);
            values[r * cols + c] += 1.0;
        }

        let kernel = gaussian_kernel(radius);
        let values = blur(&values, cols, rows, &kernel);

        let peak = values.iter().cloned().fold(0.0, f64::max);
        let values = if peak > 0.0 {
            values.into_iter().map(|v| v / peak).collect()
        } else {
            values
        };

        HeatGrid {
            origin,
            cell,
            cols,
            rows,
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cells worth drawing.
    pub fn cells(&self) -> impl Iterator<Item = HeatCell> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v >= HEAT_EPSILON)
            .map(move |(i, &v)| {
                let (r, c) = (i / self.cols, i % self.cols);
                let min = [
                    self.origin[0] + c as f64 * self.cell,
                    self.origin[1] + r as f64 * self.cell,
                ];
                HeatCell {
                    min,
                    max: [min[0] + self.cell, min[1] + self.cell],
                    intensity: v,
                }
            })
    }
}

/// Normalized 1-D Gaussian with sigma = radius / 2.
fn gaussian_kernel(radius: f64) -> Vec<f64> {
    let half = radius.max(0.0).ceil() as i64;
    if half == 0 {
        return vec![1.0];
    }
    let sigma = (radius / 2.0).max(0.5);
    let weights: Vec<f64> = (-half..=half)
        .map(|k| (-((k * k) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable blur: horizontal pass then vertical pass.
fn blur(values: &[f64], cols: usize, rows: usize, kernel: &[f64]) -> Vec<f64> {
    let half = (kernel.len() / 2) as i64;
    let sample = |src: &[f64], c: i64, r: i64| -> f64 {
        if c < 0 || r < 0 || c >= cols as i64 || r >= rows as i64 {
            0.0
        } else {
            src[r as usize * cols + c as usize]
        }
    };

    let mut horizontal = vec![0.0; values.len()];
    for r in 0..rows as i64 {
        for c in 0..cols as i64 {
            horizontal[r as usize * cols + c as usize] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * sample(values, c + k as i64 - half, r))
                .sum();
        }
    }

    let mut out = vec![0.0; values.len()];
    for r in 0..rows as i64 {
        for c in 0..cols as i64 {
            out[r as usize * cols + c as usize] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * sample(&horizontal, c, r + k as i64 - half))
                .sum();
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Map layers
// ---------------------------------------------------------------------------

/// Everything the map adapter needs for one selection, computed once per
/// filter change rather than once per frame.
#[derive(Debug, Clone, Default)]
pub struct MapLayers {
    pub projection: Projection,
    /// Projected points, parallel to the visible observation indices.
    pub points: Vec<PlanePoint>,
    pub bounds: Option<Bounds>,
    pub heat: HeatGrid,
}

impl MapLayers {
    /// Build from `(lat, lon)` pairs in display order.
    pub fn build(coords: &[(f64, f64)], heat_resolution: usize, heat_radius: f64) -> Self {
        let projection = Projection::for_points(coords.iter().copied());
        let points: Vec<PlanePoint> = coords
            .iter()
            .map(|&(lat, lon)| projection.project(lat, lon))
            .collect();
        let bounds = Bounds::of(&points);
        let heat = HeatGrid::build(&points, heat_resolution, heat_radius);
        MapLayers {
            projection,
            points,
            bounds,
            heat,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position (in `points`) of the point nearest to `p`, if within `max_dist`.
    pub fn nearest(&self, p: PlanePoint, max_dist: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, q)| (i, (q[0] - p[0]).hypot(q[1] - p[1])))
            .filter(|&(_, d)| d <= max_dist)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_round_trips_and_scales_longitude() {
        let proj = Projection::for_points([(60.0, -120.0), (60.0, -130.0)]);
        let p = proj.project(60.0, -120.0);
        assert!((p[0] - -60.0).abs() < 1e-9);
        let (lat, lon) = proj.unproject(p);
        assert!((lat - 60.0).abs() < 1e-9);
        assert!((lon - -120.0).abs() < 1e-9);
    }

    #[test]
    fn empty_projection_is_identity() {
        let proj = Projection::for_points(std::iter::empty());
        assert_eq!(proj.project(10.0, 20.0), [20.0, 10.0]);
    }

    #[test]
    fn bounds_of_points() {
        assert_eq!(Bounds::of(&[]), None);
        let b = Bounds::of(&[[1.0, 5.0], [-2.0, 7.0], [0.0, 6.0]]).unwrap();
        assert_eq!(b.min, [-2.0, 5.0]);
        assert_eq!(b.max, [1.0, 7.0]);
        assert_eq!(b.width(), 3.0);
        assert_eq!(b.expanded(1.0).min, [-3.0, 4.0]);
    }

    #[test]
    fn clustering_keeps_every_point_once() {
        let points = vec![[0.1, 0.1], [0.2, 0.3], [5.5, 5.5], [5.9, 5.1], [-3.0, 2.0]];
        let clusters = cluster(&points, 1.0);
        assert_eq!(clusters.len(), 3);

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        let big = clusters.iter().find(|c| c.members.contains(&2)).unwrap();
        assert_eq!(big.count(), 2);
        assert!((big.center[0] - 5.7).abs() < 1e-9);
    }

    #[test]
    fn degenerate_cell_size_gives_singletons() {
        let points = vec![[0.0, 0.0], [0.0, 0.0]];
        assert_eq!(cluster(&points, 0.0).len(), 2);
        assert_eq!(cluster(&points, f64::NAN).len(), 2);
    }

    #[test]
    fn heat_grid_is_normalized_and_peaks_at_the_dense_spot() {
        let mut points = vec![[0.0, 0.0]; 10];
        points.push([10.0, 10.0]);
        let grid = HeatGrid::build(&points, 20, 2.0);

        assert!(!grid.is_empty());
        let cells: Vec<HeatCell> = grid.cells().collect();
        assert!(cells.iter().all(|c| c.intensity > 0.0 && c.intensity <= 1.0 + 1e-12));

        let hottest = cells
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
            .unwrap();
        assert!((hottest.intensity - 1.0).abs() < 1e-12);
        assert!(hottest.min[0] <= 0.0 && hottest.max[0] >= 0.0);
    }

    #[test]
    fn heat_grid_of_a_single_point() {
        let grid = HeatGrid::build(&[[3.0, 4.0]], 64, 0.0);
        assert_eq!((grid.cols, grid.rows), (1, 1));
        let cells: Vec<HeatCell> = grid.cells().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].intensity, 1.0);
    }

    #[test]
    fn heat_grid_of_nothing_is_empty() {
        let grid = HeatGrid::build(&[], 64, 3.0);
        assert!(grid.is_empty());
        assert_eq!(grid.cells().count(), 0);
    }

    #[test]
    fn map_layers_project_and_pick_nearest() {
        let layers = MapLayers::build(&[(49.0, -123.0), (54.0, -128.0)], 16, 1.0);
        assert_eq!(layers.points.len(), 2);
        assert!(layers.bounds.is_some());
        assert!(!layers.heat.is_empty());

        let near_first = layers.projection.project(49.01, -123.01);
        assert_eq!(layers.nearest(near_first, 0.5), Some(0));
        assert_eq!(layers.nearest([1000.0, 1000.0], 0.5), None);
    }

    #[test]
    fn empty_map_layers() {
        let layers = MapLayers::build(&[], 16, 1.0);
        assert!(layers.is_empty());
        assert!(layers.bounds.is_none());
        assert!(layers.heat.is_empty());
    }
}
