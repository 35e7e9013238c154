//! Helpers for the `fenris-mms` test suites.
//!
//! The interpolants here play the role of the finite element interpolation machinery: a
//! manufactured field is sampled at the nodes of a uniform mesh of the unit interval or unit
//! square, and the resulting discrete field is evaluated (together with its derivatives) the
//! way a numerical pipeline would.
use nalgebra::Vector2;

/// Poor man's approx assertion for slices of floating point numbers
#[macro_export]
macro_rules! assert_slices_approx_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let x: &[f64] = $x;
        let y: &[f64] = $y;
        assert_eq!(x.len(), y.len(), "slices have different lengths");
        let max_absdiff = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        if !(max_absdiff <= $tol) {
            println!("abstol: {:e}", $tol);
            println!("left: {:?}", x);
            println!("right: {:?}", y);
            println!("max absdiff: {:e}", max_absdiff);
        }
        assert!(max_absdiff <= $tol);
    }};
}

fn locate_cell(x: f64, num_cells: usize) -> (usize, f64) {
    let h = 1.0 / num_cells as f64;
    let cell = ((x / h).floor().max(0.0) as usize).min(num_cells - 1);
    let local = (x - cell as f64 * h) / h;
    (cell, local)
}

/// Continuous piecewise linear interpolant on a uniform mesh of `[0, 1]`.
#[derive(Debug, Clone)]
pub struct LinearInterpolant1d {
    nodal_values: Vec<f64>,
}

impl LinearInterpolant1d {
    /// Interpolates `f` at the `num_cells + 1` nodes of a uniform mesh.
    pub fn interpolate(num_cells: usize, f: impl Fn(f64) -> f64) -> Self {
        assert!(num_cells > 0);
        let h = 1.0 / num_cells as f64;
        let nodal_values = (0..=num_cells).map(|i| f(i as f64 * h)).collect();
        Self { nodal_values }
    }

    pub fn num_cells(&self) -> usize {
        self.nodal_values.len() - 1
    }

    pub fn value(&self, x: f64) -> f64 {
        let (cell, s) = locate_cell(x, self.num_cells());
        let (a, b) = (self.nodal_values[cell], self.nodal_values[cell + 1]);
        (1.0 - s) * a + s * b
    }

    /// The (cell-wise constant) derivative.
    pub fn derivative(&self, x: f64) -> f64 {
        let n = self.num_cells();
        let (cell, _) = locate_cell(x, n);
        (self.nodal_values[cell + 1] - self.nodal_values[cell]) * n as f64
    }
}

/// Continuous piecewise bilinear interpolant on a uniform quadrilateral mesh of `[0, 1]^2`.
#[derive(Debug, Clone)]
pub struct BilinearInterpolant2d {
    cells_per_dim: usize,
    // Node (i, j) is stored at index i * (cells_per_dim + 1) + j
    nodal_values: Vec<f64>,
}

impl BilinearInterpolant2d {
    pub fn interpolate(cells_per_dim: usize, f: impl Fn(f64, f64) -> f64) -> Self {
        assert!(cells_per_dim > 0);
        let h = 1.0 / cells_per_dim as f64;
        let mut nodal_values = Vec::with_capacity((cells_per_dim + 1).pow(2));
        for i in 0..=cells_per_dim {
            for j in 0..=cells_per_dim {
                nodal_values.push(f(i as f64 * h, j as f64 * h));
            }
        }
        Self {
            cells_per_dim,
            nodal_values,
        }
    }

    fn corner_values(&self, x: f64, y: f64) -> ([f64; 4], f64, f64) {
        let n = self.cells_per_dim;
        let (i, s) = locate_cell(x, n);
        let (j, r) = locate_cell(y, n);
        let node = |i: usize, j: usize| self.nodal_values[i * (n + 1) + j];
        ([node(i, j), node(i + 1, j), node(i, j + 1), node(i + 1, j + 1)], s, r)
    }

    pub fn value(&self, x: f64, y: f64) -> f64 {
        let ([u00, u10, u01, u11], s, r) = self.corner_values(x, y);
        (1.0 - s) * (1.0 - r) * u00 + s * (1.0 - r) * u10 + (1.0 - s) * r * u01 + s * r * u11
    }

    pub fn gradient(&self, x: f64, y: f64) -> Vector2<f64> {
        let ([u00, u10, u01, u11], s, r) = self.corner_values(x, y);
        let n = self.cells_per_dim as f64;
        let du_ds = (1.0 - r) * (u10 - u00) + r * (u11 - u01);
        let du_dr = (1.0 - s) * (u01 - u00) + s * (u11 - u10);
        Vector2::new(du_ds * n, du_dr * n)
    }
}
