use crate::core::models::atom::NUM_GRID_TYPES;
use nalgebra::{Point3, Vector3};

/// Per-atom-type receptor interaction grids on a shared uniform lattice.
///
/// Each map is a dense 3D array of precomputed interaction energies, stored
/// flat in x-fastest order. Map construction is an external concern; this
/// type owns the lattice geometry and the O(1) lookup arithmetic, and
/// tolerates out-of-bounds queries via [`ReceptorGrids::contains`] rather
/// than erroring.
///
/// The scorable region stops one probe short of the lattice edge on every
/// axis, so the forward-difference neighbors (+x, +y, +z) of any in-bounds
/// probe are always valid samples.
#[derive(Debug, Clone)]
pub struct ReceptorGrids {
    center: Point3<f64>,
    size: Vector3<f64>,
    corner0: Point3<f64>,
    corner1: Point3<f64>,
    granularity: f64,
    granularity_inverse: f64,
    num_probes: [usize; 3],
    maps: Vec<Vec<f64>>,
}

impl ReceptorGrids {
    /// Lays out a lattice covering a search box, with all maps initially
    /// empty. Maps are attached per atom type via [`ReceptorGrids::set_map`].
    ///
    /// # Panics
    ///
    /// Panics if `granularity` or any component of `size` is not positive.
    pub fn new(center: Point3<f64>, size: Vector3<f64>, granularity: f64) -> Self {
        assert!(granularity > 0.0, "grid granularity must be positive");
        assert!(
            size.iter().all(|&s| s > 0.0),
            "search box size must be positive"
        );
        let granularity_inverse = 1.0 / granularity;
        let mut num_probes = [0usize; 3];
        for k in 0..3 {
            // One probe past the box on each axis keeps the +1 neighbor of
            // every scorable probe inside the lattice.
            num_probes[k] = (size[k] * granularity_inverse).ceil() as usize + 2;
        }
        let corner0 = center - 0.5 * size;
        let corner1 = Point3::new(
            corner0.x + granularity * (num_probes[0] - 1) as f64,
            corner0.y + granularity * (num_probes[1] - 1) as f64,
            corner0.z + granularity * (num_probes[2] - 1) as f64,
        );
        Self {
            center,
            size,
            corner0,
            corner1,
            granularity,
            granularity_inverse,
            num_probes,
            maps: vec![Vec::new(); NUM_GRID_TYPES],
        }
    }

    /// Number of samples each attached map must hold.
    pub fn samples_per_map(&self) -> usize {
        self.num_probes[0] * self.num_probes[1] * self.num_probes[2]
    }

    /// Attaches the energy map for one atom type.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold exactly one sample per lattice probe.
    pub fn set_map(&mut self, type_index: usize, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.samples_per_map(),
            "grid map sample count mismatch"
        );
        self.maps[type_index] = values;
    }

    /// Attaches a constant-value map for every atom type.
    pub fn fill_uniform(&mut self, value: f64) {
        let len = self.samples_per_map();
        for t in 0..NUM_GRID_TYPES {
            self.maps[t] = vec![value; len];
        }
    }

    pub fn map(&self, type_index: usize) -> &[f64] {
        &self.maps[type_index]
    }

    pub fn has_map(&self, type_index: usize) -> bool {
        !self.maps[type_index].is_empty()
    }

    /// Whether a point lies inside the scorable region.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|k| self.corner0[k] <= p[k] && p[k] < self.corner1[k])
    }

    /// Lattice index of the probe at the lower corner of the cell containing
    /// `p`. Caller guarantees `contains(p)`.
    pub fn probe_index(&self, p: &Point3<f64>) -> [usize; 3] {
        debug_assert!(self.contains(p));
        let mut index = [0usize; 3];
        for k in 0..3 {
            index[k] = ((p[k] - self.corner0[k]) * self.granularity_inverse) as usize;
        }
        index
    }

    /// Flat offset of a lattice probe into a map array.
    pub fn flat_index(&self, index: [usize; 3]) -> usize {
        self.num_probes[0] * (self.num_probes[1] * index[2] + index[1]) + index[0]
    }

    /// Flat-offset strides along x, y and z; the forward-difference
    /// neighbors of a probe at offset `o` are `o + strides()[k]`.
    pub fn strides(&self) -> [usize; 3] {
        [1, self.num_probes[0], self.num_probes[0] * self.num_probes[1]]
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn size(&self) -> Vector3<f64> {
        self.size
    }

    pub fn granularity(&self) -> f64 {
        self.granularity
    }

    pub fn granularity_inverse(&self) -> f64 {
        self.granularity_inverse
    }
}
