/// Tabulated pairwise intramolecular potentials.
///
/// For every unordered pair of heavy-atom types the table stores the energy
/// and its radial derivative, sampled uniformly over squared distance from
/// zero up to a cutoff. Storing both at matching offsets lets the evaluator
/// read one index for both values, and sampling over squared distance
/// avoids a square root in the hot loop.
///
/// The table-offset arithmetic ([`PairPotentials::pair_offset`]) is a pure
/// function of the two type indices. The topology builder bakes it into each
/// interacting pair at construction time, so it must index the tables
/// exactly as the evaluator reads them later.
#[derive(Debug, Clone)]
pub struct PairPotentials {
    num_types: usize,
    num_bins: usize,
    bins_per_sq_angstrom: f64,
    cutoff_sq: f64,
    energies: Vec<f64>,
    derivatives: Vec<f64>,
}

impl PairPotentials {
    /// Wraps externally built tables.
    ///
    /// `energies` and `derivatives` hold `num_bins` samples for each of the
    /// `num_types * (num_types + 1) / 2` unordered type pairs, concatenated
    /// in [`PairPotentials::pair_offset`] order. Bin `b` of a pair covers
    /// squared distances in `[b, b + 1) * cutoff_sq / (num_bins - 1)`.
    ///
    /// # Panics
    ///
    /// Panics if the table lengths disagree with `num_types` and `num_bins`,
    /// or if the cutoff is not positive.
    pub fn new(
        num_types: usize,
        num_bins: usize,
        cutoff_sq: f64,
        energies: Vec<f64>,
        derivatives: Vec<f64>,
    ) -> Self {
        assert!(num_bins >= 2, "potential tables need at least two bins");
        assert!(cutoff_sq > 0.0, "potential cutoff must be positive");
        let expected = num_bins * num_types * (num_types + 1) / 2;
        assert_eq!(energies.len(), expected, "energy table length mismatch");
        assert_eq!(
            derivatives.len(),
            expected,
            "derivative table length mismatch"
        );
        Self {
            num_types,
            num_bins,
            bins_per_sq_angstrom: (num_bins - 1) as f64 / cutoff_sq,
            cutoff_sq,
            energies,
            derivatives,
        }
    }

    /// All-zero tables; useful when only the grid term should contribute.
    pub fn zeroed(num_types: usize, num_bins: usize, cutoff_sq: f64) -> Self {
        let len = num_bins * num_types * (num_types + 1) / 2;
        Self::new(num_types, num_bins, cutoff_sq, vec![0.0; len], vec![0.0; len])
    }

    /// Base offset of the table segment for an unordered type pair.
    pub fn pair_offset(&self, t1: usize, t2: usize) -> usize {
        debug_assert!(t1 < self.num_types && t2 < self.num_types);
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        self.num_bins * (lo + hi * (hi + 1) / 2)
    }

    /// Bin index for a squared distance; caller guarantees `r_sq < cutoff_sq`.
    pub fn bin(&self, r_sq: f64) -> usize {
        debug_assert!(r_sq < self.cutoff_sq);
        (self.bins_per_sq_angstrom * r_sq) as usize
    }

    pub fn cutoff_sq(&self) -> f64 {
        self.cutoff_sq
    }

    pub fn num_types(&self) -> usize {
        self.num_types
    }

    pub fn energy_at(&self, offset: usize) -> f64 {
        self.energies[offset]
    }

    pub fn derivative_at(&self, offset: usize) -> f64 {
        self.derivatives[offset]
    }
}
