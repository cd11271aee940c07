use nalgebra::Vector3;

/// A rigid fragment of the ligand, connected to its parent fragment by
/// exactly one rotatable bond.
///
/// Frames live in a dense arena owned by the ligand; tree edges are integer
/// indices, never pointers. Frame 0 is the root (its parent and rotor fields
/// are dummies pointing at itself) and for every other frame
/// `parent < own index`, so a single pass in increasing index order suffices
/// for forward kinematics and a single pass in decreasing order for force
/// aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Arena index of the parent frame (self for the root).
    pub parent: usize,
    /// Serial number of the rotor X atom, the bond pivot in the parent frame.
    pub rotor_x_serial: u32,
    /// Serial number of the rotor Y atom, the bond pivot in this frame.
    pub rotor_y_serial: u32,
    /// Heavy-atom index of rotor X (lives in the parent's atom range).
    pub rotor_x_index: usize,
    /// Heavy-atom index of rotor Y; its position is this frame's origin.
    pub rotor_y_index: usize,
    /// Start of this frame's range in the ligand's heavy-atom array.
    pub heavy_begin: usize,
    /// End (exclusive) of this frame's heavy-atom range.
    pub heavy_end: usize,
    /// Start of this frame's range in the ligand's hydrogen array.
    pub hydrogen_begin: usize,
    /// End (exclusive) of this frame's hydrogen range.
    pub hydrogen_end: usize,
    /// Arena indices of child frames, in parse order.
    pub children: Vec<usize>,
    /// Whether this frame's torsion is an optimization variable. False for
    /// terminal fragments whose only heavy atom is rotor Y (rotating them
    /// has no steric effect).
    pub active: bool,
    /// Vector from the parent frame's rotor Y to this frame's rotor Y, in
    /// the parent's local basis. Computed once at build time.
    pub origin_offset: Vector3<f64>,
    /// Unit vector from rotor X to rotor Y (the torsion rotation axis), in
    /// the parent's local basis. Computed once at build time.
    pub axis_local: Vector3<f64>,
}

impl Frame {
    /// Creates a frame as it is first encountered at a branch marker; atom
    /// range ends and geometric constants are filled in when the branch
    /// closes.
    pub fn new(
        parent: usize,
        rotor_x_serial: u32,
        rotor_y_serial: u32,
        rotor_x_index: usize,
        heavy_begin: usize,
        hydrogen_begin: usize,
    ) -> Self {
        Self {
            parent,
            rotor_x_serial,
            rotor_y_serial,
            rotor_x_index,
            rotor_y_index: heavy_begin,
            heavy_begin,
            heavy_end: 0,
            hydrogen_begin,
            hydrogen_end: 0,
            children: Vec::new(),
            active: true,
            origin_offset: Vector3::zeros(),
            axis_local: Vector3::zeros(),
        }
    }

    pub fn heavy_atom_indices(&self) -> std::ops::Range<usize> {
        self.heavy_begin..self.heavy_end
    }

    pub fn hydrogen_indices(&self) -> std::ops::Range<usize> {
        self.hydrogen_begin..self.hydrogen_end
    }
}
