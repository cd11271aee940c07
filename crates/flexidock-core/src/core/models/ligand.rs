use super::atom::Atom;
use super::frame::Frame;
use crate::core::utils::geometry;
use nalgebra::{Point3, UnitQuaternion};

/// A heavy-atom pair eligible for the intramolecular energy term.
///
/// The pair's potential-table offset is baked in at topology-build time
/// using the same arithmetic the evaluator uses for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractingPair {
    /// Heavy-atom index in the earlier frame.
    pub first: usize,
    /// Heavy-atom index in the later frame.
    pub second: usize,
    /// Base offset into the pairwise potential tables for this type pair.
    pub table_offset: usize,
}

/// An immutable flexible ligand: a kinematic tree of rigid frames over
/// dense atom arrays, plus the set of interacting heavy-atom pairs.
///
/// Built once per ligand by [`super::builder`]; never mutated afterwards, so
/// it is shared read-only across all concurrent optimization trials. Atom
/// positions are stored relative to the owning frame's rotorY origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Ligand {
    pub(crate) frames: Vec<Frame>,
    pub(crate) heavy_atoms: Vec<Atom>,
    pub(crate) hydrogens: Vec<Atom>,
    pub(crate) num_active_torsions: usize,
    pub(crate) interacting_pairs: Vec<InteractingPair>,
}

/// A reconstructed pose: the scalar energy plus world coordinates for every
/// atom. Immutable once produced; result lists are ordered by energy.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformation {
    pub energy: f64,
    pub heavy_coords: Vec<Point3<f64>>,
    pub hydrogen_coords: Vec<Point3<f64>>,
}

impl Ligand {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn heavy_atoms(&self) -> &[Atom] {
        &self.heavy_atoms
    }

    pub fn hydrogens(&self) -> &[Atom] {
        &self.hydrogens
    }

    pub fn interacting_pairs(&self) -> &[InteractingPair] {
        &self.interacting_pairs
    }

    pub fn num_active_torsions(&self) -> usize {
        self.num_active_torsions
    }

    /// Length of a generalized coordinate vector: 3 position + 4 quaternion
    /// + one scalar per active torsion.
    pub fn num_coordinates(&self) -> usize {
        7 + self.num_active_torsions
    }

    /// Number of optimization variables (and gradient length): 3 position +
    /// 3 orientation + one per active torsion.
    pub fn num_variables(&self) -> usize {
        6 + self.num_active_torsions
    }

    /// Reconstructs world coordinates for every atom from a generalized
    /// coordinate vector.
    ///
    /// This is the forward-kinematics pass over the full atom set: frames
    /// are visited in increasing index order (parents always precede
    /// children), each frame's atoms are placed by its origin and rotation,
    /// and each active child consumes the next torsion scalar to compose
    /// its orientation about the world-space rotation axis. Inactive
    /// children inherit the parent orientation and consume nothing.
    pub fn compose_conformation(&self, energy: f64, x: &[f64]) -> Conformation {
        debug_assert_eq!(x.len(), self.num_coordinates());
        let num_frames = self.frames.len();
        let mut origins = vec![Point3::origin(); num_frames];
        let mut orientations = vec![UnitQuaternion::identity(); num_frames];
        origins[0] = Point3::new(x[0], x[1], x[2]);
        orientations[0] = geometry::orientation_of(x);

        let mut heavy_coords = vec![Point3::origin(); self.heavy_atoms.len()];
        let mut hydrogen_coords = vec![Point3::origin(); self.hydrogens.len()];

        let mut torsion = 0;
        for k in 0..num_frames {
            let frame = &self.frames[k];
            let rotation = orientations[k].to_rotation_matrix();
            for i in frame.heavy_atom_indices() {
                heavy_coords[i] = origins[k] + rotation * self.heavy_atoms[i].position.coords;
            }
            for i in frame.hydrogen_indices() {
                hydrogen_coords[i] = origins[k] + rotation * self.hydrogens[i].position.coords;
            }
            for &c in &frame.children {
                let child = &self.frames[c];
                origins[c] = origins[k] + rotation * child.origin_offset;
                orientations[c] = if child.active {
                    let axis = rotation * child.axis_local;
                    let angle = x[7 + torsion];
                    torsion += 1;
                    geometry::axis_angle(&axis, angle) * orientations[k]
                } else {
                    orientations[k]
                };
            }
        }
        debug_assert_eq!(torsion, self.num_active_torsions);

        Conformation {
            energy,
            heavy_coords,
            hydrogen_coords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, AtomType, NUM_GRID_TYPES};
    use crate::core::models::builder::{LigandRecord, build_ligand};
    use crate::core::forcefield::potentials::PairPotentials;
    use std::f64::consts::PI;

    fn carbon(serial: u32, x: f64) -> LigandRecord {
        LigandRecord::Atom(Atom::new(
            serial,
            AtomType::HydrophobicCarbon,
            Point3::new(x, 0.0, 0.0),
        ))
    }

    fn potentials() -> PairPotentials {
        PairPotentials::zeroed(NUM_GRID_TYPES, 16, 64.0)
    }

    /// Root C1-C2, child frame C3-C4 rotating about the C2-C3 bond.
    fn two_fragment_ligand() -> Ligand {
        let records = vec![
            carbon(1, 0.0),
            carbon(2, 1.5),
            LigandRecord::Branch {
                rotor_x_serial: 2,
                rotor_y_serial: 3,
            },
            carbon(3, 3.0),
            carbon(4, 4.5),
            LigandRecord::EndBranch,
        ];
        build_ligand(records, &potentials()).unwrap()
    }

    fn identity_pose(ligand: &Ligand, px: f64, py: f64, pz: f64) -> Vec<f64> {
        let mut x = vec![0.0; ligand.num_coordinates()];
        x[0] = px;
        x[1] = py;
        x[2] = pz;
        x[3] = 1.0; // identity quaternion
        x
    }

    #[test]
    fn identity_pose_reproduces_input_geometry_offset_by_position() {
        let ligand = two_fragment_ligand();
        let pose = identity_pose(&ligand, 10.0, -2.0, 5.0);
        let conf = ligand.compose_conformation(0.0, &pose);
        // Input atoms sat on the x axis at 0.0, 1.5, 3.0, 4.5; the root
        // origin (rotorY of frame 0) was atom C1.
        for (i, expected_x) in [0.0, 1.5, 3.0, 4.5].iter().enumerate() {
            let p = conf.heavy_coords[i];
            assert!((p.x - (10.0 + expected_x)).abs() < 1e-12);
            assert!((p.y + 2.0).abs() < 1e-12);
            assert!((p.z - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn reconstruction_is_deterministic() {
        let ligand = two_fragment_ligand();
        let mut pose = identity_pose(&ligand, 1.0, 2.0, 3.0);
        pose[7] = 0.8; // arbitrary torsion
        let a = ligand.compose_conformation(-1.5, &pose);
        let b = ligand.compose_conformation(-1.5, &pose);
        assert_eq!(a, b);
    }

    #[test]
    fn torsion_rotates_child_atoms_about_the_bond_axis() {
        let ligand = two_fragment_ligand();
        let mut pose = identity_pose(&ligand, 0.0, 0.0, 0.0);
        pose[7] = PI; // half turn about the x-aligned C2-C3 axis
        let conf = ligand.compose_conformation(0.0, &pose);
        // All atoms lie on the rotation axis, so a torsion changes nothing.
        for (i, expected_x) in [0.0, 1.5, 3.0, 4.5].iter().enumerate() {
            assert!((conf.heavy_coords[i].x - expected_x).abs() < 1e-9);
            assert!(conf.heavy_coords[i].y.abs() < 1e-9);
        }
    }

    #[test]
    fn torsion_moves_off_axis_child_atoms() {
        // Child frame holds C3 plus an off-axis C4.
        let records = vec![
            carbon(1, 0.0),
            carbon(2, 1.5),
            LigandRecord::Branch {
                rotor_x_serial: 2,
                rotor_y_serial: 3,
            },
            carbon(3, 3.0),
            LigandRecord::Atom(Atom::new(
                4,
                AtomType::HydrophobicCarbon,
                Point3::new(3.8, 1.2, 0.0),
            )),
            LigandRecord::EndBranch,
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        let mut pose = identity_pose(&ligand, 0.0, 0.0, 0.0);
        pose[7] = PI;
        let conf = ligand.compose_conformation(0.0, &pose);
        // A half turn about the x axis flips the off-axis atom's y.
        let c4 = conf.heavy_coords[3];
        assert!((c4.x - 3.8).abs() < 1e-9);
        assert!((c4.y + 1.2).abs() < 1e-9);
        assert!(c4.z.abs() < 1e-9);
    }

    #[test]
    fn coordinate_vector_dimensions_follow_active_torsions() {
        let ligand = two_fragment_ligand();
        assert_eq!(ligand.num_active_torsions(), 1);
        assert_eq!(ligand.num_coordinates(), 8);
        assert_eq!(ligand.num_variables(), 7);
    }
}
