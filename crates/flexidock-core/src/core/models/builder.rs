use super::atom::Atom;
use super::frame::Frame;
use super::ligand::{InteractingPair, Ligand};
use crate::core::forcefield::potentials::PairPotentials;
use thiserror::Error;

/// Structural errors raised while building a ligand's topology.
///
/// All of these are fatal for the ligand being built and carry enough
/// context to identify the offending input; they never corrupt shared
/// state, so other ligands and trials are unaffected.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(
        "empty branch {rotor_x_serial} -> {rotor_y_serial}: a rotatable fragment must contain at least one heavy atom (the input structure is probably invalid)"
    )]
    EmptyBranch {
        rotor_x_serial: u32,
        rotor_y_serial: u32,
    },

    #[error("rotor atom with serial {serial} not found in its fragment")]
    RotorAtomNotFound { serial: u32 },

    #[error("end-branch marker without a matching branch marker")]
    UnmatchedEndBranch,

    #[error("branch markers left unclosed at end of input")]
    UnclosedBranch,

    #[error("atom with serial {serial} appears after its fragment was closed")]
    AtomAfterBranchClose { serial: u32 },

    #[error("structure contains no heavy atoms")]
    EmptyStructure,
}

/// One element of the sequential branched-structure description.
///
/// Raw structure-file parsing and atom classification happen upstream; the
/// builder consumes already-classified atoms interleaved with the branch
/// markers that delimit rigid fragments.
#[derive(Debug, Clone)]
pub enum LigandRecord {
    Atom(Atom),
    /// Opens a rotatable fragment. `rotor_x_serial` names the bond pivot in
    /// the enclosing fragment, `rotor_y_serial` the pivot in the new one.
    Branch {
        rotor_x_serial: u32,
        rotor_y_serial: u32,
    },
    EndBranch,
}

/// Builds a [`Ligand`] from a stream of [`LigandRecord`]s.
///
/// Atoms are consumed in order and attributed to the innermost open
/// fragment. Covalent bonds are discovered against atoms already placed in
/// the same fragment; rotor bonds are added when a branch closes. The
/// potential tables are consulted only for their pure offset arithmetic,
/// baked into each interacting pair.
pub struct LigandBuilder<'a> {
    potentials: &'a PairPotentials,
    frames: Vec<Frame>,
    heavy_atoms: Vec<Atom>,
    hydrogens: Vec<Atom>,
    /// Covalent adjacency list indexed by heavy-atom index.
    bonds: Vec<Vec<usize>>,
    /// Index of the innermost open frame.
    current: usize,
    num_active_torsions: usize,
}

/// Convenience wrapper: feeds every record into a [`LigandBuilder`] and
/// finalizes it.
pub fn build_ligand(
    records: impl IntoIterator<Item = LigandRecord>,
    potentials: &PairPotentials,
) -> Result<Ligand, TopologyError> {
    let mut builder = LigandBuilder::new(potentials);
    for record in records {
        builder.push(record)?;
    }
    builder.finish()
}

impl<'a> LigandBuilder<'a> {
    pub fn new(potentials: &'a PairPotentials) -> Self {
        Self {
            potentials,
            // The root is a frame like any other; its parent and rotor
            // fields are dummies referring to itself.
            frames: vec![Frame::new(0, 0, 0, 0, 0, 0)],
            heavy_atoms: Vec::new(),
            hydrogens: Vec::new(),
            bonds: Vec::new(),
            current: 0,
            num_active_torsions: 0,
        }
    }

    pub fn push(&mut self, record: LigandRecord) -> Result<(), TopologyError> {
        match record {
            LigandRecord::Atom(atom) => self.push_atom(atom),
            LigandRecord::Branch {
                rotor_x_serial,
                rotor_y_serial,
            } => self.open_branch(rotor_x_serial, rotor_y_serial),
            LigandRecord::EndBranch => self.close_branch(),
        }
    }

    fn push_atom(&mut self, atom: Atom) -> Result<(), TopologyError> {
        // Atom ranges are contiguous per frame: once a fragment has closed,
        // no further atoms may be attributed to it.
        if self.current != self.frames.len() - 1 {
            return Err(TopologyError::AtomAfterBranchClose { serial: atom.serial });
        }
        if atom.atom_type.is_hydrogen() {
            self.push_hydrogen(atom);
        } else {
            self.push_heavy_atom(atom);
        }
        Ok(())
    }

    fn push_hydrogen(&mut self, atom: Atom) {
        // A polar hydrogen marks its bonded hetero atom as a donor; scan
        // the current fragment's heavy atoms from most recent backwards.
        if atom.atom_type.is_polar_hydrogen() {
            let begin = self.frames[self.current].heavy_begin;
            for i in (begin..self.heavy_atoms.len()).rev() {
                let heavy = &mut self.heavy_atoms[i];
                if !heavy.is_hetero() {
                    continue;
                }
                if atom.bonded_to(heavy) {
                    heavy.atom_type = heavy.atom_type.donorized();
                    break;
                }
            }
        }
        self.hydrogens.push(atom);
    }

    fn push_heavy_atom(&mut self, mut atom: Atom) {
        let index = self.heavy_atoms.len();
        debug_assert_eq!(self.bonds.len(), index);
        self.bonds.push(Vec::new());
        let begin = self.frames[self.current].heavy_begin;
        for i in (begin..index).rev() {
            let other = &mut self.heavy_atoms[i];
            if atom.bonded_to(other) {
                self.bonds[index].push(i);
                self.bonds[i].push(index);
                // A carbon bonded to a hetero atom is no longer hydrophobic.
                if atom.is_hetero() && !other.is_hetero() {
                    other.atom_type = other.atom_type.dehydrophobicized();
                } else if !atom.is_hetero() && other.is_hetero() {
                    atom.atom_type = atom.atom_type.dehydrophobicized();
                }
            }
        }
        let frame = &mut self.frames[self.current];
        if self.current > 0 && atom.serial == frame.rotor_y_serial {
            frame.rotor_y_index = index;
        }
        self.heavy_atoms.push(atom);
    }

    fn open_branch(&mut self, rotor_x_serial: u32, rotor_y_serial: u32) -> Result<(), TopologyError> {
        // Serials are unique, so scanning onward from the enclosing frame's
        // first heavy atom finds rotor X wherever the branch is rooted.
        let begin = self.frames[self.current].heavy_begin;
        let rotor_x_index = (begin..self.heavy_atoms.len())
            .find(|&i| self.heavy_atoms[i].serial == rotor_x_serial)
            .ok_or(TopologyError::RotorAtomNotFound {
                serial: rotor_x_serial,
            })?;

        let child = self.frames.len();
        self.frames.push(Frame::new(
            self.current,
            rotor_x_serial,
            rotor_y_serial,
            rotor_x_index,
            self.heavy_atoms.len(),
            self.hydrogens.len(),
        ));
        self.frames[self.current].children.push(child);

        // Atom ranges are assigned in parse order: the previously created
        // frame's range ends where the new frame's begins.
        self.frames[child - 1].heavy_end = self.heavy_atoms.len();
        self.frames[child - 1].hydrogen_end = self.hydrogens.len();

        self.current = child;
        Ok(())
    }

    fn close_branch(&mut self) -> Result<(), TopologyError> {
        if self.current == 0 {
            return Err(TopologyError::UnmatchedEndBranch);
        }
        let frame = &self.frames[self.current];
        if frame.heavy_begin == self.heavy_atoms.len() {
            return Err(TopologyError::EmptyBranch {
                rotor_x_serial: frame.rotor_x_serial,
                rotor_y_serial: frame.rotor_y_serial,
            });
        }
        let rotor_y_index = frame.rotor_y_index;
        let rotor_x_index = frame.rotor_x_index;
        if self.heavy_atoms[rotor_y_index].serial != frame.rotor_y_serial {
            return Err(TopologyError::RotorAtomNotFound {
                serial: frame.rotor_y_serial,
            });
        }

        // A terminal fragment whose only heavy atom is rotor Y (-OH, -NH2
        // and the like) has no steric torsion; it stays out of the
        // optimization variables.
        let is_terminal_single = self.current == self.frames.len() - 1
            && frame.heavy_begin + 1 == self.heavy_atoms.len();
        if is_terminal_single {
            self.frames[self.current].active = false;
        } else {
            self.num_active_torsions += 1;
        }

        // The rotatable bond itself.
        self.bonds[rotor_y_index].push(rotor_x_index);
        self.bonds[rotor_x_index].push(rotor_y_index);

        if self.heavy_atoms[rotor_y_index].is_hetero()
            && !self.heavy_atoms[rotor_x_index].is_hetero()
        {
            self.heavy_atoms[rotor_x_index].atom_type =
                self.heavy_atoms[rotor_x_index].atom_type.dehydrophobicized();
        }
        if self.heavy_atoms[rotor_x_index].is_hetero()
            && !self.heavy_atoms[rotor_y_index].is_hetero()
        {
            self.heavy_atoms[rotor_y_index].atom_type =
                self.heavy_atoms[rotor_y_index].atom_type.dehydrophobicized();
        }

        // Geometric constants, computed while positions are still in input
        // (world) coordinates.
        let parent = self.frames[self.current].parent;
        let parent_rotor_y = self.heavy_atoms[self.frames[parent].rotor_y_index].position;
        let rotor_y = self.heavy_atoms[rotor_y_index].position;
        let rotor_x = self.heavy_atoms[rotor_x_index].position;
        let frame = &mut self.frames[self.current];
        frame.origin_offset = rotor_y - parent_rotor_y;
        frame.axis_local = (rotor_y - rotor_x).normalize();

        self.current = parent;
        Ok(())
    }

    /// Finalizes atom ranges, rebases atom coordinates to their frame
    /// origins, enumerates interacting pairs, and returns the ligand.
    pub fn finish(mut self) -> Result<Ligand, TopologyError> {
        if self.current != 0 {
            return Err(TopologyError::UnclosedBranch);
        }
        if self.heavy_atoms.is_empty() {
            return Err(TopologyError::EmptyStructure);
        }
        let last = self.frames.len() - 1;
        self.frames[last].heavy_end = self.heavy_atoms.len();
        self.frames[last].hydrogen_end = self.hydrogens.len();

        // Rebase every atom onto its frame's rotorY origin. Frame ranges
        // are disjoint, so each origin is read before any of its frame's
        // atoms move.
        for frame in &self.frames {
            let origin = self.heavy_atoms[frame.rotor_y_index].position;
            for i in frame.heavy_atom_indices() {
                self.heavy_atoms[i].position -= origin.coords;
            }
            for i in frame.hydrogen_indices() {
                self.hydrogens[i].position -= origin.coords;
            }
        }

        let interacting_pairs = self.enumerate_interacting_pairs();

        Ok(Ligand {
            frames: self.frames,
            heavy_atoms: self.heavy_atoms,
            hydrogens: self.hydrogens,
            num_active_torsions: self.num_active_torsions,
            interacting_pairs,
        })
    }

    /// Collects heavy-atom pairs eligible for the intramolecular term: all
    /// cross-frame pairs outside the 1-2-3-4 covalent neighborhood, minus
    /// the rotor-constrained relationships that carry no steric freedom.
    fn enumerate_interacting_pairs(&self) -> Vec<InteractingPair> {
        let num_frames = self.frames.len();
        let mut pairs = Vec::new();
        let mut neighbors: Vec<usize> = Vec::with_capacity(16);

        for k1 in 0..num_frames {
            let f1 = &self.frames[k1];
            for i in f1.heavy_atom_indices() {
                // Atoms within three consecutive covalent bonds of atom i.
                neighbors.clear();
                for &b1 in &self.bonds[i] {
                    if !neighbors.contains(&b1) {
                        neighbors.push(b1);
                    }
                    for &b2 in &self.bonds[b1] {
                        if !neighbors.contains(&b2) {
                            neighbors.push(b2);
                        }
                        for &b3 in &self.bonds[b2] {
                            if !neighbors.contains(&b3) {
                                neighbors.push(b3);
                            }
                        }
                    }
                }

                for k2 in (k1 + 1)..num_frames {
                    let f2 = &self.frames[k2];
                    let f3 = &self.frames[f2.parent];
                    for j in f2.heavy_atom_indices() {
                        // Rotor pair joining a frame to its child.
                        if k1 == f2.parent && (i == f2.rotor_x_index || j == f2.rotor_y_index) {
                            continue;
                        }
                        // Two sibling frames' rotor Y atoms.
                        if k1 > 0
                            && f1.parent == f2.parent
                            && i == f1.rotor_y_index
                            && j == f2.rotor_y_index
                        {
                            continue;
                        }
                        // Rotor X to grandchild rotor Y through one frame.
                        if f2.parent > 0
                            && k1 == f3.parent
                            && i == f3.rotor_x_index
                            && j == f2.rotor_y_index
                        {
                            continue;
                        }
                        if neighbors.contains(&j) {
                            continue;
                        }
                        let table_offset = self.potentials.pair_offset(
                            self.heavy_atoms[i].atom_type.grid_index(),
                            self.heavy_atoms[j].atom_type.grid_index(),
                        );
                        pairs.push(InteractingPair {
                            first: i,
                            second: j,
                            table_offset,
                        });
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{AtomType, NUM_GRID_TYPES};
    use nalgebra::Point3;

    fn potentials() -> PairPotentials {
        PairPotentials::zeroed(NUM_GRID_TYPES, 16, 64.0)
    }

    fn atom(serial: u32, atom_type: AtomType, x: f64, y: f64, z: f64) -> LigandRecord {
        LigandRecord::Atom(Atom::new(serial, atom_type, Point3::new(x, y, z)))
    }

    fn carbon(serial: u32, x: f64) -> LigandRecord {
        atom(serial, AtomType::HydrophobicCarbon, x, 0.0, 0.0)
    }

    fn branch(rotor_x_serial: u32, rotor_y_serial: u32) -> LigandRecord {
        LigandRecord::Branch {
            rotor_x_serial,
            rotor_y_serial,
        }
    }

    /// Carbon chain along x with 1.5 A bonds, split after `root_len` atoms.
    fn split_chain(total: u32, root_len: u32) -> Vec<LigandRecord> {
        let mut records = Vec::new();
        for s in 1..=root_len {
            records.push(carbon(s, 1.5 * (s - 1) as f64));
        }
        records.push(branch(root_len, root_len + 1));
        for s in (root_len + 1)..=total {
            records.push(carbon(s, 1.5 * (s - 1) as f64));
        }
        records.push(LigandRecord::EndBranch);
        records
    }

    #[test]
    fn four_atom_chain_has_no_interacting_pairs() {
        let ligand = build_ligand(split_chain(4, 2), &potentials()).unwrap();
        // (1,4) is within the three-bond neighborhood; everything closer is
        // excluded as well.
        assert!(ligand.interacting_pairs().is_empty());
    }

    #[test]
    fn five_atom_chain_keeps_exactly_the_one_five_pair() {
        let ligand = build_ligand(split_chain(5, 2), &potentials()).unwrap();
        let pairs = ligand.interacting_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first, 0);
        assert_eq!(pairs[0].second, 4);
        let expected = potentials().pair_offset(
            AtomType::HydrophobicCarbon.grid_index(),
            AtomType::HydrophobicCarbon.grid_index(),
        );
        assert_eq!(pairs[0].table_offset, expected);
    }

    #[test]
    fn parent_index_precedes_frame_index_for_nested_branches() {
        // Root C1-C2, child off C2, grandchild off that child, and a second
        // child back off the root.
        let records = vec![
            carbon(1, 0.0),
            carbon(2, 1.5),
            branch(2, 3),
            carbon(3, 3.0),
            carbon(4, 4.5),
            branch(4, 5),
            carbon(5, 6.0),
            carbon(6, 7.5),
            LigandRecord::EndBranch,
            LigandRecord::EndBranch,
            branch(1, 7),
            atom(7, AtomType::HydrophobicCarbon, 0.0, 1.5, 0.0),
            atom(8, AtomType::HydrophobicCarbon, 0.0, 3.0, 0.0),
            LigandRecord::EndBranch,
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        assert_eq!(ligand.frames().len(), 4);
        for (k, frame) in ligand.frames().iter().enumerate().skip(1) {
            assert!(frame.parent < k);
        }
        assert_eq!(ligand.frames()[0].children, vec![1, 3]);
        assert_eq!(ligand.frames()[1].children, vec![2]);
    }

    #[test]
    fn atom_ranges_are_disjoint_and_in_parse_order() {
        let ligand = build_ligand(split_chain(6, 3), &potentials()).unwrap();
        let frames = ligand.frames();
        assert_eq!(frames[0].heavy_atom_indices(), 0..3);
        assert_eq!(frames[1].heavy_atom_indices(), 3..6);
    }

    #[test]
    fn empty_branch_is_a_fatal_structural_error() {
        let records = vec![
            carbon(1, 0.0),
            carbon(2, 1.5),
            branch(2, 3),
            LigandRecord::EndBranch,
        ];
        let err = build_ligand(records, &potentials()).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::EmptyBranch {
                rotor_x_serial: 2,
                rotor_y_serial: 3
            }
        ));
    }

    #[test]
    fn terminal_single_heavy_fragment_is_inactive() {
        // A hydroxyl-style branch: one oxygen, nothing else.
        let records = vec![
            carbon(1, 0.0),
            carbon(2, 1.5),
            branch(2, 3),
            atom(3, AtomType::AcceptorOxygen, 2.9, 0.0, 0.0),
            LigandRecord::EndBranch,
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        assert!(!ligand.frames()[1].active);
        assert_eq!(ligand.num_active_torsions(), 0);
    }

    #[test]
    fn multi_heavy_fragment_is_active() {
        let ligand = build_ligand(split_chain(4, 2), &potentials()).unwrap();
        assert!(ligand.frames()[1].active);
        assert_eq!(ligand.num_active_torsions(), 1);
    }

    #[test]
    fn polar_hydrogen_marks_its_hetero_neighbor_as_donor() {
        let records = vec![
            atom(1, AtomType::AcceptorOxygen, 0.0, 0.0, 0.0),
            atom(2, AtomType::PolarHydrogen, 0.95, 0.0, 0.0),
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        assert_eq!(
            ligand.heavy_atoms()[0].atom_type,
            AtomType::DonorAcceptorOxygen
        );
        assert_eq!(ligand.hydrogens().len(), 1);
    }

    #[test]
    fn distant_polar_hydrogen_does_not_donorize() {
        let records = vec![
            atom(1, AtomType::AcceptorOxygen, 0.0, 0.0, 0.0),
            atom(2, AtomType::PolarHydrogen, 5.0, 0.0, 0.0),
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        assert_eq!(ligand.heavy_atoms()[0].atom_type, AtomType::AcceptorOxygen);
    }

    #[test]
    fn carbon_bonded_to_hetero_atom_loses_hydrophobicity() {
        let records = vec![
            carbon(1, 0.0),
            atom(2, AtomType::AcceptorOxygen, 1.4, 0.0, 0.0),
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        assert_eq!(ligand.heavy_atoms()[0].atom_type, AtomType::PolarCarbon);
    }

    #[test]
    fn rotor_carbon_bonded_to_hetero_rotor_y_loses_hydrophobicity_late() {
        // The C-O bond is only discovered when the branch closes.
        let records = vec![
            carbon(1, 0.0),
            carbon(2, 1.5),
            branch(2, 3),
            atom(3, AtomType::AcceptorOxygen, 2.9, 0.0, 0.0),
            LigandRecord::EndBranch,
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        assert_eq!(ligand.heavy_atoms()[1].atom_type, AtomType::PolarCarbon);
        assert_eq!(ligand.heavy_atoms()[0].atom_type, AtomType::HydrophobicCarbon);
    }

    #[test]
    fn unmatched_end_branch_is_rejected() {
        let records = vec![carbon(1, 0.0), LigandRecord::EndBranch];
        let err = build_ligand(records, &potentials()).unwrap_err();
        assert!(matches!(err, TopologyError::UnmatchedEndBranch));
    }

    #[test]
    fn unclosed_branch_is_rejected() {
        let records = vec![carbon(1, 0.0), branch(1, 2), carbon(2, 1.5)];
        let err = build_ligand(records, &potentials()).unwrap_err();
        assert!(matches!(err, TopologyError::UnclosedBranch));
    }

    #[test]
    fn unknown_rotor_serial_is_rejected() {
        let records = vec![carbon(1, 0.0), branch(9, 2), carbon(2, 1.5)];
        let err = build_ligand(records, &potentials()).unwrap_err();
        assert!(matches!(err, TopologyError::RotorAtomNotFound { serial: 9 }));
    }

    #[test]
    fn atom_after_closed_fragment_is_rejected() {
        let mut records = split_chain(4, 2);
        records.push(carbon(9, 20.0));
        let err = build_ligand(records, &potentials()).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::AtomAfterBranchClose { serial: 9 }
        ));
    }

    #[test]
    fn structure_without_heavy_atoms_is_rejected() {
        let err = build_ligand(Vec::<LigandRecord>::new(), &potentials()).unwrap_err();
        assert!(matches!(err, TopologyError::EmptyStructure));
    }

    #[test]
    fn atom_coordinates_are_rebased_onto_frame_origins() {
        let records = vec![
            atom(1, AtomType::HydrophobicCarbon, 1.0, 2.0, 3.0),
            atom(2, AtomType::HydrophobicCarbon, 2.5, 2.0, 3.0),
            branch(2, 3),
            atom(3, AtomType::HydrophobicCarbon, 4.0, 2.0, 3.0),
            atom(4, AtomType::HydrophobicCarbon, 5.5, 2.0, 3.0),
            LigandRecord::EndBranch,
        ];
        let ligand = build_ligand(records, &potentials()).unwrap();
        let heavy = ligand.heavy_atoms();
        // Root origin is C1, child origin is C3.
        assert_eq!(heavy[0].position, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(heavy[1].position, Point3::new(1.5, 0.0, 0.0));
        assert_eq!(heavy[2].position, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(heavy[3].position, Point3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn branch_geometric_constants_are_computed_at_close() {
        let ligand = build_ligand(split_chain(4, 2), &potentials()).unwrap();
        let child = &ligand.frames()[1];
        // rotorY (C3) minus parent rotorY (C1).
        assert_eq!(child.origin_offset, nalgebra::Vector3::new(3.0, 0.0, 0.0));
        // Unit vector from rotorX (C2) to rotorY (C3).
        assert!((child.axis_local - nalgebra::Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }
}
