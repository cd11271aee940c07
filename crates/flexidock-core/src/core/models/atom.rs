use nalgebra::Point3;

/// Number of heavy-atom interaction types with their own receptor grid map
/// and pairwise potential tables.
pub const NUM_GRID_TYPES: usize = 15;

/// Factor applied to the sum of covalent radii when testing for a bond.
const BOND_TOLERANCE: f64 = 1.1;

/// XScore-style classification of a ligand atom.
///
/// The variant encodes everything the topology builder and the scoring side
/// need to know about an atom: whether it is a hydrogen, whether it is a
/// hetero atom, whether it is currently considered hydrophobic, and whether
/// it donates or accepts hydrogen bonds. Nitrogen and oxygen variants exist
/// in donor/acceptor combinations because donor status is only discovered
/// during topology construction, when a polar hydrogen is attributed to its
/// bonded hetero atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomType {
    /// Nonpolar hydrogen, bonded to carbon.
    Hydrogen,
    /// Polar hydrogen, bonded to a hetero atom; marks that atom as a donor.
    PolarHydrogen,
    /// Carbon with no hetero neighbors.
    HydrophobicCarbon,
    /// Carbon bonded to at least one hetero atom.
    PolarCarbon,
    /// Nitrogen, neither donor nor acceptor.
    PolarNitrogen,
    /// Nitrogen carrying a polar hydrogen.
    DonorNitrogen,
    /// Hydrogen-bond-accepting nitrogen.
    AcceptorNitrogen,
    /// Nitrogen that both donates and accepts.
    DonorAcceptorNitrogen,
    /// Hydrogen-bond-accepting oxygen.
    AcceptorOxygen,
    /// Oxygen that both donates and accepts.
    DonorAcceptorOxygen,
    Sulfur,
    Phosphorus,
    Fluorine,
    Chlorine,
    Bromine,
    Iodine,
    /// Metal ion treated as a hydrogen-bond donor.
    MetalDonor,
}

impl AtomType {
    pub fn is_hydrogen(self) -> bool {
        matches!(self, AtomType::Hydrogen | AtomType::PolarHydrogen)
    }

    pub fn is_polar_hydrogen(self) -> bool {
        self == AtomType::PolarHydrogen
    }

    pub fn is_heavy(self) -> bool {
        !self.is_hydrogen()
    }

    /// Anything that is neither hydrogen nor carbon.
    pub fn is_hetero(self) -> bool {
        !matches!(
            self,
            AtomType::Hydrogen
                | AtomType::PolarHydrogen
                | AtomType::HydrophobicCarbon
                | AtomType::PolarCarbon
        )
    }

    pub fn is_hydrophobic(self) -> bool {
        matches!(
            self,
            AtomType::HydrophobicCarbon
                | AtomType::Fluorine
                | AtomType::Chlorine
                | AtomType::Bromine
                | AtomType::Iodine
        )
    }

    pub fn is_donor(self) -> bool {
        matches!(
            self,
            AtomType::DonorNitrogen
                | AtomType::DonorAcceptorNitrogen
                | AtomType::DonorAcceptorOxygen
                | AtomType::MetalDonor
        )
    }

    /// The type after a polar hydrogen has been attributed to this atom.
    pub fn donorized(self) -> Self {
        match self {
            AtomType::PolarNitrogen => AtomType::DonorNitrogen,
            AtomType::AcceptorNitrogen => AtomType::DonorAcceptorNitrogen,
            AtomType::AcceptorOxygen => AtomType::DonorAcceptorOxygen,
            other => other,
        }
    }

    /// The type after a bond to a hetero atom has been discovered.
    pub fn dehydrophobicized(self) -> Self {
        match self {
            AtomType::HydrophobicCarbon => AtomType::PolarCarbon,
            other => other,
        }
    }

    /// Covalent radius in Angstroms, used by the bonding-distance test.
    pub fn covalent_radius(self) -> f64 {
        match self {
            AtomType::Hydrogen | AtomType::PolarHydrogen => 0.37,
            AtomType::HydrophobicCarbon | AtomType::PolarCarbon => 0.77,
            AtomType::PolarNitrogen
            | AtomType::DonorNitrogen
            | AtomType::AcceptorNitrogen
            | AtomType::DonorAcceptorNitrogen => 0.75,
            AtomType::AcceptorOxygen | AtomType::DonorAcceptorOxygen => 0.73,
            AtomType::Sulfur => 1.02,
            AtomType::Phosphorus => 1.06,
            AtomType::Fluorine => 0.71,
            AtomType::Chlorine => 0.99,
            AtomType::Bromine => 1.14,
            AtomType::Iodine => 1.33,
            AtomType::MetalDonor => 1.36,
        }
    }

    /// Index of this type's receptor grid map and potential-table row.
    ///
    /// # Panics
    ///
    /// Panics for hydrogen variants; hydrogens carry no interaction type and
    /// are never scored against the grids or the pair tables.
    pub fn grid_index(self) -> usize {
        match self {
            AtomType::HydrophobicCarbon => 0,
            AtomType::PolarCarbon => 1,
            AtomType::PolarNitrogen => 2,
            AtomType::DonorNitrogen => 3,
            AtomType::AcceptorNitrogen => 4,
            AtomType::DonorAcceptorNitrogen => 5,
            AtomType::AcceptorOxygen => 6,
            AtomType::DonorAcceptorOxygen => 7,
            AtomType::Sulfur => 8,
            AtomType::Phosphorus => 9,
            AtomType::Fluorine => 10,
            AtomType::Chlorine => 11,
            AtomType::Bromine => 12,
            AtomType::Iodine => 13,
            AtomType::MetalDonor => 14,
            AtomType::Hydrogen | AtomType::PolarHydrogen => {
                panic!("hydrogens carry no grid map type")
            }
        }
    }
}

/// A ligand atom.
///
/// During topology construction `position` holds input (world) coordinates;
/// once the ligand is finalized it holds coordinates relative to the owning
/// frame's rotorY origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number from the input structure, used to resolve rotor atoms.
    pub serial: u32,
    /// Classification of the atom; may be refined during topology building.
    pub atom_type: AtomType,
    /// Coordinates in Angstroms (world during build, frame-local after).
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(serial: u32, atom_type: AtomType, position: Point3<f64>) -> Self {
        Self {
            serial,
            atom_type,
            position,
        }
    }

    pub fn is_hetero(&self) -> bool {
        self.atom_type.is_hetero()
    }

    /// Distance-based covalent bond test against another atom.
    ///
    /// Both positions must be in the same (world) coordinate space; the
    /// builder only calls this before atoms are rebased to frame-local
    /// coordinates.
    pub fn bonded_to(&self, other: &Atom) -> bool {
        let threshold =
            BOND_TOLERANCE * (self.atom_type.covalent_radius() + other.atom_type.covalent_radius());
        (self.position - other.position).norm_squared() < threshold * threshold
    }
}
