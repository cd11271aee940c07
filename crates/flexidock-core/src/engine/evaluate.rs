use crate::core::forcefield::grid::ReceptorGrids;
use crate::core::forcefield::potentials::PairPotentials;
use crate::core::models::ligand::Ligand;
use crate::core::utils::geometry;
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Energy charged to each heavy atom outside the receptor lattice. Such an
/// atom contributes no gradient, so nothing pushes it back toward the box;
/// a known source of search stagnation near the boundary, kept for result
/// compatibility.
pub const OUT_OF_BOUNDS_PENALTY: f64 = 10.0;

/// Computes the energy of one candidate conformation and its gradient over
/// the generalized coordinates.
///
/// Runs the forward-kinematics pass over heavy atoms, accumulates the
/// per-atom grid term and the tabulated intramolecular pair term, then
/// back-propagates per-atom forces through the frame tree in decreasing
/// index order, projecting each active frame's aggregate torque onto its
/// rotation axis to obtain the torsion gradient. The root frame's aggregate
/// force and torque become the first six gradient slots (a small-angle
/// linearization of the quaternion orientation).
///
/// Returns `None` as soon as the running energy reaches `energy_upper_bound`;
/// the gradient buffer is then meaningless for any pairs left unevaluated.
///
/// The grid term reads the energy at the lower corner of the containing cell
/// and approximates each gradient component as the forward finite difference
/// to the neighboring corner along that axis. This is deliberately not full
/// trilinear interpolation (4 of 8 corner samples are touched) and must not
/// be upgraded without breaking result compatibility.
pub fn evaluate(
    ligand: &Ligand,
    x: &[f64],
    potentials: &PairPotentials,
    grids: &ReceptorGrids,
    energy_upper_bound: f64,
    gradient: &mut [f64],
) -> Option<f64> {
    let frames = ligand.frames();
    let heavy_atoms = ligand.heavy_atoms();
    let num_frames = frames.len();
    let num_heavy = heavy_atoms.len();
    debug_assert_eq!(x.len(), ligand.num_coordinates());
    debug_assert_eq!(gradient.len(), ligand.num_variables());

    // Per-frame pose and per-atom scratch for this conformation.
    let mut origins = vec![Point3::origin(); num_frames];
    let mut axes = vec![Vector3::zeros(); num_frames];
    let mut orientations = vec![UnitQuaternion::identity(); num_frames];
    let mut coords = vec![Point3::origin(); num_heavy];
    let mut derivs = vec![Vector3::zeros(); num_heavy];

    origins[0] = Point3::new(x[0], x[1], x[2]);
    orientations[0] = geometry::orientation_of(x);

    // Forward pass: parents precede children in index order.
    let mut torsion = 0;
    for k in 0..num_frames {
        let frame = &frames[k];
        let rotation = orientations[k].to_rotation_matrix();
        for i in frame.heavy_atom_indices() {
            coords[i] = origins[k] + rotation * heavy_atoms[i].position.coords;
        }
        for &c in &frame.children {
            let child = &frames[c];
            origins[c] = origins[k] + rotation * child.origin_offset;
            if !child.active {
                orientations[c] = orientations[k];
                continue;
            }
            let axis = rotation * child.axis_local;
            orientations[c] = geometry::axis_angle(&axis, x[7 + torsion]) * orientations[k];
            axes[c] = axis;
            torsion += 1;
        }
    }
    debug_assert_eq!(torsion, ligand.num_active_torsions());

    // Per-atom receptor grid term.
    let mut energy = 0.0;
    let [sx, sy, sz] = grids.strides();
    let granularity_inverse = grids.granularity_inverse();
    for i in 0..num_heavy {
        if !grids.contains(&coords[i]) {
            energy += OUT_OF_BOUNDS_PENALTY;
            derivs[i] = Vector3::zeros();
            continue;
        }
        let map = grids.map(heavy_atoms[i].atom_type.grid_index());
        let o000 = grids.flat_index(grids.probe_index(&coords[i]));
        let e000 = map[o000];
        derivs[i] = Vector3::new(
            (map[o000 + sx] - e000) * granularity_inverse,
            (map[o000 + sy] - e000) * granularity_inverse,
            (map[o000 + sz] - e000) * granularity_inverse,
        );
        energy += e000;
    }
    if energy >= energy_upper_bound {
        return None;
    }

    // Intramolecular pair term, short-circuited once the bound is reached.
    for pair in ligand.interacting_pairs() {
        let r = coords[pair.second] - coords[pair.first];
        let r_sq = r.norm_squared();
        if r_sq < potentials.cutoff_sq() {
            let offset = pair.table_offset + potentials.bin(r_sq);
            energy += potentials.energy_at(offset);
            let derivative = potentials.derivative_at(offset) * r;
            derivs[pair.first] -= derivative;
            derivs[pair.second] += derivative;
            if energy >= energy_upper_bound {
                return None;
            }
        }
    }

    // Reverse pass: aggregate forces and torques from children toward the
    // root, with the lever-arm correction for each frame-to-parent hop.
    let mut forces = vec![Vector3::zeros(); num_frames];
    let mut torques = vec![Vector3::zeros(); num_frames];
    let mut torsion = ligand.num_active_torsions();
    for k in (1..num_frames).rev() {
        let frame = &frames[k];
        for i in frame.heavy_atom_indices() {
            forces[k] += derivs[i];
            torques[k] += (coords[i] - origins[k]).cross(&derivs[i]);
        }
        let force = forces[k];
        let torque = torques[k];
        forces[frame.parent] += force;
        torques[frame.parent] += torque + (origins[k] - origins[frame.parent]).cross(&force);
        if frame.active {
            torsion -= 1;
            gradient[6 + torsion] = torque.dot(&axes[k]);
        }
    }
    let root = &frames[0];
    for i in root.heavy_atom_indices() {
        forces[0] += derivs[i];
        torques[0] += (coords[i] - origins[0]).cross(&derivs[i]);
    }
    gradient[0] = forces[0].x;
    gradient[1] = forces[0].y;
    gradient[2] = forces[0].z;
    gradient[3] = torques[0].x;
    gradient[4] = torques[0].y;
    gradient[5] = torques[0].z;

    Some(energy)
}
