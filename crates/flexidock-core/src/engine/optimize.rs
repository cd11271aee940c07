use crate::core::forcefield::grid::ReceptorGrids;
use crate::core::forcefield::potentials::PairPotentials;
use crate::core::models::ligand::{Conformation, Ligand};
use crate::core::utils::geometry;
use crate::engine::evaluate::evaluate;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Step multipliers tried per line search, starting at 1.0.
const NUM_LINE_SEARCH_TRIALS: usize = 5;
/// Backtracking factor between consecutive step multipliers.
const STEP_SHRINK: f64 = 0.1;
/// Armijo sufficient-decrease coefficient.
const ARMIJO_C1: f64 = 1e-4;
/// Weak-Wolfe curvature coefficient.
const CURVATURE_C2: f64 = 0.9;
/// Conformations whose energy reaches this bound times the heavy-atom count
/// are rejected without finishing the evaluation.
const ENERGY_BOUND_PER_HEAVY_ATOM: f64 = 40.0;

/// Flat offset of element `(i, j)`, `i <= j`, in the upper-triangular
/// packing of a symmetric matrix.
#[inline]
fn tri(i: usize, j: usize) -> usize {
    debug_assert!(i <= j);
    i + j * (j + 1) / 2
}

#[inline]
fn tri_sym(i: usize, j: usize) -> usize {
    if i <= j { tri(i, j) } else { tri(j, i) }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// One independent basin-hopping trial; returns the best conformation found.
///
/// The trial draws a random starting pose inside the receptor box, then runs
/// `num_generations` rounds of root-position perturbation followed by BFGS
/// refinement. A refined pose replaces the incumbent only when its energy
/// strictly improves; the historical naming of this rule as a Metropolis
/// criterion is misleading, acceptance is deterministic and greedy.
///
/// All randomness comes from a generator seeded with `seed`, and every
/// floating-point reduction has a fixed order, so repeated calls with equal
/// inputs reproduce the same result bit for bit.
pub fn run_trial(
    ligand: &Ligand,
    potentials: &PairPotentials,
    grids: &ReceptorGrids,
    seed: u64,
    num_generations: usize,
) -> Conformation {
    let mut rng = StdRng::seed_from_u64(seed);
    let num_coordinates = ligand.num_coordinates();
    let num_variables = ligand.num_variables();
    let num_torsions = ligand.num_active_torsions();
    let energy_bound = ENERGY_BOUND_PER_HEAVY_ATOM * ligand.heavy_atoms().len() as f64;

    // Random starting pose: position inside the box, orientation uniform on
    // the quaternion sphere via normalization of a point in the 4-cube,
    // torsions in [-1, 1] radians.
    let mut x0 = vec![0.0; num_coordinates];
    let center = grids.center();
    let size = grids.size();
    for d in 0..3 {
        x0[d] = center[d] + rng.gen_range(-1.0..1.0) * size[d];
    }
    let raw = Quaternion::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    geometry::store_orientation(&mut x0, &UnitQuaternion::from_quaternion(raw));
    for t in 0..num_torsions {
        x0[7 + t] = rng.gen_range(-1.0..1.0);
    }

    let mut g0 = vec![0.0; num_variables];
    let mut e0 = evaluate(ligand, &x0, potentials, grids, f64::INFINITY, &mut g0)
        .unwrap_or(f64::INFINITY);
    let mut best = ligand.compose_conformation(e0, &x0);

    // Scratch reused across generations.
    let mut x1 = vec![0.0; num_coordinates];
    let mut x2 = vec![0.0; num_coordinates];
    let mut g1 = vec![0.0; num_variables];
    let mut g2 = vec![0.0; num_variables];
    let mut p = vec![0.0; num_variables];
    let mut y = vec![0.0; num_variables];
    let mut mhy = vec![0.0; num_variables];
    let mut h = vec![0.0; num_variables * (num_variables + 1) / 2];

    for _ in 0..num_generations {
        x1.copy_from_slice(&x0);
        for d in 0..3 {
            x1[d] += rng.gen_range(-1.0..1.0);
        }
        let Some(mut e1) = evaluate(ligand, &x1, potentials, grids, energy_bound, &mut g1)
        else {
            continue;
        };

        h.fill(0.0);
        for i in 0..num_variables {
            h[tri(i, i)] = 1.0;
        }

        loop {
            for i in 0..num_variables {
                let mut sum = 0.0;
                for j in 0..num_variables {
                    sum += h[tri_sym(i, j)] * g1[j];
                }
                p[i] = -sum;
            }
            let pg1 = dot(&p, &g1);

            let mut alpha = 1.0;
            let mut accepted = None;
            for _ in 0..NUM_LINE_SEARCH_TRIALS {
                for d in 0..3 {
                    x2[d] = x1[d] + alpha * p[d];
                }
                let step =
                    geometry::from_rotation_vector(&(alpha * Vector3::new(p[3], p[4], p[5])));
                geometry::store_orientation(&mut x2, &(step * geometry::orientation_of(&x1)));
                for t in 0..num_torsions {
                    x2[7 + t] = x1[7 + t] + alpha * p[6 + t];
                }
                let sufficient_decrease = e1 + ARMIJO_C1 * alpha * pg1;
                if let Some(e2) =
                    evaluate(ligand, &x2, potentials, grids, sufficient_decrease, &mut g2)
                {
                    if dot(&p, &g2) >= CURVATURE_C2 * pg1 {
                        accepted = Some((e2, alpha));
                        break;
                    }
                }
                alpha *= STEP_SHRINK;
            }
            let Some((e2, alpha)) = accepted else {
                break;
            };

            for i in 0..num_variables {
                y[i] = g2[i] - g1[i];
            }
            let yp = dot(&y, &p);
            x1.copy_from_slice(&x2);
            e1 = e2;
            g1.copy_from_slice(&g2);
            // A vanishing curvature denominator ends the refinement with the
            // accepted step kept.
            if yp == 0.0 {
                break;
            }
            for i in 0..num_variables {
                let mut sum = 0.0;
                for j in 0..num_variables {
                    sum += h[tri_sym(i, j)] * y[j];
                }
                mhy[i] = -sum;
            }
            let yhy = -dot(&y, &mhy);
            let ryp = 1.0 / yp;
            let pco = ryp * (ryp * yhy + alpha);
            for j in 0..num_variables {
                for i in 0..=j {
                    h[tri(i, j)] +=
                        ryp * (mhy[i] * p[j] + mhy[j] * p[i]) + pco * p[i] * p[j];
                }
            }
        }

        if e1 < e0 {
            best = ligand.compose_conformation(e1, &x1);
            x0.copy_from_slice(&x1);
            e0 = e1;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, AtomType, NUM_GRID_TYPES};
    use crate::core::models::builder::{LigandRecord, build_ligand};
    use nalgebra::Point3;

    fn short_potentials() -> PairPotentials {
        // Cutoff below any bond length so the pair term never fires.
        PairPotentials::zeroed(NUM_GRID_TYPES, 16, 1.0)
    }

    /// Root C1-C2 with a branch to C3-C4; one active torsion.
    fn two_fragment_ligand() -> Ligand {
        let records = vec![
            LigandRecord::Atom(Atom::new(
                1,
                AtomType::HydrophobicCarbon,
                Point3::new(0.0, 0.0, 0.0),
            )),
            LigandRecord::Atom(Atom::new(
                2,
                AtomType::HydrophobicCarbon,
                Point3::new(1.5, 0.0, 0.0),
            )),
            LigandRecord::Branch {
                rotor_x_serial: 2,
                rotor_y_serial: 3,
            },
            LigandRecord::Atom(Atom::new(
                3,
                AtomType::HydrophobicCarbon,
                Point3::new(3.0, 0.0, 0.0),
            )),
            LigandRecord::Atom(Atom::new(
                4,
                AtomType::HydrophobicCarbon,
                Point3::new(4.5, 0.0, 0.0),
            )),
            LigandRecord::EndBranch,
        ];
        build_ligand(records, &short_potentials()).unwrap()
    }

    fn flat_grids(value: f64) -> ReceptorGrids {
        let mut grids = ReceptorGrids::new(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(20.0, 20.0, 20.0),
            1.0,
        );
        grids.fill_uniform(value);
        grids
    }

    #[test]
    fn equal_seeds_reproduce_the_same_result() {
        let ligand = two_fragment_ligand();
        let potentials = short_potentials();
        let grids = flat_grids(0.0);
        let a = run_trial(&ligand, &potentials, &grids, 42, 20);
        let b = run_trial(&ligand, &potentials, &grids, 42, 20);
        assert_eq!(a.energy, b.energy);
        assert_eq!(a.heavy_coords, b.heavy_coords);
    }

    #[test]
    fn flat_energy_landscape_never_improves_on_the_start() {
        // Every in-bounds sample equals the out-of-bounds penalty and the
        // pair term is silent, so energy is 10 per heavy atom everywhere and
        // the gradient is identically zero. No refinement or perturbation
        // can strictly improve, so the best stays at the starting energy.
        let ligand = two_fragment_ligand();
        let potentials = short_potentials();
        let grids = flat_grids(10.0);
        for seed in 0..8 {
            let best = run_trial(&ligand, &potentials, &grids, seed, 30);
            assert_eq!(best.energy, 40.0);
        }
    }

    #[test]
    fn accepted_energies_never_exceed_the_initial_energy() {
        // A linear ramp along x gives a constant nonzero gradient, so the
        // optimizer has a direction to follow. Reconstruct the starting
        // pose by replaying the seeded draw sequence and verify the trial
        // never reports a best above its own start.
        let ligand = two_fragment_ligand();
        let potentials = short_potentials();
        let mut grids = ReceptorGrids::new(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(20.0, 20.0, 20.0),
            1.0,
        );
        let [sx, sy, sz] = grids.strides();
        let samples = grids.samples_per_map();
        let mut map = vec![0.0; samples];
        for iz in 0..samples / sz {
            for iy in 0..sz / sy {
                for ix in 0..sy / sx {
                    map[sz * iz + sy * iy + ix] = 0.1 * ix as f64;
                }
            }
        }
        for type_index in 0..NUM_GRID_TYPES {
            grids.set_map(type_index, map.clone());
        }

        let seed = 7;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x0 = vec![0.0; ligand.num_coordinates()];
        for d in 0..3 {
            x0[d] = rng.gen_range(-1.0..1.0) * 20.0;
        }
        let raw = Quaternion::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        geometry::store_orientation(&mut x0, &UnitQuaternion::from_quaternion(raw));
        for t in 0..ligand.num_active_torsions() {
            x0[7 + t] = rng.gen_range(-1.0..1.0);
        }
        let mut g0 = vec![0.0; ligand.num_variables()];
        let e0 = evaluate(&ligand, &x0, &potentials, &grids, f64::INFINITY, &mut g0).unwrap();

        let best = run_trial(&ligand, &potentials, &grids, seed, 50);
        assert!(best.energy <= e0);
    }
}
