use nalgebra::Point3;

/// One docked conformation of a ligand.
///
/// `positions` is parallel to the atom list of the ligand the pose belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Predicted binding affinity in kcal/mol (lower is better).
    pub energy: f64,
    /// RMSD lower bound to the best pose.
    pub rmsd_lb: f64,
    /// RMSD upper bound to the best pose.
    pub rmsd_ub: f64,
    pub positions: Vec<Point3<f64>>,
}

impl Pose {
    pub fn new(energy: f64, positions: Vec<Point3<f64>>) -> Self {
        Self {
            energy,
            rmsd_lb: 0.0,
            rmsd_ub: 0.0,
            positions,
        }
    }
}

/// Selects the poses to report: sorted by energy, at most `num_modes`, and no worse
/// than `energy_range` kcal/mol above the best one.
pub fn select_reported(poses: &[Pose], num_modes: usize, energy_range: f64) -> Vec<&Pose> {
    let mut sorted: Vec<&Pose> = poses.iter().collect();
    sorted.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    let Some(best) = sorted.first().map(|p| p.energy) else {
        return sorted;
    };
    sorted
        .into_iter()
        .take_while(|p| p.energy <= best + energy_range)
        .take(num_modes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(energy: f64) -> Pose {
        Pose::new(energy, vec![])
    }

    #[test]
    fn select_reported_sorts_and_limits_by_count() {
        let poses = vec![pose(-5.0), pose(-7.0), pose(-6.0)];
        let selected = select_reported(&poses, 2, 10.0);
        let energies: Vec<f64> = selected.iter().map(|p| p.energy).collect();
        assert_eq!(energies, vec![-7.0, -6.0]);
    }

    #[test]
    fn select_reported_applies_energy_range() {
        let poses = vec![pose(-9.0), pose(-8.5), pose(-5.9)];
        let selected = select_reported(&poses, 9, 3.0);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn select_reported_handles_empty_input() {
        assert!(select_reported(&[], 9, 3.0).is_empty());
    }
}
