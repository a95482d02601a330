use hashbrown::HashSet;
use ndarray::Array2;

use super::*;

/// Purely random generation: colors from the chosen color space, targets sampled uniformly without replacement.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomGridGenerator {
    seed: u64,
    color_space: ColorSpace,
}

impl RandomGridGenerator {
    pub fn new(seed: u64, color_space: ColorSpace) -> Self {
        Self { seed, color_space }
    }
}

impl GridGenerator for RandomGridGenerator {
    fn generate(self, config: &StageConfig) -> Grid {
        use rand::prelude::*;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let colors = generate_colors(self.color_space, config.color_delta, &mut rng);

        let total_cells = config.total_cells();
        if config.target_count >= total_cells {
            log::warn!(
                "Stage grid has no base cells, requested {} targets but only fits {}",
                config.target_count,
                total_cells
            );
        }
        let wanted = usize::from(config.target_count.min(total_cells));

        let mut target_indices: HashSet<CellCount> = HashSet::with_capacity(wanted);
        while target_indices.len() < wanted {
            target_indices.insert(rng.random_range(0..total_cells));
        }

        let mut target_mask: Array2<bool> =
            Array2::default((config.grid_size, config.grid_size).to_nd_index());
        for &index in &target_indices {
            target_mask[index_to_coords(index, config.grid_size).to_nd_index()] = true;
        }

        log::trace!(
            "generated {}x{} grid, base {}, target {}",
            config.grid_size,
            config.grid_size,
            colors.base,
            colors.target
        );
        Grid::from_target_mask(target_mask, colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_exact_target_count_on_every_standard_stage() {
        for seed in 0..50 {
            for (stage, config) in STANDARD_STAGES.iter().enumerate() {
                let grid = RandomGridGenerator::new(seed, ColorSpace::Rgb).generate(config);

                assert_eq!(grid.side(), config.grid_size, "stage {}", stage);
                assert_eq!(grid.target_count(), config.target_count, "stage {}", stage);

                let targets: Vec<CellCount> = grid.target_indices().collect();
                assert_eq!(targets.len(), usize::from(config.target_count));
                assert!(targets.iter().all(|&i| i < config.total_cells()));

                let cells: Vec<Cell> = grid.cells().collect();
                assert_eq!(cells.len(), usize::from(config.total_cells()));
                for cell in cells {
                    let expected = if cell.is_target {
                        grid.colors().target
                    } else {
                        grid.colors().base
                    };
                    assert_eq!(cell.color, expected);
                }
            }
        }
    }

    #[test]
    fn base_and_target_colors_differ() {
        for seed in 0..50 {
            for config in &STANDARD_STAGES {
                for space in [ColorSpace::Rgb, ColorSpace::Hsl] {
                    let colors = RandomGridGenerator::new(seed, space).generate(config).colors();
                    assert_ne!(colors.base, colors.target);
                }
            }
        }
    }

    #[test]
    fn same_seed_same_grid() {
        let config = StageConfig::new(8, 3, 25);
        let a = RandomGridGenerator::new(42, ColorSpace::Hsl).generate(&config);
        let b = RandomGridGenerator::new(42, ColorSpace::Hsl).generate(&config);
        assert_eq!(a, b);
    }

    #[test]
    fn target_placement_covers_the_grid() {
        let config = StageConfig::new(3, 1, 50);
        let mut seen = [false; 9];
        for seed in 0..500 {
            let grid = RandomGridGenerator::new(seed, ColorSpace::Rgb).generate(&config);
            for index in grid.target_indices() {
                seen[usize::from(index)] = true;
            }
        }
        assert!(seen.iter().all(|&hit| hit));
    }
}
