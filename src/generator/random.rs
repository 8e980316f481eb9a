use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::*;

/// Shuffle-based mine placement: collect every eligible coordinate, partially
/// shuffle, take the first `mines`. Terminates unconditionally and samples
/// layouts uniformly, unlike rejection sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    safe_zone: SafeZone,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, safe_zone: SafeZone) -> Self {
        Self { seed, safe_zone }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig, first_reveal: Coord2) -> Minefield {
        let zone = effective_zone(self.safe_zone, config, first_reveal);
        let excluded = zone_cells(zone, config.size, first_reveal);

        let mut eligible: Vec<Coord2> = Vec::with_capacity(config.total_cells().into());
        for x in 0..config.size.0 {
            for y in 0..config.size.1 {
                if !excluded.contains(&(x, y)) {
                    eligible.push((x, y));
                }
            }
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (picked, _) = eligible.partial_shuffle(&mut rng, config.mines.into());

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for &coords in picked.iter() {
            mine_mask[coords.to_nd_index()] = true;
        }

        let field = Minefield::from_mine_mask(mine_mask);
        debug_assert_eq!(field.mine_count(), config.mines);
        log::debug!(
            "placed {} mines on {:?} board, safe zone {:?} around {:?}",
            field.mine_count(),
            config.size,
            zone,
            first_reveal
        );
        field
    }
}

/// Shrinks the requested safe zone when the mines would not fit outside it.
/// The fallback is deterministic: `Neighborhood` degrades to `ClickedOnly`,
/// which always fits for a validated config.
fn effective_zone(requested: SafeZone, config: GameConfig, first_reveal: Coord2) -> SafeZone {
    match requested {
        SafeZone::ClickedOnly => SafeZone::ClickedOnly,
        SafeZone::Neighborhood => {
            let zone_len = zone_cells(SafeZone::Neighborhood, config.size, first_reveal).len();
            let free = config.total_cells() - zone_len as CellCount;
            if free < config.mines {
                log::warn!(
                    "cannot keep the 3x3 neighborhood of {:?} mine-free ({} mines, {} cells outside it), falling back to the clicked cell only",
                    first_reveal,
                    config.mines,
                    free
                );
                SafeZone::ClickedOnly
            } else {
                SafeZone::Neighborhood
            }
        }
    }
}

fn zone_cells(zone: SafeZone, size: Coord2, first_reveal: Coord2) -> Vec<Coord2> {
    let mut cells = vec![first_reveal];
    if matches!(zone, SafeZone::Neighborhood) {
        cells.extend(neighbors(first_reveal, size));
    }
    cells
}
