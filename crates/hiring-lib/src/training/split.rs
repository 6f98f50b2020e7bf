//! Seeded train/holdout partitioning

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Number of holdout rows for `n` rows; always leaves at least one row to train on
pub fn holdout_size(n: usize, test_size: f64) -> usize {
    if n < 2 {
        return 0;
    }
    let wanted = (n as f64 * test_size.clamp(0.0, 1.0)).round() as usize;
    wanted.min(n - 1)
}

/// Shuffle with a fixed seed and split off `test_size` of the rows.
///
/// With `stratify`, each class contributes to the holdout in proportion to
/// its share of the data.
pub fn train_holdout_split(labels: &[bool], test_size: f64, stratify: bool, seed: u64) -> Partition {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = labels.len();
    let n_holdout = holdout_size(n, test_size);

    if !stratify {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_holdout);
        return Partition {
            train,
            holdout: indices,
        };
    }

    let mut classes: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        classes[usize::from(label)].push(i);
    }

    // Largest-remainder allocation of holdout slots across the two classes
    let exact: Vec<f64> = classes
        .iter()
        .map(|c| n_holdout as f64 * c.len() as f64 / n.max(1) as f64)
        .collect();
    let mut quota: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_holdout - quota.iter().sum::<usize>();
    let mut order = [0usize, 1];
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });
    for &c in order.iter().cycle().take(4) {
        if remaining == 0 {
            break;
        }
        if quota[c] < classes[c].len() {
            quota[c] += 1;
            remaining -= 1;
        }
    }

    let mut train = Vec::with_capacity(n - n_holdout);
    let mut holdout = Vec::with_capacity(n_holdout);
    for (class, q) in classes.iter_mut().zip(&quota) {
        class.shuffle(&mut rng);
        holdout.extend_from_slice(&class[..*q]);
        train.extend_from_slice(&class[*q..]);
    }
    train.shuffle(&mut rng);
    holdout.shuffle(&mut rng);

    Partition { train, holdout }
}
