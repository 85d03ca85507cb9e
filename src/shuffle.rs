use rand::Rng;

/// Returns a uniformly shuffled copy of `items` (Fisher-Yates, last index down to 1).
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn shuffle_keeps_elements_and_input() {
        let mut rng = Pcg32::seed_from_u64(7);
        let input: Vec<u32> = (0..20).collect();
        let out = shuffled(&input, &mut rng);
        assert_eq!(input, (0..20).collect::<Vec<_>>());
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, input);
    }

    #[test]
    fn shuffle_handles_tiny_inputs() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(shuffled::<u8, _>(&[], &mut rng).is_empty());
        assert_eq!(shuffled(&[9], &mut rng), vec![9]);
    }

    #[test]
    fn every_position_is_reachable() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen_first = [false; 4];
        for _ in 0..200 {
            let out = shuffled(&[0usize, 1, 2, 3], &mut rng);
            seen_first[out[0]] = true;
        }
        assert!(seen_first.iter().all(|s| *s));
    }
}
