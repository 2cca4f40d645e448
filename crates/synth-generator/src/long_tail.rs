//! Long-tailed vocabularies from a Pitman-Yor (Chinese restaurant) process.
//!
//! [`ChineseRestaurant`] produces an unbounded sequence of table indices
//! whose popularity is long-tailed. With `discount = 0` this is a Dirichlet
//! process and the number of distinct tables grows like `alpha * ln(n)`;
//! with `discount > 0` it grows like `alpha * n^discount`.
//!
//! [`LongTail`] pairs the process with a [`MaterializedVocabulary`] that
//! turns each new table into a concrete item (a word, a domain) the first
//! time it is seen and returns the cached item ever after, which is what
//! makes values repeat realistically.
//!
//! Neither type is synchronized. A vocabulary shared between workers goes
//! behind a `Mutex`.

use crate::generator::GeneratorError;
use rand::rngs::StdRng;
use rand::Rng;

fn check_parameters(alpha: f64, discount: f64) -> Result<(), GeneratorError> {
    synth_core::validate_long_tail("pitman_yor", alpha, discount)
        .map_err(|e| GeneratorError::InvalidParameter(e.to_string()))
}

/// Seating state of a Pitman-Yor process.
///
/// Table occupancies live in a Fenwick tree so a draw costs `O(log k)`
/// while still selecting exactly the first table, in creation order, whose
/// cumulative `count - discount` exceeds the uniform draw.
#[derive(Debug, Clone)]
pub struct ChineseRestaurant {
    alpha: f64,
    discount: f64,
    /// Occupancy per table, in creation order
    counts: Vec<u64>,
    /// 1-based Fenwick tree over `counts`
    tree: Vec<u64>,
    /// Total number of seated draws
    n: u64,
    rng: StdRng,
}

impl ChineseRestaurant {
    /// Create an empty process. Fails when `alpha <= 0` or `discount` is
    /// outside `[0, 1)`.
    pub fn new(alpha: f64, discount: f64, rng: StdRng) -> Result<Self, GeneratorError> {
        check_parameters(alpha, discount)?;
        Ok(Self {
            alpha,
            discount,
            counts: Vec::new(),
            tree: vec![0],
            n: 0,
            rng,
        })
    }

    /// Seat `prior` as pre-existing tables before the first draw.
    ///
    /// Zero entries are raised to one so every primed table can be hit.
    pub fn with_prior(mut self, prior: impl IntoIterator<Item = u64>) -> Self {
        for count in prior {
            self.open_table(count.max(1));
        }
        self
    }

    /// Strength parameter.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Discount parameter.
    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Change the strength. Rejected when not positive.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), GeneratorError> {
        check_parameters(alpha, self.discount)?;
        self.alpha = alpha;
        Ok(())
    }

    /// Change the discount. Rejected when outside `[0, 1)`.
    pub fn set_discount(&mut self, discount: f64) -> Result<(), GeneratorError> {
        check_parameters(self.alpha, discount)?;
        self.discount = discount;
        Ok(())
    }

    /// Number of distinct tables opened so far.
    pub fn table_count(&self) -> usize {
        self.counts.len()
    }

    /// Total number of draws seated so far, including any prior.
    pub fn draws(&self) -> u64 {
        self.n
    }

    /// Occupancy of each table, in creation order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Draw the next table index.
    pub fn sample(&mut self) -> usize {
        let k = self.counts.len();
        let u = self.rng.random::<f64>() * (self.n as f64 + self.alpha);
        let occupied = self.n as f64 - self.discount * k as f64;

        if k > 0 && u < occupied {
            let table = self.find(u).min(k - 1);
            self.increment(table);
            table
        } else {
            self.open_table(1);
            k
        }
    }

    /// First table whose cumulative `count - discount` exceeds `u`.
    fn find(&self, u: f64) -> usize {
        let len = self.counts.len();
        let mut pos = 0usize;
        let mut acc = 0u64;
        let mut step = if len == 0 {
            0
        } else {
            1usize << (usize::BITS - 1 - len.leading_zeros())
        };

        while step > 0 {
            let next = pos + step;
            if next <= len {
                let candidate = acc + self.tree[next];
                if candidate as f64 - self.discount * next as f64 <= u {
                    pos = next;
                    acc = candidate;
                }
            }
            step >>= 1;
        }
        pos
    }

    fn prefix(&self, mut i: usize) -> u64 {
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    fn increment(&mut self, table: usize) {
        self.counts[table] += 1;
        self.n += 1;
        let mut i = table + 1;
        while i < self.tree.len() {
            self.tree[i] += 1;
            i += i & i.wrapping_neg();
        }
    }

    fn open_table(&mut self, count: u64) {
        let i = self.counts.len() + 1;
        let lowbit = i & i.wrapping_neg();
        let covered = self.prefix(i - 1) - self.prefix(i - lowbit);
        self.tree.push(count + covered);
        self.counts.push(count);
        self.n += count;
    }
}

/// Lazily built list of distinct items, index-aligned with the tables of a
/// [`ChineseRestaurant`].
pub struct MaterializedVocabulary<T> {
    items: Vec<T>,
    factory: Box<dyn FnMut(usize) -> T + Send>,
}

impl<T> MaterializedVocabulary<T> {
    /// Create an empty vocabulary that builds item `i` with `factory(i)`.
    pub fn new(factory: impl FnMut(usize) -> T + Send + 'static) -> Self {
        Self {
            items: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// The item for `index`, creating it (and any gap before it) on first use.
    pub fn get_or_create(&mut self, index: usize) -> &T {
        while self.items.len() <= index {
            let next = self.items.len();
            let item = (self.factory)(next);
            self.items.push(item);
        }
        &self.items[index]
    }

    /// Number of items built so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no item has been built yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items built so far, by table index.
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MaterializedVocabulary<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedVocabulary")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

/// A long-tailed sampler over materialized items.
#[derive(Debug)]
pub struct LongTail<T> {
    process: ChineseRestaurant,
    vocabulary: MaterializedVocabulary<T>,
}

impl<T: Clone> LongTail<T> {
    /// Combine a process with a factory for new items.
    pub fn new(
        process: ChineseRestaurant,
        factory: impl FnMut(usize) -> T + Send + 'static,
    ) -> Self {
        Self {
            process,
            vocabulary: MaterializedVocabulary::new(factory),
        }
    }

    /// Draw an item; previously seen tables return their cached item.
    pub fn sample(&mut self) -> T {
        let index = self.process.sample();
        self.vocabulary.get_or_create(index).clone()
    }

    /// Change the strength of the underlying process.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), GeneratorError> {
        self.process.set_alpha(alpha)
    }

    /// Change the discount of the underlying process.
    pub fn set_discount(&mut self, discount: f64) -> Result<(), GeneratorError> {
        self.process.set_discount(discount)
    }

    /// The underlying process.
    pub fn process(&self) -> &ChineseRestaurant {
        &self.process
    }

    /// The items materialized so far.
    pub fn vocabulary(&self) -> &MaterializedVocabulary<T> {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn restaurant(alpha: f64, discount: f64, seed: u64) -> ChineseRestaurant {
        ChineseRestaurant::new(alpha, discount, StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let rng = || StdRng::seed_from_u64(0);
        assert!(ChineseRestaurant::new(0.0, 0.0, rng()).is_err());
        assert!(ChineseRestaurant::new(-1.0, 0.0, rng()).is_err());
        assert!(ChineseRestaurant::new(f64::NAN, 0.0, rng()).is_err());
        assert!(ChineseRestaurant::new(1.0, 1.0, rng()).is_err());
        assert!(ChineseRestaurant::new(1.0, -0.01, rng()).is_err());
        assert!(ChineseRestaurant::new(1.0, 0.99, rng()).is_ok());

        let mut crp = restaurant(1.0, 0.5, 0);
        assert!(matches!(
            crp.set_alpha(0.0),
            Err(GeneratorError::InvalidParameter(_))
        ));
        assert!(crp.set_discount(1.5).is_err());
        assert_eq!(crp.alpha(), 1.0);
        assert_eq!(crp.discount(), 0.5);
        crp.set_alpha(3.0).unwrap();
        crp.set_discount(0.0).unwrap();
        assert_eq!((crp.alpha(), crp.discount()), (3.0, 0.0));
    }

    #[test]
    fn test_counts_sum_to_draws() {
        let mut crp = restaurant(5.0, 0.2, 1);
        for _ in 0..10_000 {
            let t = crp.sample();
            assert!(t < crp.table_count());
        }
        assert_eq!(crp.draws(), 10_000);
        assert_eq!(crp.counts().iter().sum::<u64>(), 10_000);
        assert!(crp.counts().iter().all(|&c| c >= 1));
    }

    #[test]
    fn test_new_tables_are_appended_in_order() {
        let mut crp = restaurant(3.0, 0.4, 2);
        let mut max_seen: Option<usize> = None;
        for _ in 0..5_000 {
            let t = crp.sample();
            match max_seen {
                Some(m) if t <= m => {}
                _ => {
                    assert_eq!(t, max_seen.map_or(0, |m| m + 1));
                    max_seen = Some(t);
                }
            }
        }
    }

    #[test]
    fn test_small_case_probabilities() {
        // alpha = 1, d = 0.5: the second draw joins table 0 with probability
        // (1 - 0.5) / (1 + 1) = 0.25
        let mut rng = StdRng::seed_from_u64(77);
        let trials = 100_000;
        let mut joined = 0;
        for _ in 0..trials {
            let mut crp =
                ChineseRestaurant::new(1.0, 0.5, StdRng::seed_from_u64(rng.random())).unwrap();
            assert_eq!(crp.sample(), 0);
            match crp.sample() {
                0 => joined += 1,
                1 => {}
                other => panic!("second draw returned table {other}"),
            }
        }
        let p = joined as f64 / trials as f64;
        assert!((p - 0.25).abs() < 0.01, "p = {p}");
    }

    #[test]
    fn test_dirichlet_growth_is_logarithmic() {
        let alpha = 1000.0;
        let n = 100_000;
        let mut crp = restaurant(alpha, 0.0, 3);
        for _ in 0..n {
            crp.sample();
        }
        let expected = alpha * (n as f64).ln();
        let k = crp.table_count() as f64;
        assert!(k > 0.2 * expected && k < 1.0 * expected, "k = {k}, alpha ln n = {expected}");

        let mut discounted = restaurant(alpha, 0.3, 3);
        for _ in 0..n {
            discounted.sample();
        }
        assert!(
            discounted.table_count() > crp.table_count(),
            "{} vs {}",
            discounted.table_count(),
            crp.table_count()
        );
    }

    #[test]
    fn test_popularity_is_long_tailed() {
        let mut crp = restaurant(10.0, 0.5, 4);
        for _ in 0..50_000 {
            crp.sample();
        }
        let mut counts = crp.counts().to_vec();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        let singletons = counts.iter().filter(|&&c| c == 1).count();
        assert!(counts[0] > 200, "top table has {}", counts[0]);
        assert!(singletons > counts.len() / 4, "{singletons} of {}", counts.len());
    }

    #[test]
    fn test_prior_seats_tables() {
        let mut crp = restaurant(0.001, 0.0, 5).with_prior([1000, 0, 10]);
        assert_eq!(crp.table_count(), 3);
        assert_eq!(crp.counts(), &[1000, 1, 10]);
        assert_eq!(crp.draws(), 1011);

        let mut hits: HashMap<usize, u32> = HashMap::new();
        for _ in 0..2000 {
            *hits.entry(crp.sample()).or_default() += 1;
        }
        assert!(hits[&0] > hits.get(&2).copied().unwrap_or(0) * 10);
    }

    #[test]
    fn test_long_tail_caches_items() {
        let process = restaurant(2.0, 0.3, 6);
        let mut calls = 0usize;
        let mut tail = LongTail::new(process, move |i| {
            calls += 1;
            format!("item-{i}-{calls}")
        });

        let mut seen: HashMap<String, u32> = HashMap::new();
        for _ in 0..2_000 {
            *seen.entry(tail.sample()).or_default() += 1;
        }

        // each table's item was built exactly once, in index order
        let tables = tail.process().table_count();
        assert_eq!(tail.vocabulary().len(), tables);
        for (i, item) in tail.vocabulary().items().iter().enumerate() {
            assert_eq!(item, &format!("item-{i}-{}", i + 1));
        }
        assert_eq!(seen.len(), tables);
        assert!(seen.values().any(|&c| c > 1));
    }

    #[test]
    fn test_vocabulary_fills_gaps() {
        let mut vocab = MaterializedVocabulary::new(|i| i * 10);
        assert!(vocab.is_empty());
        assert_eq!(*vocab.get_or_create(3), 30);
        assert_eq!(vocab.items(), &[0, 10, 20, 30]);
        assert_eq!(*vocab.get_or_create(1), 10);
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_same_stream_same_sequence() {
        let node = HierarchicalSeedTree::new(8).child("words");
        let mut a = ChineseRestaurant::new(4.0, 0.25, node.random_generator()).unwrap();
        let mut b = ChineseRestaurant::new(4.0, 0.25, node.random_generator()).unwrap();
        let xs: Vec<_> = (0..500).map(|_| a.sample()).collect();
        let ys: Vec<_> = (0..500).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_shared_behind_mutex() {
        let tail = Arc::new(Mutex::new(LongTail::new(restaurant(5.0, 0.1, 9), |i| i)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tail = Arc::clone(&tail);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        tail.lock().unwrap().sample();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let tail = tail.lock().unwrap();
        assert_eq!(tail.process().draws(), 4_000);
    }
}
