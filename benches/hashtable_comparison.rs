use core::hash::Hash;
use core::hash::Hasher;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::hash_table::Entry as HashbrownEntry;
use hashbrown::hash_table::HashTable as HashbrownHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use robin_hash::HashTable as RobinHashTable;
use robin_hash::hash_table::Entry as RobinEntry;
use siphasher::sip::SipHasher;

trait KeyValuePair: Clone {
    fn new(key: u64) -> Self;

    fn hash_key(&self) -> u64;
    fn eq_key(&self, other: &Self) -> bool;
}

#[derive(Clone)]
struct TestItem {
    key: String,
    _value: u64,
}

impl KeyValuePair for TestItem {
    fn new(key: u64) -> Self {
        black_box(Self {
            key: format!("key_{:016X}", key),
            _value: key,
        })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[derive(Clone)]
struct SmallTestItem {
    key: u64,
}

impl KeyValuePair for SmallTestItem {
    fn new(key: u64) -> Self {
        black_box(Self { key })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// The operations every benchmark drives, implemented for both tables so each
/// scenario is written once.
trait BenchTable<T: KeyValuePair> {
    const NAME: &'static str;

    fn with_capacity(capacity: usize) -> Self;
    fn capacity(&self) -> usize;
    /// Inserts `item`, or removes the present equal item when `toggle` is set.
    fn upsert(&mut self, hash: u64, item: T, toggle: bool);
    fn find(&self, hash: u64, item: &T) -> Option<&T>;
    fn remove(&mut self, hash: u64, item: &T) -> Option<T>;
    fn iter_count(&self) -> usize;
}

impl<T: KeyValuePair> BenchTable<T> for RobinHashTable<T> {
    const NAME: &'static str = "robin_hash";

    fn with_capacity(capacity: usize) -> Self {
        RobinHashTable::with_capacity(capacity)
    }

    fn capacity(&self) -> usize {
        RobinHashTable::capacity(self)
    }

    fn upsert(&mut self, hash: u64, item: T, toggle: bool) {
        match self.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
            RobinEntry::Vacant(entry) => {
                black_box(entry.insert(item));
            }
            RobinEntry::Occupied(entry) if toggle => {
                black_box(entry.remove());
            }
            RobinEntry::Occupied(mut entry) => {
                *entry.get_mut() = item;
            }
        }
    }

    fn find(&self, hash: u64, item: &T) -> Option<&T> {
        RobinHashTable::find(self, hash, |v| v.eq_key(item))
    }

    fn remove(&mut self, hash: u64, item: &T) -> Option<T> {
        RobinHashTable::remove(self, hash, |v| v.eq_key(item))
    }

    fn iter_count(&self) -> usize {
        self.iter().map(black_box).count()
    }
}

impl<T: KeyValuePair> BenchTable<T> for HashbrownHashTable<T> {
    const NAME: &'static str = "hashbrown";

    fn with_capacity(capacity: usize) -> Self {
        HashbrownHashTable::with_capacity(capacity)
    }

    fn capacity(&self) -> usize {
        HashbrownHashTable::capacity(self)
    }

    fn upsert(&mut self, hash: u64, item: T, toggle: bool) {
        match self.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
            HashbrownEntry::Vacant(entry) => {
                black_box(entry.insert(item));
            }
            HashbrownEntry::Occupied(entry) if toggle => {
                black_box(entry.remove().0);
            }
            HashbrownEntry::Occupied(mut entry) => {
                *entry.get_mut() = item;
            }
        }
    }

    fn find(&self, hash: u64, item: &T) -> Option<&T> {
        HashbrownHashTable::find(self, hash, |v| v.eq_key(item))
    }

    fn remove(&mut self, hash: u64, item: &T) -> Option<T> {
        match self.find_entry(hash, |v| v.eq_key(item)) {
            Ok(entry) => Some(entry.remove().0),
            Err(_) => None,
        }
    }

    fn iter_count(&self) -> usize {
        self.iter().map(black_box).count()
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

fn items<T: KeyValuePair>(keys: impl Iterator<Item = u64>) -> Vec<(u64, T)> {
    keys.map(|key| {
        let item = T::new(key);
        (item.hash_key(), item)
    })
    .collect()
}

fn shuffled<T: Clone>(values: &[T]) -> Vec<T> {
    let mut values = values.to_vec();
    values.shuffle(&mut SmallRng::from_os_rng());
    values
}

fn filled<T: KeyValuePair, B: BenchTable<T>>(size: usize, hash_and_item: &[(u64, T)]) -> B {
    let mut table = B::with_capacity(size);
    let capacity = table.capacity();
    for (hash, item) in hash_and_item.iter().take(capacity).cloned() {
        table.upsert(hash, item, false);
    }
    table
}

fn run_insert_random<T: KeyValuePair, B: BenchTable<T>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
) {
    let mut rng = OsRng;
    let count = B::with_capacity(size).capacity();
    let hash_and_item = items::<T>((0..count).map(|_| rng.try_next_u64().unwrap()));

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function(BenchmarkId::new(B::NAME, size), |b| {
        b.iter_batched(
            || shuffled(&hash_and_item),
            |hash_and_item| {
                let mut table = B::with_capacity(0);
                for (hash, item) in hash_and_item {
                    table.upsert(hash, item, false);
                }
                black_box(table)
            },
            BatchSize::SmallInput,
        )
    });
}

fn run_find<T: KeyValuePair, B: BenchTable<T>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
    miss: bool,
) {
    let count = B::with_capacity(size).capacity() as u64;
    let present = items::<T>((0..count * 2).step_by(2));
    let lookups = if miss {
        items::<T>((1..count * 2).step_by(2))
    } else {
        present.clone()
    };
    let table: B = filled(size, &present);

    group.throughput(Throughput::Elements(count));
    group.bench_function(BenchmarkId::new(B::NAME, size), |b| {
        b.iter_batched(
            || shuffled(&lookups),
            |lookups| {
                for (hash, item) in &lookups {
                    black_box(table.find(*hash, item));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn run_remove<T: KeyValuePair, B: BenchTable<T>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
) {
    let count = B::with_capacity(size).capacity() as u64;
    let hash_and_item = items::<T>(0..count);

    group.throughput(Throughput::Elements(count));
    group.bench_function(BenchmarkId::new(B::NAME, size), |b| {
        b.iter_batched(
            || {
                let table: B = filled(size, &hash_and_item);
                (table, shuffled(&hash_and_item))
            },
            |(mut table, removals)| {
                for (hash, item) in &removals {
                    black_box(table.remove(*hash, item));
                }
                black_box(table)
            },
            BatchSize::SmallInput,
        )
    });
}

fn run_iteration<T: KeyValuePair, B: BenchTable<T>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
) {
    let count = B::with_capacity(size).capacity() as u64;
    let table: B = filled(size, &items::<T>(0..count));

    group.throughput(Throughput::Elements(count));
    group.bench_function(BenchmarkId::new(B::NAME, size), |b| {
        b.iter(|| black_box(table.iter_count()))
    });
}

fn run_churn<T: KeyValuePair, B: BenchTable<T>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
) {
    let count = B::with_capacity(size).capacity() as u64;
    let insertions_and_removals = items::<T>((0..count).flat_map(|key| [key, key]));

    group.throughput(Throughput::Elements(count * 2));
    group.bench_function(BenchmarkId::new(B::NAME, size), |b| {
        b.iter_batched(
            || shuffled(&insertions_and_removals),
            |hash_and_item| {
                let mut table = B::with_capacity(0);
                for (hash, item) in hash_and_item {
                    table.upsert(hash, item, true);
                }
                black_box(table)
            },
            BatchSize::SmallInput,
        )
    });
}

#[derive(Clone, Copy)]
enum Operation {
    Insert,
    Remove,
    Find,
}

fn run_mixed_zipf<T: KeyValuePair, B: BenchTable<T>>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    size: usize,
    exponent: f64,
) {
    const KEY_SPACE_MULTIPLIER: f32 = 2.0;

    let count = B::with_capacity(size).capacity();
    let mut rng = SmallRng::from_os_rng();
    let op_distr = Zipf::new(3.0, exponent).unwrap();
    let operations = (0..count * 3)
        .map(|_| {
            let op_choice: f64 = rng.sample(op_distr);
            if op_choice <= 1.0 {
                Operation::Find
            } else if op_choice <= 2.0 {
                Operation::Insert
            } else {
                Operation::Remove
            }
        })
        .collect::<Vec<Operation>>();

    let insert_distr = Zipf::new(count as f32 - 1.0, 1.0).unwrap();
    let find_remove_distr = Zipf::new(count as f32 * KEY_SPACE_MULTIPLIER - 1.0, 1.0).unwrap();

    group.throughput(Throughput::Elements(count as u64 * 3));
    group.bench_function(BenchmarkId::new(B::NAME, size), |b| {
        b.iter_batched(
            || shuffled(&operations),
            |operations| {
                let mut table = B::with_capacity(0);
                for operation in operations {
                    match operation {
                        Operation::Insert => {
                            let item = T::new(rng.sample(insert_distr) as u64);
                            table.upsert(item.hash_key(), item, false);
                        }
                        Operation::Remove => {
                            let item = T::new(rng.sample(find_remove_distr) as u64);
                            black_box(table.remove(item.hash_key(), &item));
                        }
                        Operation::Find => {
                            let item = T::new(rng.sample(find_remove_distr) as u64);
                            black_box(table.find(item.hash_key(), &item));
                        }
                    }
                }
                black_box(table)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_random<T: KeyValuePair>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_random_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &size in SIZES {
        run_insert_random::<T, RobinHashTable<T>>(&mut group, size);
        run_insert_random::<T, HashbrownHashTable<T>>(&mut group, size);
    }
    group.finish();
}

fn bench_find_hit<T: KeyValuePair>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_hit_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &size in SIZES {
        run_find::<T, RobinHashTable<T>>(&mut group, size, false);
        run_find::<T, HashbrownHashTable<T>>(&mut group, size, false);
    }
    group.finish();
}

fn bench_find_miss<T: KeyValuePair>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_miss_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &size in SIZES {
        run_find::<T, RobinHashTable<T>>(&mut group, size, true);
        run_find::<T, HashbrownHashTable<T>>(&mut group, size, true);
    }
    group.finish();
}

fn bench_remove<T: KeyValuePair>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("remove_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &size in SIZES {
        run_remove::<T, RobinHashTable<T>>(&mut group, size);
        run_remove::<T, HashbrownHashTable<T>>(&mut group, size);
    }
    group.finish();
}

fn bench_iteration<T: KeyValuePair>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &size in SIZES {
        run_iteration::<T, RobinHashTable<T>>(&mut group, size);
        run_iteration::<T, HashbrownHashTable<T>>(&mut group, size);
    }
    group.finish();
}

fn bench_churn<T: KeyValuePair>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("churn_{}", core::any::type_name::<T>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &size in SIZES {
        run_churn::<T, RobinHashTable<T>>(&mut group, size);
        run_churn::<T, HashbrownHashTable<T>>(&mut group, size);
    }
    group.finish();
}

fn bench_mixed_probabilistic_zipf<T: KeyValuePair>(c: &mut Criterion) {
    for exponent in [1.0, 1.3] {
        let mut group = c.benchmark_group(format!(
            "mixed_probabilistic_zipf_{:.01}_{}",
            exponent,
            core::any::type_name::<T>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
        for &size in SIZES {
            run_mixed_zipf::<T, RobinHashTable<T>>(&mut group, size, exponent);
            run_mixed_zipf::<T, HashbrownHashTable<T>>(&mut group, size, exponent);
        }
        group.finish();
    }
}

criterion_group!(
    benches,
    bench_insert_random::<SmallTestItem>,
    bench_insert_random::<TestItem>,
    bench_find_hit::<SmallTestItem>,
    bench_find_hit::<TestItem>,
    bench_find_miss::<SmallTestItem>,
    bench_find_miss::<TestItem>,
    bench_remove::<SmallTestItem>,
    bench_remove::<TestItem>,
    bench_iteration::<SmallTestItem>,
    bench_iteration::<TestItem>,
    bench_churn::<SmallTestItem>,
    bench_churn::<TestItem>,
    bench_mixed_probabilistic_zipf::<SmallTestItem>,
    bench_mixed_probabilistic_zipf::<TestItem>,
);

criterion_main!(benches);
