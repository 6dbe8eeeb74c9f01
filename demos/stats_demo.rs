use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use robin_hash::HashTable;
use robin_hash::hash_table::Entry;

#[derive(Parser, Debug)]
struct Args {
    /// Number of values to insert.
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: u64,

    /// Fraction of the inserted values to erase afterwards, lowest first.
    #[arg(short = 'e', long = "erase_fraction", default_value_t = 0.5)]
    erase_fraction: f64,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    let mut table: HashTable<u64> = HashTable::new();
    println!(
        "Inserting {} values in descending order, starting from {} slots",
        args.count,
        table.slot_count()
    );

    let mut num_failures = 0;
    for value in (0..args.count).rev() {
        let hash = hash_u64(value);
        match table.try_entry(hash, |&v| v == value, |&v| hash_u64(v)) {
            Ok(Entry::Vacant(entry)) => {
                entry.insert(value);
            }
            Ok(Entry::Occupied(_)) => {
                panic!("Value already exists in table: {}", value);
            }
            Err(err) => {
                num_failures += 1;
                eprintln!("failed to insert {value}: {err}");
            }
        }
    }

    println!(
        "Inserted {} values into {} slots ({:.2}% full)",
        table.len(),
        table.slot_count(),
        (table.len() as f64 / table.slot_count() as f64) * 100.0
    );
    table.probe_histogram().print();

    let to_erase = (args.count as f64 * args.erase_fraction.clamp(0.0, 1.0)) as u64;
    let erased = (0..to_erase)
        .filter(|&value| table.remove(hash_u64(value), |&v| v == value).is_some())
        .count();

    println!("Erased {} values, {} remain", erased, table.len());
    table.probe_histogram().print();
    table.debug_stats().print();
    println!("Number of failed insertions: {}", num_failures);
}
