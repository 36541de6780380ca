use chain_map::Config;
use chain_map::FoldBucketHasher;
use chain_map::HashMap;
use chain_map::RehashMode;
use clap::Parser;
use clap::ValueEnum;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Hasher {
    Polynomial,
    Fold,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: usize,

    #[arg(short = 'b', long = "initial_buckets", default_value_t = 16)]
    initial_buckets: usize,

    #[arg(long = "hasher", value_enum, default_value_t = Hasher::Polynomial)]
    hasher: Hasher,

    /// Move whole chains by their head key on growth.
    #[arg(long = "whole_chain")]
    whole_chain: bool,

    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,
}

fn random_key(rng: &mut SmallRng) -> String {
    let len = rng.random_range(1..=12);
    (0..len)
        .map(|_| rng.random_range(b'a'..=b'z') as char)
        .collect()
}

fn fill<H: chain_map::BucketHasher>(map: &mut HashMap<u64, H>, args: &Args) {
    let mut rng = SmallRng::seed_from_u64(args.seed);
    for i in 0..args.count {
        let key = random_key(&mut rng);
        map.set(&key, i as u64)
            .unwrap_or_else(|e| panic!("failed to insert {key:?}: {e}"));
    }
}

fn report<H: chain_map::BucketHasher>(map: &HashMap<u64, H>, count: usize) {
    println!("Inserted {} keys ({} distinct)", count, map.len());
    println!(
        "Final load factor: {:.2}% over {} buckets",
        map.load_factor() * 100.0,
        map.bucket_count()
    );

    map.chain_histogram().print();
    map.debug_stats().print();

    let unreachable = map.iter().filter(|(key, _)| !map.has(key)).count();
    println!(
        "Unreachable keys: {} ({:.02}%)",
        unreachable,
        unreachable as f64 / map.len().max(1) as f64 * 100.0
    );
}

fn main() {
    let args = Args::parse();

    let rehash = if args.whole_chain {
        RehashMode::WholeChain
    } else {
        RehashMode::PerEntry
    };
    let config = Config::default()
        .initial_buckets(args.initial_buckets)
        .rehash(rehash);

    println!(
        "Creating HashMap with {} initial buckets, {:?} hasher, {:?} rehash",
        args.initial_buckets, args.hasher, rehash
    );

    match args.hasher {
        Hasher::Polynomial => {
            let mut map = match HashMap::with_config(config) {
                Ok(map) => map,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            fill(&mut map, &args);
            report(&map, args.count);
        }
        Hasher::Fold => {
            let hasher = FoldBucketHasher::with_seed(args.seed);
            let mut map = match HashMap::with_config_and_hasher(config, hasher) {
                Ok(map) => map,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            fill(&mut map, &args);
            report(&map, args.count);
        }
    }
}
