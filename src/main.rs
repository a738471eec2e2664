use std::{error::Error, fs, process};

use cachesim::{
    trace::{Access, Trace},
    AccessTraceEntry, Cache, CacheStats, HierarchyConfig,
};
use env_logger::Env;
use log::{error, info, warn};
use serde::Serialize;

#[derive(Serialize)]
struct LevelHistory<'a> {
    name: &'a str,
    entries: Vec<AccessTraceEntry>,
}

/// Hands out monotonically increasing cycles to the access stream.
#[derive(Debug, Default)]
struct Clock {
    last: Option<u64>,
    accesses: u64,
}

impl Clock {
    fn next(&mut self, access: &Access) -> u64 {
        let implicit = self.last.map_or(0, |c| c + 1);
        let cycle = match (access.cycle, self.last) {
            (Some(cycle), Some(last)) if cycle < last => {
                warn!("cycle {cycle} goes backwards, treating it as cycle {last}");
                last
            }
            (Some(cycle), _) => cycle,
            (None, _) => implicit,
        };
        self.last = Some(cycle);
        self.accesses += 1;
        cycle
    }
}

fn main() {
    let env = Env::default()
        .filter_or("CACHESIM_LOG", "info")
        .write_style_or("CACHESIM_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    if let Err(err) = run() {
        error!("{err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = pico_args::Arguments::from_env();
    let n_warm: u64 = args.opt_value_from_str("-w")?.unwrap_or(0);
    let heartbeat_int: u64 = args.opt_value_from_str("-h")?.unwrap_or(0);
    let seed: Option<u64> = args.opt_value_from_str("--seed")?;

    let config_str: String = match args.opt_value_from_str("--config")? {
        Some(config_str) => config_str,
        None => {
            let config_path: String = args
                .opt_value_from_str("-p")?
                .ok_or("must provide a config with --config <json> or -p <path>")?;
            fs::read_to_string(config_path)?
        }
    };
    let config: HierarchyConfig = serde_json::from_str(&config_str)?;
    let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    let mut cache = config.build(&mut rng)?;

    let stats_path: String = args
        .opt_value_from_str("--json")?
        .ok_or("must provide output path with --json")?;
    let history_path: Option<String> = args.opt_value_from_str("--history")?;
    let trace_path: String = args
        .opt_value_from_str("-t")?
        .ok_or("must provide a trace with -t")?;
    let accesses_per_block: usize = args
        .opt_value_from_str("--buffer-size")?
        .unwrap_or(1024 * 16);
    let blocks_per_queue: usize = args.opt_value_from_str("--queue-size")?.unwrap_or(32);

    let trace = Trace::read(trace_path.into(), accesses_per_block, blocks_per_queue)?;

    let mut clock = Clock::default();
    let mut warmup = n_warm > 0;
    let mut next_heartbeat = heartbeat_int;
    for block in trace.rec.iter() {
        for access in block? {
            let cycle = clock.next(&access);
            cache.access(access.address, access.kind, cycle);

            if warmup && clock.accesses >= n_warm {
                cache.clear_stats();
                warmup = false;
                info!("Finished warmup after {} accesses", clock.accesses);
            }
            if heartbeat_int != 0 && clock.accesses >= next_heartbeat {
                info!(
                    "Accesses: {} (L1 hit rate {:.4})",
                    clock.accesses,
                    cache.hit_rate()
                );
                next_heartbeat += heartbeat_int;
            }
        }
    }
    info!("Simulated {} accesses", clock.accesses);

    let stats = cache.levels().map(Cache::stats).collect::<Vec<CacheStats>>();
    let stats_file = fs::File::create(stats_path)?;
    serde_json::to_writer_pretty(stats_file, &stats)?;

    if let Some(history_path) = history_path {
        let history = cache
            .levels()
            .map(|c| LevelHistory {
                name: c.name(),
                entries: c.access_trace().snapshot(),
            })
            .collect::<Vec<_>>();
        serde_json::to_writer_pretty(fs::File::create(history_path)?, &history)?;
    }
    Ok(())
}
