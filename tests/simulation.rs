use numasim::prelude::*;
use numasim::policies::MAX_BLOCKS;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Split every write so interleaving would show up if the reporter
        // ever emitted outside its lock.
        let mut out = self.0.lock();
        for &byte in buf {
            out.push(byte);
            drop(out);
            std::thread::yield_now();
            out = self.0.lock();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Splits console output into `(worker, node, local, remote, time)` per block,
/// failing on any line that is out of place.
fn parse_console_blocks(text: &str) -> Vec<(usize, usize, usize, usize, u64)> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len() % 5, 0, "ragged console output:\n{}", text);

    lines
        .chunks(5)
        .map(|block| {
            let head = block[0]
                .strip_prefix("[Worker ")
                .unwrap_or_else(|| panic!("block starts with {:?}", block[0]));
            let (worker, node) = head.split_once("] node ").unwrap();
            let local = block[1].strip_prefix("Local Access  : ").unwrap();
            let remote = block[2].strip_prefix("Remote Access : ").unwrap();
            let time = block[3]
                .strip_prefix("Total Time    : ")
                .and_then(|t| t.strip_suffix(" ns"))
                .unwrap();
            assert_eq!(block[4], "-------------------------");
            (
                worker.parse().unwrap(),
                node.parse().unwrap(),
                local.parse().unwrap(),
                remote.parse().unwrap(),
                time.parse().unwrap(),
            )
        })
        .collect()
}

fn logged_run(dir: &TempDir, config: SimConfig) -> (SimReport, String) {
    let path = dir.path().join("results.csv");
    let report = Simulation::new(config.with_console(false).with_log_path(&path))
        .run()
        .unwrap();
    let log = std::fs::read_to_string(&path).unwrap();
    (report, log)
}

#[test]
fn two_node_first_touch_scenario() {
    let topology = Topology::build(2).unwrap();
    assert_eq!(topology.matrix(), &[vec![10, 45], vec![45, 10]]);

    let policy = PolicyKind::FirstTouch.build();
    let allocation = policy
        .allocate(&topology, 4, 0, &mut StdRng::seed_from_u64(0))
        .unwrap();
    let metrics = simulate_access(&topology, &allocation, 0).unwrap();

    assert_eq!(metrics, Metrics { local_access: 4, remote_access: 0, total_time: 40 });
}

#[test]
fn four_node_interleaved_scenario() {
    let topology = Topology::build(4).unwrap();
    let allocation = PolicyKind::Interleaved
        .build()
        .allocate(&topology, 10, 0, &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(allocation.owners(), &[0, 1, 2, 3, 0, 1, 2, 3, 0, 1]);

    let metrics = simulate_access(&topology, &allocation, 0).unwrap();
    assert_eq!(metrics.local_access, 3);
    assert_eq!(metrics.remote_access, 7);
}

#[test]
fn pinned_workers_cover_nodes_in_order() {
    let report = Simulation::new(
        SimConfig::default()
            .with_shape(4, 4, 20)
            .with_pinning(Pinning::Pinned)
            .with_console(false)
            .without_log(),
    )
    .run()
    .unwrap();

    assert_eq!(report.assignments, vec![0, 1, 2, 3]);
}

#[test]
fn log_has_one_header_and_one_row_per_worker() {
    let dir = TempDir::new().unwrap();
    let workers = 12;
    let (report, log) = logged_run(
        &dir,
        SimConfig::default()
            .with_shape(4, workers, 30)
            .with_policy(PolicyKind::Random)
            .with_pinning(Pinning::Unpinned),
    );

    let mut lines = log.lines();
    assert_eq!(lines.next(), Some("thread,local,remote,time"));
    assert_eq!(log.matches("thread,local,remote,time").count(), 1);

    let mut seen = BTreeSet::new();
    for line in lines {
        let fields: Vec<u64> = line.split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(fields.len(), 4, "malformed row: {}", line);
        assert_eq!(fields[1] + fields[2], 30);

        let worker = &report.workers[fields[0] as usize];
        assert_eq!(worker.metrics.local_access as u64, fields[1]);
        assert_eq!(worker.metrics.remote_access as u64, fields[2]);
        assert_eq!(worker.metrics.total_time, fields[3]);
        assert!(seen.insert(fields[0]), "worker {} logged twice", fields[0]);
    }

    assert_eq!(seen.len(), workers);
    assert_eq!(report.emitted, workers);
}

#[test]
fn presets_run_to_completion() {
    for name in ["ideal", "stress", "worst"] {
        let dir = TempDir::new().unwrap();
        let (report, log) = logged_run(&dir, SimConfig::preset(name).unwrap().with_seed(5));

        assert_eq!(log.lines().count(), report.config.worker_count + 1);
        for worker in &report.workers {
            assert_eq!(worker.metrics.accesses(), report.config.block_count);
        }
    }
}

#[test]
fn ideal_preset_never_goes_remote() {
    let report = Simulation::new(
        SimConfig::preset("ideal").unwrap().with_console(false).without_log(),
    )
    .run()
    .unwrap();

    assert_eq!(report.summary.remote_access, 0);
    assert_eq!(report.summary.local_access_ratio, 1.0);
}

#[test]
fn capacity_violation_is_fatal() {
    let result = Simulation::new(
        SimConfig::default()
            .with_shape(4, 4, MAX_BLOCKS + 1)
            .with_console(false)
            .without_log(),
    )
    .run();

    assert!(matches!(result, Err(SimError::CapacityExceeded { .. })));
}

#[test]
fn strict_log_fails_fast() {
    let dir = TempDir::new().unwrap();
    let result = Simulation::new(
        SimConfig::default()
            .with_console(false)
            .with_log_path(dir.path().join("nope/results.csv"))
            .with_log_policy(LogPolicy::Strict),
    )
    .run();

    assert!(matches!(result, Err(SimError::ResourceUnavailable { .. })));
}

#[test]
fn lenient_log_keeps_running() {
    let dir = TempDir::new().unwrap();
    let report = Simulation::new(
        SimConfig::default()
            .with_console(false)
            .with_log_path(dir.path().join("nope/results.csv")),
    )
    .run()
    .unwrap();

    assert_eq!(report.workers.len(), 4);
    assert_eq!(report.emitted, 4);
}

#[test]
fn console_blocks_stay_whole_and_match_log_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv");
    let console = SharedBuf::default();
    let workers = 32;

    let report = Simulation::new(
        SimConfig::default()
            .with_shape(8, workers, 64)
            .with_policy(PolicyKind::Random)
            .with_pinning(Pinning::Unpinned)
            .with_seed(77)
            .with_log_path(&path),
    )
    .with_console_writer(console.clone())
    .run()
    .unwrap();

    let blocks = parse_console_blocks(&console.text());
    assert_eq!(blocks.len(), workers);

    for &(worker, node, local, remote, time) in &blocks {
        let expected = &report.workers[worker];
        assert_eq!(expected.node, node);
        assert_eq!(expected.metrics, Metrics { local_access: local, remote_access: remote, total_time: time });
    }

    let console_order: Vec<usize> = blocks.iter().map(|b| b.0).collect();
    let log_order: Vec<usize> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|row| row.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(console_order, log_order);

    let distinct: BTreeSet<usize> = console_order.iter().copied().collect();
    assert_eq!(distinct.len(), workers);
}

#[test]
fn unavailable_log_falls_back_to_console() {
    let dir = TempDir::new().unwrap();
    let console = SharedBuf::default();

    let report = Simulation::new(
        SimConfig::default()
            .with_shape(4, 6, 20)
            .with_console(false)
            .with_log_path(dir.path().join("nope/results.csv")),
    )
    .with_console_writer(console.clone())
    .run()
    .unwrap();

    assert_eq!(report.emitted, 6);
    let mut seen: Vec<usize> = parse_console_blocks(&console.text()).iter().map(|b| b.0).collect();
    seen.sort();
    assert_eq!(seen, (0..6).collect::<Vec<_>>());
}

#[test]
fn quiet_run_with_working_log_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv");
    let console = SharedBuf::default();

    Simulation::new(SimConfig::default().with_console(false).with_log_path(&path))
        .with_console_writer(console.clone())
        .run()
        .unwrap();

    assert!(console.text().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 5);
}
