use std::time::{ Duration, Instant };
use clifford_cache::{
    fold::{ self, Pivot },
    CachingSim,
    QubitId,
    SimResult,
    Simulator,
    Stabilizer,
    Tableau,
};

const MAX_REPS: usize = 1000;
const MAX_TIME: Duration = Duration::from_secs(2);
const SEED: u64 = 10546;

// run `f` repeatedly and print its mean time against a goal
fn perf<F>(name: &str, goal: Duration, mut f: F) -> SimResult<()>
where F: FnMut() -> SimResult<()>
{
    let t0 = Instant::now();
    let mut reps: usize = 0;
    while reps < MAX_REPS && t0.elapsed() < MAX_TIME {
        f()?;
        reps += 1;
    }
    let mean = t0.elapsed() / reps.max(1) as u32;
    let status = if mean <= goal { "ok" } else { "SLOW" };
    println!("{:<48} {:>12.3?} (goal {:>9.3?}, {} reps) {}",
        name, mean, goal, reps, status);
    Ok(())
}

fn register<S>(sim: &mut S, n: usize) -> SimResult<Vec<QubitId>>
where S: Simulator
{
    (0..n).map(|_| sim.allocate()).collect()
}

fn perf_cnots(goal: Duration, n: usize) -> SimResult<()> {
    let mut sim = Tableau::new(n, Some(SEED));
    let qs = register(&mut sim, n)?;
    perf(&format!("{}-cnots-{}-qubits", n, n), goal, || {
        for i in 0..n {
            if i != n - i - 1 { sim.cnot(qs[i], qs[n - i - 1])?; }
        }
        Ok(())
    })
}

fn perf_mix_and_measure(goal: Duration, n: usize) -> SimResult<()> {
    let mut sim = Tableau::new(n, Some(SEED));
    let qs = register(&mut sim, n)?;
    perf(&format!("mix-and-measure-{}-qubits", n), goal, || {
        for i in 0..n {
            let j = (i * 3 + 5) % n;
            sim.hadamard(qs[i])?;
            if i != j { sim.cnot(qs[i], qs[j])?; }
        }
        for q in qs.iter() { sim.measure(*q, None)?; }
        Ok(())
    })
}

// weight-4 plaquettes on a d × d grid of qubits, alternating X and Z in a
// checkerboard so that all of them commute
fn plaquettes(qs: &[QubitId], d: usize) -> SimResult<Vec<Stabilizer>> {
    let mut stabs: Vec<Stabilizer> = Vec::new();
    for i in 0..d - 1 {
        for j in 0..d - 1 {
            let word = if (i + j) % 2 == 0 { "XXXX" } else { "ZZZZ" };
            let support = [
                qs[i * d + j],
                qs[i * d + j + 1],
                qs[(i + 1) * d + j],
                qs[(i + 1) * d + j + 1],
            ];
            stabs.push(Stabilizer::parse(support, word)?);
        }
    }
    Ok(stabs)
}

fn perf_measure_stabilizers(goal: Duration, d: usize) -> SimResult<()> {
    let mut sim = Tableau::new(d * d + 1, Some(SEED));
    let qs = register(&mut sim, d * d)?;
    let stabs = plaquettes(&qs, d)?;
    perf(&format!("measure-plaquettes-uncached-distance-{}", d), goal, || {
        for s in stabs.iter() { fold::measure(&mut sim, s, None, Pivot::Lead)?; }
        Ok(())
    })?;

    let mut sim = CachingSim::new(Tableau::new(d * d + 1, Some(SEED)));
    let qs = register(&mut sim, d * d)?;
    let stabs = plaquettes(&qs, d)?;
    perf(&format!("measure-plaquettes-cached-distance-{}", d), goal, || {
        for s in stabs.iter() { sim.measure(s, None)?; }
        Ok(())
    })?;
    let stats = sim.stats();
    println!("  hits: {}, misses: {}, evictions: {}",
        stats.hits, stats.misses, stats.evictions);
    Ok(())
}

fn main() -> SimResult<()> {
    env_logger::init();

    perf_cnots(Duration::from_micros(70), 10)?;
    perf_cnots(Duration::from_micros(500), 100)?;
    perf_cnots(Duration::from_millis(50), 1000)?;

    perf_mix_and_measure(Duration::from_micros(80), 10)?;
    perf_mix_and_measure(Duration::from_micros(800), 100)?;
    perf_mix_and_measure(Duration::from_millis(100), 1000)?;

    perf_measure_stabilizers(Duration::from_millis(3), 5)?;
    perf_measure_stabilizers(Duration::from_millis(15), 10)?;
    perf_measure_stabilizers(Duration::from_millis(50), 15)?;
    perf_measure_stabilizers(Duration::from_millis(120), 20)?;
    Ok(())
}
