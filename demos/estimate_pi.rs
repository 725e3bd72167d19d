//! Monte Carlo estimate of pi on the thread pool
//!
//! Every task tests one random point against the unit circle; the result
//! rides back inside the task.

use msgq::{PoolConfig, Task};
use tracing::info;

const SAMPLES: usize = 1_000_000;

struct Sample {
    x: f64,
    y: f64,
    inside: Option<bool>,
}

impl Task for Sample {
    fn execute(&mut self) {
        self.inside = Some(self.x * self.x + self.y * self.y <= 1.0);
    }
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_thread_names(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut pool = PoolConfig::new().task_capacity(1024).build()?;
    info!(workers = pool.workers(), samples = SAMPLES, "estimating pi");

    let mut rng = fastrand::Rng::new();
    let mut pushed = 0;
    let mut collected = 0;
    let mut inside = 0u64;

    while collected < SAMPLES {
        while pushed < SAMPLES {
            let sample = Sample {
                x: rng.f64(),
                y: rng.f64(),
                inside: None,
            };
            if pool.push(sample).is_err() {
                break;
            }
            pushed += 1;
        }

        match pool.pop(true) {
            Ok((_, sample)) => {
                if sample.inside == Some(true) {
                    inside += 1;
                }
                collected += 1;
            }
            Err(err) => {
                tracing::error!(%err, "pool stopped early");
                break;
            }
        }
    }
    pool.join();

    let estimate = 4.0 * inside as f64 / collected.max(1) as f64;
    info!(
        estimate,
        error = (estimate - std::f64::consts::PI).abs(),
        "done"
    );
    Ok(())
}
