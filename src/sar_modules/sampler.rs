use std::io::Write;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sar_modules::config::SarConfig;
use crate::sar_modules::counters::{CounterSource, PortCounters};
use crate::sar_modules::error::SamplerError;
use crate::sar_modules::report::{header_line, row_line, PortRates};

/// Counters of one port together with the moment they were read.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub counters: PortCounters,
    pub taken_at: Instant,
}

/// Periodically samples every configured port and writes one rate row per
/// port per tick.
pub struct Sampler<W> {
    source: CounterSource,
    ports: Vec<String>,
    interval: Duration,
    out: W,
}

impl<W: Write> Sampler<W> {
    pub fn new(config: &SarConfig, source: CounterSource, out: W) -> Self {
        Self {
            source,
            ports: config.interfaces.clone(),
            interval: config.interval,
            out,
        }
    }

    /// Runs until the process is stopped. Returns only if the report can no
    /// longer be written.
    pub async fn run(mut self) -> Result<(), SamplerError> {
        self.run_for(None).await
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Header, baseline, then `ticks` report rounds (`None` means forever).
    pub(crate) async fn run_for(&mut self, ticks: Option<u64>) -> Result<(), SamplerError> {
        let started = Instant::now();
        writeln!(self.out, "{}", header_line())?;
        self.out.flush()?;

        // One entry per configured port, in configured order: the port's last
        // successful reading, if it has had one.
        let mut baseline: Vec<Option<Sample>> = Vec::with_capacity(self.ports.len());
        for port in &self.ports {
            baseline.push(self.sample(port).await.good());
        }

        let mut ticker = interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            ports = self.ports.len(),
            interval_secs = self.interval.as_secs_f64(),
            "Sampling started."
        );

        let mut done = 0_u64;
        while ticks.map_or(true, |limit| done < limit) {
            ticker.tick().await;

            let mut current = Vec::with_capacity(self.ports.len());
            for port in &self.ports {
                current.push(self.sample(port).await);
            }

            for ((port, last_good), reading) in
                self.ports.iter().zip(baseline.iter_mut()).zip(current)
            {
                let rates = match last_good.as_ref() {
                    Some(old) => {
                        let new = &reading.sample;
                        let dt = new.taken_at.duration_since(old.taken_at).as_secs_f64();
                        debug!(port = %port, dt, "Computing port rates.");
                        PortRates::between(&old.counters, &new.counters, dt)
                    }
                    // Nothing to diff against until the port answers once.
                    None => PortRates::default(),
                };
                writeln!(
                    self.out,
                    "{}",
                    row_line(started.elapsed().as_secs_f64(), port, &rates)
                )?;
                if let Some(sample) = reading.good() {
                    *last_good = Some(sample);
                }
            }
            self.out.flush()?;

            done += 1;
        }
        Ok(())
    }

    /// A failed poll is reported once and read as zero counters.
    async fn sample(&self, port: &str) -> Reading {
        let (counters, ok) = match self.source.fetch(port).await {
            Ok(counters) => (counters, true),
            Err(e) => {
                warn!(port = %port, error = %e, "Poll failed, reporting zero counters.");
                (PortCounters::zeroed(), false)
            }
        };
        Reading {
            sample: Sample {
                counters,
                taken_at: Instant::now(),
            },
            ok,
        }
    }
}

/// Result of one poll. A failed poll still yields a zero-filled sample for
/// its own row but never becomes a baseline.
struct Reading {
    sample: Sample,
    ok: bool,
}

impl Reading {
    fn good(&self) -> Option<Sample> {
        self.ok.then_some(self.sample)
    }
}
