use log::debug;
use stopwatch::Stopwatch;

/// Kernels the owning iteration and presolve layers record against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    ColPrice,
    RowPrice,
    RowPriceDense,
    BasisUpdate,
    CollectColumn,
}

impl Kernel {
    pub const ALL: [Kernel; 5] = [
        Kernel::ColPrice,
        Kernel::RowPrice,
        Kernel::RowPriceDense,
        Kernel::BasisUpdate,
        Kernel::CollectColumn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kernel::ColPrice => "column price",
            Kernel::RowPrice => "row price",
            Kernel::RowPriceDense => "row price (dense)",
            Kernel::BasisUpdate => "basis update",
            Kernel::CollectColumn => "collect column",
        }
    }

    /// Three-character tag for compact report lines.
    pub fn tag(self) -> &'static str {
        match self {
            Kernel::ColPrice => "CPR",
            Kernel::RowPrice => "RPR",
            Kernel::RowPriceDense => "RPD",
            Kernel::BasisUpdate => "UPD",
            Kernel::CollectColumn => "COL",
        }
    }

    fn idx(self) -> usize {
        match self {
            Kernel::ColPrice => 0,
            Kernel::RowPrice => 1,
            Kernel::RowPriceDense => 2,
            Kernel::BasisUpdate => 3,
            Kernel::CollectColumn => 4,
        }
    }
}

struct KernelClock {
    watch: Stopwatch,
    calls: usize,
    ticks: f64,
}

/// Thin per-kernel counter/clock facility: wall-clock accumulation across
/// start/stop pairs, call counts, and a synthetic-tick tally for the
/// owning algorithm's work estimates.
pub struct KernelTimer {
    clocks: Vec<KernelClock>,
}

impl KernelTimer {
    pub fn new() -> KernelTimer {
        KernelTimer {
            clocks: Kernel::ALL
                .iter()
                .map(|_| KernelClock {
                    watch: Stopwatch::new(),
                    calls: 0,
                    ticks: 0.0,
                })
                .collect(),
        }
    }

    pub fn start(&mut self, kernel: Kernel) {
        let clock = &mut self.clocks[kernel.idx()];
        clock.calls += 1;
        clock.watch.start();
    }

    pub fn stop(&mut self, kernel: Kernel) {
        self.clocks[kernel.idx()].watch.stop();
    }

    /// Charge abstract operation cost to a kernel, e.g. a work vector's
    /// `synthetic_tick` after a pricing pass.
    pub fn add_ticks(&mut self, kernel: Kernel, ticks: f64) {
        self.clocks[kernel.idx()].ticks += ticks;
    }

    pub fn calls(&self, kernel: Kernel) -> usize {
        self.clocks[kernel.idx()].calls
    }

    pub fn elapsed_ms(&self, kernel: Kernel) -> i64 {
        self.clocks[kernel.idx()].watch.elapsed_ms()
    }

    pub fn ticks(&self, kernel: Kernel) -> f64 {
        self.clocks[kernel.idx()].ticks
    }

    /// One debug line per kernel with recorded activity.
    pub fn report(&self) {
        for &kernel in Kernel::ALL.iter() {
            let clock = &self.clocks[kernel.idx()];
            if clock.calls == 0 {
                continue;
            }
            debug!(
                "{} {:18} calls {:8} time {:6} ms ticks {:12.0}",
                kernel.tag(),
                kernel.name(),
                clock.calls,
                clock.watch.elapsed_ms(),
                clock.ticks
            );
        }
    }
}

impl Default for KernelTimer {
    fn default() -> KernelTimer {
        KernelTimer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_test() {
        let mut timer = KernelTimer::new();
        assert_eq!(timer.calls(Kernel::RowPrice), 0);

        timer.start(Kernel::RowPrice);
        timer.stop(Kernel::RowPrice);
        timer.start(Kernel::RowPrice);
        timer.stop(Kernel::RowPrice);
        timer.start(Kernel::BasisUpdate);
        timer.stop(Kernel::BasisUpdate);

        assert_eq!(timer.calls(Kernel::RowPrice), 2);
        assert_eq!(timer.calls(Kernel::BasisUpdate), 1);
        assert_eq!(timer.calls(Kernel::ColPrice), 0);
        assert!(timer.elapsed_ms(Kernel::RowPrice) >= 0);
    }

    #[test]
    fn ticks_test() {
        let mut timer = KernelTimer::new();
        timer.add_ticks(Kernel::ColPrice, 120.0);
        timer.add_ticks(Kernel::ColPrice, 30.0);
        assert_eq!(timer.ticks(Kernel::ColPrice), 150.0);
        assert_eq!(timer.ticks(Kernel::RowPrice), 0.0);
    }

    #[test]
    fn tags_test() {
        for &kernel in Kernel::ALL.iter() {
            assert_eq!(kernel.tag().len(), 3);
            assert!(!kernel.name().is_empty());
        }
    }
}
