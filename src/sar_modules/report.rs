//! Fixed-width, sar-style report lines.
use crate::sar_modules::counters::{DirectionCounters, PortCounters};

const BYTES_PER_KB: f64 = 1024.0;

/// Column labels after the elapsed-time and interface columns, in print order.
pub const RATE_COLUMNS: [&str; 8] = [
    "rxpck/s", "txpck/s", "rxkB/s", "txkB/s", "rxdrop/s", "txdrop/s", "rxerr/s", "txerr/s",
];

/// Per-second rates of one port over one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortRates {
    pub rx_packets: f64,
    pub tx_packets: f64,
    pub rx_kbytes: f64,
    pub tx_kbytes: f64,
    pub rx_drops: f64,
    pub tx_drops: f64,
    pub rx_errors: f64,
    pub tx_errors: f64,
}

impl PortRates {
    /// `(new - old) / dt_secs`, bytes further scaled to KB.
    ///
    /// Decreasing counters give negative rates and `dt_secs == 0` gives
    /// non-finite rates; neither is corrected here.
    pub fn between(old: &PortCounters, new: &PortCounters, dt_secs: f64) -> Self {
        let rate = |old: u64, new: u64| (i128::from(new) - i128::from(old)) as f64 / dt_secs;
        let rx = |f: fn(&DirectionCounters) -> u64| rate(f(&old.rx), f(&new.rx));
        let tx = |f: fn(&DirectionCounters) -> u64| rate(f(&old.tx), f(&new.tx));

        Self {
            rx_packets: rx(|c| c.packets),
            tx_packets: tx(|c| c.packets),
            rx_kbytes: rx(|c| c.bytes) / BYTES_PER_KB,
            tx_kbytes: tx(|c| c.bytes) / BYTES_PER_KB,
            rx_drops: rx(|c| c.drops),
            tx_drops: tx(|c| c.drops),
            rx_errors: rx(|c| c.errors),
            tx_errors: tx(|c| c.errors),
        }
    }

    fn columns(&self) -> [f64; 8] {
        [
            self.rx_packets,
            self.tx_packets,
            self.rx_kbytes,
            self.tx_kbytes,
            self.rx_drops,
            self.tx_drops,
            self.rx_errors,
            self.tx_errors,
        ]
    }
}

pub fn header_line() -> String {
    let mut line = format!("{:<6.2} {:<13}", 0.0_f64, "IFACE");
    for label in RATE_COLUMNS {
        line.push_str(&format!(" {label:<10}"));
    }
    line
}

pub fn row_line(elapsed_secs: f64, port: &str, rates: &PortRates) -> String {
    let mut line = format!("{elapsed_secs:<6.2} {port:<13}");
    for value in rates.columns() {
        line.push_str(&format!(" {value:<10.2}"));
    }
    line
}
