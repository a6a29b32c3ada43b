use std::io::{self, Write};
use std::time::{Duration, Instant};

const HEADER_WIDTH: usize = 80;
const BAR_LENGTH: usize = 50;

const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Presentation context for the setup transcript. Constructed once and passed
/// down explicitly; holds no state beyond the color/interactivity switches.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    colors: bool,
    interactive: bool,
}

impl Console {
    pub fn new(colors: bool, interactive: bool) -> Self {
        Self {
            colors,
            interactive,
        }
    }

    fn paint(&self, text: &str, color: &str, bold: bool) -> String {
        if !self.colors {
            return text.to_string();
        }
        if bold {
            format!("{color}{BOLD}{text}{RESET}")
        } else {
            format!("{color}{text}{RESET}")
        }
    }

    pub fn header(&self, text: &str) {
        let rule = "=".repeat(HEADER_WIDTH);
        println!();
        println!("{}", self.paint(&rule, CYAN, true));
        println!("{}", self.paint(&center(text, HEADER_WIDTH), CYAN, true));
        println!("{}", self.paint(&rule, CYAN, true));
        println!();
    }

    pub fn step(&self, num: usize, total: usize, description: &str) {
        let line = format!("Step {num}/{total}: {description}");
        println!();
        println!("{}", self.paint(&line, MAGENTA, true));
        println!("{}", self.paint(&"-".repeat(line.len()), MAGENTA, false));
        println!();
    }

    pub fn plain(&self, message: &str) {
        println!("{message}");
    }

    pub fn blank(&self) {
        println!();
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.paint(message, CYAN, false));
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.paint(message, GREEN, true));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.paint(message, YELLOW, false));
    }

    pub fn error(&self, message: &str) {
        println!("{}", self.paint(message, RED, true));
    }

    /// Redraws the in-place progress bar. Skipped entirely when the total is
    /// unknown (0) or the console is non-interactive; never emits a newline,
    /// the surrounding stage prints its own terminator.
    pub fn progress(&self, current: u64, total: u64, prefix: &str) {
        if total == 0 || !self.interactive {
            return;
        }
        let current = current.min(total);
        let bar = render_bar(current, total, BAR_LENGTH);
        let percent = format!("{:>6}", format!("{:.1}%", percent_of(current, total)));
        let line = format!(
            "\r{}: [{}] {}",
            self.paint(prefix, YELLOW, false),
            self.paint(&bar, GREEN, false),
            percent
        );
        let mut stdout = io::stdout();
        let _ = stdout.write_all(line.as_bytes());
        let _ = stdout.flush();
    }
}

pub trait ProgressSink {
    fn on_progress(&self, current: u64, total: u64, label: &str);
}

impl ProgressSink for Console {
    fn on_progress(&self, current: u64, total: u64, label: &str) {
        self.progress(current, total, label);
    }
}

/// Gate for rate-limiting redraws. The first call is always ready.
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&mut self) -> bool {
        match self.last {
            Some(last) if last.elapsed() < self.interval => false,
            _ => {
                self.last = Some(Instant::now());
                true
            }
        }
    }
}

pub fn percent_of(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current.min(total) as f64) * 100.0 / (total as f64)
}

pub fn render_bar(current: u64, total: u64, length: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((current.min(total) as u128 * length as u128) / total as u128) as usize
    };
    let mut out = String::with_capacity(length);
    for i in 0..length {
        out.push(if i < filled { '#' } else { '.' });
    }
    out
}

pub fn bytes_to_human(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let value = bytes as f64;
    if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{bytes} B")
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_monotonically() {
        let total = 1000u64;
        let mut last_filled = 0;
        for current in [0u64, 1, 250, 500, 750, 999, 1000] {
            let bar = render_bar(current, total, 50);
            let filled = bar.chars().filter(|ch| *ch == '#').count();
            assert!(filled >= last_filled);
            last_filled = filled;
        }
        assert_eq!(last_filled, 50);
    }

    #[test]
    fn bar_clamps_overshoot() {
        assert_eq!(render_bar(2000, 1000, 10), "##########");
    }

    #[test]
    fn percent_is_monotonic_and_bounded() {
        let mut last = -1.0f64;
        for current in [0u64, 100, 5000, 9999, 10000, 12000] {
            let pct = percent_of(current, 10_000);
            assert!(pct >= last);
            assert!(pct <= 100.0);
            last = pct;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn zero_total_renders_nothing_meaningful() {
        assert_eq!(percent_of(42, 0), 0.0);
        assert_eq!(render_bar(42, 0, 10), "..........");
    }

    #[test]
    fn throttle_gates_after_first_call() {
        let mut throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.ready());
        assert!(!throttle.ready());

        let mut eager = Throttle::new(Duration::ZERO);
        assert!(eager.ready());
        assert!(eager.ready());
    }

    #[test]
    fn humanizes_byte_counts() {
        assert_eq!(bytes_to_human(512), "512 B");
        assert_eq!(bytes_to_human(2048), "2.00 KB");
        assert_eq!(bytes_to_human(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn centered_text_keeps_width() {
        let line = center("SETUP", 20);
        assert!(line.starts_with("       "));
        assert!(line.ends_with("SETUP"));
    }
}
