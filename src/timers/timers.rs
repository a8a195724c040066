use std::collections::HashMap;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

#[derive(Debug, Default)]
struct InnerTimer {
    start: Option<Instant>,
    elapsed: Duration,
    subtimers: SubTimersMap,
}

impl InnerTimer {
    fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
        self.subtimers.clear();
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Debug, Default)]
struct SubTimersMap(HashMap<&'static str, InnerTimer>);

impl Deref for SubTimersMap {
    type Target = HashMap<&'static str, InnerTimer>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for SubTimersMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SubTimersMap {
    fn start_subtimer(&mut self, key: &'static str) {
        let t = self.0.entry(key).or_default();
        t.start();
    }

    pub fn total_time(&self) -> Duration {
        self.values()
            .fold(Duration::ZERO, |acc, t| acc + t.elapsed())
    }

    // time accumulated under `key` at any depth
    fn find(&self, key: &str) -> Duration {
        self.iter().fold(Duration::ZERO, |acc, (k, t)| {
            let own = if *k == key { t.elapsed } else { Duration::ZERO };
            acc + own + t.subtimers.find(key)
        })
    }

    fn print(&self, out: &mut dyn Write, depth: u8) -> std::io::Result<()> {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort();
        for key in keys {
            let val = &self[key];
            let tabs = format!("{: <1$}", "", 4 * depth as usize);
            writeln!(out, "{}{:} : {:?}", tabs, *key, val.elapsed)?;
            val.subtimers.print(out, depth + 1)?;
        }
        Ok(())
    }
}

/// Tree of named timers.  Timers started while another is running are
/// nested below it.
#[derive(Default, Debug)]
pub struct Timers {
    stack: Vec<&'static str>,
    subtimers: SubTimersMap,
}

impl Timers {
    fn mut_active_timer(&mut self) -> Option<&mut InnerTimer> {
        let (first, rest) = self.stack.split_first()?;
        let mut active_timer = self.subtimers.get_mut(first)?;
        for key in rest {
            active_timer = active_timer.subtimers.get_mut(key)?;
        }
        Some(active_timer)
    }

    /// clear every timer
    pub fn reset(&mut self) {
        self.stack.clear();
        for t in self.subtimers.values_mut() {
            t.reset();
        }
        self.subtimers.clear();
    }

    pub fn start_as_current(&mut self, key: &'static str) {
        //starts a timer with name "key" as the current timer
        if let Some(active) = self.mut_active_timer() {
            active.subtimers.start_subtimer(key);
        } else {
            self.subtimers.start_subtimer(key);
        }
        self.stack.push(key);
    }

    pub fn stop_current(&mut self) {
        if let Some(active) = self.mut_active_timer() {
            active.stop();
        }
        self.stack.pop();
    }

    pub fn total_time(&self) -> Duration {
        self.subtimers.total_time()
    }

    /// Total time spent under `key`, summed over every nesting position.
    pub fn elapsed(&self, key: &str) -> Duration {
        self.subtimers.find(key)
    }

    pub fn print(&self, out: &mut dyn Write) -> std::io::Result<()> {
        self.subtimers.print(out, 0)
    }
}

macro_rules! timeit {
    ($timer:expr => $key:literal; $($tt:tt)+) => {
        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;

#[path = "test.rs"]
#[cfg(test)]
mod test;
