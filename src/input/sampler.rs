//! Stabilized events sampler
//!
//! Pen input arrives with polling jitter, but the stabilizer wants one
//! sample per fixed cadence so that stroke segments come out even. The
//! sampler buffers the raw samples of the current window and, when drained,
//! spreads them uniformly across the elapsed wall-clock time:
//!
//! ```text
//! slot i  ->  buffered[floor(len / slots * i)]
//! ```
//!
//! Samples are picked, never interpolated. Once the buffer is exhausted (or
//! empty) the last sample of the previous window stands in.

use super::clock::{Clock, LapTimer, MonotonicClock};
use super::PaintInfo;
use crate::config::StabilizerConfig;
use crate::error::{Result, StabilizerError};
use std::fmt;
use std::iter::FusedIterator;

type OutputHandler<P> = Box<dyn FnMut(&P)>;

/// Resamples irregular pen input into an evenly spaced sequence
///
/// Single-threaded: record, reset and drain all happen on the input thread.
pub struct StabilizedEventsSampler<P = PaintInfo, C: Clock = MonotonicClock> {
    /// Output cadence in milliseconds, always > 0
    sample_interval_ms: u64,
    /// Tail stretch used by [`Self::finish_stroke`]
    finishing_delay_ms: i64,
    output_handler: Option<OutputHandler<P>>,
    timer: LapTimer<C>,
    /// Samples recorded since the last reset
    real_events: Vec<P>,
    /// Synthetic elapsed time added to the next `range()` only
    elapsed_override_ms: i64,
    /// Last sample of the previous window
    last_paint_info: Option<P>,
}

impl<P: Clone> StabilizedEventsSampler<P, MonotonicClock> {
    /// Create a sampler timed by the system monotonic clock
    pub fn new(sample_interval_ms: i64) -> Result<Self> {
        Self::with_clock(sample_interval_ms, MonotonicClock::new())
    }

    /// Create a sampler from a loaded configuration
    pub fn from_config(config: &StabilizerConfig) -> Result<Self> {
        config.validate()?;
        let mut sampler = Self::new(config.sample_interval_ms)?;
        sampler.finishing_delay_ms = config.finishing_delay_ms;
        Ok(sampler)
    }
}

impl<P: Clone, C: Clock> StabilizedEventsSampler<P, C> {
    /// Create a sampler timed by `clock`
    pub fn with_clock(sample_interval_ms: i64, clock: C) -> Result<Self> {
        let interval = u64::try_from(sample_interval_ms)
            .ok()
            .filter(|&ms| ms > 0)
            .ok_or_else(|| {
                StabilizerError::InvalidConfiguration(format!(
                    "sample interval must be > 0 ms, got {}",
                    sample_interval_ms
                ))
            })?;

        tracing::info!("[Stabilizer] Created sampler, interval {} ms", interval);

        Ok(Self {
            sample_interval_ms: interval,
            finishing_delay_ms: 0,
            output_handler: None,
            timer: LapTimer::new(clock),
            real_events: Vec::with_capacity(64),
            elapsed_override_ms: 0,
            last_paint_info: None,
        })
    }

    /// Register the callback invoked once per slot by [`Self::drain_push`]
    ///
    /// Replaces any previously registered handler.
    pub fn set_output_handler(&mut self, handler: impl FnMut(&P) + 'static) {
        self.output_handler = Some(Box::new(handler));
    }

    pub fn clear_output_handler(&mut self) {
        self.output_handler = None;
    }

    /// Buffer one raw sample
    ///
    /// The first sample ever recorded starts the window clock.
    pub fn record(&mut self, sample: P) {
        if !self.timer.is_started() {
            self.timer.start();
        }

        self.real_events.push(sample);
    }

    /// Close the current window
    ///
    /// Remembers the last buffered sample as the fallback, empties the
    /// buffer and restarts the clock.
    pub fn reset(&mut self) {
        if let Some(last) = self.real_events.pop() {
            self.last_paint_info = Some(last);
        }

        self.real_events.clear();
        self.timer.start();
    }

    /// Queue a synthetic tail sample stretched over `extra_elapsed_ms`
    ///
    /// After this the buffer holds only the last known sample, and the next
    /// [`Self::range`] covers `extra_elapsed_ms` on top of real elapsed time.
    pub fn record_finishing_sample(&mut self, extra_elapsed_ms: i64) {
        self.reset();

        self.elapsed_override_ms = extra_elapsed_ms;
        match &self.last_paint_info {
            Some(last) => self.real_events.push(last.clone()),
            None => tracing::debug!("[Stabilizer] Finishing sample requested before any input"),
        }
    }

    /// [`Self::record_finishing_sample`] with the configured finishing delay
    pub fn finish_stroke(&mut self) {
        self.record_finishing_sample(self.finishing_delay_ms);
    }

    /// Push one sample per cadence slot of the elapsed window to the handler
    ///
    /// Laps the clock. Slots are `0, interval, 2 * interval, ...` below the
    /// elapsed time, so the count rounds up. The buffer is left intact and
    /// the pending elapsed override is left for [`Self::range`]. Returns the
    /// number of handler invocations.
    pub fn drain_push(&mut self) -> Result<usize> {
        let elapsed = self.timer.lap_ms();

        if elapsed == 0 {
            tracing::debug!("[Stabilizer] No time elapsed, nothing to drain");
            return Ok(0);
        }

        let Some(handler) = self.output_handler.as_mut() else {
            tracing::warn!(
                "[Stabilizer] Drain of {} ms without an output handler, slots dropped",
                elapsed
            );
            return Ok(0);
        };

        let events = self.real_events.as_slice();
        let fallback = self.last_paint_info.as_ref();
        if events.is_empty() && fallback.is_none() {
            return Err(StabilizerError::NoSampleAvailable);
        }

        let mut emitted = 0;
        for i in (0..elapsed).step_by(self.sample_interval_ms as usize) {
            if let Some(sample) = pick(events, fallback, elapsed, i) {
                handler(sample);
                emitted += 1;
            }
        }

        tracing::trace!(
            "[Stabilizer] Drained {} slots from {} events over {} ms",
            emitted,
            events.len(),
            elapsed
        );
        Ok(emitted)
    }

    /// Evenly spaced samples covering the time since the last lap
    ///
    /// Laps the clock and consumes the pending elapsed override. The
    /// returned iterator borrows the sampler, so the buffer cannot change
    /// while it is consumed.
    pub fn range(&mut self) -> Result<SampledRange<'_, P>> {
        let lap = i64::try_from(self.timer.lap_ms()).unwrap_or(i64::MAX);
        let elapsed = lap.saturating_add(std::mem::take(&mut self.elapsed_override_ms));
        let slot_count = u64::try_from(elapsed).unwrap_or(0) / self.sample_interval_ms;
        let slot_count = usize::try_from(slot_count).unwrap_or(usize::MAX);

        let events = self.real_events.as_slice();
        let fallback = self.last_paint_info.as_ref();

        if slot_count > 0 && events.is_empty() && fallback.is_none() {
            return Err(StabilizerError::NoSampleAvailable);
        }

        tracing::trace!(
            "[Stabilizer] Range of {} slots from {} events over {} ms",
            slot_count,
            events.len(),
            elapsed
        );

        Ok(SampledRange {
            events,
            fallback,
            slot_count,
            front: 0,
            back: slot_count,
        })
    }

    pub fn sample_interval_ms(&self) -> u64 {
        self.sample_interval_ms
    }

    /// Samples recorded since the last reset, in arrival order
    pub fn buffered(&self) -> &[P] {
        &self.real_events
    }

    /// Fallback sample carried over from the previous window
    pub fn last_known(&self) -> Option<&P> {
        self.last_paint_info.as_ref()
    }

    pub fn pending_elapsed_override_ms(&self) -> i64 {
        self.elapsed_override_ms
    }
}

impl<P: fmt::Debug, C: Clock> fmt::Debug for StabilizedEventsSampler<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StabilizedEventsSampler")
            .field("sample_interval_ms", &self.sample_interval_ms)
            .field("has_output_handler", &self.output_handler.is_some())
            .field("real_events", &self.real_events)
            .field("elapsed_override_ms", &self.elapsed_override_ms)
            .field("last_paint_info", &self.last_paint_info)
            .finish()
    }
}

/// Map slot position `pos` of `span` onto the buffer
///
/// `floor(len / span * pos)` in exact integer arithmetic. Positions past the
/// buffer (only possible when it is empty) resolve to the fallback.
fn pick<'a, P>(events: &'a [P], fallback: Option<&'a P>, span: u64, pos: u64) -> Option<&'a P> {
    let k = (events.len() as u128 * pos as u128) / span.max(1) as u128;
    usize::try_from(k)
        .ok()
        .and_then(|k| events.get(k))
        .or(fallback)
        .or_else(|| events.last())
}

/// Lazy, finite sequence of stabilized samples produced by
/// [`StabilizedEventsSampler::range`]
#[derive(Debug, Clone)]
pub struct SampledRange<'a, P> {
    events: &'a [P],
    fallback: Option<&'a P>,
    slot_count: usize,
    front: usize,
    back: usize,
}

impl<'a, P> SampledRange<'a, P> {
    /// Ratio of buffered samples to output slots
    pub fn alpha(&self) -> f64 {
        if self.slot_count == 0 {
            0.0
        } else {
            self.events.len() as f64 / self.slot_count as f64
        }
    }

    /// Total number of slots in the range, consumed or not
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn is_empty(&self) -> bool {
        self.front >= self.back
    }

    fn sample_at(&self, slot: usize) -> Option<&'a P> {
        pick(
            self.events,
            self.fallback,
            self.slot_count as u64,
            slot as u64,
        )
    }
}

impl<'a, P> Iterator for SampledRange<'a, P> {
    type Item = &'a P;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let sample = self.sample_at(self.front);
        self.front += 1;
        sample
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl<'a, P> DoubleEndedIterator for SampledRange<'a, P> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.sample_at(self.back)
    }
}

impl<'a, P> ExactSizeIterator for SampledRange<'a, P> {}

impl<'a, P> FusedIterator for SampledRange<'a, P> {}
