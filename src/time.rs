// SPDX-License-Identifier: Apache-2.0

use crate::{traits::DhcpPlatform, DhcpError, ErrorKind};

/// Monotonic timestamp in platform ticks. Wrapping arithmetic only; two
/// timestamps may only be compared through their wrapping difference and
/// only when they are within the platform's working span of each other.
pub type Ticks = u64;

// RFC 2131 timing fields are u8 seconds at most, so any platform clock
// must at least cover one full retransmission timeout.
const MIN_TIMER_SECONDS: u32 = 255;

/// Single one-shot timer with second-level scheduling on top of the
/// platform tick clock.
///
/// Waits longer than `max_timer_sec()` cannot be expressed in one arming;
/// the client splits those into sub-intervals and re-arms at absolute
/// instants so that the split introduces no drift.
#[derive(Debug)]
pub(crate) struct DhcpTimer {
    tick_hz: u64,
    max_timer_sec: u32,
    set_time: Ticks,
}

impl DhcpTimer {
    pub(crate) fn new<P: DhcpPlatform>(platform: &P) -> Result<Self, DhcpError> {
        let tick_hz = platform.tick_hz();
        if tick_hz == 0 {
            return Err(DhcpError::new(
                ErrorKind::InvalidArgument,
                "Platform reported a zero tick frequency".to_string(),
            ));
        }
        let max_timer_sec = u32::try_from(platform.max_timer_span() / tick_hz)
            .unwrap_or(u32::MAX);
        if max_timer_sec < MIN_TIMER_SECONDS {
            return Err(DhcpError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Platform timer span covers only {max_timer_sec} \
                     seconds, minimum is {MIN_TIMER_SECONDS}"
                ),
            ));
        }
        Ok(Self {
            tick_hz,
            max_timer_sec,
            set_time: 0,
        })
    }

    /// Largest interval in seconds that fits into a single timer arming.
    pub(crate) fn max_timer_sec(&self) -> u32 {
        self.max_timer_sec
    }

    pub(crate) fn sec_to_ticks(&self, seconds: u32) -> Ticks {
        debug_assert!(seconds <= self.max_timer_sec);
        self.sec_to_ticks_unchecked(seconds)
    }

    pub(crate) fn sec_to_ticks_unchecked(&self, seconds: u32) -> Ticks {
        u64::from(seconds).wrapping_mul(self.tick_hz)
    }

    /// Ticks to whole seconds, rounding down, saturating at `u32::MAX`.
    pub(crate) fn ticks_to_sec(&self, ticks: Ticks) -> u32 {
        u32::try_from(ticks / self.tick_hz).unwrap_or(u32::MAX)
    }

    /// Arm the timer `seconds` from now. `seconds` must not exceed
    /// `max_timer_sec()`.
    pub(crate) fn set_after<P: DhcpPlatform>(
        &mut self,
        platform: &mut P,
        seconds: u32,
    ) {
        let expire_at =
            platform.now().wrapping_add(self.sec_to_ticks(seconds));
        self.set_at(platform, expire_at);
    }

    /// Arm the timer at an absolute instant, replacing any earlier arming.
    pub(crate) fn set_at<P: DhcpPlatform>(
        &mut self,
        platform: &mut P,
        expire_at: Ticks,
    ) {
        self.set_time = expire_at;
        platform.timer_set(expire_at);
    }

    pub(crate) fn unset<P: DhcpPlatform>(&mut self, platform: &mut P) {
        platform.timer_unset();
    }

    /// The instant the timer was last armed for.
    pub(crate) fn set_time(&self) -> Ticks {
        self.set_time
    }
}
