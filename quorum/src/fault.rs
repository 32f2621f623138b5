use std::collections::VecDeque;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Availability strategy an acceptor consults before processing each
/// message. Dwell times are counted in messages rather than wall-clock
/// time, so tests can force exact Active/Inactive sequences.
#[derive(Clone, Debug)]
pub enum FaultPlan {
    /// Always available.
    Up,
    /// Never available.
    Down,
    /// One state per message, in order; holds the last state once the
    /// script runs out.
    Scripted {
        /// Remaining scripted states, `true` = available.
        states: VecDeque<bool>,
        /// State held after the script is exhausted.
        last: bool,
    },
    /// Alternates Active/Inactive dwell periods drawn from `dwell` using
    /// a seeded generator, so a given seed replays the same sequence.
    Seeded {
        /// Seeded generator driving the dwell draws.
        rng: StdRng,
        /// Whether the current dwell period is Active.
        active: bool,
        /// Messages left in the current dwell period.
        remaining: u32,
        /// Bounds each dwell period is drawn from; the lower bound is at
        /// least 1, so every period covers at least one message.
        dwell: Range<u32>,
    },
}

impl FaultPlan {
    /// A scripted plan; `true` entries are Active.
    pub fn scripted(states: impl IntoIterator<Item = bool>) -> Self {
        FaultPlan::Scripted {
            states: states.into_iter().collect(),
            last: true,
        }
    }

    /// A seeded plan starting Active, with per-period dwell drawn from
    /// `dwell` (in messages).
    ///
    /// Panics if `dwell` starts at 0: a zero-length period would flip the
    /// plan before its first message, contradicting the Active start.
    pub fn seeded(seed: u64, dwell: Range<u32>) -> Self {
        assert!(dwell.start > 0, "dwell periods must cover at least one message");
        let mut rng = StdRng::seed_from_u64(seed);
        let remaining = rng.gen_range(dwell.clone());
        FaultPlan::Seeded {
            rng,
            active: true,
            remaining,
            dwell,
        }
    }

    /// Consume one step and report whether the acceptor is available
    /// for this message.
    pub fn poll(&mut self) -> bool {
        match self {
            FaultPlan::Up => true,
            FaultPlan::Down => false,
            FaultPlan::Scripted { states, last } => {
                if let Some(s) = states.pop_front() {
                    *last = s;
                }
                *last
            }
            FaultPlan::Seeded {
                rng,
                active,
                remaining,
                dwell,
            } => {
                if *remaining == 0 {
                    *active = !*active;
                    *remaining = rng.gen_range(dwell.clone());
                }
                *remaining = remaining.saturating_sub(1);
                *active
            }
        }
    }
}
