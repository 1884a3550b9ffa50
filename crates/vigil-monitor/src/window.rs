//! Height-keyed sliding window for recent missed blocks.

use chrono::{DateTime, Utc};

use vigil_protocols::ValidatorAlertState;

/// Fold one observed block into the window.
///
/// The window is block-height-based, not wall-clock: `latest_block_checked`
/// only ever advances, and a height at or behind it is a no-op. The counter
/// is the number of missed heights still inside `(height - window, height]`,
/// so it can never exceed the window size or go negative.
pub fn record_block(
    state: &mut ValidatorAlertState,
    window: i64,
    height: i64,
    signed: bool,
    time: DateTime<Utc>,
) {
    if height <= state.latest_block_checked {
        return;
    }
    state.latest_block_checked = height;

    if signed {
        state.latest_block_signed = height;
        state.latest_signed_timestamp = Some(time);
    } else {
        state.missed_heights.push_back(height);
    }

    let cutoff = height - window;
    while state.missed_heights.front().is_some_and(|h| *h <= cutoff) {
        state.missed_heights.pop_front();
    }

    state.recent_missed_blocks = state.missed_heights.len() as i64;
    state.recent_missed_blocks_max = state
        .recent_missed_blocks_max
        .max(state.recent_missed_blocks);
}
