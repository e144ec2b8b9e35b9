// Copyright 2025 the Ridgeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-driven loop scheduler.

use ridgeline_canvas::CanvasHost;
use ridgeline_map::Result;

use crate::context::RenderContext;

/// Fans one host frame callback out to the three cooperative loops.
///
/// The host calls [`Scheduler::frame`] from its animation-frame (or
/// timer) callback with a monotonic timestamp in milliseconds; the
/// scheduler runs each loop when its configured cadence has elapsed.
/// Recalc runs before redraw within a frame so a fresh invalidation is
/// composited and painted in the same frame when both are due.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    last_redraw: Option<f64>,
    last_recalc: Option<f64>,
    last_recheck: Option<f64>,
}

impl Scheduler {
    /// Creates a scheduler with no history; every loop fires on the
    /// first frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives the loops for one frame at `now` (monotonic milliseconds).
    pub fn frame(
        &mut self,
        ctx: &mut RenderContext,
        host: &mut dyn CanvasHost,
        now: f64,
    ) -> Result<()> {
        let config = ctx.config();
        let recalc_interval = 1000.0 / config.recalc_hz;
        let recheck_interval = 1000.0 / config.recheck_hz;
        let redraw_interval = 1000.0 / config.redraw_hz;

        if due(self.last_recalc, now, recalc_interval) {
            self.last_recalc = Some(now);
            ctx.recalc_tick(host)?;
        }
        if due(self.last_recheck, now, recheck_interval) {
            self.last_recheck = Some(now);
            ctx.recheck_tick()?;
        }
        if due(self.last_redraw, now, redraw_interval) {
            self.last_redraw = Some(now);
            ctx.redraw_tick(host)?;
        }
        Ok(())
    }
}

fn due(last: Option<f64>, now: f64, interval: f64) -> bool {
    last.is_none_or(|last| now - last >= interval)
}
