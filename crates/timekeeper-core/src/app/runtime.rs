impl TimekeeperApp {
    /// One tick of the once-per-second loop.
    ///
    /// `None` means the clock could not be read this tick: show the fault
    /// frame, advance nothing, commit nothing, retry next second.
    pub fn tick(&mut self, reading: Option<ClockReading>) -> TickOutcome {
        let Some(reading) = reading else {
            return TickOutcome {
                frame: DisplayFrame::fault(),
                phase: self.phase(),
                save: SaveKind::None,
                rolled_over: false,
            };
        };

        let mut save = SaveKind::None;
        let mut rolled_over = false;

        let today = clock::yyyymmdd(&reading.time);
        if today != self.state.day {
            info!(
                "day rollover {} -> {}: countdown reset to {}s",
                self.state.day, today, self.config.daily_target_secs
            );
            self.state.day = today;
            self.state.started = false;
            self.state.remaining = self.config.daily_target_secs;
            save = SaveKind::Immediate;
            rolled_over = true;
        }

        // Negative deltas (clock rewound) count as zero; oversized deltas
        // are capped so a jump or a missed stretch of ticks cannot burn
        // more than one minute of countdown.
        let delta = match self.last_epoch {
            Some(prev) => (reading.epoch - prev).clamp(0, DELTA_CLAMP_SECS),
            None => 0,
        };
        self.last_epoch = Some(reading.epoch);

        if self.state.started && self.state.remaining > 0 {
            let dec = (delta as i32).min(self.state.remaining);
            self.state.remaining -= dec;
            if self.state.remaining == 0 {
                info!("daily target reached");
            }
            if dec > 0
                && self.state.remaining % 60 == 0
                && save == SaveKind::None
                && self.throttle_open(reading.epoch)
            {
                save = SaveKind::Throttled;
            }
        }

        if save != SaveKind::None {
            self.note_save(Some(reading.epoch));
        }

        TickOutcome {
            frame: render::remaining_frame(self.state.remaining, reading.time.second),
            phase: self.phase(),
            save,
            rolled_over,
        }
    }
}
