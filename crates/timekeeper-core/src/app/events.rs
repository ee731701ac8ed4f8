impl TimekeeperApp {
    /// Handles a station association.
    ///
    /// Classification: an address is accepted if no address is bound yet, if
    /// it matches the bound one, or if the daily re-learn window is still
    /// open (re-learn enabled and no check-in today). Anything else is
    /// ignored without touching state. The re-learn window closes the
    /// instant `started` flips true.
    pub fn on_sta_connected(&mut self, mac: Mac, aid: u16, now_ms: u64) -> ConnectOutcome {
        let matches = self.state.have_mac && self.state.mac == mac;
        let can_relearn = self.config.relearn_mac_daily && !self.state.started;

        if !(!self.state.have_mac || matches || can_relearn) {
            debug!(
                "sta aid={} rejected: not the bound address and check-in done",
                aid
            );
            return ConnectOutcome {
                decision: ConnectDecision::Ignored,
                save: false,
                deauth_at_ms: None,
            };
        }

        let mut save = false;
        let mut relearned = false;

        if !self.state.have_mac || (!matches && can_relearn) {
            relearned = self.state.have_mac;
            self.state.mac = mac;
            self.state.have_mac = true;
            save = true;
        }

        let first_connect = !self.state.started;
        if first_connect {
            self.state.started = true;
            save = true;
            info!("check-in: aid={} remaining={}s", aid, self.state.remaining);
        }

        let should_deauth = match self.config.deauth_policy {
            DeauthPolicy::Always => true,
            DeauthPolicy::OnFirstConnect => first_connect,
            DeauthPolicy::Never => false,
        };

        let deauth_at_ms = if should_deauth {
            // Arming overrides any previous schedule.
            self.deauth_aid = aid;
            self.deauth_mac = mac;
            self.deauth_pending = true;
            let due = now_ms + self.config.deauth_delay_ms;
            self.deauth_due_ms = Some(due);
            Some(due)
        } else {
            None
        };

        if save {
            self.note_save(self.last_epoch);
        }

        ConnectOutcome {
            decision: if first_connect {
                ConnectDecision::CheckedIn { relearned }
            } else {
                ConnectDecision::AlreadyCheckedIn
            },
            save,
            deauth_at_ms,
        }
    }

    /// Handles a station disassociation: cancels the pending deauth.
    /// Idempotent; persisted state is never touched here.
    pub fn on_sta_disconnected(&mut self, _mac: Mac, aid: u16) {
        if self.deauth_pending {
            debug!("sta aid={} left before deauth fired; cancelling", aid);
        }
        self.deauth_pending = false;
        self.deauth_aid = 0;
        self.deauth_due_ms = None;
    }

    /// Returns the AID to deauth exactly once when the delay has elapsed.
    /// The pending guard suppresses fires that race a disconnect.
    pub fn poll_deauth(&mut self, now_ms: u64) -> Option<u16> {
        let due = self.deauth_due_ms?;
        if now_ms < due {
            return None;
        }
        self.deauth_due_ms = None;

        if !self.deauth_pending || self.deauth_aid == 0 {
            return None;
        }
        let aid = self.deauth_aid;
        self.deauth_pending = false;
        self.deauth_aid = 0;
        debug!(
            "deauth due for aid={} mac={:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            aid,
            self.deauth_mac[0],
            self.deauth_mac[1],
            self.deauth_mac[2],
            self.deauth_mac[3],
            self.deauth_mac[4],
            self.deauth_mac[5],
        );
        Some(aid)
    }
}
