//! Notification badge state and relative timestamps for the notice board.

/// Label shown on the bell for `total` notifications.
pub fn badge_label(total: usize) -> String {
    if total > 9 {
        "9+".to_string()
    } else {
        total.to_string()
    }
}

/// What the bell should show after a notifications snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeUpdate {
    pub label: String,
    /// The feed grew since the last non-empty snapshot.
    pub alert: bool,
}

/// Tracks the last seen notification total across snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    last_total: usize,
    label: String,
}

impl Default for Badge {
    fn default() -> Self {
        Self::new()
    }
}

impl Badge {
    pub fn new() -> Self {
        Self {
            last_total: 0,
            label: "0".to_string(),
        }
    }

    /// Records a snapshot of `total` entries.
    ///
    /// An empty feed resets the label but keeps the last total, so a feed
    /// that is cleared and refilled to the same size does not alert.
    pub fn observe(&mut self, total: usize) -> BadgeUpdate {
        self.label = badge_label(total);
        if total == 0 {
            return BadgeUpdate {
                label: self.label.clone(),
                alert: false,
            };
        }

        let alert = total > self.last_total;
        self.last_total = total;
        BadgeUpdate {
            label: self.label.clone(),
            alert,
        }
    }

    /// The reader opened the list.
    pub fn acknowledge(&mut self) {
        self.label = "0".to_string();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn last_total(&self) -> usize {
        self.last_total
    }
}

/// Whole minutes between `ts` and `now` (both epoch millis), for display.
pub fn time_ago(ts: i64, now: i64) -> String {
    let minutes = now.saturating_sub(ts).div_euclid(60_000);
    match minutes {
        m if m <= 0 => "Just now".to_string(),
        1 => "1 min".to_string(),
        m => format!("{m} min"),
    }
}
