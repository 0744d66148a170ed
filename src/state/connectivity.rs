use serde::Serialize;

/// Reachability of the remote store as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Mutations go local-only and the periodic poll is skipped.
    Offline,
    /// Mutations try the remote store first.
    Online,
}

/// Effect of a connectivity-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    WentOnline,
    WentOffline,
    Unchanged,
}

impl Connectivity {
    pub fn from_online(online: bool) -> Self {
        if online {
            Connectivity::Online
        } else {
            Connectivity::Offline
        }
    }

    pub fn is_online(self) -> bool {
        matches!(self, Connectivity::Online)
    }

    /// Classify a move from `self` to `next`.
    pub fn transition(self, next: Connectivity) -> Transition {
        match (self, next) {
            (Connectivity::Offline, Connectivity::Online) => Transition::WentOnline,
            (Connectivity::Online, Connectivity::Offline) => Transition::WentOffline,
            _ => Transition::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_classified() {
        use Connectivity::*;
        assert_eq!(Offline.transition(Online), Transition::WentOnline);
        assert_eq!(Online.transition(Offline), Transition::WentOffline);
        assert_eq!(Online.transition(Online), Transition::Unchanged);
        assert_eq!(Offline.transition(Offline), Transition::Unchanged);
    }
}
