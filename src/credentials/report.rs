// src/credentials/report.rs
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotSelected,
    NothingToSecure,
    NoContexts,
    NothingStored,
    Declined,
    NotDelegated,
    NoStoredSecret,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotSelected => "not the selected user",
            Self::NothingToSecure => "nothing to secure",
            Self::NoContexts => "no context links it to a cluster",
            Self::NothingStored => "no secret was stored for any of its clusters",
            Self::Declined => "operator declined to remove sensitive parts",
            Self::NotDelegated => "doesn't seem to be configured to use this helper",
            Self::NoStoredSecret => "no stored secret found for any of its clusters",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sensitive fields moved to the vault under each listed endpoint.
    Secured { user: String, servers: Vec<String> },
    /// Sensitive fields copied back from the record stored for `server`.
    Restored { user: String, server: String },
    Skipped { user: String, reason: SkipReason },
}

impl Outcome {
    pub fn user(&self) -> &str {
        match self {
            Self::Secured { user, .. } | Self::Restored { user, .. } | Self::Skipped { user, .. } => {
                user
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcome_for(&self, user: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.user() == user)
    }

    pub fn changed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, Outcome::Skipped { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.changed()
    }

    pub fn summary(&self, verb: &str) -> String {
        format!("{} {} user(s), skipped {}", verb, self.changed(), self.skipped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_changed_and_skipped() {
        let mut report = Report::default();
        report.push(Outcome::Secured {
            user: "alice".into(),
            servers: vec!["https://a.example".into()],
        });
        report.push(Outcome::Skipped {
            user: "bob".into(),
            reason: SkipReason::NothingToSecure,
        });
        assert_eq!(report.summary("Secured"), "Secured 1 user(s), skipped 1");
        assert_eq!(
            report.outcome_for("bob"),
            Some(&Outcome::Skipped {
                user: "bob".into(),
                reason: SkipReason::NothingToSecure
            })
        );
    }
}
