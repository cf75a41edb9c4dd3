// Trigger Authorization
//
// The poll trigger is guarded by a shared secret carried in a request
// header. An unset or empty configured secret rejects every request: the
// gate fails closed, never open.

/// Header carrying the trigger credential.
pub const SECRET_HEADER: &str = "x-poll-secret";

/// Shared secret for the poll trigger.
#[derive(Clone)]
pub struct PollSecret {
    secret: String,
}

impl PollSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check a presented credential.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        if self.secret.is_empty() {
            tracing::warn!("poll secret is not configured; rejecting trigger request");
            return false;
        }
        presented == Some(self.secret.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_secret() {
        let secret = PollSecret::new("hunter2");
        assert!(secret.verify(Some("hunter2")));
    }

    #[test]
    fn rejects_mismatched_secret() {
        let secret = PollSecret::new("hunter2");
        assert!(!secret.verify(Some("hunter3")));
    }

    #[test]
    fn rejects_missing_secret() {
        let secret = PollSecret::new("hunter2");
        assert!(!secret.verify(None));
    }

    #[test]
    fn empty_configured_secret_rejects_everything() {
        let secret = PollSecret::new("");
        assert!(!secret.verify(Some("")));
        assert!(!secret.verify(None));
    }
}
