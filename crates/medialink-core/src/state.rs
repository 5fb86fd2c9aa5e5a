use crate::text::textual_enum;

textual_enum! {
    /// Connection lifecycle state of a media.
    ///
    /// `Closed -> Opening -> Open -> Closing -> Closed`. `Changed` is not a
    /// lifecycle phase: it signals that settings changed while open and is
    /// routed through the same state-change channel.
    pub enum MediaState {
        Closed => "Closed",
        Open => "Open",
        Opening => "Opening",
        Closing => "Closing",
        Changed => "Changed",
    }
}

impl Default for MediaState {
    fn default() -> Self {
        MediaState::Closed
    }
}

impl MediaState {
    /// Whether `self -> next` is a legal lifecycle step.
    ///
    /// `Changed` is only legal as a notification while `Open`.
    pub fn can_transition_to(self, next: MediaState) -> bool {
        matches!(
            (self, next),
            (MediaState::Closed, MediaState::Opening)
                | (MediaState::Opening, MediaState::Open)
                | (MediaState::Opening, MediaState::Closed)
                | (MediaState::Open, MediaState::Closing)
                | (MediaState::Open, MediaState::Changed)
                | (MediaState::Closing, MediaState::Closed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("OPEN".parse::<MediaState>().unwrap(), MediaState::Open);
        assert_eq!("closing".parse::<MediaState>().unwrap(), MediaState::Closing);
        assert_eq!(" Changed ".parse::<MediaState>().unwrap(), MediaState::Changed);
    }

    #[test]
    fn render_is_canonical() {
        let rendered: Vec<_> = MediaState::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(rendered, ["Closed", "Open", "Opening", "Closing", "Changed"]);
    }

    #[test]
    fn unknown_text_is_unknown_enum() {
        let err = "half-open".parse::<MediaState>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownEnum);
    }

    #[test]
    fn lifecycle_transitions() {
        use MediaState::*;
        assert!(Closed.can_transition_to(Opening));
        assert!(Opening.can_transition_to(Open));
        assert!(Open.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Closed));
        assert!(Open.can_transition_to(Changed));

        assert!(!Closed.can_transition_to(Open));
        assert!(!Open.can_transition_to(Opening));
        assert!(!Closed.can_transition_to(Changed));
    }
}
