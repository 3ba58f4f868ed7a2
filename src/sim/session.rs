//! Session state machine
//!
//! ```text
//! Menu --Start--> Playing --Pause--> Paused --Resume--> Playing
//! Playing --Collide--> GameOver --Restart--> Playing
//! GameOver --Abandon--> Menu,  Paused --Abandon--> Menu
//! ```
//!
//! Start and Restart fully reset the run before the first tick. Rejected
//! requests leave state and transition log untouched.

use super::state::{
    GameEvent, SessionCommand, SessionState, SimulationState, TransitionRecord,
};

/// A request the current state does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {command:?} while {from:?}")]
    Invalid {
        from: SessionState,
        command: SessionCommand,
    },
}

/// Target state for `command` from `from`, if the transition exists
pub fn next_state(from: SessionState, command: SessionCommand) -> Option<SessionState> {
    use SessionCommand::*;
    use SessionState::*;

    match (from, command) {
        (Menu, Start) => Some(Playing),
        (Playing, Pause | TogglePause) => Some(Paused),
        (Paused, Resume | TogglePause) => Some(Playing),
        (Playing, Collide) => Some(GameOver),
        (GameOver, Restart) => Some(Playing),
        (GameOver | Paused, Abandon) => Some(Menu),
        _ => None,
    }
}

impl SimulationState {
    /// Apply a session command, returning the events it produced
    pub fn request(&mut self, command: SessionCommand) -> Result<Vec<GameEvent>, TransitionError> {
        let from = self.session;
        let Some(to) = next_state(from, command) else {
            log::warn!("Rejected transition: {command:?} while {from:?}");
            return Err(TransitionError::Invalid { from, command });
        };

        let mut events = Vec::new();
        match command {
            SessionCommand::Start | SessionCommand::Restart => {
                self.reset_run();
                log::info!("Run started ({command:?})");
            }
            SessionCommand::Collide => {
                self.actor.alive = false;
                let final_score = self.score.final_score();
                log::info!(
                    "Run over after {} ticks, final score {}",
                    self.run_ticks,
                    final_score
                );
                events.push(GameEvent::ScoreSubmitted { final_score });
            }
            _ => {}
        }

        self.session = to;
        self.transitions.push(TransitionRecord {
            from,
            to,
            command,
            tick: self.run_ticks,
        });
        log::info!("Session {from:?} -> {to:?}");
        events.push(GameEvent::SessionChanged { from, to });
        Ok(events)
    }

    pub fn start(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        self.request(SessionCommand::Start)
    }

    pub fn toggle_pause(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        self.request(SessionCommand::TogglePause)
    }

    pub fn restart(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        self.request(SessionCommand::Restart)
    }

    pub fn abandon(&mut self) -> Result<Vec<GameEvent>, TransitionError> {
        self.request(SessionCommand::Abandon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn sim() -> SimulationState {
        SimulationState::new(Tuning::default()).unwrap()
    }

    #[test]
    fn test_transition_table() {
        use SessionCommand::*;
        use SessionState::*;

        assert_eq!(next_state(Menu, Start), Some(Playing));
        assert_eq!(next_state(Playing, TogglePause), Some(Paused));
        assert_eq!(next_state(Paused, TogglePause), Some(Playing));
        assert_eq!(next_state(Playing, Collide), Some(GameOver));
        assert_eq!(next_state(GameOver, Restart), Some(Playing));
        assert_eq!(next_state(GameOver, Abandon), Some(Menu));
        assert_eq!(next_state(Paused, Abandon), Some(Menu));

        assert_eq!(next_state(Menu, Pause), None);
        assert_eq!(next_state(GameOver, Start), None);
        assert_eq!(next_state(GameOver, Resume), None);
        assert_eq!(next_state(Playing, Abandon), None);
        assert_eq!(next_state(Paused, Collide), None);
        assert_eq!(next_state(Playing, Restart), None);
    }

    #[test]
    fn test_rejected_request_changes_nothing() {
        let mut s = sim();
        let err = s.request(SessionCommand::Restart).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                from: SessionState::Menu,
                command: SessionCommand::Restart
            }
        );
        assert_eq!(s.session, SessionState::Menu);
        assert!(s.transitions.is_empty());
    }

    #[test]
    fn test_collide_submits_score_once() {
        let mut s = sim();
        s.start().unwrap();
        s.score.on_obstacle_cleared(0.0);
        let events = s.request(SessionCommand::Collide).unwrap();
        let submissions: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ScoreSubmitted { .. }))
            .collect();
        assert_eq!(submissions, vec![&GameEvent::ScoreSubmitted { final_score: 1 }]);
        assert!(!s.actor.alive);

        // A second collision is rejected, so no second submission
        assert!(s.request(SessionCommand::Collide).is_err());
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut s = sim();
        s.start().unwrap();
        s.actor.y = 10.0;
        s.actor.velocity = 7.0;
        s.obstacles.spawn();
        s.score.on_obstacle_cleared(0.0);
        s.run_ticks = 500;
        s.request(SessionCommand::Collide).unwrap();

        s.restart().unwrap();
        let tuning = Tuning::default();
        assert_eq!(s.session, SessionState::Playing);
        assert_eq!(s.score.state().score, 0.0);
        assert_eq!(s.score.state().combo_count, 0);
        assert_eq!(s.score.state().multiplier, 1.0);
        assert_eq!(s.actor.y, tuning.actor_start_y);
        assert_eq!(s.actor.velocity, 0.0);
        assert!(s.actor.alive);
        assert!(s.obstacles.obstacles().is_empty());
        assert_eq!(s.run_ticks, 0);
        assert_eq!(s.physics.tracked_entities(), 0);
        // Start grace window
        assert!(s.collision.is_invincible());
    }

    #[test]
    fn test_resume_does_not_reset() {
        let mut s = sim();
        s.start().unwrap();
        s.score.on_obstacle_cleared(0.0);
        s.toggle_pause().unwrap();
        s.toggle_pause().unwrap();
        assert_eq!(s.session, SessionState::Playing);
        assert_eq!(s.score.state().score, 1.0);
    }

    #[test]
    fn test_transitions_are_logged() {
        let mut s = sim();
        s.start().unwrap();
        s.toggle_pause().unwrap();
        s.abandon().unwrap();
        let path: Vec<_> = s.transitions.iter().map(|r| (r.from, r.to)).collect();
        assert_eq!(
            path,
            vec![
                (SessionState::Menu, SessionState::Playing),
                (SessionState::Playing, SessionState::Paused),
                (SessionState::Paused, SessionState::Menu),
            ]
        );
    }
}
