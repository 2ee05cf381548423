//! Room configuration and lifecycle phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
///
/// The defaults match the reference deployment: ten-minute sessions
/// counted down one whole second at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Each participant's starting time, in whole seconds.
    pub initial_time_secs: u64,

    /// How often the turn clock decrements the active participant.
    pub tick_period: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            initial_time_secs: 600,
            tick_period: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// WaitingForOpponent → Active ⇄ RematchRequested
///          │             │            │
///          └─────────────┴────────────┴──→ Closed
/// ```
///
/// - **WaitingForOpponent**: 0–1 participants seated, no clock.
/// - **Active**: both seats filled, clock tied to the turn holder.
/// - **RematchRequested**: play frozen, one accept away from a fresh
///   `Active` with reset clocks.
/// - **Closed**: terminal. The room id is free to be reused by an
///   unrelated fresh room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    WaitingForOpponent,
    Active,
    RematchRequested,
    Closed,
}

impl RoomPhase {
    /// Returns `true` if a game is in progress (or frozen mid-rematch).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active | Self::RematchRequested)
    }

    /// Returns `true` once the room has been torn down.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if transitioning to `target` is legal.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::WaitingForOpponent, Self::Active)
                | (Self::Active, Self::RematchRequested)
                | (Self::RematchRequested, Self::Active)
                | (Self::WaitingForOpponent, Self::Closed)
                | (Self::Active, Self::Closed)
                | (Self::RematchRequested, Self::Closed)
        )
    }

    /// Attempts the transition, rejecting anything outside the declared
    /// edges.
    pub fn transition_to(
        self,
        target: Self,
    ) -> Result<Self, crate::RoomError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(crate::RoomError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForOpponent => write!(f, "WaitingForOpponent"),
            Self::Active => write!(f, "Active"),
            Self::RematchRequested => write!(f, "RematchRequested"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_legal_transitions() {
        assert!(RoomPhase::WaitingForOpponent
            .can_transition_to(RoomPhase::Active));
        assert!(RoomPhase::Active
            .can_transition_to(RoomPhase::RematchRequested));
        assert!(RoomPhase::RematchRequested
            .can_transition_to(RoomPhase::Active));
        assert!(RoomPhase::WaitingForOpponent
            .can_transition_to(RoomPhase::Closed));
        assert!(RoomPhase::Active.can_transition_to(RoomPhase::Closed));
        assert!(RoomPhase::RematchRequested
            .can_transition_to(RoomPhase::Closed));
    }

    #[test]
    fn test_phase_illegal_transitions_rejected() {
        assert!(!RoomPhase::WaitingForOpponent
            .can_transition_to(RoomPhase::RematchRequested));
        assert!(!RoomPhase::Active
            .can_transition_to(RoomPhase::WaitingForOpponent));
        assert!(!RoomPhase::RematchRequested
            .can_transition_to(RoomPhase::RematchRequested));
        assert!(!RoomPhase::Closed.can_transition_to(RoomPhase::Active));
        assert!(!RoomPhase::Closed
            .can_transition_to(RoomPhase::WaitingForOpponent));
    }

    #[test]
    fn test_phase_transition_to_returns_error_on_illegal_edge() {
        let result = RoomPhase::Closed.transition_to(RoomPhase::Active);
        assert!(matches!(
            result,
            Err(crate::RoomError::InvalidTransition {
                from: RoomPhase::Closed,
                to: RoomPhase::Active,
            })
        ));
    }

    #[test]
    fn test_phase_is_active() {
        assert!(!RoomPhase::WaitingForOpponent.is_active());
        assert!(RoomPhase::Active.is_active());
        assert!(RoomPhase::RematchRequested.is_active());
        assert!(!RoomPhase::Closed.is_active());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(
            RoomPhase::WaitingForOpponent.to_string(),
            "WaitingForOpponent"
        );
        assert_eq!(RoomPhase::Closed.to_string(), "Closed");
    }

    #[test]
    fn test_room_config_default_matches_reference_deployment() {
        let config = RoomConfig::default();
        assert_eq!(config.initial_time_secs, 600);
        assert_eq!(config.tick_period, Duration::from_secs(1));
    }
}
