//! Status line shown by the host.

use training_defence_core::{Event, Rejection};

/// Status shown before the first wave and after a clean reset.
pub(crate) const READY: &str = "Ready";

/// Derives the status line that follows an event, if the event changes it.
pub(crate) fn describe(event: &Event, wave_active: bool, wave: u32) -> Option<String> {
    let idle = || {
        if wave_active {
            format!("Wave {wave}")
        } else {
            READY.to_owned()
        }
    };
    let text = match event {
        Event::WaveStarted { wave, .. } => format!("Wave {wave}"),
        Event::WaveCleared { .. } => "Wave cleared".to_owned(),
        Event::EnemyEscaped { .. } => "Breach".to_owned(),
        Event::GameOver { .. } => "System down".to_owned(),
        Event::PauseChanged { paused: true } => "Paused".to_owned(),
        Event::PauseChanged { paused: false } | Event::SnapshotRestored { .. } => idle(),
        Event::RunReset => READY.to_owned(),
        Event::MapChanged { map } => format!("Map {}", map.definition().name),
        Event::CommandRejected { reason } => rejection(*reason),
        _ => return None,
    };
    Some(text)
}

/// Status line for a refused command.
pub(crate) fn rejection(reason: Rejection) -> String {
    match reason {
        Rejection::FieldNotClear | Rejection::MapNotUnlocked => "Map locked".to_owned(),
        Rejection::SystemDown => "System down".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use training_defence_core::{EnemyId, MapId};

    use super::*;

    #[test]
    fn breaches_and_game_over_are_announced() {
        let breach = Event::EnemyEscaped {
            enemy: EnemyId::new(1),
            lives_remaining: 3,
        };
        assert_eq!(describe(&breach, true, 2).as_deref(), Some("Breach"));
        assert_eq!(
            describe(&Event::GameOver { wave: 2 }, false, 2).as_deref(),
            Some("System down")
        );
    }

    #[test]
    fn unpausing_returns_to_the_wave_or_ready() {
        let resume = Event::PauseChanged { paused: false };
        assert_eq!(describe(&resume, true, 4).as_deref(), Some("Wave 4"));
        assert_eq!(describe(&resume, false, 4).as_deref(), Some(READY));
    }

    #[test]
    fn locked_maps_share_one_notice() {
        let locked = Event::CommandRejected {
            reason: Rejection::FieldNotClear,
        };
        assert_eq!(describe(&locked, true, 1).as_deref(), Some("Map locked"));
        assert_eq!(rejection(Rejection::MapNotUnlocked), "Map locked");
        assert_eq!(
            describe(&Event::MapChanged { map: MapId::Splice }, false, 0).as_deref(),
            Some("Map Splice Grid")
        );
    }

    #[test]
    fn routine_events_leave_the_status_alone() {
        let tick = Event::TimeAdvanced {
            dt: std::time::Duration::from_millis(33),
        };
        assert_eq!(describe(&tick, true, 1), None);
    }
}
