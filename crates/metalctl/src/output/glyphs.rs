// Status glyphs for machine tables.

use chrono::{DateTime, TimeDelta, Utc};
use metal_api::models::MachineResponse;

pub const DEAD: &str = "💀";
pub const UNKNOWN: &str = "❓";
pub const LOCKED: &str = "🔒";
pub const RESERVED: &str = "🚧";
pub const LED_ON: &str = "💡";
pub const RECENT_ERROR: &str = "⭕";

pub const TREE_BRANCH: &str = "├─╴";
pub const TREE_LAST: &str = "└─╴";

/// Last error events newer than this get the error glyph.
pub const RECENT_ERROR_THRESHOLD: TimeDelta = TimeDelta::days(7);

/// Alive machines render blank.
pub fn liveliness(value: Option<&str>) -> &'static str {
    match value.unwrap_or_default().to_lowercase().as_str() {
        "alive" => "",
        "dead" => DEAD,
        _ => UNKNOWN,
    }
}

pub fn lock_state(state: &str) -> &'static str {
    match state {
        "LOCKED" => LOCKED,
        "RESERVED" => RESERVED,
        _ => "",
    }
}

/// Liveliness, lock, LED and recent-error glyphs joined for one cell.
pub fn machine_status(m: &MachineResponse, now: DateTime<Utc>) -> String {
    let mut glyphs = vec![liveliness(m.liveliness.as_deref()), lock_state(&m.state.value)];
    if m.ledstate.as_ref().is_some_and(|l| l.value == "LED-ON") {
        glyphs.push(LED_ON);
    }
    if has_recent_error(m, now) {
        glyphs.push(RECENT_ERROR);
    }
    glyphs.retain(|g| !g.is_empty());
    glyphs.join(" ")
}

pub fn has_recent_error(m: &MachineResponse, now: DateTime<Utc>) -> bool {
    m.events
        .as_ref()
        .and_then(|e| e.last_error_event.as_ref())
        .and_then(|e| e.time)
        .is_some_and(|t| now - t < RECENT_ERROR_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use metal_api::models::{MachineEvents, MachineState, ProvisioningEvent};

    use super::*;

    #[test]
    fn liveliness_glyphs() {
        assert_eq!(liveliness(Some("Alive")), "");
        assert_eq!(liveliness(Some("Dead")), DEAD);
        assert_eq!(liveliness(None), UNKNOWN);
    }

    #[test]
    fn recent_errors_expire_after_a_week() {
        let now = Utc::now();
        let machine = |age: TimeDelta| MachineResponse {
            liveliness: Some("Alive".into()),
            state: MachineState {
                value: "LOCKED".into(),
                ..MachineState::default()
            },
            events: Some(MachineEvents {
                last_error_event: Some(ProvisioningEvent {
                    event: "Crashed".into(),
                    message: None,
                    time: Some(now - age),
                }),
                ..MachineEvents::default()
            }),
            ..MachineResponse::default()
        };

        assert_eq!(machine_status(&machine(TimeDelta::days(1)), now), "🔒 ⭕");
        assert_eq!(machine_status(&machine(TimeDelta::days(8)), now), "🔒");
    }
}
