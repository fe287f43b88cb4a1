//! JSON profile document
//!
//! Parses the user-editable profile document into a [`KnobConfig`]. The
//! document is parsed into a `serde_json::Value` tree on the heap and then
//! walked leniently: anything missing or malformed below the top level
//! keeps its default instead of failing the whole document.
//!
//! ```json
//! {
//!   "current_profile": 1,
//!   "sensitivity_volume": 2,
//!   "sensitivity_scroll": 1,
//!   "sensitivity_mouse": 4,
//!   "profiles": [
//!     {
//!       "cw": {"type": "simple", "action": "volume_up"},
//!       "click": {"type": "macro", "keys": ["CTRL", "C"]},
//!       "long_press": {"type": "simple", "action": "next_profile"}
//!     }
//!   ]
//! }
//! ```

use alloc::string::String;
use serde_json::{Map, Value};

use crate::action::{
    Action, KeyCode, Macro, MouseButton, ProfileControl, SimpleAction, Step, MAX_MACRO_STEPS,
};
use crate::config::defaults::default_profile;
use crate::config::{KnobConfig, MacroPolicy};
use crate::gesture::GestureKind;
use crate::profile::{sanitize_multiplier, Profile, Sensitivity, PROFILE_COUNT};

/// Hold time between pressing and releasing a chord
pub const CHORD_HOLD_MS: u16 = 10;

/// Document-level parse failures
///
/// Only a document that is not JSON at all, or whose root is not an
/// object, is rejected. Everything else degrades to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JsonError {
    /// Not valid JSON
    Syntax,
    /// Root is not an object
    NotAnObject,
}

/// Document key for each gesture slot
pub const fn gesture_key(gesture: GestureKind) -> &'static str {
    match gesture {
        GestureKind::RotateCw => "cw",
        GestureKind::RotateCcw => "ccw",
        GestureKind::SingleClick => "click",
        GestureKind::DoubleClick => "double_click",
        GestureKind::TripleClick => "triple_click",
        GestureKind::LongPress => "long_press",
        GestureKind::ShiftRotateCw => "cw_shifted",
        GestureKind::ShiftRotateCcw => "ccw_shifted",
    }
}

/// Parse a profile document
pub fn parse_config(bytes: &[u8]) -> Result<KnobConfig, JsonError> {
    let root: Value = serde_json::from_slice(bytes).map_err(|_| JsonError::Syntax)?;
    let doc = root.as_object().ok_or(JsonError::NotAnObject)?;
    Ok(config_from_object(doc))
}

/// Parse a profile document from a string
pub fn parse_config_str(text: &str) -> Result<KnobConfig, JsonError> {
    parse_config(text.as_bytes())
}

fn config_from_object(doc: &Map<String, Value>) -> KnobConfig {
    let mut config = KnobConfig::default();

    config.active_profile = match doc.get("current_profile").and_then(Value::as_u64) {
        Some(n) if (1..=PROFILE_COUNT as u64).contains(&n) => (n - 1) as u8,
        Some(n) => {
            warn!("current_profile {} out of range, using 1", n);
            0
        }
        None => 0,
    };

    let global = Sensitivity {
        volume: multiplier(doc.get("sensitivity_volume")),
        scroll: multiplier(doc.get("sensitivity_scroll")),
        mouse: multiplier(doc.get("sensitivity_mouse")),
    };

    let listed = doc.get("profiles").and_then(Value::as_array);
    if listed.is_none() {
        warn!("no profiles array, using built-in profiles");
    }
    for (i, slot) in config.profiles.profiles.iter_mut().enumerate() {
        *slot = match listed.and_then(|list| list.get(i)) {
            Some(value) => parse_profile(value, global),
            None => {
                debug!("profile {} missing, using built-in", i);
                default_profile(i)
            }
        };
    }

    if let Some(timing) = doc.get("timing").and_then(Value::as_object) {
        if let Some(ms) = timing.get("long_press_ms").and_then(Value::as_u64) {
            config.timing.long_press_ms = ms.min(u32::MAX as u64) as u32;
        }
        if let Some(ms) = timing.get("multi_click_ms").and_then(Value::as_u64) {
            config.timing.multi_click_ms = ms.min(u32::MAX as u64) as u32;
        }
        if let Some(n) = timing.get("debounce_samples").and_then(Value::as_u64) {
            config.conditioner.debounce_samples = n.min(u8::MAX as u64) as u8;
        }
    }

    if let Some(name) = doc.get("macro_policy").and_then(Value::as_str) {
        match MacroPolicy::from_name(name) {
            Some(policy) => config.macro_policy = policy,
            None => warn!("unknown macro_policy {:?}", name),
        }
    }

    config.sanitized()
}

/// Multiplier value; missing or out of range means 1
fn multiplier(value: Option<&Value>) -> u8 {
    value
        .and_then(Value::as_u64)
        .map(|m| sanitize_multiplier(m.min(u8::MAX as u64) as u8))
        .unwrap_or(1)
}

fn parse_profile(value: &Value, global: Sensitivity) -> Profile {
    let mut profile = Profile {
        sensitivity: global,
        ..Profile::default()
    };

    let Some(obj) = value.as_object() else {
        warn!("profile entry is not an object");
        return profile;
    };

    for gesture in GestureKind::ALL {
        if let Some(action) = obj.get(gesture_key(gesture)) {
            profile.set(gesture, parse_action(action));
        }
    }

    if let Some(s) = obj.get("sensitivity").and_then(Value::as_object) {
        if let Some(v) = s.get("volume") {
            profile.sensitivity.volume = multiplier(Some(v));
        }
        if let Some(v) = s.get("scroll") {
            profile.sensitivity.scroll = multiplier(Some(v));
        }
        if let Some(v) = s.get("mouse") {
            profile.sensitivity.mouse = multiplier(Some(v));
        }
    }

    profile
}

/// Parse an action object; anything malformed is the no-op
pub fn parse_action(value: &Value) -> Action {
    let Some(obj) = value.as_object() else {
        return Action::nothing();
    };

    match obj.get("type").and_then(Value::as_str) {
        Some("simple") => {
            let name = obj.get("action").and_then(Value::as_str).unwrap_or("nothing");
            if let Some(control) = ProfileControl::from_name(name) {
                Action::ProfileControl(control)
            } else if let Some(simple) = SimpleAction::from_name(name) {
                Action::Simple(simple)
            } else {
                warn!("unknown simple action {:?}", name);
                Action::nothing()
            }
        }
        Some("macro") => {
            let steps = if let Some(steps) = obj.get("steps").and_then(Value::as_array) {
                parse_steps(steps)
            } else if let Some(keys) = obj.get("keys").and_then(Value::as_array) {
                chord(keys)
            } else {
                Macro::new()
            };
            if steps.is_empty() {
                warn!("macro without usable steps");
                Action::nothing()
            } else {
                Action::Macro(steps)
            }
        }
        other => {
            warn!("unknown action type {:?}", other);
            Action::nothing()
        }
    }
}

/// Key given by name or raw usage id
fn key(value: &Value) -> Option<KeyCode> {
    let code = match value {
        Value::String(name) => KeyCode::from_name(name),
        Value::Number(n) => n.as_u64().filter(|c| *c <= u8::MAX as u64).map(|c| KeyCode(c as u8)),
        _ => None,
    };
    if code.is_none() {
        warn!("unknown key {:?}", value.as_str());
    }
    code
}

/// Expand a chord: press every key, hold briefly, release all
fn chord(keys: &[Value]) -> Macro {
    let mut steps = Macro::new();
    for code in keys.iter().filter_map(key).take(MAX_MACRO_STEPS - 2) {
        let _ = steps.push(Step::KeyPress(code));
    }
    if !steps.is_empty() {
        let _ = steps.push(Step::Wait(CHORD_HOLD_MS));
        let _ = steps.push(Step::ReleaseAll);
    }
    steps
}

fn parse_steps(values: &[Value]) -> Macro {
    let mut steps = Macro::new();
    for value in values {
        let Some(step) = parse_step(value) else {
            warn!("skipping malformed macro step");
            continue;
        };
        if steps.push(step).is_err() {
            warn!("macro truncated at {} steps", MAX_MACRO_STEPS);
            break;
        }
    }
    steps
}

fn parse_step(value: &Value) -> Option<Step> {
    let obj = value.as_object()?;

    if let Some(k) = obj.get("press") {
        return key(k).map(Step::KeyPress);
    }
    if let Some(k) = obj.get("release") {
        return key(k).map(Step::KeyRelease);
    }
    if let Some(k) = obj.get("tap") {
        return key(k).map(Step::KeyTap);
    }
    if obj.contains_key("release_all") {
        return Some(Step::ReleaseAll);
    }
    if let Some(ms) = obj.get("wait").and_then(Value::as_u64) {
        return Some(Step::Wait(ms.min(u16::MAX as u64) as u16));
    }
    if let Some(delta) = obj.get("mouse_move").and_then(Value::as_array) {
        let axis = |i: usize| {
            delta
                .get(i)
                .and_then(Value::as_i64)
                .map(|d| d.clamp(i8::MIN as i64, i8::MAX as i64) as i8)
        };
        return Some(Step::MouseMove {
            dx: axis(0)?,
            dy: axis(1)?,
        });
    }
    if let Some(name) = obj.get("mouse_button").and_then(Value::as_str) {
        let button = MouseButton::from_name(name)?;
        let pressed = obj.get("pressed").and_then(Value::as_bool).unwrap_or(true);
        return Some(Step::MouseButton { button, pressed });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::DEFAULT_SENSITIVITY;
    use crate::gesture::TimingConfig;

    #[test]
    fn test_rejects_non_json() {
        assert_eq!(parse_config(b"{not json"), Err(JsonError::Syntax));
        assert_eq!(parse_config(b"[1, 2]"), Err(JsonError::NotAnObject));
    }

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = parse_config_str("{}").unwrap();
        assert_eq!(config, KnobConfig::default());
    }

    #[test]
    fn test_full_document() {
        let doc = r#"{
            "current_profile": 2,
            "sensitivity_volume": 3,
            "sensitivity_scroll": 5,
            "sensitivity_mouse": 7,
            "profiles": [
                {
                    "cw": {"type": "simple", "action": "volume_up"},
                    "ccw": {"type": "simple", "action": "volume_down"},
                    "long_press": {"type": "simple", "action": "switch_profile_3"}
                },
                {
                    "cw": {"type": "simple", "action": "mouse_scroll_v_pos"},
                    "ccw": {"type": "simple", "action": "scroll_down"},
                    "double_click": {"type": "macro", "keys": ["CTRL", "c"]},
                    "sensitivity": {"scroll": 9}
                },
                {
                    "click": {"type": "simple", "action": "mouse_click_left"},
                    "cw_shifted": {"type": "simple", "action": "redo"}
                }
            ]
        }"#;
        let config = parse_config_str(doc).unwrap();
        assert_eq!(config.active_profile, 1);

        let p0 = &config.profiles.profiles[0];
        assert_eq!(
            p0.sensitivity,
            Sensitivity {
                volume: 3,
                scroll: 5,
                mouse: 7
            }
        );
        assert_eq!(
            p0.action(GestureKind::LongPress),
            &Action::ProfileControl(ProfileControl::SetProfile(2))
        );
        assert!(p0.action(GestureKind::SingleClick).is_nothing());

        let p1 = &config.profiles.profiles[1];
        assert_eq!(p1.sensitivity.scroll, 9);
        assert_eq!(p1.sensitivity.volume, 3);
        assert_eq!(
            p1.action(GestureKind::RotateCw),
            &Action::Simple(SimpleAction::ScrollUp)
        );
        assert_eq!(
            p1.action(GestureKind::RotateCcw),
            &Action::Simple(SimpleAction::ArrowDown)
        );
        assert_eq!(
            p1.action(GestureKind::DoubleClick),
            &Action::from_steps(&[
                Step::KeyPress(KeyCode::LEFT_CTRL),
                Step::KeyPress(KeyCode::C),
                Step::Wait(CHORD_HOLD_MS),
                Step::ReleaseAll,
            ])
        );

        let p2 = &config.profiles.profiles[2];
        assert_eq!(
            p2.action(GestureKind::SingleClick),
            &Action::Simple(SimpleAction::MouseClick(MouseButton::Left))
        );
        assert_eq!(
            p2.action(GestureKind::ShiftRotateCw),
            &Action::Simple(SimpleAction::Redo)
        );
    }

    #[test]
    fn test_steps_macro() {
        let doc = r#"{"profiles": [{"click": {"type": "macro", "steps": [
            {"press": "shift"},
            {"tap": "a"},
            {"wait": 50},
            {"release": "SHIFT"},
            {"mouse_move": [10, -300]},
            {"mouse_button": "right", "pressed": false},
            {"bogus": 1},
            {"tap": "NOT_A_KEY"},
            {"release_all": true}
        ]}}]}"#;
        let config = parse_config_str(doc).unwrap();
        assert_eq!(
            config.profiles.profiles[0].action(GestureKind::SingleClick),
            &Action::from_steps(&[
                Step::KeyPress(KeyCode::LEFT_SHIFT),
                Step::KeyTap(KeyCode::A),
                Step::Wait(50),
                Step::KeyRelease(KeyCode::LEFT_SHIFT),
                Step::MouseMove { dx: 10, dy: -128 },
                Step::MouseButton {
                    button: MouseButton::Right,
                    pressed: false
                },
                Step::ReleaseAll,
            ])
        );
    }

    #[test]
    fn test_malformed_entries_fall_back() {
        let doc = r#"{
            "current_profile": 9,
            "sensitivity_volume": 0,
            "sensitivity_scroll": 11,
            "sensitivity_mouse": "fast",
            "profiles": [
                "not a profile",
                {"cw": {"type": "simple", "action": "warp_drive"},
                 "ccw": {"type": "teleport"},
                 "click": 42,
                 "double_click": {"type": "macro", "keys": []}}
            ]
        }"#;
        let config = parse_config_str(doc).unwrap();
        assert_eq!(config.active_profile, 0);

        let ones = Sensitivity::default();
        let p0 = &config.profiles.profiles[0];
        assert_eq!(p0.sensitivity, ones);
        assert!(GestureKind::ALL.iter().all(|g| p0.action(*g).is_nothing()));

        let p1 = &config.profiles.profiles[1];
        assert_eq!(p1.sensitivity, ones);
        assert!(GestureKind::ALL.iter().all(|g| p1.action(*g).is_nothing()));

        // Missing third profile is padded with the built-in one
        assert_eq!(config.profiles.profiles[2], default_profile(2));
        assert_eq!(config.profiles.profiles[2].sensitivity, DEFAULT_SENSITIVITY);
    }

    #[test]
    fn test_timing_and_policy() {
        let doc = r#"{
            "timing": {"long_press_ms": 800, "multi_click_ms": 250, "debounce_samples": 2},
            "macro_policy": "abort"
        }"#;
        let config = parse_config_str(doc).unwrap();
        assert_eq!(
            config.timing,
            TimingConfig {
                long_press_ms: 800,
                multi_click_ms: 250
            }
        );
        assert_eq!(config.conditioner.debounce_samples, 2);
        assert_eq!(config.macro_policy, MacroPolicy::Abort);
    }

    #[test]
    fn test_raw_key_codes() {
        let action = parse_action(&serde_json::json!({"type": "macro", "keys": [224, 6]}));
        assert_eq!(
            action,
            Action::from_steps(&[
                Step::KeyPress(KeyCode::LEFT_CTRL),
                Step::KeyPress(KeyCode::C),
                Step::Wait(CHORD_HOLD_MS),
                Step::ReleaseAll,
            ])
        );
    }
}
