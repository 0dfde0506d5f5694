//! IPC message dispatch: parse s-expressions and route to handlers.

use lexpr::Value;
use tracing::{debug, info, warn};

use crate::state::HandvoxState;

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns an optional response string (s-expression).
pub fn handle_message(state: &mut HandvoxState, raw: &str) -> Option<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);
    debug!(msg_id, "IPC message {:?}", msg_type);

    match msg_type.as_deref() {
        Some("status") => handle_status(state, msg_id),
        Some("voxel-count") => handle_voxel_count(state, msg_id),
        Some("place") => handle_place(state, msg_id),
        Some("remove") => handle_remove(state, msg_id),
        Some("undo") => handle_undo(state, msg_id),
        Some("reset") => handle_reset(state, msg_id),
        Some("export") => handle_export(state, msg_id),
        Some("load") => handle_load(state, msg_id, &value),
        Some("set-hold-delay") => handle_set_hold_delay(state, msg_id, &value),
        Some("set-debounce") => handle_set_debounce(state, msg_id, &value),
        Some("set-sensitivity") => handle_set_sensitivity(state, msg_id, &value),
        Some("quit") => handle_quit(state, msg_id),
        Some(other) => {
            warn!("unknown message type: {}", other);
            Some(error_response(
                msg_id,
                &format!("unknown message type: {other}"),
            ))
        }
        None => Some(error_response(msg_id, "missing :type field")),
    }
}

// ── Handlers ────────────────────────────────────────────────

fn handle_status(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :handvox {})",
        msg_id,
        state.status_sexp()
    ))
}

fn handle_voxel_count(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :count {})",
        msg_id,
        state.controller.world().len()
    ))
}

fn handle_place(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    let placed = state.controller.place_at_cursor();
    Some(format!(
        "(:type :response :id {} :status :ok :placed {})",
        msg_id,
        sexp_bool(placed)
    ))
}

fn handle_remove(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    let removed = state.controller.remove_at_cursor();
    Some(format!(
        "(:type :response :id {} :status :ok :removed {})",
        msg_id,
        sexp_bool(removed)
    ))
}

fn handle_undo(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    let undone = state.controller.undo();
    Some(format!(
        "(:type :response :id {} :status :ok :undone {})",
        msg_id,
        sexp_bool(undone)
    ))
}

fn handle_reset(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    state.reset();
    Some(ok_response(msg_id))
}

fn handle_export(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    match state.controller.export_json() {
        Ok(json) => Some(format!(
            "(:type :response :id {} :status :ok :data \"{}\")",
            msg_id,
            escape_string(&json)
        )),
        Err(e) => Some(error_response(msg_id, &e.to_string())),
    }
}

fn handle_load(state: &mut HandvoxState, msg_id: i64, value: &Value) -> Option<String> {
    let Some(data) = get_string(value, "data") else {
        return Some(error_response(msg_id, "missing :data"));
    };
    match state.controller.load_snapshot(&data) {
        Ok(count) => Some(format!(
            "(:type :response :id {} :status :ok :loaded {})",
            msg_id, count
        )),
        Err(e) => {
            warn!("snapshot load failed: {}", e);
            Some(error_response(msg_id, &e.to_string()))
        }
    }
}

fn handle_set_hold_delay(state: &mut HandvoxState, msg_id: i64, value: &Value) -> Option<String> {
    let ms = match get_int(value, "ms") {
        Some(ms) if (100..=10_000).contains(&ms) => ms as f64,
        _ => return Some(error_response(msg_id, "invalid :ms (100-10000)")),
    };
    state.controller.config_mut().hold_delay_ms = ms;
    info!("Hold delay set to {}ms", ms);
    Some(format!(
        "(:type :response :id {} :status :ok :ms {:.0})",
        msg_id, ms
    ))
}

fn handle_set_debounce(state: &mut HandvoxState, msg_id: i64, value: &Value) -> Option<String> {
    let ms = match get_int(value, "ms") {
        Some(ms) if (0..=5_000).contains(&ms) => ms as f64,
        _ => return Some(error_response(msg_id, "invalid :ms (0-5000)")),
    };
    state.controller.config_mut().rotate_debounce_ms = ms;
    info!("Rotation debounce set to {}ms", ms);
    Some(format!(
        "(:type :response :id {} :status :ok :ms {:.0})",
        msg_id, ms
    ))
}

fn handle_set_sensitivity(state: &mut HandvoxState, msg_id: i64, value: &Value) -> Option<String> {
    let sensitivity = match get_float(value, "value") {
        Some(v) if v.is_finite() && v > 0.0 && v <= 20.0 => v as f32,
        _ => return Some(error_response(msg_id, "invalid :value (0-20)")),
    };
    state.controller.config_mut().rotate_sensitivity = sensitivity;
    info!("Rotation sensitivity set to {:.2}", sensitivity);
    Some(format!(
        "(:type :response :id {} :status :ok :value {:.2})",
        msg_id, sensitivity
    ))
}

fn handle_quit(state: &mut HandvoxState, msg_id: i64) -> Option<String> {
    info!("Quit requested over IPC");
    state.running = false;
    Some(ok_response(msg_id))
}

// ── Helpers ─────────────────────────────────────────────────

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

fn sexp_bool(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Extract a keyword value from an s-expression plist.
/// Handles both `Value::Keyword("key")` and `Value::Symbol(":key")` forms.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            let Value::Cons(next) = pair.cdr() else {
                return None;
            };
            let val = next.car();
            return match val {
                Value::Keyword(v) => Some(v.to_string()),
                Value::Symbol(v) => {
                    let s = v.to_string();
                    Some(s.strip_prefix(':').unwrap_or(&s).to_string())
                }
                Value::String(v) => Some(v.to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(sexp_bool(*b).to_string()),
                Value::Null => Some("nil".to_string()),
                _ => Some(val.to_string()),
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract an integer value from an s-expression plist.
fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a floating-point value from an s-expression plist.
fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a string value from an s-expression plist.
fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Format an unsolicited event for the presentation layer.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}
