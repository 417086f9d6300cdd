//! Message dispatch: parse s-expressions and route to handlers.

use anyhow::{anyhow, bail, ensure, Result};
use lexpr::Value;
use tracing::{debug, warn};

use crate::gesture::{
    Frame, GestureController, GestureEvent, HandLandmarks, Landmark, TrackedPoint, LANDMARK_COUNT,
};

/// Lines produced for one inbound message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    /// Response and event lines, in write order.
    pub lines: Vec<String>,
    /// Some part of the message was refused with an error response.
    pub rejected: bool,
}

impl Reply {
    fn line(line: String) -> Self {
        Self {
            lines: vec![line],
            rejected: false,
        }
    }

    fn error(id: i64, reason: &str) -> Self {
        Self {
            lines: vec![error_response(id, reason)],
            rejected: true,
        }
    }
}

/// Parse an s-expression message and dispatch to the appropriate handler.
///
/// `fallback_ms` stands in for a frame's `:t` when the sender omits it.
pub fn handle_message(controller: &mut GestureController, raw: &str, fallback_ms: f64) -> Reply {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return Reply::error(0, &format!("malformed s-expression: {e}"));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("frame") => handle_frame(controller, msg_id, &value, fallback_ms),
        Some("reset") => Reply::line(handle_reset(controller, msg_id)),
        Some("status") => Reply::line(handle_status(controller, msg_id, fallback_ms)),
        Some("config") => match handle_config(controller, msg_id, &value) {
            Ok(line) => Reply::line(line),
            Err(e) => {
                warn!(msg_id, "config rejected: {:#}", e);
                Reply::error(msg_id, &format!("{e:#}"))
            }
        },
        Some(other) => Reply::error(msg_id, &format!("unknown message type: {other}")),
        None => Reply::error(msg_id, "missing :type field"),
    }
}

// ── Handlers ────────────────────────────────────────────────

fn handle_frame(
    controller: &mut GestureController,
    msg_id: i64,
    value: &Value,
    fallback_ms: f64,
) -> Reply {
    let timestamp_ms = get_float(value, "t").unwrap_or(fallback_ms);

    // A bad landmark list is reported, then processed as "no hand".
    let mut reply = Reply::default();
    let hand = match parse_landmarks(value) {
        Ok(hand) => hand,
        Err(e) => {
            warn!(msg_id, "rejected landmarks: {:#}", e);
            reply = Reply::error(msg_id, &format!("{e:#}"));
            None
        }
    };

    let output = controller.process(&Frame { timestamp_ms, hand });
    reply
        .lines
        .extend(output.events.iter().map(format_gesture_event));
    reply
}

fn handle_reset(controller: &mut GestureController, msg_id: i64) -> String {
    controller.reset();
    debug!("tracker state reset");
    ok_response(msg_id)
}

fn handle_status(controller: &GestureController, msg_id: i64, fallback_ms: f64) -> String {
    let now_ms = controller.last_timestamp_ms().unwrap_or(fallback_ms);
    format!(
        "(:type :response :id {} :status :ok :tracker (:mode :{} :pose :{} :orientation :{} :transition {} :history {} :text \"{}\"))",
        msg_id,
        controller.mode().as_str(),
        controller.last_pose().as_str(),
        controller.stable_orientation().as_str(),
        if controller.in_transition(now_ms) { "t" } else { "nil" },
        controller.history().len(),
        escape_string(controller.status_text()),
    )
}

fn handle_config(controller: &mut GestureController, msg_id: i64, value: &Value) -> Result<String> {
    let mut config = controller.config().clone();

    if let Some(enabled) = get_bool(value, "enabled") {
        config.enabled = enabled;
    }
    if let Some(warmup) = get_float(value, "warmup-ms") {
        ensure!(warmup >= 0.0, "warmup-ms must be non-negative");
        config.warmup_ms = warmup;
    }
    if let Some(transition) = get_float(value, "transition-ms") {
        ensure!(transition >= 0.0, "transition-ms must be non-negative");
        config.orientation.transition_ms = transition;
    }
    if let Some(cooldown) = get_float(value, "click-cooldown-ms") {
        ensure!(cooldown >= 0.0, "click-cooldown-ms must be non-negative");
        config.click.cooldown_ms = cooldown;
    }
    if let Some(threshold) = get_float(value, "click-z-threshold") {
        ensure!(threshold < 0.0, "click-z-threshold must be negative");
        config.click.z_threshold = threshold as f32;
    }
    if let Some(linearity) = get_float(value, "linearity-threshold") {
        config.analysis.linearity_threshold = linearity as f32;
    }
    if let Some(dead_zone) = get_float(value, "dead-zone") {
        config.analysis.dead_zone = dead_zone as f32;
    }

    controller.set_config(config);
    Ok(format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id,
        controller.config().config_sexp()
    ))
}

// ── Landmark parsing ────────────────────────────────────────

/// Read `:landmarks ((x y z) ...)`.  A missing or nil list means no hand.
fn parse_landmarks(value: &Value) -> Result<Option<HandLandmarks>> {
    let Some(list) = get_value(value, "landmarks") else {
        return Ok(None);
    };
    if is_nil(list) {
        return Ok(None);
    }

    let entries = list_items(list)?;
    let mut points = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let coords = list_items(entry)?
            .into_iter()
            .map(number)
            .collect::<Result<Vec<f32>>>()
            .map_err(|e| anyhow!("landmark {}: {}", i, e))?;
        let point = match coords[..] {
            [x, y] => Landmark::new(x, y, 0.0),
            [x, y, z] => Landmark::new(x, y, z),
            _ => bail!("landmark {} needs (x y z), got {} values", i, coords.len()),
        };
        points.push(point);
    }

    let count = points.len();
    HandLandmarks::from_points(points)
        .map(Some)
        .ok_or_else(|| anyhow!("expected {} landmarks, got {}", LANDMARK_COUNT, count))
}

fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Elements of a proper list.
fn list_items(value: &Value) -> Result<Vec<&Value>> {
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            v if is_nil(v) => return Ok(items),
            other => bail!("expected a list, got {}", other),
        }
    }
}

fn number(value: &Value) -> Result<f32> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| anyhow!("number out of range: {}", n)),
        other => bail!("expected a number, got {}", other),
    }
}

// ── Event formatting ────────────────────────────────────────

/// Render one gesture event as a protocol line.
pub fn format_gesture_event(event: &GestureEvent) -> String {
    match event {
        GestureEvent::ModeChanged { mode } => {
            format_event("gesture", &[("mode", &format!(":{}", mode.as_str()))])
        }
        GestureEvent::Scroll { delta_y } => {
            format_event("scroll", &[("delta", &format!("{:.6}", delta_y))])
        }
        GestureEvent::CursorMoved { x, y } => format_event(
            "cursor",
            &[("x", &format!("{:.4}", x)), ("y", &format!("{:.4}", y))],
        ),
        GestureEvent::Click { timestamp_ms } => {
            format_event("click", &[("t", &format!("{:.0}", timestamp_ms))])
        }
        GestureEvent::HistoryUpdated { points } => {
            format_event("history", &[("points", &points_sexp(points))])
        }
    }
}

fn points_sexp(points: &[TrackedPoint]) -> String {
    if points.is_empty() {
        return "nil".to_string();
    }
    let mut s = String::from("(");
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        s.push_str(&format!(
            "({:.4} {:.4} {:.0} :{})",
            p.x,
            p.y,
            p.timestamp_ms,
            p.orientation.as_str()
        ));
    }
    s.push(')');
    s
}

/// Format an event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

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

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Plist access ────────────────────────────────────────────

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    // Walk (key value) pairs.
    while let Value::Cons(pair) = current {
        let Value::Cons(next) = pair.cdr() else {
            return None;
        };
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return Some(next.car());
        }
        current = next.cdr();
    }
    None
}

/// Extract a scalar plist value as a string (keywords lose their colon).
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "t" } else { "nil" }.to_string(),
        Value::Nil | Value::Null => "nil".to_string(),
        _ => val.to_string(),
    })
}

fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Treats "nil" as false, anything else as true.
fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::make_hand;
    use crate::gesture::{GestureMode, Orientation};

    /// Landmark list literal for the two-finger test hand.
    fn scroll_landmarks(wrist_y: f32) -> String {
        let hand = make_hand(0.5, wrist_y);
        let body: Vec<String> = hand
            .points()
            .iter()
            .map(|p| format!("({:.4} {:.4} {:.4})", p.x, p.y, p.z))
            .collect();
        format!("({})", body.join(" "))
    }

    fn frame_message(id: i64, t: f64, wrist_y: f32) -> String {
        format!(
            "(:type :frame :id {} :t {:.1} :landmarks {})",
            id,
            t,
            scroll_landmarks(wrist_y)
        )
    }

    fn parse(line: &str) -> Value {
        lexpr::from_str(line).unwrap()
    }

    // ── responses ───────────────────────────────────────────

    #[test]
    fn test_ok_response_parseable_fields() {
        let v = parse(&ok_response(99));
        assert_eq!(get_keyword(&v, "type"), Some("response".to_string()));
        assert_eq!(get_int(&v, "id"), Some(99));
        assert_eq!(get_keyword(&v, "status"), Some("ok".to_string()));
    }

    #[test]
    fn test_error_response_escapes_quotes() {
        let r = error_response(1, "say \"hello\"");
        assert!(r.contains("say \\\"hello\\\""));
        let v = parse(&r);
        assert_eq!(get_keyword(&v, "reason"), Some("say \"hello\"".to_string()));
    }

    #[test]
    fn test_format_event_is_valid_sexp() {
        let e = format_event("scroll", &[("delta", "0.020000")]);
        assert_eq!(e, "(:type :event :event :scroll :delta 0.020000)");
        let v = parse(&e);
        assert_eq!(get_float(&v, "delta"), Some(0.02));
    }

    #[test]
    fn test_format_gesture_events() {
        let mode = format_gesture_event(&GestureEvent::ModeChanged {
            mode: GestureMode::HandDetected,
        });
        assert_eq!(get_keyword(&parse(&mode), "mode"), Some("hand-detected".to_string()));

        let cursor = format_gesture_event(&GestureEvent::CursorMoved { x: 0.25, y: 0.75 });
        let v = parse(&cursor);
        assert_eq!(get_keyword(&v, "event"), Some("cursor".to_string()));
        assert_eq!(get_float(&v, "x"), Some(0.25));
        assert_eq!(get_float(&v, "y"), Some(0.75));

        let click = format_gesture_event(&GestureEvent::Click { timestamp_ms: 1234.0 });
        assert_eq!(get_int(&parse(&click), "t"), Some(1234));
    }

    #[test]
    fn test_history_event_lists_points() {
        let points = vec![
            TrackedPoint {
                x: 0.5,
                y: 0.25,
                timestamp_ms: 400.0,
                orientation: Orientation::Horizontal,
            };
            3
        ];
        let line = format_gesture_event(&GestureEvent::HistoryUpdated { points });
        let v = parse(&line);
        let listed = list_items(get_value(&v, "points").unwrap()).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(line.contains("(0.5000 0.2500 400 :horizontal)"));
        assert!(format_gesture_event(&GestureEvent::HistoryUpdated { points: Vec::new() })
            .ends_with(":points nil)"));
    }

    // ── plist access ────────────────────────────────────────

    #[test]
    fn test_get_keyword_from_plist() {
        let v = parse("(:type :frame :id 7 :t 16.5)");
        assert_eq!(get_keyword(&v, "type"), Some("frame".to_string()));
        assert_eq!(get_int(&v, "id"), Some(7));
        assert_eq!(get_float(&v, "t"), Some(16.5));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_keyword_skips_values_named_like_keys() {
        let v = parse("(:type :event :event :cursor :x 0.25)");
        assert_eq!(get_keyword(&v, "event"), Some("cursor".to_string()));
        assert_eq!(get_float(&v, "x"), Some(0.25));

        let v = parse("(:type :config :enabled :warmup-ms :warmup-ms 200)");
        assert_eq!(get_float(&v, "warmup-ms"), Some(200.0));
    }

    #[test]
    fn test_get_value_odd_length_plist() {
        assert!(get_value(&parse("(:type :frame :t)"), "t").is_none());
    }

    #[test]
    fn test_get_bool() {
        assert_eq!(get_bool(&parse("(:enabled t)"), "enabled"), Some(true));
        assert_eq!(get_bool(&parse("(:enabled nil)"), "enabled"), Some(false));
    }

    #[test]
    fn test_list_items_rejects_atoms() {
        assert!(list_items(&parse("42")).is_err());
        assert_eq!(list_items(&parse("(1 2 3)")).unwrap().len(), 3);
    }

    // ── landmarks ───────────────────────────────────────────

    #[test]
    fn test_parse_landmarks_full_hand() {
        let v = parse(&frame_message(1, 0.0, 0.9));
        let hand = parse_landmarks(&v).unwrap().unwrap();
        assert_eq!(hand.points().len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_parse_landmarks_absent_or_nil() {
        assert!(parse_landmarks(&parse("(:type :frame :t 0)")).unwrap().is_none());
        assert!(parse_landmarks(&parse("(:type :frame :t 0 :landmarks nil)"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_landmarks_wrong_count() {
        let err = parse_landmarks(&parse("(:landmarks ((0.1 0.2 0.0) (0.3 0.4 0.0)))")).unwrap_err();
        assert!(err.to_string().contains("expected 21 landmarks, got 2"));
    }

    #[test]
    fn test_parse_landmarks_non_numeric() {
        let err = parse_landmarks(&parse("(:landmarks ((0.1 :up 0.0)))")).unwrap_err();
        assert!(err.to_string().contains("landmark 0"));
    }

    // ── dispatch ────────────────────────────────────────────

    #[test]
    fn test_malformed_message() {
        let mut c = GestureController::default();
        let out = handle_message(&mut c, "(:type :frame", 0.0).lines;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains(":status :error"));
    }

    #[test]
    fn test_unknown_and_missing_type() {
        let mut c = GestureController::default();
        let reply = handle_message(&mut c, "(:type :wave :id 3)", 0.0);
        assert!(reply.rejected);
        let out = reply.lines;
        assert!(out[0].contains("unknown message type: wave"));
        assert!(out[0].contains(":id 3"));
        let out = handle_message(&mut c, "(:id 4)", 0.0).lines;
        assert!(out[0].contains("missing :type field"));
    }

    #[test]
    fn test_empty_frame_reports_idle() {
        let mut c = GestureController::default();
        let reply = handle_message(&mut c, "(:type :frame :id 1 :t 0)", 0.0);
        assert!(!reply.rejected);
        assert_eq!(reply.lines, vec!["(:type :event :event :gesture :mode :idle)".to_string()]);
    }

    #[test]
    fn test_bad_frame_reports_error_then_idle() {
        let mut c = GestureController::default();
        let reply = handle_message(&mut c, "(:type :frame :id 9 :t 0 :landmarks ((0 0 0)))", 0.0);
        assert!(reply.rejected);
        assert_eq!(reply.lines.len(), 2);
        assert!(reply.lines[0].contains(":status :error"));
        assert!(reply.lines[1].contains(":mode :idle"));
    }

    #[test]
    fn test_frame_stream_reaches_scrolling() {
        let mut c = GestureController::default();
        let mut last = Vec::new();
        for i in 0..16 {
            let msg = frame_message(i, i as f64 * 50.0, 0.5 + 0.02 * i as f32);
            last = handle_message(&mut c, &msg, 0.0).lines;
        }
        assert_eq!(last.len(), 3);
        assert!(last[0].contains(":event :history"));
        assert!(last[1].contains(":mode :scrolling"));
        let delta = get_float(&parse(&last[2]), "delta").unwrap();
        assert!(delta > 0.015, "delta {delta}");
    }

    #[test]
    fn test_missing_timestamp_uses_fallback() {
        let mut c = GestureController::default();
        let msg = format!("(:type :frame :landmarks {})", scroll_landmarks(0.9));
        handle_message(&mut c, &msg, 0.0);
        handle_message(&mut c, &msg, 450.0);
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.history().last().unwrap().timestamp_ms, 450.0);
    }

    #[test]
    fn test_status_and_reset() {
        let mut c = GestureController::default();
        let status = handle_message(&mut c, "(:type :status :id 2)", 0.0).lines;
        let v = parse(&status[0]);
        assert_eq!(get_keyword(&v, "status"), Some("ok".to_string()));
        assert!(status[0].contains(":mode :idle"));
        assert!(status[0].contains(":text \"NO HAND DETECTED\""));

        handle_message(&mut c, &frame_message(3, 0.0, 0.9), 0.0);
        assert_eq!(c.stable_orientation(), Orientation::Horizontal);
        let reset = handle_message(&mut c, "(:type :reset :id 4)", 0.0).lines;
        assert_eq!(reset, vec![ok_response(4)]);
        assert_eq!(c.stable_orientation(), Orientation::Neutral);
    }

    #[test]
    fn test_config_updates_and_reports() {
        let mut c = GestureController::default();
        let out = handle_message(
            &mut c,
            "(:type :config :id 5 :warmup-ms 200 :click-cooldown-ms 750 :enabled t)",
            0.0,
        )
        .lines;
        assert!(out[0].contains(":status :ok"));
        assert!(out[0].contains(":warmup-ms 200"));
        assert!(out[0].contains(":click-cooldown-ms 750"));
        assert_eq!(c.config().warmup_ms, 200.0);
        assert_eq!(c.config().click.cooldown_ms, 750.0);
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        let mut c = GestureController::default();
        let reply = handle_message(&mut c, "(:type :config :id 6 :click-z-threshold 0.1)", 0.0);
        assert!(reply.rejected);
        assert!(reply.lines[0].contains(":status :error"));
        assert_eq!(c.config().click.z_threshold, -0.06);

        let out = handle_message(&mut c, "(:type :config :id 7 :warmup-ms -5)", 0.0).lines;
        assert!(out[0].contains("warmup-ms must be non-negative"));
    }

    #[test]
    fn test_config_can_disable() {
        let mut c = GestureController::default();
        handle_message(&mut c, "(:type :config :enabled nil)", 0.0);
        assert!(!c.config().enabled);
        let out = handle_message(&mut c, &frame_message(1, 0.0, 0.9), 0.0).lines;
        assert_eq!(out, vec!["(:type :event :event :gesture :mode :idle)".to_string()]);
    }
}
