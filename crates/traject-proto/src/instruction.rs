//! Wire-format instruction parsing.
//!
//! Wire format: instructions are terminated by `;` and composed of
//! comma-separated length-prefixed elements `<decimal-length>.<payload>`,
//! where the payload is exactly `length` characters. The first element is
//! the opcode, the rest are string arguments.
//!
//! Timestamps: the first `sync` instruction's argument anchors wall-clock
//! time; every following `sync`/`mouse`/`key` timestamp is rewritten
//! relative to that anchor. A log with no `sync` yields timestamps relative
//! to zero. Later `sync` values are ignored for anchoring — no validation
//! that they stay consistent with the first (long-session clock drift is
//! not detected here).

/// One decoded wire instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode name (`sync`, `mouse`, `key`, or anything else).
    pub opcode: String,
    /// Decoded string arguments (timestamp argument stripped for
    /// `mouse`/`key`).
    pub args: Vec<String>,
    /// Milliseconds relative to the session's first `sync`; 0 for opcodes
    /// without a timestamp argument.
    pub timestamp: i64,
}

/// Decode one length-prefixed element, returning the payload.
///
/// `None` for elements without a `<digits>.` prefix or with fewer payload
/// characters than declared (a truncated trailing element).
fn parse_length_prefixed(element: &str) -> Option<&str> {
    let (prefix, rest) = element.split_once('.')?;
    let length: usize = prefix.parse().ok()?;
    if length == 0 {
        return Some("");
    }
    // Length counts characters, not bytes.
    let mut char_indices = rest.char_indices();
    let _ = char_indices.nth(length - 1)?;
    let end = char_indices.next().map_or(rest.len(), |(idx, _)| idx);
    Some(&rest[..end])
}

/// Parse the full content of a protocol log into ordered instructions.
///
/// Malformed chunks (bad length prefixes, short payloads, missing
/// arguments) are skipped silently — truncated logs from crashed sessions
/// are expected input, not errors.
#[must_use]
pub fn parse_instructions(content: &str) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut first_sync: Option<f64> = None;

    for chunk in content.split(';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }

        let mut elements = chunk.split(',');
        let Some(opcode) = elements.next().and_then(parse_length_prefixed) else {
            continue;
        };

        let parsed: Vec<&str> = elements
            .filter_map(parse_length_prefixed)
            .filter(|v| !v.is_empty())
            .collect();
        if parsed.is_empty() {
            continue;
        }

        let (args, timestamp) = match opcode {
            "sync" => {
                let Ok(raw) = parsed[0].parse::<f64>() else {
                    continue;
                };
                if first_sync.is_none() {
                    first_sync = Some(raw);
                }
                (vec![parsed[0].to_string()], relative_ms(raw, first_sync))
            }
            "mouse" => {
                // x, y, button state, wall-clock timestamp
                let Some((raw, rest)) = split_trailing_timestamp(&parsed, 4) else {
                    continue;
                };
                (rest, relative_ms(raw, first_sync))
            }
            "key" => {
                // keycode, pressed flag, wall-clock timestamp
                let Some((raw, rest)) = split_trailing_timestamp(&parsed, 3) else {
                    continue;
                };
                (rest, relative_ms(raw, first_sync))
            }
            _ => (parsed.iter().map(ToString::to_string).collect(), 0),
        };

        instructions.push(Instruction {
            opcode: opcode.to_string(),
            args,
            timestamp,
        });
    }

    instructions
}

/// Split off the wall-clock timestamp argument of a fixed-arity opcode.
fn split_trailing_timestamp(parsed: &[&str], arity: usize) -> Option<(f64, Vec<String>)> {
    if parsed.len() < arity {
        return None;
    }
    let raw = parsed[arity - 1].parse::<f64>().ok()?;
    let rest = parsed[..arity - 1].iter().map(ToString::to_string).collect();
    Some((raw, rest))
}

#[allow(clippy::cast_possible_truncation)]
fn relative_ms(raw: f64, anchor: Option<f64>) -> i64 {
    (raw - anchor.unwrap_or(0.0)).round() as i64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one wire element from a payload.
    fn elem(payload: &str) -> String {
        format!("{}.{payload}", payload.chars().count())
    }

    /// Build one wire instruction from opcode + args.
    fn inst(parts: &[&str]) -> String {
        let encoded: Vec<String> = parts.iter().map(|p| elem(p)).collect();
        format!("{};", encoded.join(","))
    }

    #[test]
    fn parses_sync_anchor_to_zero() {
        let log = inst(&["sync", "1700000000000"]);
        let out = parse_instructions(&log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].opcode, "sync");
        assert_eq!(out[0].timestamp, 0);
    }

    #[test]
    fn mouse_and_key_timestamps_are_relative_to_first_sync() {
        let log = [
            inst(&["sync", "1000"]),
            inst(&["mouse", "100", "200", "1", "1250"]),
            inst(&["key", "65", "1", "1500"]),
        ]
        .concat();
        let out = parse_instructions(&log);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].timestamp, 250);
        assert_eq!(out[1].args, vec!["100", "200", "1"]);
        assert_eq!(out[2].timestamp, 500);
        assert_eq!(out[2].args, vec!["65", "1"]);
    }

    #[test]
    fn duplicate_sync_values_are_ignored_after_first() {
        let log = [
            inst(&["sync", "1000"]),
            inst(&["sync", "9000"]),
            inst(&["key", "65", "1", "2000"]),
        ]
        .concat();
        let out = parse_instructions(&log);
        // Second sync reports its offset from the first anchor; the anchor
        // itself does not move.
        assert_eq!(out[1].timestamp, 8000);
        assert_eq!(out[2].timestamp, 1000);
    }

    #[test]
    fn no_sync_yields_timestamps_relative_to_zero() {
        let log = inst(&["key", "65", "1", "1234"]);
        let out = parse_instructions(&log);
        assert_eq!(out[0].timestamp, 1234);
    }

    #[test]
    fn truncated_trailing_element_is_skipped() {
        // Timestamp declares 13 chars but the log was cut short.
        let out = parse_instructions("4.sync,13.17000");
        assert!(out.is_empty());
    }

    #[test]
    fn malformed_length_prefix_skips_instruction() {
        let log = "sync,5.12345;4.sync,3.100;";
        let out = parse_instructions(log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].args, vec!["100"]);
    }

    #[test]
    fn opcode_with_no_args_is_skipped() {
        let log = "3.nop;4.sync,3.100;";
        let out = parse_instructions(log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].opcode, "sync");
    }

    #[test]
    fn unknown_opcodes_keep_args_verbatim() {
        let log = inst(&["size", "1024", "768"]);
        let out = parse_instructions(&log);
        assert_eq!(out[0].opcode, "size");
        assert_eq!(out[0].args, vec!["1024", "768"]);
        assert_eq!(out[0].timestamp, 0);
    }

    #[test]
    fn mouse_missing_timestamp_is_skipped() {
        let log = inst(&["mouse", "100", "200", "1"]);
        assert!(parse_instructions(&log).is_empty());
    }

    #[test]
    fn payload_longer_than_declared_is_cut_to_length() {
        // "2.abcd" decodes as "ab" with the rest ignored, matching the
        // length-prefix contract.
        let log = "3.log,2.abcd;";
        let out = parse_instructions(log);
        assert_eq!(out[0].args, vec!["ab"]);
    }

    #[test]
    fn fractional_timestamps_round() {
        let log = [inst(&["sync", "1000.4"]), inst(&["key", "65", "1", "1001.6"])].concat();
        let out = parse_instructions(&log);
        assert_eq!(out[1].timestamp, 1);
    }
}
