//! Mouse event decoding.
//!
//! Mouse instructions report absolute position and button state. Decoding
//! tracks button transitions: a down→up pair becomes a click when both the
//! displacement and the elapsed time stay under the configured thresholds,
//! and a drag otherwise. Drag trajectories are resampled to a fixed
//! control-point count so every drag has the same shape downstream.

use traject_core::{DragPoint, ProcessedEvent, resample_points};

use crate::extractor::ProtocolConfig;
use crate::instruction::Instruction;

/// Decode `mouse` instructions into click and drag events.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn extract_mouse_events(
    instructions: &[Instruction],
    config: &ProtocolConfig,
) -> Vec<ProcessedEvent> {
    let mut events = Vec::new();

    let mut down_time: Option<i64> = None;
    let mut down_pos: Option<(i64, i64)> = None;
    let mut accumulated: Vec<DragPoint> = Vec::new();
    let mut last_button_state = "0".to_string();

    for instruction in instructions {
        if instruction.opcode != "mouse" || instruction.args.len() < 3 {
            continue;
        }
        let (Ok(x), Ok(y)) = (
            instruction.args[0].parse::<i64>(),
            instruction.args[1].parse::<i64>(),
        ) else {
            continue;
        };
        let button_state = instruction.args[2].as_str();

        if button_state == "1" && last_button_state == "0" {
            down_time = Some(instruction.timestamp);
            down_pos = Some((x, y));
            accumulated = vec![DragPoint { time: 0, x, y }];
        } else if button_state == "0" && last_button_state == "1" {
            if let (Some(start), Some((sx, sy))) = (down_time, down_pos) {
                let duration = instruction.timestamp - start;
                let distance = (((x - sx).pow(2) + (y - sy).pow(2)) as f64).sqrt();

                if distance <= config.click_threshold_px && duration <= config.click_threshold_ms {
                    events.push(ProcessedEvent::Mouseclick {
                        timestamp: start,
                        x: sx,
                        y: sy,
                    });
                } else {
                    // The release position terminates the path so resampled
                    // endpoints match where the drag actually started and
                    // ended.
                    accumulated.push(DragPoint {
                        time: duration,
                        x,
                        y,
                    });
                    events.push(ProcessedEvent::Mousedrag {
                        timestamp: start,
                        coordinates: resample_points(&accumulated, config.drag_control_points),
                    });
                }
            }
            down_time = None;
            down_pos = None;
            accumulated.clear();
        } else if button_state == "1" {
            if let Some(start) = down_time {
                accumulated.push(DragPoint {
                    time: instruction.timestamp - start,
                    x,
                    y,
                });
            }
        }

        last_button_state = button_state.to_string();
    }

    events
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
