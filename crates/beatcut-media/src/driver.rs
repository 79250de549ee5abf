// crates/beatcut-media/src/driver.rs
//
// External ffmpeg driver.
//
// Takes a `CompiledExport`, assembles the full argv, spawns the ffmpeg
// CLI and drains its stderr line-by-line on the calling thread. Progress
// (`frame= … fps= … time= …`) is parsed from the stats lines, coalesced
// to at most one event per PROGRESS_INTERVAL, and the last
// STDERR_TAIL_LINES lines are retained so a failure can report context.
// Cancellation kills the child and removes the partial output file.
//
// Blocking by design — `ExportWorker` runs one of these per job thread.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use uuid::Uuid;

use beatcut_core::{CompiledExport, InputSpec};

/// Stderr lines kept for failure reports.
pub const STDERR_TAIL_LINES: usize = 40;

/// Minimum spacing between Progress events.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Events reported by a running export job.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportEvent {
    Progress {
        job_id: Uuid,
        frame:  u64,
        fps:    f64,
        /// Output timestamp reached, seconds.
        time:   f64,
    },
    Done {
        job_id: Uuid,
        path:   PathBuf,
    },
    Cancelled {
        job_id: Uuid,
    },
    Failed {
        job_id: Uuid,
        code:   Option<i32>,
        tail:   Vec<String>,
    },
}

/// Full ffmpeg argv for a compiled export (excluding the binary name).
pub fn build_args(compiled: &CompiledExport, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into()];
    for input in &compiled.inputs {
        match input {
            InputSpec::File(path) => {
                args.push("-i".into());
                args.push(path.to_string_lossy().into_owned());
            }
            InputSpec::Lavfi(graph) => {
                args.push("-f".into());
                args.push("lavfi".into());
                args.push("-i".into());
                args.push(graph.clone());
            }
        }
    }
    args.push("-filter_complex".into());
    args.push(compiled.filter_complex.clone());
    args.push("-map".into());
    args.push(format!("[{}]", compiled.video_out));
    args.push("-map".into());
    args.push(format!("[{}]", compiled.audio_out));
    args.extend(
        [
            "-c:v", "libx264", "-crf", "20", "-preset", "medium",
            "-pix_fmt", "yuv420p", "-c:a", "aac", "-b:a", "192k",
        ]
        .map(String::from),
    );
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Parse one ffmpeg stats line into `(frame, fps, time_seconds)`.
pub fn parse_progress(line: &str) -> Option<(u64, f64, f64)> {
    let frame = field(line, "frame=")?.parse().ok()?;
    let fps = field(line, "fps=")?.parse().unwrap_or(0.0);
    let time = parse_clock(&field(line, "time=")?)?;
    Some((frame, fps, time))
}

/// Value of `key` in a stats line, tolerating ffmpeg's `key=  value` padding.
fn field(line: &str, key: &str) -> Option<String> {
    let at = line.find(key)? + key.len();
    let rest = line[at..].trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// `HH:MM:SS.cc` → seconds.
fn parse_clock(clock: &str) -> Option<f64> {
    let mut parts = clock.split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

/// Run one export to completion. Blocking; check `cancel` per stderr line.
pub fn run_export(
    job_id: Uuid,
    compiled: &CompiledExport,
    output: &Path,
    cancel: Arc<AtomicBool>,
    tx: &Sender<ExportEvent>,
) {
    let args = build_args(compiled, output);
    log::debug!("[export] ffmpeg {}", args.join(" "));

    let mut child = match Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            let _ = tx.send(ExportEvent::Failed {
                job_id,
                code: None,
                tail: vec![format!("ffmpeg spawn failed: {e}")],
            });
            return;
        }
    };

    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut last_progress = Instant::now() - PROGRESS_INTERVAL;

    if let Some(stderr) = child.stderr.take() {
        for line in BufReader::new(stderr).lines() {
            let Ok(line) = line else { break };

            if cancel.load(Ordering::Relaxed) {
                let _ = child.kill();
                let _ = child.wait();
                let _ = std::fs::remove_file(output);
                let _ = tx.send(ExportEvent::Cancelled { job_id });
                return;
            }

            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.clone());

            if let Some((frame, fps, time)) = parse_progress(&line) {
                if last_progress.elapsed() >= PROGRESS_INTERVAL {
                    last_progress = Instant::now();
                    let _ = tx.send(ExportEvent::Progress { job_id, frame, fps, time });
                }
            }
        }
    }

    match child.wait() {
        Ok(status) if status.success() => {
            let _ = tx.send(ExportEvent::Done { job_id, path: output.to_path_buf() });
        }
        Ok(status) => {
            let _ = std::fs::remove_file(output);
            let _ = tx.send(ExportEvent::Failed {
                job_id,
                code: status.code(),
                tail: tail.into_iter().collect(),
            });
        }
        Err(e) => {
            let _ = tx.send(ExportEvent::Failed {
                job_id,
                code: None,
                tail: vec![format!("wait failed: {e}")],
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn compiled() -> CompiledExport {
        CompiledExport {
            inputs:         vec![
                InputSpec::Lavfi("anullsrc=r=44100:cl=stereo".into()),
                InputSpec::File(PathBuf::from("/a.mp4")),
            ],
            filter_complex: "color=c=black:s=1080x1920:d=1.0000[bg];[bg]format=yuv420p[vout];[0:a]atrim=0:1.0000,asetpts=PTS-STARTPTS[aout]".into(),
            video_out:      "vout".into(),
            audio_out:      "aout".into(),
            duration:       1.0,
        }
    }

    #[test]
    fn argv_shape_matches_the_contract() {
        let args = build_args(&compiled(), Path::new("/out.mp4"));
        let joined = args.join(" ");
        assert!(joined.starts_with("-y -f lavfi -i anullsrc=r=44100:cl=stereo -i /a.mp4"));
        assert!(joined.contains("-filter_complex"));
        assert!(joined.contains("-map [vout] -map [aout]"));
        assert!(joined.contains("-c:v libx264 -crf 20 -preset medium -pix_fmt yuv420p"));
        assert!(joined.contains("-c:a aac -b:a 192k"));
        assert!(joined.ends_with("/out.mp4"));
        // Inputs precede the filter graph; one -i per input.
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
        let fc = args.iter().position(|a| a == "-filter_complex").unwrap();
        let last_i = args.iter().rposition(|a| a == "-i").unwrap();
        assert!(last_i < fc);
    }

    #[test]
    fn progress_line_parses() {
        let line = "frame=  240 fps= 48 q=28.0 size=    1024KiB time=00:00:08.12 bitrate=1032.5kbits/s speed=1.62x";
        let (frame, fps, time) = parse_progress(line).unwrap();
        assert_eq!(frame, 240);
        assert_eq!(fps, 48.0);
        assert!((time - 8.12).abs() < 1e-9);
    }

    #[test]
    fn non_progress_lines_are_ignored() {
        assert!(parse_progress("Stream mapping:").is_none());
        assert!(parse_progress("  Metadata:").is_none());
        assert!(parse_progress("frame=x fps=0 time=bad").is_none());
    }

    #[test]
    fn clock_parse_handles_hours() {
        assert_eq!(parse_clock("01:02:03.50"), Some(3723.5));
        assert_eq!(parse_clock("00:00:00.00"), Some(0.0));
        assert_eq!(parse_clock("nope"), None);
    }

    #[test]
    fn field_tolerates_padding() {
        let mut seen = HashMap::new();
        seen.insert("frame", field("frame=   12 fps= 3", "frame="));
        assert_eq!(seen["frame"].as_deref(), Some("12"));
    }
}
