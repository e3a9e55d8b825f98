use std::io::{self, Write};

use crate::captions::domain::caption::CaptionFrame;

/// Writes caption frames as a SubRip document, numbered from 1.
pub fn write_srt<W: Write>(out: &mut W, frames: &[CaptionFrame]) -> io::Result<()> {
    for (i, frame) in frames.iter().enumerate() {
        writeln!(out, "{}", i + 1)?;
        writeln!(
            out,
            "{} --> {}",
            format_srt_time(frame.start),
            format_srt_time(frame.end)
        )?;
        for line in &frame.lines {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `HH:MM:SS,mmm`, rounded to the millisecond. Negative input clamps to zero.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let m = (total_sec / 60) % 60;
    let h = total_sec / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
