//! Plain-text rendering of the session for the terminal.

use engine::messages::{Message, Role};
use engine::transport::{PlaybackState, Transport};
use engine::{Clip, ClipKind, Timeline, Track};

/// Clip ids are UUIDs; this many characters are enough to tell them apart.
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

pub fn message_line(message: &Message) -> String {
    match message.role {
        Role::User => format!("you › {}", message.content),
        Role::Assistant => format!("editor › {}", message.content),
        Role::Tool => format!("    {}", message.content),
    }
}

pub fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let minutes = (total / 60.0).floor() as u64;
    format!("{:02}:{:04.1}", minutes, total - minutes as f64 * 60.0)
}

/// Playhead position plus the video frame it lands on.
pub fn playhead_line(timeline: &Timeline, time: f64) -> String {
    let frame = timeline
        .clip_at(ClipKind::Video, time)
        .and_then(|clip| Some((clip, clip.source_time_at(time)?)));
    match frame {
        Some((clip, source)) => format!(
            "playhead {}  [{}] {} @ {:.1}s",
            clock(time),
            short_id(&clip.id),
            clip.name,
            source
        ),
        None => format!("playhead {}", clock(time)),
    }
}

fn clip_line(clip: &Clip) -> String {
    format!(
        "  [{}] {:<20} {} → {}  (source {:.1}s–{:.1}s)",
        short_id(&clip.id),
        clip.name,
        clock(clip.timeline_start),
        clock(clip.timeline_end()),
        clip.source_start,
        clip.source_end
    )
}

fn track_lines(label: &str, track: &Track, out: &mut Vec<String>) {
    if track.clips.is_empty() {
        out.push(format!("{label}: (empty)"));
        return;
    }
    out.push(format!("{label}:"));
    let mut clips: Vec<&Clip> = track.clips.iter().collect();
    clips.sort_by(|a, b| a.timeline_start.total_cmp(&b.timeline_start));
    out.extend(clips.into_iter().map(clip_line));
}

pub fn timeline_lines(timeline: &Timeline, transport: &Transport) -> Vec<String> {
    let state = match transport.state() {
        PlaybackState::Playing => "▶",
        PlaybackState::Stopped => "■",
    };
    let mut out = vec![format!(
        "{} {} / {}   zoom {:.0} px/s",
        state,
        clock(transport.current_time()),
        clock(timeline.total_duration()),
        timeline.zoom.pixels_per_second()
    )];
    track_lines("video", &timeline.video, &mut out);
    track_lines("audio", &timeline.audio, &mut out);
    out
}
