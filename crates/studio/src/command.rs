use std::path::PathBuf;

use engine::gesture::DragKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text goes to the editing agent.
    Say(String),
    Import { url: String, name: Option<String> },
    ImportAudio { url: String, name: Option<String> },
    Videos,
    Select(String),
    Voice(PathBuf),
    ZoomIn,
    ZoomOut,
    /// Drags a clip handle by `seconds` along the timeline.
    Drag { kind: DragKind, clip_id: String, seconds: f64 },
    /// Cuts a clip in two at a timeline position.
    Split { clip_id: String, at: f64 },
    /// Keeps only `start..end` of a clip's source.
    Cut { clip_id: String, start: f64, end: f64 },
    /// Puts a clip at an absolute timeline position.
    Place { clip_id: String, at: f64 },
    Delete(String),
    Clear,
    Seek(f64),
    Play,
    Pause,
    Render,
    Export,
    Timeline,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command /{0}, try /help")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("not a number: {0}")]
    Number(String),
}

fn number(raw: &str) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Number(raw.to_string()))
}

fn url_and_name(args: &[&str], usage: &'static str) -> Result<(String, Option<String>), ParseError> {
    match args {
        [url] => Ok((url.to_string(), None)),
        [url, name @ ..] => Ok((url.to_string(), Some(name.join(" ")))),
        [] => Err(ParseError::Usage(usage)),
    }
}

fn drag(kind: DragKind, args: &[&str], usage: &'static str) -> Result<Command, ParseError> {
    match args {
        [clip_id, seconds] => Ok(Command::Drag {
            kind,
            clip_id: clip_id.to_string(),
            seconds: number(seconds)?,
        }),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("import", args) => {
            let (url, name) = url_and_name(args, "/import <url> [name]")?;
            Command::Import { url, name }
        }
        ("audio", args) => {
            let (url, name) = url_and_name(args, "/audio <url> [name]")?;
            Command::ImportAudio { url, name }
        }
        ("videos", []) => Command::Videos,
        ("select", [id]) => Command::Select(id.to_string()),
        ("select", _) => return Err(ParseError::Usage("/select <video_id>")),
        ("voice", [path]) => Command::Voice(PathBuf::from(path)),
        ("voice", _) => return Err(ParseError::Usage("/voice <audio file>")),
        ("zoom", ["in"]) | ("zoom", ["+"]) => Command::ZoomIn,
        ("zoom", ["out"]) | ("zoom", ["-"]) => Command::ZoomOut,
        ("zoom", _) => return Err(ParseError::Usage("/zoom in|out")),
        ("trim-left", args) => drag(DragKind::TrimLeft, args, "/trim-left <clip_id> <seconds>")?,
        ("trim-right", args) => drag(DragKind::TrimRight, args, "/trim-right <clip_id> <seconds>")?,
        ("move", args) => drag(DragKind::Move, args, "/move <clip_id> <seconds>")?,
        ("split", [clip_id, at]) => Command::Split {
            clip_id: clip_id.to_string(),
            at: number(at)?,
        },
        ("split", _) => return Err(ParseError::Usage("/split <clip_id> <at>")),
        ("cut", [clip_id, start, end]) => Command::Cut {
            clip_id: clip_id.to_string(),
            start: number(start)?,
            end: number(end)?,
        },
        ("cut", _) => return Err(ParseError::Usage("/cut <clip_id> <start> <end>")),
        ("place", [clip_id, at]) => Command::Place {
            clip_id: clip_id.to_string(),
            at: number(at)?,
        },
        ("place", _) => return Err(ParseError::Usage("/place <clip_id> <at>")),
        ("delete", [clip_id]) | ("rm", [clip_id]) => Command::Delete(clip_id.to_string()),
        ("delete", _) | ("rm", _) => return Err(ParseError::Usage("/delete <clip_id>")),
        ("clear", []) => Command::Clear,
        ("seek", [t]) => Command::Seek(number(t)?),
        ("seek", _) => return Err(ParseError::Usage("/seek <seconds>")),
        ("play", []) => Command::Play,
        ("pause", []) => Command::Pause,
        ("render", []) => Command::Render,
        ("export", []) => Command::Export,
        ("timeline", []) | ("tl", []) => Command::Timeline,
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("exit", _) | ("q", _) => Command::Quit,
        (other, _) => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

pub const HELP: &str = "\
  <text>                       ask the editor (\"trim the first 5 seconds\")
  /import <url> [name]         import a video and put it on the timeline
  /audio <url> [name]          import an audio track
  /videos                      refresh the video list
  /select <video_id>           switch the current video
  /voice <file>                send a recorded voice command
  /zoom in|out                 change timeline zoom
  /trim-left <clip> <secs>     drag a clip's left edge
  /trim-right <clip> <secs>    drag a clip's right edge
  /move <clip> <secs>          slide a clip along the timeline
  /split <clip> <at>           cut a clip in two at a timeline time
  /cut <clip> <start> <end>    keep only that part of the clip's source
  /place <clip> <at>           put a clip at a timeline time
  /delete <clip>               remove a clip
  /clear                       remove every clip
  /seek <secs>                 move the playhead
  /play, /pause                transport
  /render                      render the whole timeline
  /export                      print the download URL
  /timeline                    show tracks and clips
  /quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_chat_message() {
        assert_eq!(
            parse("  add text saying hello ").unwrap(),
            Some(Command::Say("add text saying hello".into()))
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn import_keeps_multi_word_name() {
        assert_eq!(
            parse("/import https://x.test/a.mp4 beach day").unwrap(),
            Some(Command::Import {
                url: "https://x.test/a.mp4".into(),
                name: Some("beach day".into())
            })
        );
        assert_eq!(parse("/import"), Err(ParseError::Usage("/import <url> [name]")));
    }

    #[test]
    fn drags_take_clip_and_signed_seconds() {
        assert_eq!(
            parse("/trim-left clip-1 -1.5").unwrap(),
            Some(Command::Drag {
                kind: DragKind::TrimLeft,
                clip_id: "clip-1".into(),
                seconds: -1.5
            })
        );
        assert_eq!(
            parse("/move clip-1 abc"),
            Err(ParseError::Number("abc".into()))
        );
        assert!(matches!(parse("/trim-right clip-1"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn clip_edits_parse() {
        assert_eq!(
            parse("/split 3f2a 4.5").unwrap(),
            Some(Command::Split {
                clip_id: "3f2a".into(),
                at: 4.5
            })
        );
        assert_eq!(
            parse("/cut 3f2a 2 7").unwrap(),
            Some(Command::Cut {
                clip_id: "3f2a".into(),
                start: 2.0,
                end: 7.0
            })
        );
        assert_eq!(parse("/rm 3f2a").unwrap(), Some(Command::Delete("3f2a".into())));
        assert_eq!(parse("/clear").unwrap(), Some(Command::Clear));
        assert_eq!(parse("/cut 3f2a 2"), Err(ParseError::Usage("/cut <clip_id> <start> <end>")));
    }

    #[test]
    fn zoom_and_transport() {
        assert_eq!(parse("/zoom +").unwrap(), Some(Command::ZoomIn));
        assert_eq!(parse("/zoom out").unwrap(), Some(Command::ZoomOut));
        assert_eq!(parse("/seek 12").unwrap(), Some(Command::Seek(12.0)));
        assert_eq!(parse("/seek inf"), Err(ParseError::Number("inf".into())));
        assert_eq!(parse("/play").unwrap(), Some(Command::Play));
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = parse("/explode now").unwrap_err();
        assert_eq!(err.to_string(), "unknown command /explode, try /help");
    }
}
