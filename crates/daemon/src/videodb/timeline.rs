use serde_json::{json, Value};

const AUDIO_FADE_SECONDS: f64 = 1.0;

/// Style applied to every text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub fontsize: u32,
    pub fontcolor: String,
    pub bordercolor: String,
    pub borderw: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            fontsize: 48,
            fontcolor: "white".to_string(),
            bordercolor: "black".to_string(),
            borderw: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAsset {
    Text {
        text: String,
        duration: f64,
        style: TextStyle,
    },
    Audio {
        asset_id: String,
        start: f64,
        end: Option<f64>,
    },
}

/// One entry of a compiled timeline. Inline entries play back to back;
/// overlays sit on top of them starting at `start` seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    Inline {
        asset_id: String,
        start: f64,
        end: Option<f64>,
    },
    Overlay {
        start: f64,
        asset: OverlayAsset,
    },
}

impl TimelineEntry {
    pub fn video(asset_id: impl Into<String>, start: f64, end: Option<f64>) -> Self {
        TimelineEntry::Inline {
            asset_id: asset_id.into(),
            start,
            end,
        }
    }

    pub fn text(start: f64, text: impl Into<String>, duration: f64) -> Self {
        TimelineEntry::Overlay {
            start,
            asset: OverlayAsset::Text {
                text: text.into(),
                duration,
                style: TextStyle::default(),
            },
        }
    }

    pub fn audio(at: f64, asset_id: impl Into<String>, start: f64, end: Option<f64>) -> Self {
        TimelineEntry::Overlay {
            start: at,
            asset: OverlayAsset::Audio {
                asset_id: asset_id.into(),
                start,
                end,
            },
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TimelineEntry::Inline {
                asset_id,
                start,
                end,
            } => json!({
                "type": "inline",
                "asset": {
                    "type": "video",
                    "asset_id": asset_id,
                    "start": start,
                    "end": end,
                }
            }),
            TimelineEntry::Overlay { start, asset } => {
                let asset = match asset {
                    OverlayAsset::Text {
                        text,
                        duration,
                        style,
                    } => json!({
                        "type": "text",
                        "text": text,
                        "duration": duration,
                        "style": {
                            "fontsize": style.fontsize,
                            "fontcolor": style.fontcolor,
                            "bordercolor": style.bordercolor,
                            "borderw": style.borderw,
                        }
                    }),
                    OverlayAsset::Audio {
                        asset_id,
                        start,
                        end,
                    } => json!({
                        "type": "audio",
                        "asset_id": asset_id,
                        "start": start,
                        "end": end,
                        "disable_other_tracks": false,
                        "fade_in_duration": AUDIO_FADE_SECONDS,
                        "fade_out_duration": AUDIO_FADE_SECONDS,
                    }),
                };
                json!({ "type": "overlay", "start": start, "asset": asset })
            }
        }
    }
}
