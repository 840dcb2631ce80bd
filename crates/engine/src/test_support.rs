use crate::timeline::Video;

pub(crate) fn video(id: &str, length: f64) -> Video {
    Video {
        id: id.to_string(),
        name: format!("{id}.mp4"),
        length,
        stream_url: format!("https://stream.example/{id}.m3u8"),
    }
}
