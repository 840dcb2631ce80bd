use crate::timeline::Video;

/// Videos the session knows about, plus the one currently on screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoLibrary {
    videos: Vec<Video>,
    current: Option<Video>,
}

impl VideoLibrary {
    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn current(&self) -> Option<&Video> {
        self.current.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&Video> {
        self.videos.iter().find(|v| v.id == id)
    }

    pub fn replace_all(&mut self, videos: Vec<Video>) {
        self.videos = videos;
    }

    /// Makes `video` current and records it, replacing any entry with the
    /// same id. Returns whether it was new.
    pub fn set_current(&mut self, video: Video) -> bool {
        let added = match self.videos.iter_mut().find(|v| v.id == video.id) {
            Some(known) => {
                *known = video.clone();
                false
            }
            None => {
                self.videos.push(video.clone());
                true
            }
        };
        self.current = Some(video);
        added
    }

    pub fn select(&mut self, id: &str) -> Option<&Video> {
        let video = self.get(id)?.clone();
        self.current = Some(video);
        self.current.as_ref()
    }
}
