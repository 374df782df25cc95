use std::{any::Any, fmt, sync::Arc};

use crate::node::rest::RawTrack;

/// Handle opaco del solicitante (usuario, mensaje, lo que quiera el host).
pub type Requester = Arc<dyn Any + Send + Sync>;

/// Autor de un track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackAuthor {
    pub name: String,
    pub avatar: Option<String>,
    pub url: Option<String>,
}

impl TrackAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: None,
            url: None,
        }
    }
}

/// Track reproducible por el nodo (inmutable, `token` es el blob opaco del nodo)
#[derive(Clone)]
pub struct Track {
    token: String,
    identifier: String,
    title: String,
    authors: Vec<TrackAuthor>,
    duration: u64,
    thumbnail: Option<String>,
    uri: String,
    seekable: bool,
    stream: bool,
    explicit: bool,
    requester: Option<Requester>,
}

impl Track {
    pub fn new(token: impl Into<String>, identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            identifier: identifier.into(),
            title: title.into(),
            authors: Vec::new(),
            duration: 0,
            thumbnail: None,
            uri: String::new(),
            seekable: true,
            stream: false,
            explicit: false,
            requester: None,
        }
    }

    /// Construye un track a partir de la respuesta de `/loadtracks`
    pub fn from_raw(raw: &RawTrack, requester: Option<Requester>, fallback_thumbnail: Option<&str>) -> Self {
        let info = &raw.info;
        let thumbnail = info
            .thumbnail
            .clone()
            .or_else(|| fallback_thumbnail.map(str::to_string));

        Self {
            token: raw.track.clone(),
            identifier: info.identifier.clone(),
            title: info.title.clone(),
            authors: vec![TrackAuthor::new(info.author.clone())],
            duration: info.length,
            thumbnail,
            uri: info.uri.clone(),
            seekable: info.is_seekable,
            stream: info.is_stream,
            explicit: false,
            requester,
        }
    }

    // Getters
    pub fn token(&self) -> &str {
        &self.token
    }
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn authors(&self) -> &[TrackAuthor] {
        &self.authors
    }
    /// Duración en milisegundos
    pub fn duration(&self) -> u64 {
        self.duration
    }
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }
    pub fn uri(&self) -> &str {
        &self.uri
    }
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }
    pub fn is_stream(&self) -> bool {
        self.stream
    }
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Devuelve el solicitante si es del tipo `T`
    pub fn requester<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.requester.as_ref()?.downcast_ref::<T>()
    }

    pub fn raw_requester(&self) -> Option<&Requester> {
        self.requester.as_ref()
    }

    // Setters
    pub fn with_author(mut self, author: TrackAuthor) -> Self {
        self.authors.push(author);
        self
    }

    pub fn with_authors(mut self, authors: Vec<TrackAuthor>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = duration_ms;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_seekable(mut self, seekable: bool) -> Self {
        self.seekable = seekable;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_requester<T: Any + Send + Sync>(mut self, requester: T) -> Self {
        self.requester = Some(Arc::new(requester));
        self
    }

    pub fn with_raw_requester(mut self, requester: Option<Requester>) -> Self {
        self.requester = requester;
        self
    }

    /// Token y título no vacíos
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.title.is_empty()
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("identifier", &self.identifier)
            .field("title", &self.title)
            .field("authors", &self.authors)
            .field("duration", &self.duration)
            .field("uri", &self.uri)
            .field("seekable", &self.seekable)
            .field("stream", &self.stream)
            .field("has_requester", &self.requester.is_some())
            .finish_non_exhaustive()
    }
}

/// Formatea milisegundos como `mm:ss` o `hh:mm:ss`
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let (h, m, s) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);

    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
