//! # Sources
//!
//! Search routing. Plain queries and links the node can resolve by itself
//! (YouTube, SoundCloud, any other URL) go to its `/loadtracks` endpoint.
//! Catalogue links (Spotify, Deezer, Apple Music) are handed to a
//! [`SearchProvider`] registered on the [`crate::LinkManager`].

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future, str::FromStr, sync::Arc};
use tracing::{debug, info};
use url::Url;

use crate::{
    audio::{
        player::Player,
        track::{Requester, Track},
    },
    error::Result,
    manager::Shared,
    node::{
        protocol::Severity,
        rest::{LoadException, LoadTracksResponse, LoadType},
        Node,
    },
};

/// Plataforma de búsqueda para consultas de texto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "youtube")]
    YouTube,
    #[default]
    #[serde(rename = "youtube music")]
    YouTubeMusic,
    #[serde(rename = "soundcloud")]
    SoundCloud,
    #[serde(rename = "spotify")]
    Spotify,
    #[serde(rename = "apple music")]
    AppleMusic,
    #[serde(rename = "deezer")]
    Deezer,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::YouTube,
        Platform::YouTubeMusic,
        Platform::SoundCloud,
        Platform::Spotify,
        Platform::AppleMusic,
        Platform::Deezer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::YouTubeMusic => "youtube music",
            Platform::SoundCloud => "soundcloud",
            Platform::Spotify => "spotify",
            Platform::AppleMusic => "apple music",
            Platform::Deezer => "deezer",
        }
    }

    /// Prefijo de búsqueda del nodo (`ytsearch`, `scsearch`...)
    pub fn search_prefix(self) -> &'static str {
        match self {
            Platform::YouTube => "ytsearch",
            Platform::YouTubeMusic => "ytmsearch",
            Platform::SoundCloud => "scsearch",
            Platform::Spotify => "spsearch",
            Platform::AppleMusic => "amsearch",
            Platform::Deezer => "dzsearch",
        }
    }

    /// El nodo resuelve las búsquedas de texto de esta plataforma
    pub fn is_node_native(self) -> bool {
        matches!(
            self,
            Platform::YouTube | Platform::YouTubeMusic | Platform::SoundCloud
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown platform '{}'", s))
    }
}

/// Origen de una consulta según su forma
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    YouTube,
    SoundCloud,
    Spotify,
    AppleMusic,
    Deezer,
    /// Cualquier otra URL
    Url,
    /// Texto libre
    Query,
}

/// Clasifica la consulta por el host de la URL
pub fn source_from_url(query: &str) -> SourceKind {
    let Ok(url) = Url::parse(query.trim()) else {
        return SourceKind::Query;
    };

    match url.host_str().unwrap_or_default() {
        "www.youtube.com" | "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtu.be" => {
            SourceKind::YouTube
        }
        "soundcloud.com" | "m.soundcloud.com" => SourceKind::SoundCloud,
        "open.spotify.com" => SourceKind::Spotify,
        "music.apple.com" => SourceKind::AppleMusic,
        "deezer.com" | "www.deezer.com" => SourceKind::Deezer,
        _ => SourceKind::Url,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLoadType {
    TrackLoaded,
    PlaylistLoaded,
    SearchResult,
    NoMatches,
    LoadFailed,
}

impl From<LoadType> for SearchLoadType {
    fn from(load_type: LoadType) -> Self {
        match load_type {
            LoadType::TrackLoaded => SearchLoadType::TrackLoaded,
            LoadType::PlaylistLoaded => SearchLoadType::PlaylistLoaded,
            LoadType::SearchResult => SearchLoadType::SearchResult,
            LoadType::NoMatches => SearchLoadType::NoMatches,
            LoadType::LoadFailed => SearchLoadType::LoadFailed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaylistInfo {
    pub name: String,
    /// Duración total en ms
    pub duration: u64,
    pub selected_track: Option<Track>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub load_type: SearchLoadType,
    pub tracks: Vec<Track>,
    pub exception: Option<LoadException>,
    pub playlist_info: Option<PlaylistInfo>,
}

impl SearchResult {
    /// Resultado vacío con un mensaje de severidad común
    pub fn no_matches(message: impl Into<String>) -> Self {
        Self {
            load_type: SearchLoadType::NoMatches,
            tracks: Vec::new(),
            exception: Some(LoadException {
                message: message.into(),
                severity: Severity::Common,
            }),
            playlist_info: None,
        }
    }
}

/// Resolvedor externo para catálogos que el nodo no entiende
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        player: &Player,
        query: &str,
        requester: Option<Requester>,
    ) -> Result<SearchResult>;

    /// `false` mientras el proveedor no pueda atender (token pendiente, etc.)
    fn is_ready(&self) -> bool {
        true
    }
}

/// Ejecuta las búsquedas en paralelo y devuelve los resultados en el orden de entrada
pub async fn resolve_ordered<I, F, Fut, T>(items: I, resolve: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    join_all(items.into_iter().map(resolve)).await
}

/// Traduce la respuesta de `/loadtracks` a un [`SearchResult`]
pub fn map_load_result(
    response: LoadTracksResponse,
    query: &str,
    requester: Option<Requester>,
    fallback_thumbnail: Option<&str>,
) -> SearchResult {
    if response.tracks.is_empty() {
        return SearchResult {
            load_type: SearchLoadType::NoMatches,
            tracks: Vec::new(),
            exception: response.exception,
            playlist_info: None,
        };
    }

    let tracks: Vec<Track> = response
        .tracks
        .iter()
        .map(|raw| Track::from_raw(raw, requester.clone(), fallback_thumbnail))
        .collect();

    let load_type = SearchLoadType::from(response.load_type);
    let playlist_info = (load_type == SearchLoadType::PlaylistLoaded).then(|| {
        let info = response.playlist_info.unwrap_or_else(|| crate::node::rest::RawPlaylistInfo {
            name: None,
            selected_track: None,
        });
        let selected = info.selected_track.unwrap_or(0);

        PlaylistInfo {
            name: info
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            duration: tracks.iter().map(Track::duration).sum(),
            selected_track: usize::try_from(selected)
                .ok()
                .and_then(|i| tracks.get(i).cloned()),
            url: query.to_string(),
        }
    });

    SearchResult {
        load_type,
        tracks,
        exception: response.exception,
        playlist_info,
    }
}

pub(crate) async fn search(
    player: &Player,
    node: &Node,
    link: &Shared,
    query: &str,
    requester: Option<Requester>,
    platform: Option<Platform>,
) -> Result<SearchResult> {
    let platform = platform.unwrap_or(link.options.default_platform);
    let source = source_from_url(query);

    let provider_platform = match source {
        SourceKind::YouTube | SourceKind::SoundCloud | SourceKind::Url => None,
        SourceKind::Query if platform.is_node_native() => None,
        SourceKind::Query => Some(platform),
        SourceKind::Spotify => Some(Platform::Spotify),
        SourceKind::AppleMusic => Some(Platform::AppleMusic),
        SourceKind::Deezer => Some(Platform::Deezer),
    };

    if let Some(platform) = provider_platform {
        let provider = link.provider(platform).filter(|p| p.is_ready());
        let Some(provider) = provider else {
            debug!("Proveedor {} no disponible", platform);
            return Ok(SearchResult::no_matches(format!("{} is not ready.", platform)));
        };

        info!("🔍 Buscando '{}' en {}", query, platform);
        return provider.search(player, query, requester).await;
    }

    let identifier = if source == SourceKind::Query {
        format!("{}:{}", platform.search_prefix(), query)
    } else {
        query.to_string()
    };

    info!("🔍 Buscando '{}' en {}", identifier, node.name());
    let response = node.load_tracks(&identifier).await?;
    Ok(map_load_result(
        response,
        &identifier,
        requester,
        link.options.fallback_thumbnail.as_deref(),
    ))
}

pub(crate) type SharedProvider = Arc<dyn SearchProvider>;
