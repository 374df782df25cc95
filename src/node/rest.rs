//! API REST del nodo (`/loadtracks`) y petición HTTP compartida.

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{protocol::Severity, Node};
use crate::error::{Error, Result};

/// Tiempo máximo para recibir las cabeceras de la respuesta
pub const HEADERS_TIMEOUT: Duration = Duration::from_secs(30);

/// Petición antes de enviarse; el hook de [`Node::make_request_with`] puede reescribirla
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    TrackLoaded,
    PlaylistLoaded,
    SearchResult,
    LoadFailed,
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadException {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlaylistInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub selected_track: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    pub track: String,
    pub info: RawTrackInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrackInfo {
    pub title: String,
    pub identifier: String,
    pub author: String,
    pub length: u64,
    pub is_seekable: bool,
    pub is_stream: bool,
    pub uri: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Respuesta de `GET /loadtracks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTracksResponse {
    pub load_type: LoadType,
    #[serde(default)]
    pub tracks: Vec<RawTrack>,
    #[serde(default)]
    pub exception: Option<LoadException>,
    #[serde(default)]
    pub playlist_info: Option<RawPlaylistInfo>,
}

impl Node {
    /// GET al nodo con la contraseña como `Authorization`, sin reintentos
    pub async fn make_request<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.make_request_with(endpoint, |_| {}).await
    }

    /// Igual que [`Node::make_request`], pero `modify` puede reescribir la petición
    pub async fn make_request_with<T, F>(&self, endpoint: &str, modify: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(&mut RequestOptions),
    {
        let password = HeaderValue::from_str(&self.options().password)
            .map_err(|_| Error::InvalidHeader { name: "Authorization" })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, password);

        let mut options = RequestOptions {
            path: format!("/{}", endpoint.trim_start_matches('/')),
            method: Method::GET,
            headers,
        };
        modify(&mut options);

        let url = format!("{}{}", self.http_base(), options.path);
        debug!("🌐 {} {}", options.method, url);

        let request = self
            .http()
            .request(options.method, url)
            .headers(options.headers)
            .send();

        let response = tokio::time::timeout(HEADERS_TIMEOUT, request)
            .await
            .map_err(|_| Error::HeadersTimeout(self.name().to_string()))??;

        Ok(response.json::<T>().await?)
    }

    /// `GET /loadtracks?identifier=...`
    pub async fn load_tracks(&self, identifier: &str) -> Result<LoadTracksResponse> {
        self.make_request(&format!(
            "loadtracks?identifier={}",
            urlencoding::encode(identifier)
        ))
        .await
    }
}
