use rand::seq::SliceRandom;
use std::collections::VecDeque;
use tracing::debug;

use crate::{
    audio::track::Track,
    error::{Error, Result},
};

/// Cola de reproducción: pendientes, track actual aparte e historial
#[derive(Debug, Default)]
pub struct Queue {
    tracks: VecDeque<Track>,
    current: Option<Track>,
    previous: Vec<Track>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un track. Si no hay track actual, pasa a ser el actual.
    pub fn add(&mut self, track: Track, offset: Option<usize>) -> Result<()> {
        if !track.is_valid() {
            return Err(Error::InvalidTrack);
        }

        if self.current.is_none() {
            debug!("▶️ Track actual: {}", track.title());
            self.current = Some(track);
            return Ok(());
        }

        let offset = self.check_offset(offset)?;
        self.tracks.insert(offset, track);
        Ok(())
    }

    /// Agrega varios tracks (playlist). El primero pasa a ser el actual si hace falta.
    pub fn add_many(&mut self, tracks: Vec<Track>, offset: Option<usize>) -> Result<()> {
        if tracks.iter().any(|t| !t.is_valid()) {
            return Err(Error::InvalidTrack);
        }

        // el offset se comprueba contra los pendientes, que no cambian al llenar el actual
        let offset = self.check_offset(offset)?;
        let mut tracks = tracks.into_iter();
        if self.current.is_none() {
            self.current = tracks.next();
        }

        for (i, track) in tracks.enumerate() {
            self.tracks.insert(offset + i, track);
        }

        debug!("➕ Cola con {} canciones pendientes", self.tracks.len());
        Ok(())
    }

    /// Elimina el track pendiente en `position`
    pub fn remove(&mut self, position: usize) -> Result<Track> {
        let len = self.tracks.len();
        self.tracks.remove(position).ok_or(Error::InvalidRange {
            start: position,
            end: position + 1,
            len,
        })
    }

    /// Elimina los tracks pendientes en `start..end`
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<Vec<Track>> {
        let len = self.tracks.len();
        if start >= end || start >= len || end > len {
            return Err(Error::InvalidRange { start, end, len });
        }

        Ok(self.tracks.drain(start..end).collect())
    }

    /// Limpia los tracks pendientes
    pub fn clear(&mut self) {
        self.tracks.clear();
        debug!("🗑️ Cola limpiada");
    }

    /// Mezcla los tracks pendientes
    pub fn shuffle(&mut self) {
        let mut rng = rand::thread_rng();
        self.tracks.make_contiguous().shuffle(&mut rng);
        debug!("🔀 Cola mezclada");
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> &[Track] {
        &self.previous
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Cantidad de tracks pendientes (sin contar el actual)
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Pendientes más el actual
    pub fn total_length(&self) -> usize {
        self.tracks.len() + usize::from(self.current.is_some())
    }

    /// Duración total en milisegundos (actual + pendientes)
    pub fn duration(&self) -> u64 {
        let current = self.current.as_ref().map_or(0, Track::duration);
        self.tracks.iter().map(Track::duration).sum::<u64>() + current
    }

    // Transiciones usadas por el player

    pub(crate) fn set_current(&mut self, track: Option<Track>) {
        self.current = track;
    }

    /// Mueve el actual al historial (si existe)
    pub(crate) fn retire_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.previous.push(current);
        }
    }

    pub(crate) fn pop_next(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Mueve los primeros `amount` pendientes al historial
    pub(crate) fn drop_front_into_previous(&mut self, amount: usize) {
        let amount = amount.min(self.tracks.len());
        self.previous.extend(self.tracks.drain(..amount));
    }

    /// Vuelve a encolar todo el historial y lo vacía
    pub(crate) fn recycle_previous(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        let mut previous = previous.into_iter();
        if self.current.is_none() {
            self.current = previous.next();
        }
        self.tracks.extend(previous);
    }

    fn check_offset(&self, offset: Option<usize>) -> Result<usize> {
        match offset {
            None => Ok(self.tracks.len()),
            Some(offset) if offset <= self.tracks.len() => Ok(offset),
            Some(offset) => Err(Error::InvalidOffset {
                offset,
                len: self.tracks.len(),
            }),
        }
    }
}
