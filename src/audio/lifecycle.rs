//! Reacción del player a los eventos de reproducción que empuja el nodo.

use tracing::{debug, info, warn};

use crate::{
    audio::{
        player::{LoopMode, Player},
        queue::Queue,
        track::Track,
    },
    events::TrackEvent,
    node::protocol::{LifecycleEvent, TrackEndReason},
};

/// Qué hacer después de procesar un fin de track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndOutcome {
    /// Solo avisar
    Notify,
    /// Avisar y reproducir el nuevo actual
    Continue,
    QueueEnd,
}

/// Avanza la cola según la razón de fin y el modo de repetición
pub(crate) fn advance(queue: &mut Queue, loop_mode: LoopMode, reason: TrackEndReason) -> EndOutcome {
    use TrackEndReason::*;

    match reason {
        LoadFailed | Cleanup => {
            queue.retire_current();
            match queue.pop_next() {
                Some(next) => {
                    queue.set_current(Some(next));
                    EndOutcome::Continue
                }
                None => EndOutcome::QueueEnd,
            }
        }
        Replaced => EndOutcome::Notify,
        _ => {
            let has_current = queue.current().is_some();
            match loop_mode {
                LoopMode::Track if has_current => {
                    if reason == Stopped {
                        queue.retire_current();
                        let next = queue.pop_next();
                        queue.set_current(next);
                    }
                    if queue.current().is_none() {
                        EndOutcome::QueueEnd
                    } else {
                        EndOutcome::Continue
                    }
                }
                LoopMode::Queue if has_current => {
                    queue.retire_current();
                    let next = queue.pop_next();
                    let exhausted = next.is_none();
                    queue.set_current(next);

                    if exhausted {
                        // al parar a mano no se recicla el historial
                        if reason == Stopped {
                            return EndOutcome::QueueEnd;
                        }
                        queue.recycle_previous();
                    }
                    EndOutcome::Continue
                }
                _ => {
                    if queue.is_empty() {
                        return EndOutcome::QueueEnd;
                    }
                    queue.retire_current();
                    let next = queue.pop_next();
                    queue.set_current(next);
                    EndOutcome::Continue
                }
            }
        }
    }
}

impl Player {
    pub(crate) async fn handle_event(&self, event: LifecycleEvent) {
        let guild_id = self.guild_id();

        match event {
            LifecycleEvent::TrackStartEvent { .. } => {
                let track = {
                    let mut inner = self.inner.lock();
                    inner.playing = true;
                    inner.paused = false;
                    inner.queue.current().cloned()
                };
                if let Some(track) = &track {
                    info!("🎵 Reproduciendo {} en {}", track.title(), guild_id);
                }
                self.events.emit(TrackEvent::Start { guild_id, track });
            }
            LifecycleEvent::TrackEndEvent { reason, .. } => self.track_end(reason).await,
            LifecycleEvent::TrackStuckEvent { threshold_ms } => {
                let track = self.current_track();
                warn!("⚠️ Track atascado en {} ({} ms)", guild_id, threshold_ms);
                self.skip_broken().await;
                self.events.emit(TrackEvent::Stuck {
                    guild_id,
                    track,
                    threshold_ms,
                });
            }
            LifecycleEvent::TrackExceptionEvent { exception, error } => {
                let track = self.current_track();
                warn!("❌ Error de reproducción en {}: {:?} {:?}", guild_id, exception, error);
                self.skip_broken().await;
                self.events.emit(TrackEvent::Error {
                    guild_id,
                    track,
                    exception,
                    error,
                });
            }
            LifecycleEvent::WebSocketClosedEvent {
                code,
                by_remote,
                reason,
            } => {
                debug!("Socket de voz cerrado en {}: {} {}", guild_id, code, reason);
                self.events.emit(TrackEvent::SocketClosed {
                    guild_id,
                    code,
                    reason,
                    by_remote,
                });
            }
        }
    }

    fn current_track(&self) -> Option<Track> {
        self.inner.lock().queue.current().cloned()
    }

    async fn skip_broken(&self) {
        if let Err(e) = self.skip(1).await {
            warn!("No se pudo saltar el track en {}: {}", self.guild_id(), e);
        }
    }

    async fn track_end(&self, reason: TrackEndReason) {
        let guild_id = self.guild_id();

        let (track, outcome) = {
            let mut inner = self.inner.lock();
            let track = inner.queue.current().cloned();
            let loop_mode = inner.loop_mode;
            let outcome = advance(&mut inner.queue, loop_mode, reason);

            if outcome == EndOutcome::QueueEnd {
                inner.queue.set_current(None);
                inner.playing = false;
            }
            (track, outcome)
        };

        match outcome {
            EndOutcome::Notify => {
                self.events.emit(TrackEvent::End {
                    guild_id,
                    track,
                    reason,
                });
            }
            EndOutcome::Continue => {
                self.events.emit(TrackEvent::End {
                    guild_id,
                    track,
                    reason,
                });
                if let Err(e) = self.play().await {
                    warn!("No se pudo continuar la reproducción en {}: {}", guild_id, e);
                }
            }
            EndOutcome::QueueEnd => {
                info!("🏁 Cola terminada en {}", guild_id);
                self.events.emit(TrackEvent::QueueEnd { guild_id, track });
            }
        }
    }
}
