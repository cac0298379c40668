//! Playback transport boundary and a deterministic simulation of it
//!
//! A transport reports what happened through [`TransportMsg`]s polled with
//! [`Transport::take_events`]; commands never call back into the engine.

use std::collections::{HashMap, VecDeque};

use crate::messages::TransportMsg;
use crate::model::PlaybackState;

/// An audio element or player the engine drives
pub trait Transport {
    fn set_source(&mut self, audio_ref: &str);
    /// Request playback; the transport reports `Play` and later `Playing`
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position_ms: f64);
    fn set_rate(&mut self, rate: f64);

    /// Position, paused flag and rate right now
    fn snapshot(&self) -> PlaybackState;
    fn duration_ms(&self) -> Option<u64>;

    /// Drain events produced since the last poll, oldest first
    fn take_events(&mut self) -> Vec<TransportMsg>;

    /// Advance the media clock; real transports keep their own time
    fn elapse(&mut self, _elapsed_ms: u64) {}

    /// Milliseconds until the transport next produces an event on its own
    fn next_event_in(&self) -> Option<u64> {
        None
    }
}

/// Interval between periodic position updates
pub const TIME_UPDATE_INTERVAL_MS: u64 = 250;

/// Media clock driven by [`Transport::elapse`]
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    media: HashMap<String, u64>,
    source: Option<String>,
    duration_ms: Option<u64>,
    position_ms: f64,
    playing: bool,
    rate: f64,
    start_latency_ms: u64,
    /// Remaining start-up time before `Playing` is reported
    starting: Option<u64>,
    wedge_next_seek: bool,
    wedged: bool,
    reject_next_play: Option<String>,
    since_time_update: u64,
    events: VecDeque<TransportMsg>,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self {
            media: HashMap::new(),
            source: None,
            duration_ms: None,
            position_ms: 0.0,
            playing: false,
            rate: 1.0,
            start_latency_ms: 0,
            starting: None,
            wedge_next_seek: false,
            wedged: false,
            reject_next_play: None,
            since_time_update: 0,
            events: VecDeque::new(),
        }
    }
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the duration of an audio reference
    pub fn with_media(mut self, audio_ref: impl Into<String>, duration_ms: u64) -> Self {
        self.media.insert(audio_ref.into(), duration_ms);
        self
    }

    /// Delay between a play request and audio actually advancing
    pub fn with_start_latency(mut self, latency_ms: u64) -> Self {
        self.start_latency_ms = latency_ms;
        self
    }

    /// Make the next seek leave the position stuck until the following seek
    pub fn wedge_next_seek(&mut self) {
        self.wedge_next_seek = true;
    }

    /// Make the next play request fail
    pub fn reject_next_play(&mut self, reason: impl Into<String>) {
        self.reject_next_play = Some(reason.into());
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_wedged(&self) -> bool {
        self.wedged
    }

    fn stop_at_end(&mut self) {
        if let Some(duration) = self.duration_ms {
            self.position_ms = duration as f64;
        }
        self.playing = false;
        self.starting = None;
        self.events.push_back(TransportMsg::Pause);
        self.events.push_back(TransportMsg::Ended);
    }
}

impl Transport for SimulatedTransport {
    fn set_source(&mut self, audio_ref: &str) {
        self.playing = false;
        self.starting = None;
        self.wedged = false;
        self.position_ms = 0.0;
        self.since_time_update = 0;
        self.duration_ms = self.media.get(audio_ref).copied();
        self.source = Some(audio_ref.to_string());
    }

    fn play(&mut self) {
        if let Some(reason) = self.reject_next_play.take() {
            self.events.push_back(TransportMsg::PlayRejected(reason));
            return;
        }
        if self.playing {
            return;
        }
        self.playing = true;
        self.events.push_back(TransportMsg::Play);
        if self.start_latency_ms == 0 {
            self.events.push_back(TransportMsg::Playing);
        } else {
            self.starting = Some(self.start_latency_ms);
        }
    }

    fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.starting = None;
        self.events.push_back(TransportMsg::Pause);
    }

    fn seek(&mut self, position_ms: f64) {
        let max = self.duration_ms.map_or(f64::MAX, |d| d as f64);
        self.position_ms = position_ms.clamp(0.0, max);
        self.wedged = std::mem::take(&mut self.wedge_next_seek);
        self.events.push_back(TransportMsg::Seeked);
    }

    fn set_rate(&mut self, rate: f64) {
        if rate == self.rate {
            return;
        }
        self.rate = rate;
        self.events.push_back(TransportMsg::RateChange(rate));
    }

    fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            position_ms: self.position_ms,
            is_playing: self.playing,
            playback_rate: self.rate,
            stop_at_ms: None,
        }
    }

    fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    fn take_events(&mut self) -> Vec<TransportMsg> {
        self.events.drain(..).collect()
    }

    fn elapse(&mut self, elapsed_ms: u64) {
        if !self.playing {
            return;
        }
        let mut elapsed_ms = elapsed_ms;
        if let Some(remaining) = self.starting {
            if elapsed_ms < remaining {
                self.starting = Some(remaining - elapsed_ms);
                return;
            }
            elapsed_ms -= remaining;
            self.starting = None;
            self.events.push_back(TransportMsg::Playing);
        }
        if self.wedged || elapsed_ms == 0 {
            return;
        }

        self.position_ms += elapsed_ms as f64 * self.rate;
        if let Some(duration) = self.duration_ms {
            if self.position_ms >= duration as f64 {
                self.stop_at_end();
                return;
            }
        }

        self.since_time_update += elapsed_ms;
        if self.since_time_update >= TIME_UPDATE_INTERVAL_MS {
            self.since_time_update %= TIME_UPDATE_INTERVAL_MS;
            self.events.push_back(TransportMsg::TimeUpdate);
        }
    }

    fn next_event_in(&self) -> Option<u64> {
        if !self.playing {
            return None;
        }
        if let Some(remaining) = self.starting {
            return Some(remaining.max(1));
        }
        if self.wedged {
            return None;
        }
        let tick = TIME_UPDATE_INTERVAL_MS - self.since_time_update;
        let to_end = self.duration_ms.map(|d| {
            let left = (d as f64 - self.position_ms).max(0.0) / self.rate;
            (left.ceil() as u64).max(1)
        });
        Some(to_end.map_or(tick, |end| end.min(tick)).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> SimulatedTransport {
        let mut t = SimulatedTransport::new().with_media("a.ogg", 1_000);
        t.set_source("a.ogg");
        t
    }

    #[test]
    fn test_play_reports_play_then_playing() {
        let mut t = transport();
        t.play();
        assert_eq!(
            t.take_events(),
            vec![TransportMsg::Play, TransportMsg::Playing]
        );
        t.elapse(300);
        assert_eq!(t.snapshot().position_ms, 300.0);
        assert_eq!(t.take_events(), vec![TransportMsg::TimeUpdate]);
    }

    #[test]
    fn test_start_latency_delays_playing() {
        let mut t = SimulatedTransport::new()
            .with_media("a.ogg", 1_000)
            .with_start_latency(40);
        t.set_source("a.ogg");
        t.play();
        assert_eq!(t.take_events(), vec![TransportMsg::Play]);
        assert_eq!(t.next_event_in(), Some(40));

        t.elapse(30);
        assert!(t.take_events().is_empty());
        t.elapse(20);
        assert_eq!(t.take_events(), vec![TransportMsg::Playing]);
        assert_eq!(t.snapshot().position_ms, 10.0);
    }

    #[test]
    fn test_media_end_pauses_then_ends() {
        let mut t = transport();
        t.play();
        t.take_events();
        t.elapse(1_200);
        assert_eq!(t.take_events(), vec![TransportMsg::Pause, TransportMsg::Ended]);
        assert_eq!(t.snapshot().position_ms, 1_000.0);
        assert!(!t.snapshot().is_playing);
    }

    #[test]
    fn test_wedged_seek_holds_position_until_next_seek() {
        let mut t = transport();
        t.play();
        t.wedge_next_seek();
        t.seek(400.0);
        t.elapse(200);
        assert_eq!(t.snapshot().position_ms, 400.0);

        t.seek(410.0);
        t.elapse(100);
        assert_eq!(t.snapshot().position_ms, 510.0);
    }

    #[test]
    fn test_rate_change_only_reported_on_change() {
        let mut t = transport();
        t.set_rate(1.0);
        assert!(t.take_events().is_empty());
        t.set_rate(2.0);
        assert_eq!(t.take_events(), vec![TransportMsg::RateChange(2.0)]);
    }
}
