//! Status surface: read-only snapshots and manual block commands.
//!
//! A status display (CLI, tray UI, or web view) polls these functions while
//! the receive thread is live. All state lives in [`HostState`] behind
//! `std::sync::Mutex`es held only for the duration of each lookup, so a
//! reader never stalls the pipeline for more than one short critical
//! section.
//!
//! # Data Transfer Objects
//!
//! Internal types (`SecurityStats`, `SlotSnapshot`, `Instant`-based
//! records) are not directly serialisable. The DTOs here contain only
//! plain fields and derive `Serialize`/`Deserialize`, so any frontend can
//! consume them as JSON or similar without knowing the internal types.
//!
//! # `CommandResult<T>`
//!
//! Every command returns the same `{ success, data, error }` shape so a
//! frontend can check `success` without wrapping each call differently.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::application::security::{SecurityEvent, SecurityRegistry, SecurityStats};
use crate::application::session::SessionManager;
use crate::application::telemetry::TelemetryBook;
use crate::infrastructure::storage::config::HostConfig;

// ── Shared runtime state ──────────────────────────────────────────────────────

/// State shared between the receive pipeline, the sweep thread, and status
/// readers.
///
/// Each field has its own mutex so a status query on one of them never
/// contends with pipeline access to another. None of the locks is ever held
/// across I/O.
pub struct HostState {
    /// Admission control: client/address records, blocks, event log.
    pub registry: Mutex<SecurityRegistry>,
    /// Slot ownership.
    pub sessions: Mutex<SessionManager>,
    /// Per-slot receive counters.
    pub telemetry: Mutex<TelemetryBook>,
    /// The immutable validated configuration.
    pub config: HostConfig,
}

impl HostState {
    /// Builds the runtime state from a validated configuration.
    pub fn new(config: HostConfig) -> Arc<Self> {
        let now = Instant::now();
        let sessions = SessionManager::new(&config.session_policy(), now);
        let telemetry = TelemetryBook::new(sessions.slot_count());
        let registry = SecurityRegistry::new(config.security_policy());
        Arc::new(Self {
            registry: Mutex::new(registry),
            sessions: Mutex::new(sessions),
            telemetry: Mutex::new(telemetry),
            config,
        })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Aggregate security counters for the status display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityStatsDto {
    pub total_clients: usize,
    pub active_clients: usize,
    pub blocked_clients: usize,
    pub blocked_addresses: usize,
    pub tracked_addresses: usize,
    pub recent_events: usize,
}

impl From<SecurityStats> for SecurityStatsDto {
    fn from(s: SecurityStats) -> Self {
        Self {
            total_clients: s.total_clients,
            active_clients: s.active_clients,
            blocked_clients: s.blocked_clients,
            blocked_addresses: s.blocked_addresses,
            tracked_addresses: s.tracked_addresses,
            recent_events: s.recent_events,
        }
    }
}

/// One virtual-controller slot with its receive telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDto {
    pub index: usize,
    /// Client currently driving this slot, if any.
    pub client_id: Option<u32>,
    pub packets: u64,
    pub rate_hz: f32,
    /// Inter-arrival jitter in milliseconds; derived from local packet
    /// timing, not a round-trip measurement.
    pub jitter_ms: f32,
    pub last_sequence: u16,
}

/// One security event entry for the log view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDto {
    /// Seconds since the Unix epoch.
    pub at_secs: f64,
    pub kind: String,
    pub addr: String,
    pub client_id: Option<u32>,
    pub detail: String,
}

impl From<&SecurityEvent> for EventDto {
    fn from(e: &SecurityEvent) -> Self {
        Self {
            at_secs: e
                .at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            kind: e.kind.as_str().to_string(),
            addr: e.addr.to_string(),
            client_id: e.client_id,
            detail: e.detail.clone(),
        }
    }
}

/// Unified response wrapper used by every status command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the aggregate security counters.
pub fn get_security_stats(state: &HostState) -> CommandResult<SecurityStatsDto> {
    let stats = state.registry.lock().unwrap().stats(Instant::now());
    CommandResult::ok(stats.into())
}

/// Returns every slot with its binding and telemetry.
pub fn get_slots(state: &HostState) -> CommandResult<Vec<SlotDto>> {
    let snapshots = state.sessions.lock().unwrap().snapshot();
    let telemetry = state.telemetry.lock().unwrap();
    let dtos = snapshots
        .iter()
        .map(|snap| {
            let stats = telemetry.stats(snap.index);
            SlotDto {
                index: snap.index,
                client_id: snap.client_id,
                packets: stats.map(|s| s.packets).unwrap_or(0),
                rate_hz: stats.map(|s| s.rate_hz).unwrap_or(0.0),
                jitter_ms: stats.map(|s| s.jitter_ms).unwrap_or(0.0),
                last_sequence: stats.map(|s| s.last_sequence).unwrap_or(0),
            }
        })
        .collect();
    CommandResult::ok(dtos)
}

/// Returns up to `limit` of the most recent security events, oldest first.
pub fn get_recent_events(state: &HostState, limit: usize) -> CommandResult<Vec<EventDto>> {
    let events = state.registry.lock().unwrap().recent_events(limit);
    CommandResult::ok(events.iter().map(EventDto::from).collect())
}

/// Manually blocks an address, with an optional duration in seconds
/// (defaults to the configured block duration).
pub fn block_ip(state: &HostState, addr: &str, duration_secs: Option<f64>) -> CommandResult<()> {
    let parsed = match addr.parse() {
        Ok(ip) => ip,
        Err(e) => return CommandResult::err(format!("invalid address '{addr}': {e}")),
    };
    let duration = duration_secs.map(Duration::from_secs_f64);
    state
        .registry
        .lock()
        .unwrap()
        .block_ip(parsed, duration, Instant::now());
    CommandResult::ok(())
}

/// Manually clears an address block.
pub fn unblock_ip(state: &HostState, addr: &str) -> CommandResult<()> {
    let parsed = match addr.parse() {
        Ok(ip) => ip,
        Err(e) => return CommandResult::err(format!("invalid address '{addr}': {e}")),
    };
    state.registry.lock().unwrap().unblock_ip(parsed);
    CommandResult::ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
