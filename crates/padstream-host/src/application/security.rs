//! Admission control, rate limiting, and blocking for the input stream.
//!
//! The [`SecurityRegistry`] is the host's in-memory database of every client
//! id and source address it has observed. Each inbound packet passes through
//! it twice: once before decoding (address whitelist and block checks) and
//! once after (per-client checks). Every rejection is absorbed here — the
//! registry never returns anything the server loop would treat as fatal.
//!
//! # Lifecycle
//!
//! A [`ClientRecord`] is created on the first fully validated packet from a
//! new client id and evicted by the periodic [`sweep`] once the client has
//! been inactive past the retention window. Address records follow the same
//! pattern keyed by IP. The sweep plus the fixed-capacity event ring are
//! what keep memory bounded when an attacker churns through forged client
//! ids.
//!
//! # Violations and blocking
//!
//! Rejected packets from a known client increment its violation counter;
//! reaching the threshold blocks the client for `block_duration`, after
//! which the next accepted packet resets the counter. Addresses can also be
//! blocked manually, independent of the automatic counter.
//!
//! [`sweep`]: SecurityRegistry::sweep

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant, SystemTime};

use padstream_core::TokenBucket;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::replay::{self, ReplayError, ReplayPolicy};

/// Capacity of the security event ring; oldest entries are evicted first.
pub const EVENT_LOG_CAPACITY: usize = 1000;

/// Activity window used by [`SecurityStats::active_clients`].
const ACTIVE_WINDOW: Duration = Duration::from_secs(60);

// ── Policy ────────────────────────────────────────────────────────────────────

/// Tunable admission-control parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    /// Sustained packet rate allowed per client (tokens/second).
    pub rate_limit_max: f64,
    /// Burst capacity of the per-client and per-address buckets.
    pub rate_limit_burst: u32,
    /// Sustained packet rate allowed per source address.
    pub ip_rate_limit_max: f64,
    /// Maximum simultaneous client ids per source address.
    pub max_clients_per_ip: usize,
    /// Violations before a client is blocked automatically.
    pub auto_block_threshold: u32,
    /// How long an automatic or default manual block lasts.
    pub block_duration: Duration,
    /// Timestamp freshness window for the replay guard.
    pub replay: ReplayPolicy,
    /// When `true`, only whitelisted addresses are admitted at all.
    pub enable_whitelist: bool,
    /// Addresses admitted when the whitelist is enabled.
    pub whitelist: HashSet<IpAddr>,
    /// Inactivity window after which the sweep evicts records.
    pub retention: Duration,
    /// When `true`, packets dropped because of an existing block are logged
    /// as events too (noisy; off by default).
    pub log_blocked_packets: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            rate_limit_max: 120.0,
            rate_limit_burst: 20,
            ip_rate_limit_max: 200.0,
            max_clients_per_ip: 3,
            auto_block_threshold: 5,
            block_duration: Duration::from_secs(300),
            replay: ReplayPolicy::default(),
            enable_whitelist: false,
            whitelist: HashSet::new(),
            retention: Duration::from_secs(300),
            log_blocked_packets: false,
        }
    }
}

// ── Rejection reasons ─────────────────────────────────────────────────────────

/// Why a packet was refused admission.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("source address is not on the whitelist")]
    NotWhitelisted,
    #[error("source address is blocked")]
    AddressBlocked,
    #[error("client is blocked")]
    ClientBlocked,
    #[error("client rate limit exceeded")]
    ClientRateLimited,
    #[error("address rate limit exceeded")]
    AddressRateLimited,
    #[error("too many clients from this address")]
    ConnectionLimit,
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

// ── Records ───────────────────────────────────────────────────────────────────

/// Per-client state, created on the first accepted packet.
#[derive(Debug)]
pub struct ClientRecord {
    /// Source address that first presented this client id.
    pub addr: IpAddr,
    /// Last accepted sequence number.
    pub last_sequence: u16,
    /// Last accepted packet timestamp (sender nanoseconds).
    pub last_timestamp: u64,
    bucket: TokenBucket,
    /// Rejections attributed to this client since the last reset.
    pub violations: u32,
    blocked_until: Option<Instant>,
    pub first_seen: Instant,
    pub last_seen: Instant,
    /// Total accepted packets.
    pub packet_count: u64,
}

impl ClientRecord {
    fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }
}

/// Per-source-address state.
#[derive(Debug)]
struct AddressRecord {
    bucket: TokenBucket,
    client_ids: HashSet<u32>,
    blocked_until: Option<Instant>,
    last_seen: Instant,
}

impl AddressRecord {
    fn new(policy: &SecurityPolicy, now: Instant) -> Self {
        Self {
            bucket: TokenBucket::new(policy.ip_rate_limit_max, policy.rate_limit_burst, now),
            client_ids: HashSet::new(),
            blocked_until: None,
            last_seen: now,
        }
    }

    fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Kind of a logged security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    Violation,
    AutoBlockClient,
    ManualBlock,
    ManualUnblock,
    WhitelistReject,
    BlockedIp,
    BlockedClient,
    ConnectionLimit,
}

impl SecurityEventKind {
    /// Stable lower-snake name used in logs and the status surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Violation => "violation",
            Self::AutoBlockClient => "auto_block_client",
            Self::ManualBlock => "manual_block",
            Self::ManualUnblock => "manual_unblock",
            Self::WhitelistReject => "whitelist_reject",
            Self::BlockedIp => "blocked_ip",
            Self::BlockedClient => "blocked_client",
            Self::ConnectionLimit => "connection_limit",
        }
    }
}

/// One immutable entry in the security event log.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    /// Wall-clock time the event was recorded.
    pub at: SystemTime,
    pub kind: SecurityEventKind,
    /// Source address the event concerns.
    pub addr: IpAddr,
    /// Client id involved, when one was known at that pipeline stage.
    pub client_id: Option<u32>,
    /// Free-form detail for the log.
    pub detail: String,
}

/// Snapshot of aggregate security counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityStats {
    pub total_clients: usize,
    pub active_clients: usize,
    pub blocked_clients: usize,
    pub blocked_addresses: usize,
    pub tracked_addresses: usize,
    pub recent_events: usize,
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// The admission-control state machine.
///
/// All mutation happens through `&mut self`; callers wrap the registry in a
/// single `Mutex` and hold it only for the duration of each call, never
/// across I/O.
pub struct SecurityRegistry {
    policy: SecurityPolicy,
    clients: HashMap<u32, ClientRecord>,
    addresses: HashMap<IpAddr, AddressRecord>,
    events: VecDeque<SecurityEvent>,
}

impl SecurityRegistry {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self {
            policy,
            clients: HashMap::new(),
            addresses: HashMap::new(),
            events: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Address-level gate, applied before the datagram is even decoded.
    ///
    /// Whitelist rejections never create any record for the address.
    ///
    /// # Errors
    ///
    /// [`RejectReason::NotWhitelisted`] or [`RejectReason::AddressBlocked`].
    pub fn precheck_addr(&mut self, addr: IpAddr, now: Instant) -> Result<(), RejectReason> {
        if self.policy.enable_whitelist && !self.policy.whitelist.contains(&addr) {
            self.log_event(SecurityEventKind::WhitelistReject, addr, None, String::new());
            return Err(RejectReason::NotWhitelisted);
        }

        if let Some(record) = self.addresses.get_mut(&addr) {
            if record.is_blocked(now) {
                if self.policy.log_blocked_packets {
                    self.log_event(SecurityEventKind::BlockedIp, addr, None, String::new());
                }
                return Err(RejectReason::AddressBlocked);
            }
            record.blocked_until = None;
        }

        Ok(())
    }

    /// Per-client admission: block state, rate limits, replay guard, and the
    /// clients-per-address cap, in pipeline order.
    ///
    /// On success the client and address records are updated (and created if
    /// this was the client's first accepted packet). On failure exactly one
    /// violation is recorded against the client when a record exists.
    ///
    /// # Errors
    ///
    /// The [`RejectReason`] for the first failed check.
    pub fn admit(
        &mut self,
        client_id: u32,
        addr: IpAddr,
        sequence: u16,
        timestamp_ns: u64,
        now: Instant,
        now_ns: u64,
    ) -> Result<(), RejectReason> {
        // Block state first: a blocked client is refused outright and its
        // violation counter is left alone so it cannot climb past the
        // threshold while blocked.
        if let Some(record) = self.clients.get_mut(&client_id) {
            if record.is_blocked(now) {
                if self.policy.log_blocked_packets {
                    self.log_event(
                        SecurityEventKind::BlockedClient,
                        addr,
                        Some(client_id),
                        String::new(),
                    );
                }
                return Err(RejectReason::ClientBlocked);
            }
            if record.blocked_until.take().is_some() {
                // Block expired: the client starts over with a clean slate.
                record.violations = 0;
            }
        } else {
            // New client id: enforce the per-address cap before any
            // per-client state comes into existence.
            let at_cap = self
                .addresses
                .get(&addr)
                .map(|rec| {
                    rec.client_ids.len() >= self.policy.max_clients_per_ip
                        && !rec.client_ids.contains(&client_id)
                })
                .unwrap_or(false);
            if at_cap {
                self.log_event(
                    SecurityEventKind::ConnectionLimit,
                    addr,
                    Some(client_id),
                    format!("cap {}", self.policy.max_clients_per_ip),
                );
                return Err(RejectReason::ConnectionLimit);
            }
        }

        // Client rate limit. A brand-new client starts with a full bucket,
        // so the check only applies to known clients; the accepted packet's
        // token is deducted when the record is created below.
        if let Some(record) = self.clients.get_mut(&client_id) {
            if !record.bucket.try_consume(1, now) {
                self.record_violation(client_id, addr, "client_rate_limit", now);
                return Err(RejectReason::ClientRateLimited);
            }
        }

        // Address rate limit.
        let address_allowed = self
            .addresses
            .entry(addr)
            .or_insert_with(|| AddressRecord::new(&self.policy, now))
            .bucket
            .try_consume(1, now);
        if !address_allowed {
            self.record_violation(client_id, addr, "ip_rate_limit", now);
            return Err(RejectReason::AddressRateLimited);
        }

        // Replay guard: timestamp freshness plus sequence progress.
        let last_sequence = self.clients.get(&client_id).map(|r| r.last_sequence);
        if let Err(e) = replay::check(
            &self.policy.replay,
            last_sequence,
            sequence,
            timestamp_ns,
            now_ns,
        ) {
            self.record_violation(client_id, addr, &e.to_string(), now);
            return Err(RejectReason::Replay(e));
        }

        // Accepted: update or create the records.
        match self.clients.get_mut(&client_id) {
            Some(record) => {
                record.last_sequence = sequence;
                record.last_timestamp = timestamp_ns;
                record.last_seen = now;
                record.packet_count += 1;
            }
            None => {
                let mut bucket =
                    TokenBucket::new(self.policy.rate_limit_max, self.policy.rate_limit_burst, now);
                bucket.try_consume(1, now);
                self.clients.insert(
                    client_id,
                    ClientRecord {
                        addr,
                        last_sequence: sequence,
                        last_timestamp: timestamp_ns,
                        bucket,
                        violations: 0,
                        blocked_until: None,
                        first_seen: now,
                        last_seen: now,
                        packet_count: 1,
                    },
                );
                debug!(client_id, %addr, "new client admitted");
            }
        }

        let address = self
            .addresses
            .get_mut(&addr)
            .expect("address record created during rate check");
        address.client_ids.insert(client_id);
        address.last_seen = now;

        Ok(())
    }

    /// Records a violation caused by an oversized datagram. No client id is
    /// available because the payload is never decoded.
    pub fn record_oversize(&mut self, addr: IpAddr, size: usize) {
        warn!(%addr, size, "oversized datagram dropped");
        self.log_event(
            SecurityEventKind::Violation,
            addr,
            None,
            format!("oversized datagram ({size} bytes)"),
        );
    }

    /// Manually blocks an address. Idempotent; re-blocking extends the
    /// expiry from `now`.
    pub fn block_ip(&mut self, addr: IpAddr, duration: Option<Duration>, now: Instant) {
        let duration = duration.unwrap_or(self.policy.block_duration);
        self.addresses
            .entry(addr)
            .or_insert_with(|| AddressRecord::new(&self.policy, now))
            .blocked_until = Some(now + duration);
        info!(%addr, ?duration, "address blocked manually");
        self.log_event(
            SecurityEventKind::ManualBlock,
            addr,
            None,
            format!("duration={}s", duration.as_secs()),
        );
    }

    /// Manually clears an address block. Idempotent.
    pub fn unblock_ip(&mut self, addr: IpAddr) {
        if let Some(record) = self.addresses.get_mut(&addr) {
            record.blocked_until = None;
        }
        info!(%addr, "address unblocked manually");
        self.log_event(SecurityEventKind::ManualUnblock, addr, None, String::new());
    }

    /// Evicts records inactive past the retention window and clears expired
    /// blocks. Called from the periodic maintenance task, never from the
    /// receive path.
    pub fn sweep(&mut self, now: Instant) {
        let retention = self.policy.retention;

        // Blocked clients are kept so the block survives until expiry.
        let stale: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, rec)| {
                !rec.is_blocked(now) && now.saturating_duration_since(rec.last_seen) > retention
            })
            .map(|(id, _)| *id)
            .collect();
        for client_id in stale {
            if let Some(record) = self.clients.remove(&client_id) {
                if let Some(address) = self.addresses.get_mut(&record.addr) {
                    address.client_ids.remove(&client_id);
                }
            }
        }

        // Expired address blocks, and client-id mappings whose client is
        // gone (a client that switched addresses leaves a stale entry in
        // the old address's set).
        let clients = &self.clients;
        for record in self.addresses.values_mut() {
            if record.blocked_until.is_some_and(|until| now >= until) {
                record.blocked_until = None;
            }
            record.client_ids.retain(|id| clients.contains_key(id));
        }
        self.addresses.retain(|_, rec| {
            rec.is_blocked(now)
                || !rec.client_ids.is_empty()
                || now.saturating_duration_since(rec.last_seen) <= retention
        });

        debug!(
            clients = self.clients.len(),
            addresses = self.addresses.len(),
            "registry sweep complete"
        );
    }

    /// Aggregate counters for the status surface.
    pub fn stats(&self, now: Instant) -> SecurityStats {
        SecurityStats {
            total_clients: self.clients.len(),
            active_clients: self
                .clients
                .values()
                .filter(|rec| now.saturating_duration_since(rec.last_seen) < ACTIVE_WINDOW)
                .count(),
            blocked_clients: self
                .clients
                .values()
                .filter(|rec| rec.is_blocked(now))
                .count(),
            blocked_addresses: self
                .addresses
                .values()
                .filter(|rec| rec.is_blocked(now))
                .count(),
            tracked_addresses: self.addresses.len(),
            recent_events: self.events.len(),
        }
    }

    /// Returns up to `limit` of the most recent events, oldest first.
    pub fn recent_events(&self, limit: usize) -> Vec<SecurityEvent> {
        let skip = self.events.len().saturating_sub(limit);
        self.events.iter().skip(skip).cloned().collect()
    }

    /// Read access to a client record, for queries and tests.
    pub fn client(&self, client_id: u32) -> Option<&ClientRecord> {
        self.clients.get(&client_id)
    }

    /// Whether an address is currently blocked.
    pub fn is_addr_blocked(&self, addr: IpAddr, now: Instant) -> bool {
        self.addresses
            .get(&addr)
            .is_some_and(|rec| rec.is_blocked(now))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// One violation against the responsible party. Clients that have never
    /// had a packet accepted have no record, so only the event is logged.
    fn record_violation(&mut self, client_id: u32, addr: IpAddr, detail: &str, now: Instant) {
        if let Some(record) = self.clients.get_mut(&client_id) {
            record.violations += 1;
            if record.violations >= self.policy.auto_block_threshold && !record.is_blocked(now) {
                record.blocked_until = Some(now + self.policy.block_duration);
                warn!(client_id, %addr, violations = record.violations, "client auto-blocked");
                self.log_event(
                    SecurityEventKind::AutoBlockClient,
                    addr,
                    Some(client_id),
                    detail.to_string(),
                );
            }
        }
        self.log_event(
            SecurityEventKind::Violation,
            addr,
            Some(client_id),
            detail.to_string(),
        );
    }

    fn log_event(
        &mut self,
        kind: SecurityEventKind,
        addr: IpAddr,
        client_id: Option<u32>,
        detail: String,
    ) {
        if self.events.len() == EVENT_LOG_CAPACITY {
            self.events.pop_front();
        }
        debug!(kind = kind.as_str(), %addr, ?client_id, %detail, "security event");
        self.events.push_back(SecurityEvent {
            at: SystemTime::now(),
            kind,
            addr,
            client_id,
            detail,
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
