//! Logger registry: the pool's identity map and usage metadata
//!
//! Both maps and every entry's mutable fields live behind one mutex, so
//! create/remove/update, log calls and the reaper's sweep never race.

use super::{
    error::{PoolError, Result},
    log_level::LogLevel,
    logger_config::{LevelUpdate, LoggerConfig},
    logger_id::LoggerId,
    snapshot::{seconds_between, PoolEntrySnapshot, ServiceBinding},
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug)]
struct PoolEntry {
    config: LoggerConfig,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
    message_count: u64,
}

impl PoolEntry {
    fn new(config: LoggerConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            created_at: now,
            last_used: now,
            message_count: 0,
        }
    }

    /// Never moves `last_used` backwards
    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_used {
            self.last_used = now;
        }
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_used).to_std().unwrap_or(Duration::ZERO)
    }

    fn snapshot(&self, logger_id: &LoggerId, now: DateTime<Utc>) -> PoolEntrySnapshot {
        PoolEntrySnapshot {
            logger_id: logger_id.clone(),
            service_name: self.config.service_name().to_string(),
            config: self.config.clone(),
            created_at: self.created_at,
            last_used: self.last_used,
            age_seconds: seconds_between(self.created_at, now),
            idle_seconds: seconds_between(self.last_used, now),
            message_count: self.message_count,
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    entries: HashMap<LoggerId, PoolEntry>,
    /// service label -> identity, best effort
    aliases: HashMap<String, LoggerId>,
}

impl PoolState {
    fn insert(&mut self, config: LoggerConfig, now: DateTime<Utc>) -> LoggerId {
        let mut logger_id = LoggerId::generate();
        while self.entries.contains_key(&logger_id) {
            logger_id = LoggerId::generate();
        }
        self.entries
            .insert(logger_id.clone(), PoolEntry::new(config, now));
        logger_id
    }

    fn remove(&mut self, logger_id: &str) -> bool {
        if self.entries.remove(logger_id).is_none() {
            return false;
        }
        self.aliases.retain(|_, target| target.as_str() != logger_id);
        true
    }

    fn label_target(&self, service_name: &str) -> Option<&LoggerId> {
        self.aliases
            .get(service_name)
            .filter(|id| self.entries.contains_key(id.as_str()))
    }

    fn label_entry_mut(&mut self, service_name: &str) -> Option<&mut PoolEntry> {
        let logger_id = self.aliases.get(service_name)?;
        self.entries.get_mut(logger_id.as_str())
    }

    /// Insert a fresh entry and point the label at it
    fn insert_labelled(
        &mut self,
        service_name: &str,
        config: LoggerConfig,
        now: DateTime<Utc>,
    ) -> LoggerId {
        let logger_id = self.insert(config, now);
        self.aliases
            .insert(service_name.to_string(), logger_id.clone());
        logger_id
    }

    fn get_or_create_by_label(&mut self, service_name: &str, now: DateTime<Utc>) -> LoggerId {
        if let Some(logger_id) = self.label_target(service_name) {
            return logger_id.clone();
        }
        self.insert_labelled(service_name, LoggerConfig::new(service_name), now)
    }
}

/// Concurrent map of pooled loggers
///
/// Methods suffixed with `_at` take the clock reading explicitly; the plain
/// variants use `Utc::now()`.
///
/// # Example
///
/// ```
/// use relay_logger_pool::{LoggerConfig, LoggerRegistry};
///
/// let registry = LoggerRegistry::new();
/// let id = registry.create(LoggerConfig::new("uploader"));
///
/// assert_eq!(registry.len(), 1);
/// assert!(registry.remove(id.as_str()));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    state: Mutex<PoolState>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, config: LoggerConfig) -> LoggerId {
        self.create_at(config, Utc::now())
    }

    pub fn create_at(&self, config: LoggerConfig, now: DateTime<Utc>) -> LoggerId {
        self.state.lock().insert(config, now)
    }

    pub fn contains(&self, logger_id: &str) -> bool {
        self.state.lock().entries.contains_key(logger_id)
    }

    /// Mark the entry as used; returns `false` for unknown identities
    pub fn touch(&self, logger_id: &str) -> bool {
        self.touch_at(logger_id, Utc::now())
    }

    pub fn touch_at(&self, logger_id: &str, now: DateTime<Utc>) -> bool {
        match self.state.lock().entries.get_mut(logger_id) {
            Some(entry) => {
                entry.touch(now);
                true
            }
            None => false,
        }
    }

    pub fn config(&self, logger_id: &str) -> Option<LoggerConfig> {
        self.state
            .lock()
            .entries
            .get(logger_id)
            .map(|entry| entry.config.clone())
    }

    pub fn update_config(&self, logger_id: &str, update: &LevelUpdate) -> Option<LoggerConfig> {
        let mut state = self.state.lock();
        let entry = state.entries.get_mut(logger_id)?;
        entry.config.apply(update);
        Some(entry.config.clone())
    }

    /// `Some(false)` when the level is mandatory and was left untouched
    pub fn set_level(&self, logger_id: &str, level: LogLevel, enabled: bool) -> Option<bool> {
        let mut state = self.state.lock();
        let entry = state.entries.get_mut(logger_id)?;
        Some(entry.config.set_level(level, enabled))
    }

    /// Gate check and usage accounting for one log call
    ///
    /// Returns the service label to stamp on the record when the level is
    /// enabled, `Ok(None)` when it is filtered. A filtered call leaves the
    /// entry untouched.
    pub fn record_usage(
        &self,
        logger_id: &str,
        level: LogLevel,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let mut state = self.state.lock();
        let entry = state
            .entries
            .get_mut(logger_id)
            .ok_or_else(|| PoolError::not_found(logger_id))?;

        if !entry.config.is_enabled(level) {
            return Ok(None);
        }

        entry.touch(now);
        entry.message_count += 1;
        Ok(Some(entry.config.service_name().to_string()))
    }

    /// Remove an entry and sever every label alias pointing at it
    pub fn remove(&self, logger_id: &str) -> bool {
        self.state.lock().remove(logger_id)
    }

    /// Remove the entry only if it is still idle for longer than `ttl`
    ///
    /// Re-checks under the lock so a logger used after the expiry scan
    /// survives the sweep.
    pub fn remove_if_expired(&self, logger_id: &str, now: DateTime<Utc>, ttl: Duration) -> bool {
        let mut state = self.state.lock();
        let expired = state
            .entries
            .get(logger_id)
            .is_some_and(|entry| entry.idle_for(now) > ttl);
        expired && state.remove(logger_id)
    }

    pub fn snapshot(&self, logger_id: &str) -> Option<PoolEntrySnapshot> {
        self.snapshot_at(logger_id, Utc::now())
    }

    pub fn snapshot_at(&self, logger_id: &str, now: DateTime<Utc>) -> Option<PoolEntrySnapshot> {
        let state = self.state.lock();
        state
            .entries
            .get_key_value(logger_id)
            .map(|(id, entry)| entry.snapshot(id, now))
    }

    /// All entries, oldest first
    pub fn list(&self) -> Vec<PoolEntrySnapshot> {
        self.list_at(Utc::now())
    }

    pub fn list_at(&self, now: DateTime<Utc>) -> Vec<PoolEntrySnapshot> {
        let state = self.state.lock();
        let mut snapshots: Vec<_> = state
            .entries
            .iter()
            .map(|(id, entry)| entry.snapshot(id, now))
            .collect();
        drop(state);

        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.logger_id.cmp(&b.logger_id))
        });
        snapshots
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Number of live service label aliases
    pub fn service_count(&self) -> usize {
        self.state.lock().aliases.len()
    }

    pub fn resolve_label(&self, service_name: &str) -> Option<LoggerId> {
        self.state.lock().label_target(service_name).cloned()
    }

    pub fn get_or_create_by_label(&self, service_name: &str) -> LoggerId {
        self.get_or_create_by_label_at(service_name, Utc::now())
    }

    pub fn get_or_create_by_label_at(&self, service_name: &str, now: DateTime<Utc>) -> LoggerId {
        self.state.lock().get_or_create_by_label(service_name, now)
    }

    /// Update the logger behind a label, creating it first if needed
    pub fn configure_service(&self, service_name: &str, update: &LevelUpdate) -> LoggerConfig {
        let now = Utc::now();
        let mut state = self.state.lock();
        if let Some(entry) = state.label_entry_mut(service_name) {
            entry.config.apply(update);
            return entry.config.clone();
        }

        let mut config = LoggerConfig::new(service_name);
        config.apply(update);
        state.insert_labelled(service_name, config.clone(), now);
        config
    }

    pub fn service_config(&self, service_name: &str) -> Option<LoggerConfig> {
        let state = self.state.lock();
        let logger_id = state.label_target(service_name)?;
        state.entries.get(logger_id).map(|entry| entry.config.clone())
    }

    pub fn services(&self) -> BTreeMap<String, ServiceBinding> {
        let state = self.state.lock();
        state
            .aliases
            .iter()
            .filter_map(|(service_name, logger_id)| {
                state.entries.get(logger_id).map(|entry| {
                    (
                        service_name.clone(),
                        ServiceBinding {
                            logger_id: logger_id.clone(),
                            config: entry.config.clone(),
                        },
                    )
                })
            })
            .collect()
    }

    /// Identities idle for strictly longer than `ttl` at `now`
    pub fn expired(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<LoggerId> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.idle_for(now) > ttl)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    #[test]
    fn test_create_initializes_metadata() {
        let registry = LoggerRegistry::new();
        let id = registry.create_at(LoggerConfig::new("svc"), t0());

        let snapshot = registry.snapshot_at(id.as_str(), t0() + secs(5)).unwrap();
        assert_eq!(snapshot.created_at, t0());
        assert_eq!(snapshot.last_used, t0());
        assert_eq!(snapshot.message_count, 0);
        assert_eq!(snapshot.age_seconds, 5.0);
        assert_eq!(snapshot.service_name, "svc");
    }

    #[test]
    fn test_record_usage_filtered_has_no_side_effects() {
        let registry = LoggerRegistry::new();
        let id = registry.create_at(LoggerConfig::new("svc"), t0());

        let outcome = registry
            .record_usage(id.as_str(), LogLevel::Debug, t0() + secs(10))
            .unwrap();
        assert_eq!(outcome, None);

        let snapshot = registry.snapshot_at(id.as_str(), t0()).unwrap();
        assert_eq!(snapshot.message_count, 0);
        assert_eq!(snapshot.last_used, t0());
    }

    #[test]
    fn test_record_usage_accepted_touches_and_counts() {
        let registry = LoggerRegistry::new();
        let id = registry.create_at(LoggerConfig::new("svc"), t0());

        let outcome = registry
            .record_usage(id.as_str(), LogLevel::Info, t0() + secs(10))
            .unwrap();
        assert_eq!(outcome.as_deref(), Some("svc"));

        let snapshot = registry.snapshot_at(id.as_str(), t0()).unwrap();
        assert_eq!(snapshot.message_count, 1);
        assert_eq!(snapshot.last_used, t0() + secs(10));
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let registry = LoggerRegistry::new();
        let id = registry.create_at(LoggerConfig::new("svc"), t0());

        assert!(registry.touch_at(id.as_str(), t0() - secs(30)));
        registry
            .record_usage(id.as_str(), LogLevel::Error, t0() - secs(60))
            .unwrap();

        let snapshot = registry.snapshot_at(id.as_str(), t0()).unwrap();
        assert_eq!(snapshot.last_used, t0());
        assert!(snapshot.last_used >= snapshot.created_at);
        assert_eq!(snapshot.message_count, 1);
    }

    #[test]
    fn test_record_usage_unknown_identity() {
        let registry = LoggerRegistry::new();
        let err = registry
            .record_usage("missing", LogLevel::Info, t0())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_config_partial() {
        let registry = LoggerRegistry::new();
        let id = registry.create(LoggerConfig::with_levels("svc", false, true, true));

        let config = registry
            .update_config(id.as_str(), &LevelUpdate::new().debug(true))
            .unwrap();
        assert!(config.is_enabled(LogLevel::Debug));
        assert!(config.is_enabled(LogLevel::Warning));
        assert!(config.is_enabled(LogLevel::Info));

        assert!(registry.update_config("missing", &LevelUpdate::new()).is_none());
    }

    #[test]
    fn test_set_level_rejects_mandatory() {
        let registry = LoggerRegistry::new();
        let id = registry.create(LoggerConfig::new("svc"));

        assert_eq!(registry.set_level(id.as_str(), LogLevel::Critical, false), Some(false));
        assert_eq!(registry.set_level(id.as_str(), LogLevel::Debug, true), Some(true));
        assert_eq!(registry.set_level("missing", LogLevel::Debug, true), None);

        let config = registry.config(id.as_str()).unwrap();
        assert!(config.is_enabled(LogLevel::Critical));
        assert!(config.is_enabled(LogLevel::Debug));
    }

    #[test]
    fn test_remove_severs_alias() {
        let registry = LoggerRegistry::new();
        let first = registry.get_or_create_by_label("billing");
        assert_eq!(registry.get_or_create_by_label("billing"), first);
        assert_eq!(registry.service_count(), 1);

        assert!(registry.remove(first.as_str()));
        assert!(!registry.remove(first.as_str()));
        assert_eq!(registry.service_count(), 0);
        assert!(registry.resolve_label("billing").is_none());

        let second = registry.get_or_create_by_label("billing");
        assert_ne!(first, second);
    }

    #[test]
    fn test_explicit_create_does_not_claim_label() {
        let registry = LoggerRegistry::new();
        let explicit = registry.create(LoggerConfig::new("billing"));
        let by_label = registry.get_or_create_by_label("billing");

        assert_ne!(explicit, by_label);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.services().len(), 1);
    }

    #[test]
    fn test_configure_service_creates_on_demand() {
        let registry = LoggerRegistry::new();
        let config = registry.configure_service("search", &LevelUpdate::new().debug(true));

        assert!(config.is_enabled(LogLevel::Debug));
        assert_eq!(registry.service_config("search"), Some(config));
        assert!(registry.service_config("unknown").is_none());
    }

    #[test]
    fn test_configure_service_reuses_live_logger() {
        let registry = LoggerRegistry::new();
        let id = registry.get_or_create_by_label("search");

        let config = registry.configure_service("search", &LevelUpdate::new().info(false));
        assert!(!config.is_enabled(LogLevel::Info));
        assert_eq!(registry.resolve_label("search"), Some(id.clone()));
        assert_eq!(registry.config(id.as_str()), Some(config));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(id.as_str()));
        let config = registry.configure_service("search", &LevelUpdate::new().warning(false));
        let fresh = registry.resolve_label("search").expect("label re-created");

        assert_ne!(fresh, id);
        assert!(!config.is_enabled(LogLevel::Warning));
        assert!(config.is_enabled(LogLevel::Info));
        assert_eq!(registry.config(fresh.as_str()), Some(config));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_expired_boundary() {
        let registry = LoggerRegistry::new();
        let stale = registry.create_at(LoggerConfig::new("stale"), t0());
        let fresh = registry.create_at(LoggerConfig::new("fresh"), t0() + secs(40));

        let ttl = Duration::from_secs(60);
        // stale idle exactly 60s: not expired yet
        assert!(registry.expired(t0() + secs(60), ttl).is_empty());

        let expired = registry.expired(t0() + secs(61), ttl);
        assert_eq!(expired, vec![stale]);
        assert!(!expired.contains(&fresh));
    }

    #[test]
    fn test_remove_if_expired_rechecks_idle_time() {
        let registry = LoggerRegistry::new();
        let id = registry.get_or_create_by_label_at("worker", t0());
        let ttl = Duration::from_secs(60);

        let expired = registry.expired(t0() + secs(120), ttl);
        assert_eq!(expired, vec![id.clone()]);

        // used between the scan and the removal
        registry.touch_at(id.as_str(), t0() + secs(119));
        assert!(!registry.remove_if_expired(id.as_str(), t0() + secs(120), ttl));
        assert!(registry.contains(id.as_str()));

        assert!(registry.remove_if_expired(id.as_str(), t0() + secs(180), ttl));
        assert!(registry.resolve_label("worker").is_none());
    }

    #[test]
    fn test_list_sorted_by_creation() {
        let registry = LoggerRegistry::new();
        let b = registry.create_at(LoggerConfig::new("b"), t0() + secs(1));
        let a = registry.create_at(LoggerConfig::new("a"), t0());

        let listed: Vec<_> = registry
            .list_at(t0() + secs(2))
            .into_iter()
            .map(|s| s.logger_id)
            .collect();
        assert_eq!(listed, vec![a, b]);
    }
}
