//! Backup freshness validation.
//!
//! Classification precedence per (environment, element):
//! 1. `Missing` (zero finished backups)
//! 2. `Stale` (latest finished more than 48h before run start)
//! 3. `Ok`
//!
//! This module only classifies; it never creates backups. The pipeline
//! decides whether to remediate, or bypasses the audit entirely when the run
//! requested a forced refresh.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use stagehand_core::{Backup, Element, EnvId};

/// A backup older than this, relative to run start, is stale.
pub const STALE_AFTER_HOURS: i64 = 48;

/// Classification of one (environment, element) backup slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupClass {
    Ok,
    Stale,
    Missing,
}

/// Known finished backups, grouped per environment and element.
pub type BackupInventory = BTreeMap<EnvId, BTreeMap<Element, Vec<Backup>>>;

/// Derived audit: environment → element → classification.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackupAudit {
    classes: BTreeMap<EnvId, BTreeMap<Element, BackupClass>>,
}

impl BackupAudit {
    /// Environments with elements that have no finished backup at all.
    pub fn missing(&self) -> BTreeMap<EnvId, Vec<Element>> {
        self.by_class(BackupClass::Missing)
    }

    /// Environments with elements whose latest backup is too old.
    pub fn stale(&self) -> BTreeMap<EnvId, Vec<Element>> {
        self.by_class(BackupClass::Stale)
    }

    /// True when every audited slot is `Ok`.
    pub fn is_clean(&self) -> bool {
        self.classes
            .values()
            .flat_map(|elements| elements.values())
            .all(|c| *c == BackupClass::Ok)
    }

    /// (environment, element) pairs needing a fresh backup, audit order.
    pub fn needs_backup(&self) -> Vec<(EnvId, Element)> {
        self.classes
            .iter()
            .flat_map(|(env, elements)| {
                elements
                    .iter()
                    .filter(|(_, class)| **class != BackupClass::Ok)
                    .map(move |(element, _)| (env.clone(), *element))
            })
            .collect()
    }

    fn by_class(&self, wanted: BackupClass) -> BTreeMap<EnvId, Vec<Element>> {
        let mut out = BTreeMap::new();
        for (env, elements) in &self.classes {
            let hits: Vec<Element> = elements
                .iter()
                .filter(|(_, class)| **class == wanted)
                .map(|(element, _)| *element)
                .collect();
            if !hits.is_empty() {
                out.insert(env.clone(), hits);
            }
        }
        out
    }
}

/// Classify one slot from its latest finish time.
pub fn classify(latest_finish: Option<DateTime<Utc>>, run_started: DateTime<Utc>) -> BackupClass {
    match latest_finish {
        None => BackupClass::Missing,
        Some(finish) => {
            if run_started - finish > Duration::hours(STALE_AFTER_HOURS) {
                BackupClass::Stale
            } else {
                BackupClass::Ok
            }
        }
    }
}

/// Audit every element of every environment in `filter_envs`.
///
/// Environments/elements absent from the inventory classify as missing;
/// staleness is evaluated against `run_started`, never re-sampled.
pub fn validate(
    inventory: &BackupInventory,
    filter_envs: &[EnvId],
    run_started: DateTime<Utc>,
) -> BackupAudit {
    let mut audit = BackupAudit::default();
    for env in filter_envs {
        let elements = audit.classes.entry(env.clone()).or_default();
        for element in Element::all() {
            let latest = inventory
                .get(env)
                .and_then(|by_element| by_element.get(&element))
                .and_then(|backups| backups.iter().map(|b| b.finish_time).max());
            elements.insert(element, classify(latest, run_started));
        }
    }
    audit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup(env: EnvId, element: Element, age_hours: i64, now: DateTime<Utc>) -> Backup {
        Backup {
            env,
            element,
            finish_time: now - Duration::hours(age_hours),
            url: None,
        }
    }

    fn inventory(backups: Vec<Backup>) -> BackupInventory {
        let mut inv = BackupInventory::new();
        for b in backups {
            inv.entry(b.env.clone())
                .or_default()
                .entry(b.element)
                .or_default()
                .push(b);
        }
        inv
    }

    #[test]
    fn zero_backups_is_missing() {
        let now = Utc::now();
        let audit = validate(&BackupInventory::new(), &[EnvId::Dev], now);
        assert_eq!(
            audit.missing().get(&EnvId::Dev),
            Some(&vec![Element::Code, Element::Database, Element::Files])
        );
        assert!(audit.stale().is_empty());
        assert!(!audit.is_clean());
    }

    #[test]
    fn fresh_everywhere_is_clean() {
        let now = Utc::now();
        let mut backups = Vec::new();
        for env in EnvId::pipeline() {
            for element in Element::all() {
                backups.push(backup(env.clone(), element, 1, now));
            }
        }
        let audit = validate(&inventory(backups), &EnvId::pipeline(), now);
        assert!(audit.is_clean());
        assert!(audit.needs_backup().is_empty());
    }

    #[test]
    fn old_backup_is_stale_only_past_the_threshold() {
        let now = Utc::now();
        // Exactly 48h old: still ok. Strictly older: stale.
        let at_threshold = classify(Some(now - Duration::hours(STALE_AFTER_HOURS)), now);
        assert_eq!(at_threshold, BackupClass::Ok);
        let past = classify(
            Some(now - Duration::hours(STALE_AFTER_HOURS) - Duration::seconds(1)),
            now,
        );
        assert_eq!(past, BackupClass::Stale);
    }

    #[test]
    fn freshness_is_monotonic_in_evaluation_time() {
        let finish = Utc::now();
        // Ok at T stays ok for any evaluation up to T+48h.
        for hours in [0, 1, 24, STALE_AFTER_HOURS] {
            assert_eq!(
                classify(Some(finish), finish + Duration::hours(hours)),
                BackupClass::Ok
            );
        }
        // Strictly after T+48h it is stale, and stays stale.
        for hours in [STALE_AFTER_HOURS + 1, 96, 500] {
            assert_eq!(
                classify(Some(finish), finish + Duration::hours(hours)),
                BackupClass::Stale
            );
        }
    }

    #[test]
    fn latest_backup_decides_staleness() {
        let now = Utc::now();
        let backups = vec![
            backup(EnvId::Test, Element::Database, 100, now),
            backup(EnvId::Test, Element::Database, 2, now),
        ];
        let audit = validate(&inventory(backups), &[EnvId::Test], now);
        assert!(audit.stale().get(&EnvId::Test).is_none());
        // Code and files have no backups at all.
        assert_eq!(
            audit.missing().get(&EnvId::Test),
            Some(&vec![Element::Code, Element::Files])
        );
    }

    #[test]
    fn only_filtered_environments_are_audited() {
        let now = Utc::now();
        let audit = validate(&BackupInventory::new(), &[EnvId::Dev, EnvId::Test], now);
        assert!(audit.missing().get(&EnvId::Live).is_none());
        assert_eq!(audit.missing().len(), 2);
    }

    #[test]
    fn needs_backup_covers_missing_and_stale() {
        let now = Utc::now();
        let mut backups = vec![backup(EnvId::Dev, Element::Database, 72, now)];
        for element in Element::all() {
            backups.push(backup(EnvId::Dev, element, 1, now));
        }
        // Database has both a fresh and a stale backup; fresh wins.
        let audit = validate(&inventory(backups), &[EnvId::Dev, EnvId::Test], now);
        let needs = audit.needs_backup();
        assert!(needs.contains(&(EnvId::Test, Element::Database)));
        assert!(!needs.iter().any(|(env, _)| *env == EnvId::Dev));
    }
}
