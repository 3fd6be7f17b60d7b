//! Authoritative goal and income state.
//!
//! The [`GoalStore`] owns the goal list, the monthly income, the theme
//! preference, and the id sequence for the lifetime of the process.
//! Persistence is a side effect, not a second owner: every mutation is
//! validated and affordability-checked in full before the in-memory set
//! is touched, then the whole set is recomputed and written out. A failed
//! write surfaces [`GoalError::Persistence`] but never rolls the mutation
//! back: local state is authoritative and persistence is best-effort
//! durability.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::allocation;
use crate::error::GoalError;

mod kv;

pub use kv::{keys, FileKv, KeyValueStore};

#[cfg(test)]
pub(crate) use kv::MemoryKv;

/// A named savings target. `suggested_savings` is derived state: it is
/// recomputed from `(income, goals)` on load and after every mutation and
/// never persisted, so stale stored values cannot diverge from the
/// allocation formula.
///
/// Serialized as `goal` / `targetAmount` / `timeFrame` on the wire;
/// `name` is accepted as an alias for `goal` when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    #[serde(rename = "goal", alias = "name")]
    pub name: String,
    /// Amount already saved. Independent of the allocation engine, which
    /// never mutates it.
    #[serde(default)]
    pub progress: f64,
    pub target_amount: f64,
    pub time_frame: u32,
    #[serde(skip)]
    pub suggested_savings: f64,
}

impl Goal {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_amount: f64,
        time_frame: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            progress: 0.0,
            target_amount,
            time_frame,
            suggested_savings: 0.0,
        }
    }
}

/// Display color scheme, persisted alongside the financial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn from_stored(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("dark") {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

/// Point-in-time view of the store, returned by every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub income: f64,
    pub goals: Vec<Goal>,
}

pub struct GoalStore<S> {
    kv: S,
    income: f64,
    goals: Vec<Goal>,
    next_id: u64,
    theme: Theme,
}

impl<S: KeyValueStore> GoalStore<S> {
    /// Loads persisted state. Absent or malformed values fail soft (income
    /// `0`, empty goal list) so a corrupted store never bricks the app; an
    /// unreadable underlying medium is a persistence error. Suggested
    /// savings are recomputed before the state is exposed.
    pub async fn load(kv: S) -> Result<Self, GoalError> {
        let income = match kv.get(keys::MONTHLY_INCOME).await? {
            Some(text) => parse_income(&text),
            None => 0.0,
        };
        let mut goals = match kv.get(keys::SAVINGS_GOALS).await? {
            Some(text) => parse_goals(&text),
            None => Vec::new(),
        };
        let stored_seq = match kv.get(keys::GOAL_ID_SEQ).await? {
            Some(text) => text.trim().parse::<u64>().unwrap_or(1),
            None => 1,
        };
        // Floor the sequence above every numeric id already in the set so
        // ids are never reissued even if the counter key went missing.
        let max_id = goals
            .iter()
            .filter_map(|g| g.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let next_id = stored_seq.max(max_id + 1);
        let theme = match kv.get(keys::USER_THEME).await? {
            Some(text) => Theme::from_stored(&text),
            None => Theme::default(),
        };

        allocation::recompute(&mut goals, income)?;
        Ok(Self {
            kv,
            income,
            goals,
            next_id,
            theme,
        })
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            income: self.income,
            goals: self.goals.clone(),
        }
    }

    /// Updates the monthly income and recomputes every goal's suggestion.
    /// Decreases are accepted even if existing goals become underfunded:
    /// that is a user-correctable state, and rejecting it would destroy
    /// goal data.
    pub async fn set_income(&mut self, new_income: f64) -> Result<Snapshot, GoalError> {
        if !new_income.is_finite() || new_income <= 0.0 {
            return Err(GoalError::Validation {
                field: "income",
                reason: "must be a positive number".into(),
            });
        }
        self.income = new_income;
        allocation::recompute(&mut self.goals, self.income)?;
        self.kv
            .set(keys::MONTHLY_INCOME, &self.income.to_string())
            .await?;
        Ok(self.snapshot())
    }

    /// Validates the fields, assigns a fresh id, and affordability-checks
    /// the candidate against the current set before anything is written.
    /// Rejection leaves in-memory and persisted state untouched.
    pub async fn add_goal(
        &mut self,
        name: &str,
        target_amount: f64,
        time_frame: u32,
    ) -> Result<Snapshot, GoalError> {
        validate_fields(name, target_amount, time_frame)?;
        let candidate = Goal::new(
            self.next_id.to_string(),
            name.trim(),
            target_amount,
            time_frame,
        );
        allocation::can_afford(&self.goals, &candidate, self.income, None)?;

        self.goals.push(candidate);
        self.next_id += 1;
        allocation::recompute(&mut self.goals, self.income)?;
        self.persist_goals().await?;
        Ok(self.snapshot())
    }

    /// Replaces the goal in place, preserving its id and progress. The
    /// goal being edited is excluded from the affordability sum so its old
    /// suggestion does not count against its new shape.
    pub async fn edit_goal(
        &mut self,
        id: &str,
        name: &str,
        target_amount: f64,
        time_frame: u32,
    ) -> Result<Snapshot, GoalError> {
        let index = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
        validate_fields(name, target_amount, time_frame)?;
        let mut candidate = Goal::new(id, name.trim(), target_amount, time_frame);
        candidate.progress = self.goals[index].progress;
        allocation::can_afford(&self.goals, &candidate, self.income, Some(id))?;

        self.goals[index] = candidate;
        allocation::recompute(&mut self.goals, self.income)?;
        self.persist_goals().await?;
        Ok(self.snapshot())
    }

    /// Removes the goal if present; an unknown id is a no-op, not an
    /// error. Removal shifts every remaining goal's proportional share, so
    /// the whole set is recomputed.
    pub async fn delete_goal(&mut self, id: &str) -> Result<Snapshot, GoalError> {
        let before = self.goals.len();
        self.goals.retain(|g| g.id != id);
        if self.goals.len() == before {
            return Ok(self.snapshot());
        }
        allocation::recompute(&mut self.goals, self.income)?;
        self.persist_goals().await?;
        Ok(self.snapshot())
    }

    pub async fn toggle_theme(&mut self) -> Result<Theme, GoalError> {
        self.theme = self.theme.toggled();
        self.kv.set(keys::USER_THEME, self.theme.as_str()).await?;
        Ok(self.theme)
    }

    async fn persist_goals(&self) -> Result<(), GoalError> {
        let text = serde_json::to_string(&self.goals).map_err(io::Error::from)?;
        self.kv.set(keys::SAVINGS_GOALS, &text).await?;
        self.kv
            .set(keys::GOAL_ID_SEQ, &self.next_id.to_string())
            .await?;
        Ok(())
    }
}

fn validate_fields(name: &str, target_amount: f64, time_frame: u32) -> Result<(), GoalError> {
    if name.trim().is_empty() {
        return Err(GoalError::Validation {
            field: "name",
            reason: "must not be empty".into(),
        });
    }
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(GoalError::Validation {
            field: "target amount",
            reason: "must be a positive number".into(),
        });
    }
    if time_frame == 0 {
        return Err(GoalError::Validation {
            field: "time frame",
            reason: "must be at least one month".into(),
        });
    }
    Ok(())
}

fn parse_income(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

fn parse_goals(text: &str) -> Vec<Goal> {
    let mut goals: Vec<Goal> = match serde_json::from_str(text) {
        Ok(goals) => goals,
        Err(err) => {
            warn!(%err, "stored goal list is malformed, starting empty");
            return Vec::new();
        }
    };
    goals.retain(|g| {
        let ok = g.target_amount.is_finite() && g.target_amount > 0.0 && g.time_frame > 0;
        if !ok {
            warn!(id = %g.id, "dropping stored goal with non-positive target or time frame");
        }
        ok
    });
    goals
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn loaded(kv: &MemoryKv) -> GoalStore<MemoryKv> {
        GoalStore::load(kv.clone()).await.unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn starts_empty_on_first_run() {
        let kv = MemoryKv::default();
        let store = loaded(&kv).await;
        assert_eq!(store.income(), 0.0);
        assert!(store.goals().is_empty());
    }

    #[tokio::test]
    async fn add_persists_and_reload_recomputes() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(1000.0).await.unwrap();
        store.add_goal("Laptop", 1200.0, 12).await.unwrap();
        store.add_goal("Trip", 800.0, 8).await.unwrap();

        // Both rates are 100 and 20% of income covers them exactly.
        for g in store.goals() {
            assert!(close(g.suggested_savings, 100.0));
        }

        // The persisted array never carries the derived field.
        let raw = kv.value(keys::SAVINGS_GOALS).unwrap();
        assert!(!raw.contains("suggestedSavings"));

        // A fresh store over the same kv sees identical computed state.
        let reloaded = loaded(&kv).await;
        assert_eq!(reloaded.income(), 1000.0);
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[tokio::test]
    async fn rejected_add_leaves_state_and_storage_untouched() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(125.0).await.unwrap();
        store.add_goal("First", 1200.0, 12).await.unwrap();
        let persisted_before = kv.value(keys::SAVINGS_GOALS).unwrap();
        let snapshot_before = store.snapshot();

        // Rate 150 against leftover 100 (income 125 minus the capped 25
        // suggestion of the first goal).
        let err = store.add_goal("Too big", 1800.0, 12).await.unwrap_err();
        match err {
            GoalError::InsufficientIncome { shortfall, .. } => assert!(close(shortfall, 50.0)),
            other => panic!("expected affordability rejection, got {other:?}"),
        }

        assert_eq!(store.snapshot(), snapshot_before);
        assert_eq!(kv.value(keys::SAVINGS_GOALS).unwrap(), persisted_before);
    }

    #[tokio::test]
    async fn validation_reports_first_failing_field() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(1000.0).await.unwrap();

        match store.add_goal("  ", 100.0, 10).await.unwrap_err() {
            GoalError::Validation { field, .. } => assert_eq!(field, "name"),
            other => panic!("{other:?}"),
        }
        match store.add_goal("Bike", -3.0, 10).await.unwrap_err() {
            GoalError::Validation { field, .. } => assert_eq!(field, "target amount"),
            other => panic!("{other:?}"),
        }
        match store.add_goal("Bike", 100.0, 0).await.unwrap_err() {
            GoalError::Validation { field, .. } => assert_eq!(field, "time frame"),
            other => panic!("{other:?}"),
        }
    }

    #[tokio::test]
    async fn ids_are_never_reused_after_deletion() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(100_000.0).await.unwrap();
        store.add_goal("a", 100.0, 10).await.unwrap();
        store.add_goal("b", 100.0, 10).await.unwrap();
        store.add_goal("c", 100.0, 10).await.unwrap();

        store.delete_goal("2").await.unwrap();
        let snapshot = store.add_goal("d", 100.0, 10).await.unwrap();

        let ids: Vec<&str> = snapshot.goals.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["1", "3", "4"]);

        // The sequence survives a reload as well.
        let mut reloaded = loaded(&kv).await;
        reloaded.delete_goal("4").await.unwrap();
        let snapshot = reloaded.add_goal("e", 100.0, 10).await.unwrap();
        assert!(snapshot.goals.iter().any(|g| g.id == "5"));
    }

    #[tokio::test]
    async fn edit_preserves_progress_and_excludes_itself() {
        let kv = MemoryKv::default();
        kv.insert(keys::MONTHLY_INCOME, "150");
        kv.insert(
            keys::SAVINGS_GOALS,
            r#"[{"id":"1","goal":"Emergency Fund","progress":75,"targetAmount":1200,"timeFrame":12}]"#,
        );
        let mut store = loaded(&kv).await;

        // Rate grows from 100 to 150; leftover is the full income because
        // the goal's own old suggestion is excluded from the sum.
        let snapshot = store.edit_goal("1", "Emergency Fund", 1800.0, 12).await.unwrap();
        let goal = &snapshot.goals[0];
        assert_eq!(goal.id, "1");
        assert_eq!(goal.progress, 75.0);
        assert_eq!(goal.target_amount, 1800.0);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(1000.0).await.unwrap();
        assert!(matches!(
            store.edit_goal("9", "x", 10.0, 1).await,
            Err(GoalError::NotFound(id)) if id == "9"
        ));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_noop() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(1000.0).await.unwrap();
        store.add_goal("a", 120.0, 12).await.unwrap();

        let before = store.snapshot();
        let after = store.delete_goal("no-such-id").await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn income_decrease_is_accepted_and_reshapes_suggestions() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        store.set_income(1000.0).await.unwrap();
        store.add_goal("a", 1200.0, 12).await.unwrap();
        assert!(close(store.goals()[0].suggested_savings, 100.0));

        // Underfunds the existing goal but must not be rejected.
        let snapshot = store.set_income(100.0).await.unwrap();
        assert!(close(snapshot.goals[0].suggested_savings, 20.0));
    }

    #[tokio::test]
    async fn set_income_rejects_non_positive_values() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                store.set_income(bad).await,
                Err(GoalError::Validation { field: "income", .. })
            ));
        }
    }

    #[tokio::test]
    async fn load_fails_soft_on_malformed_values() {
        let kv = MemoryKv::default();
        kv.insert(keys::MONTHLY_INCOME, "not a number");
        kv.insert(keys::SAVINGS_GOALS, "{definitely not json");
        let store = loaded(&kv).await;
        assert_eq!(store.income(), 0.0);
        assert!(store.goals().is_empty());
    }

    #[tokio::test]
    async fn load_drops_invariant_violating_records() {
        let kv = MemoryKv::default();
        kv.insert(keys::MONTHLY_INCOME, "500");
        kv.insert(
            keys::SAVINGS_GOALS,
            r#"[{"id":"1","goal":"ok","targetAmount":100,"timeFrame":10},
                {"id":"2","goal":"zero months","targetAmount":100,"timeFrame":0},
                {"id":"3","goal":"negative","targetAmount":-1,"timeFrame":5}]"#,
        );
        let store = loaded(&kv).await;
        assert_eq!(store.goals().len(), 1);
        assert_eq!(store.goals()[0].id, "1");
    }

    #[tokio::test]
    async fn load_ignores_stale_persisted_suggestions() {
        let kv = MemoryKv::default();
        kv.insert(keys::MONTHLY_INCOME, "100");
        kv.insert(
            keys::SAVINGS_GOALS,
            r#"[{"id":"1","goal":"Laptop","targetAmount":1200,"timeFrame":12,"suggestedSavings":999}]"#,
        );
        let store = loaded(&kv).await;
        // available = 20, not whatever was written by an older run
        assert!(close(store.goals()[0].suggested_savings, 20.0));
    }

    #[tokio::test]
    async fn theme_round_trips() {
        let kv = MemoryKv::default();
        let mut store = loaded(&kv).await;
        assert_eq!(store.theme(), Theme::Light);
        assert_eq!(store.toggle_theme().await.unwrap(), Theme::Dark);

        let reloaded = loaded(&kv).await;
        assert_eq!(reloaded.theme(), Theme::Dark);
    }

    /// Writes fail, reads behave as empty. Used to pin down the
    /// mutate-then-report persistence contract.
    #[derive(Clone, Default)]
    struct FailingKv;

    impl KeyValueStore for FailingKv {
        async fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[tokio::test]
    async fn persistence_failure_reports_but_keeps_mutation() {
        let mut store = GoalStore::load(FailingKv).await.unwrap();

        let err = store.set_income(1000.0).await.unwrap_err();
        assert!(matches!(err, GoalError::Persistence(_)));
        assert_eq!(store.income(), 1000.0);

        let err = store.add_goal("Laptop", 1200.0, 12).await.unwrap_err();
        assert!(matches!(err, GoalError::Persistence(_)));
        assert_eq!(store.goals().len(), 1);
        assert!(close(store.goals()[0].suggested_savings, 100.0));
    }
}
