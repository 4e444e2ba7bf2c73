use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::aggregate::{DaySummary, DayTargets, summarize_day};
use crate::logbook::LogBook;
use crate::models::{
    BodyEntry, CycleDay, ExerciseDraft, ExerciseEntry, FoodDraft, FoodEntry, MealSlot,
    NewBodyEntry, TargetField, TargetMode, WaterEntry,
};
use crate::period::{self, CalendarMonth, ExportDocument};
use crate::profile::{CustomSlot, Profile, ProfileEdit};
use crate::store::Store;

/// What to estimate a food entry from.
#[derive(Debug, Clone, PartialEq)]
pub enum FoodQuery {
    Text(String),
    Image { data: Vec<u8>, mime_type: String },
}

/// Remote nutrition estimator, e.g. a generative model behind an HTTP API.
///
/// Implementations may block; callers in async contexts should run tracker
/// methods that take an estimator on a blocking thread.
pub trait NutritionEstimator: Send + Sync {
    fn estimate_food(&self, query: &FoodQuery, meal: MealSlot) -> Result<FoodDraft>;
    fn estimate_exercise(
        &self,
        description: &str,
        body_weight_kg: f64,
        duration_minutes: f64,
    ) -> Result<ExerciseDraft>;
}

/// Destination for the export document. Whether the remote side accepted the
/// document is the sink's concern.
pub trait ExportSink: Send + Sync {
    fn deliver(&self, document: &ExportDocument) -> Result<()>;
}

/// Profile, logs and their store. Every mutation is applied to a copy, saved,
/// and only then made visible, so a failed save or a rejected edit leaves the
/// in-memory state as it was.
pub struct Tracker {
    store: Store,
    profile: Profile,
    logs: LogBook,
}

impl Tracker {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_store(Store::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_store(Store::open_in_memory()?)
    }

    fn from_store(store: Store) -> Result<Self> {
        let (profile, logs) = store.load_state()?;
        Ok(Self {
            store,
            profile,
            logs,
        })
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn logs(&self) -> &LogBook {
        &self.logs
    }

    #[must_use]
    pub fn targets(&self) -> DayTargets {
        DayTargets::from(&self.profile)
    }

    // --- Profile ---

    fn update_profile(&mut self, edit: impl FnOnce(&mut Profile) -> Result<()>) -> Result<&Profile> {
        let mut next = self.profile.clone();
        edit(&mut next)?;
        self.store.save_profile(&next)?;
        self.profile = next;
        Ok(&self.profile)
    }

    pub fn edit_profile(&mut self, edit: ProfileEdit) -> Result<&Profile> {
        self.update_profile(|p| p.apply(edit))
    }

    pub fn set_target_mode(&mut self, mode: TargetMode) -> Result<&Profile> {
        self.update_profile(|p| {
            p.set_target_mode(mode);
            Ok(())
        })
    }

    pub fn set_cycle_day(&mut self, day: CycleDay) -> Result<&Profile> {
        self.update_profile(|p| {
            p.set_cycle_day(day);
            Ok(())
        })
    }

    pub fn set_custom_value(
        &mut self,
        slot: CustomSlot,
        field: TargetField,
        value: f64,
    ) -> Result<&Profile> {
        self.update_profile(|p| p.set_custom_value(slot, field, value))
    }

    // --- Logs ---

    fn update_logs<R>(
        &mut self,
        change: impl FnOnce(&mut LogBook) -> Result<R>,
        save: impl FnOnce(&Store, &LogBook) -> Result<()>,
    ) -> Result<R> {
        let mut next = self.logs.clone();
        let out = change(&mut next)?;
        save(&self.store, &next)?;
        self.logs = next;
        Ok(out)
    }

    /// Run a delete and persist only when something was removed.
    fn delete_from_logs(
        &mut self,
        delete: impl FnOnce(&mut LogBook) -> bool,
        save: impl FnOnce(&Store, &LogBook) -> Result<()>,
    ) -> Result<bool> {
        let mut next = self.logs.clone();
        if !delete(&mut next) {
            return Ok(false);
        }
        save(&self.store, &next)?;
        self.logs = next;
        Ok(true)
    }

    pub fn add_food(&mut self, date: NaiveDate, draft: FoodDraft) -> Result<FoodEntry> {
        self.update_logs(|l| l.add_food(date, draft), |s, l| s.save_food(&l.food))
    }

    pub fn update_food(&mut self, id: &str, draft: FoodDraft) -> Result<FoodEntry> {
        self.update_logs(|l| l.update_food(id, draft), |s, l| s.save_food(&l.food))
    }

    pub fn delete_food(&mut self, id: &str) -> Result<bool> {
        self.delete_from_logs(|l| l.delete_food(id), |s, l| s.save_food(&l.food))
    }

    pub fn add_exercise(&mut self, date: NaiveDate, draft: ExerciseDraft) -> Result<ExerciseEntry> {
        self.update_logs(|l| l.add_exercise(date, draft), |s, l| s.save_exercise(&l.exercise))
    }

    pub fn update_exercise(&mut self, id: &str, draft: ExerciseDraft) -> Result<ExerciseEntry> {
        self.update_logs(|l| l.update_exercise(id, draft), |s, l| s.save_exercise(&l.exercise))
    }

    pub fn delete_exercise(&mut self, id: &str) -> Result<bool> {
        self.delete_from_logs(|l| l.delete_exercise(id), |s, l| s.save_exercise(&l.exercise))
    }

    pub fn add_water(&mut self, date: NaiveDate, amount_ml: f64) -> Result<WaterEntry> {
        self.update_logs(|l| l.add_water(date, amount_ml), |s, l| s.save_water(&l.water))
    }

    pub fn delete_water(&mut self, id: &str) -> Result<bool> {
        self.delete_from_logs(|l| l.delete_water(id), |s, l| s.save_water(&l.water))
    }

    /// Record a body measurement, replacing any entry for the same date. The
    /// profile's own weight is not changed.
    pub fn log_body(&mut self, entry: NewBodyEntry) -> Result<BodyEntry> {
        self.update_logs(|l| l.upsert_body(entry), |s, l| s.save_body(&l.body))
    }

    pub fn delete_body(&mut self, id: &str) -> Result<bool> {
        self.delete_from_logs(|l| l.delete_body(id), |s, l| s.save_body(&l.body))
    }

    // --- Estimator ---

    /// Ask the estimator for a food draft and log it on `date`. On failure
    /// nothing is logged.
    pub fn estimate_and_log_food(
        &mut self,
        estimator: &dyn NutritionEstimator,
        query: &FoodQuery,
        meal: MealSlot,
        date: NaiveDate,
    ) -> Result<FoodEntry> {
        let mut draft = estimator
            .estimate_food(query, meal)
            .context("Food estimate failed")?;
        draft.meal = meal;
        self.add_food(date, draft)
    }

    pub fn estimate_and_log_exercise(
        &mut self,
        estimator: &dyn NutritionEstimator,
        description: &str,
        duration_minutes: f64,
        date: NaiveDate,
    ) -> Result<ExerciseEntry> {
        let weight = self.profile.settings().weight_kg;
        let draft = estimator
            .estimate_exercise(description, weight, duration_minutes)
            .context("Exercise estimate failed")?;
        self.add_exercise(date, draft)
    }

    // --- Queries ---

    #[must_use]
    pub fn day_summary(&self, date: NaiveDate) -> DaySummary {
        summarize_day(date, &self.logs, &self.targets())
    }

    pub fn calendar_month(&self, year: i32, month: u32) -> Result<CalendarMonth> {
        period::calendar_month(year, month, &self.logs, &self.targets())
    }

    #[must_use]
    pub fn body_trend(&self, limit: usize) -> Vec<BodyEntry> {
        period::body_trend(&self.logs, limit)
    }

    #[must_use]
    pub fn export_document(&self) -> ExportDocument {
        period::build_export(&self.profile, &self.logs, Local::now().to_rfc3339())
    }

    /// Build the export document and hand it to `sink`. The profile's last
    /// export time is stamped only after the sink reports success.
    pub fn export_to(&mut self, sink: &dyn ExportSink) -> Result<ExportDocument> {
        let document = self.export_document();
        sink.deliver(&document).context("Export failed")?;
        let at = document.exported_at.clone();
        self.update_profile(|p| {
            p.mark_exported(at);
            Ok(())
        })?;
        info!(
            days = document.daily_summary.len(),
            exported_at = %document.exported_at,
            "export delivered"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::bail;

    use crate::models::{ExerciseType, ServingTargets};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    fn draft(name: &str, calories: f64) -> FoodDraft {
        FoodDraft {
            name: name.to_string(),
            calories,
            servings: ServingTargets {
                grains: 1.5,
                proteins: 1.0,
                ..ServingTargets::default()
            },
            meal: MealSlot::Snack,
            category: "grains".to_string(),
            notes: None,
        }
    }

    struct MockEstimator {
        fail: bool,
    }

    impl NutritionEstimator for MockEstimator {
        fn estimate_food(&self, query: &FoodQuery, _meal: MealSlot) -> Result<FoodDraft> {
            if self.fail {
                bail!("service unavailable");
            }
            let name = match query {
                FoodQuery::Text(text) => text.clone(),
                FoodQuery::Image { .. } => "Photo meal".to_string(),
            };
            Ok(draft(&name, 420.0))
        }

        fn estimate_exercise(
            &self,
            description: &str,
            body_weight_kg: f64,
            duration_minutes: f64,
        ) -> Result<ExerciseDraft> {
            if self.fail {
                bail!("service unavailable");
            }
            Ok(ExerciseDraft {
                name: description.to_string(),
                calories_burned: body_weight_kg * duration_minutes / 10.0,
                duration_minutes,
                kind: ExerciseType::Cardio,
                notes: None,
            })
        }
    }

    struct MockSink {
        fail: bool,
        delivered: Mutex<Vec<usize>>,
    }

    impl MockSink {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    impl ExportSink for MockSink {
        fn deliver(&self, document: &ExportDocument) -> Result<()> {
            if self.fail {
                bail!("remote rejected export");
            }
            self.delivered
                .lock()
                .unwrap()
                .push(document.daily_summary.len());
            Ok(())
        }
    }

    #[test]
    fn test_log_and_summarize() {
        let mut t = Tracker::open_in_memory().unwrap();
        t.add_food(today(), draft("Oatmeal", 300.0)).unwrap();
        t.add_water(today(), 500.0).unwrap();
        let s = t.day_summary(today());
        assert_eq!(s.calories_in, 300.0);
        assert_eq!(s.water_total_ml, 500.0);
        assert_eq!(
            s.effective_budget,
            t.profile().active_target().calories as f64
        );
    }

    #[test]
    fn test_profile_edit_changes_budget() {
        let mut t = Tracker::open_in_memory().unwrap();
        let before = t.targets().calories;
        t.edit_profile(ProfileEdit::Goal(crate::models::Goal::Maintain))
            .unwrap();
        assert!(t.targets().calories > before);
    }

    #[test]
    fn test_rejected_edit_keeps_state() {
        let mut t = Tracker::open_in_memory().unwrap();
        let before = t.profile().clone();
        assert!(t.edit_profile(ProfileEdit::WeightKg(-1.0)).is_err());
        assert_eq!(t.profile(), &before);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut t = Tracker::open_in_memory().unwrap();
        assert!(!t.delete_water("missing").unwrap());
        assert!(!t.delete_food("missing").unwrap());
        assert!(!t.delete_body("missing").unwrap());
    }

    #[test]
    fn test_update_exercise_persists_and_moves_budget() {
        let mut t = Tracker::open_in_memory().unwrap();
        let walk = |burned: f64| ExerciseDraft {
            name: "Walk".to_string(),
            calories_burned: burned,
            duration_minutes: 40.0,
            kind: ExerciseType::Cardio,
            notes: None,
        };
        let entry = t.add_exercise(today(), walk(150.0)).unwrap();
        let base = t.day_summary(today()).effective_budget;
        t.update_exercise(&entry.id, walk(250.0)).unwrap();
        assert!((t.day_summary(today()).effective_budget - base - 100.0).abs() < f64::EPSILON);

        let before = t.logs().clone();
        assert!(t.update_exercise("missing", walk(10.0)).is_err());
        assert_eq!(t.logs(), &before);
    }

    #[test]
    fn test_estimate_food_merges_id_date_and_meal() {
        let mut t = Tracker::open_in_memory().unwrap();
        let est = MockEstimator { fail: false };
        let entry = t
            .estimate_and_log_food(
                &est,
                &FoodQuery::Text("Beef noodle soup".to_string()),
                MealSlot::Dinner,
                today(),
            )
            .unwrap();
        assert_eq!(entry.name, "Beef noodle soup");
        assert_eq!(entry.meal, MealSlot::Dinner);
        assert_eq!(entry.date, today());
        assert_eq!(entry.id.len(), 36);
        assert_eq!(t.logs().food.len(), 1);
    }

    #[test]
    fn test_estimate_failure_mutates_nothing() {
        let mut t = Tracker::open_in_memory().unwrap();
        let est = MockEstimator { fail: true };
        let err = t
            .estimate_and_log_food(
                &est,
                &FoodQuery::Image {
                    data: vec![0xff, 0xd8],
                    mime_type: "image/jpeg".to_string(),
                },
                MealSlot::Lunch,
                today(),
            )
            .unwrap_err();
        assert!(format!("{err:#}").contains("service unavailable"));
        assert!(t
            .estimate_and_log_exercise(&est, "yoga", 30.0, today())
            .is_err());
        assert_eq!(t.logs(), &LogBook::default());
    }

    #[test]
    fn test_estimate_exercise_uses_profile_weight() {
        let mut t = Tracker::open_in_memory().unwrap();
        let est = MockEstimator { fail: false };
        let entry = t
            .estimate_and_log_exercise(&est, "jog", 30.0, today())
            .unwrap();
        // 70 kg * 30 min / 10
        assert_eq!(entry.calories_burned, 210.0);
        assert_eq!(t.day_summary(today()).calories_burned, 210.0);
    }

    #[test]
    fn test_export_success_stamps_profile() {
        let mut t = Tracker::open_in_memory().unwrap();
        t.add_food(today(), draft("Rice", 200.0)).unwrap();
        let sink = MockSink::new(false);
        let doc = t.export_to(&sink).unwrap();
        assert_eq!(*sink.delivered.lock().unwrap(), vec![1]);
        assert_eq!(
            t.profile().settings().last_export_at.as_deref(),
            Some(doc.exported_at.as_str())
        );
    }

    #[test]
    fn test_export_failure_leaves_profile() {
        let mut t = Tracker::open_in_memory().unwrap();
        let sink = MockSink::new(true);
        assert!(t.export_to(&sink).is_err());
        assert!(t.profile().settings().last_export_at.is_none());
    }

    #[test]
    fn test_custom_targets_through_tracker() {
        let mut t = Tracker::open_in_memory().unwrap();
        t.edit_profile(ProfileEdit::Strategy(crate::models::DietStrategy::CarbCycling))
            .unwrap();
        t.set_target_mode(TargetMode::Custom).unwrap();
        t.set_custom_value(
            CustomSlot::Cycle(CycleDay::LowCarb),
            TargetField::Calories,
            1550.0,
        )
        .unwrap();
        assert_eq!(t.targets().calories, 1550);
        t.set_cycle_day(CycleDay::HighCarb).unwrap();
        assert_eq!(t.targets().calories, 1800);
    }

    #[test]
    fn test_state_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.db");
        let body_id = {
            let mut t = Tracker::open(&path).unwrap();
            t.set_target_mode(TargetMode::Custom).unwrap();
            t.add_water(today(), 250.0).unwrap();
            t.log_body(NewBodyEntry {
                date: today(),
                weight_kg: 69.0,
                body_fat_pct: None,
                muscle_mass_kg: None,
                waist_cm: None,
            })
            .unwrap()
            .id
        };
        let mut t = Tracker::open(&path).unwrap();
        assert_eq!(t.profile().settings().target_mode, TargetMode::Custom);
        assert_eq!(t.logs().water.len(), 1);
        assert_eq!(t.body_trend(14).len(), 1);
        // logging a body entry leaves the profile weight alone
        assert_eq!(t.profile().settings().weight_kg, 70.0);
        assert!(t.delete_body(&body_id).unwrap());
    }
}
