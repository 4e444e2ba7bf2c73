use anyhow::{Result, bail};

use nutritrack_core::models::{ExerciseDraft, ExerciseEntry, ExerciseType};
use nutritrack_core::service::Tracker;

use super::helpers::{exit_not_found, parse_date};

/// Changes requested by `exercise update`. `None` keeps the current value.
#[derive(Debug, Default)]
pub(crate) struct ExerciseUpdate {
    pub name: Option<String>,
    pub calories_burned: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub kind: Option<String>,
    pub notes: Option<String>,
}

impl ExerciseUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.calories_burned.is_none()
            && self.duration_minutes.is_none()
            && self.kind.is_none()
            && self.notes.is_none()
    }

    fn merge(self, current: &ExerciseEntry) -> Result<ExerciseDraft> {
        Ok(ExerciseDraft {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            calories_burned: self.calories_burned.unwrap_or(current.calories_burned),
            duration_minutes: self.duration_minutes.unwrap_or(current.duration_minutes),
            kind: self.kind.map_or(Ok(current.kind), |k| k.parse())?,
            notes: self.notes.or_else(|| current.notes.clone()),
        })
    }
}

fn print_entry_line(verb: &str, entry: &ExerciseEntry) {
    println!(
        "{verb} {} ({}, {:.0} min): {:.0} kcal burned on {} [{}]",
        entry.name,
        entry.kind,
        entry.duration_minutes,
        entry.calories_burned,
        entry.date.format("%Y-%m-%d"),
        entry.id
    );
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_exercise_add(
    tracker: &mut Tracker,
    name: &str,
    calories_burned: f64,
    duration_minutes: f64,
    kind: &str,
    notes: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let draft = ExerciseDraft {
        name: name.to_string(),
        calories_burned,
        duration_minutes,
        kind: kind.parse::<ExerciseType>()?,
        notes,
    };
    let entry = tracker.add_exercise(date, draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_entry_line("Logged", &entry);
    }
    Ok(())
}

pub(crate) fn cmd_exercise_update(
    tracker: &mut Tracker,
    id: &str,
    update: ExerciseUpdate,
    json: bool,
) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to update. Provide at least one field such as --calories or --minutes");
    }
    let Some(current) = tracker.logs().exercise.iter().find(|e| e.id == id) else {
        exit_not_found(&format!("Exercise entry {id} not found"), json);
    };
    let draft = update.merge(current)?;
    let entry = tracker.update_exercise(id, draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_entry_line("Updated", &entry);
    }
    Ok(())
}

pub(crate) fn cmd_exercise_delete(tracker: &mut Tracker, id: &str, json: bool) -> Result<()> {
    if tracker.delete_exercise(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted exercise entry {id}");
        }
        Ok(())
    } else {
        exit_not_found(&format!("Exercise entry {id} not found"), json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry() -> ExerciseEntry {
        ExerciseEntry {
            id: "ex-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            name: "Rowing".to_string(),
            calories_burned: 240.0,
            duration_minutes: 30.0,
            kind: ExerciseType::Cardio,
            notes: Some("intervals".to_string()),
        }
    }

    #[test]
    fn test_empty_update_detected() {
        assert!(ExerciseUpdate::default().is_empty());
        let update = ExerciseUpdate {
            duration_minutes: Some(45.0),
            ..ExerciseUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_merge_keeps_unchanged_fields() {
        let update = ExerciseUpdate {
            calories_burned: Some(310.0),
            kind: Some("strength".to_string()),
            ..ExerciseUpdate::default()
        };
        let draft = update.merge(&entry()).unwrap();
        assert_eq!(draft.name, "Rowing");
        assert!((draft.calories_burned - 310.0).abs() < f64::EPSILON);
        assert!((draft.duration_minutes - 30.0).abs() < f64::EPSILON);
        assert_eq!(draft.kind, ExerciseType::Strength);
        assert_eq!(draft.notes.as_deref(), Some("intervals"));
    }

    #[test]
    fn test_update_through_tracker_keeps_id() {
        let mut tracker = Tracker::open_in_memory().unwrap();
        let added = tracker
            .add_exercise(
                NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
                ExerciseDraft {
                    name: "Rowing".to_string(),
                    calories_burned: 240.0,
                    duration_minutes: 30.0,
                    kind: ExerciseType::Cardio,
                    notes: None,
                },
            )
            .unwrap();
        let update = ExerciseUpdate {
            duration_minutes: Some(40.0),
            ..ExerciseUpdate::default()
        };
        cmd_exercise_update(&mut tracker, &added.id, update, true).unwrap();

        let stored = &tracker.logs().exercise[0];
        assert_eq!(stored.id, added.id);
        assert!((stored.duration_minutes - 40.0).abs() < f64::EPSILON);
        assert!((stored.calories_burned - 240.0).abs() < f64::EPSILON);

        assert!(cmd_exercise_update(&mut tracker, &added.id, ExerciseUpdate::default(), true).is_err());
    }
}
