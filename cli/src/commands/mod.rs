mod body;
mod exercise;
mod export;
mod food;
mod helpers;
mod profile;
mod summary;
mod water;

pub(crate) use body::{BodyExtras, cmd_body_delete, cmd_body_history, cmd_body_log, cmd_body_show};
pub(crate) use exercise::{
    ExerciseUpdate, cmd_exercise_add, cmd_exercise_delete, cmd_exercise_update,
};
pub(crate) use export::cmd_export;
pub(crate) use food::{
    FoodUpdate, ServingOverrides, cmd_food_add, cmd_food_delete, cmd_food_list, cmd_food_update,
};
pub(crate) use helpers::ServingArgs;
pub(crate) use profile::{
    cmd_profile_custom, cmd_profile_cycle, cmd_profile_mode, cmd_profile_set, cmd_profile_show,
};
pub(crate) use summary::{cmd_calendar, cmd_summary};
pub(crate) use water::{cmd_water_add, cmd_water_delete, cmd_water_show};
