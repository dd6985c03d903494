//! Command execution.
//!
//! [`CommandExecutor`] applies one validated command and its recalculation
//! hooks. [`CommandEngine`] runs a whole batch through validation, gating and
//! execution, and reports what happened to each command.

use serde_json::{Number, Value};
use tianji_domain::{paths, ChangeLogEntry, Command, CommandAction, GameTime, Path, SaveState};

use super::error::ExecutionError;
use super::gating::{GatingLayer, GatingViolation};
use super::hooks::{HookContext, HookTable};
use super::payload::CommandPayload;
use super::validator::{CommandValidator, ValidatedCommand, ValidationRejected};
use crate::use_cases::derived::add_numbers;

// =============================================================================
// Single command
// =============================================================================

pub struct CommandExecutor {
    hooks: HookTable,
}

impl CommandExecutor {
    pub fn new(hooks: HookTable) -> Self {
        Self { hooks }
    }

    /// Apply one command. Returns the changelog entry, or `None` when the
    /// command left its path unchanged. On error the tree is untouched.
    pub fn execute(
        &self,
        state: &mut SaveState,
        command: &ValidatedCommand,
    ) -> Result<Option<ChangeLogEntry>, ExecutionError> {
        let diff_root = self.diff_root(command)?;
        let before = state.get(&diff_root).cloned();

        if !self.mutate(state, command, &diff_root)? {
            return Ok(None);
        }

        let normalized = if is_calendar_write(command) {
            normalize_calendar(state)
        } else {
            Ok(())
        };
        if let Err(e) = normalized {
            match before {
                Some(value) => state.set(&diff_root, value)?,
                None => {
                    state.remove(&diff_root);
                }
            }
            return Err(e);
        }

        let old_value = if diff_root == command.path {
            before.clone()
        } else {
            command_path_value(&diff_root, &command.path, before.as_ref())
        };
        self.hooks.run(
            state,
            &HookContext {
                command,
                old_value: old_value.as_ref(),
            },
        );

        let after = state.get(&diff_root).cloned();
        Ok(ChangeLogEntry::diff(diff_root.to_string(), command.action, before, after))
    }

    /// The subtree whose before/after snapshots form the changelog entry.
    fn diff_root(&self, command: &ValidatedCommand) -> Result<Path, ExecutionError> {
        if is_calendar_write(command) {
            return Ok(Path::parse(paths::GAME_TIME)?);
        }
        if let Some(item) = keyed_item_push(command) {
            return Ok(command.path.child(item.id.clone()));
        }
        Ok(command.path.clone())
    }

    /// Returns `false` for commands that turn out to be no-ops.
    fn mutate(
        &self,
        state: &mut SaveState,
        command: &ValidatedCommand,
        diff_root: &Path,
    ) -> Result<bool, ExecutionError> {
        let path = &command.path;
        let value = command.value_or_null();

        match command.action {
            CommandAction::Set => state.set(path, value)?,

            CommandAction::Add if is_calendar_add(command) => {
                let minutes = whole_minutes(&value).ok_or_else(|| {
                    ExecutionError::NonNumericOperand { path: path.to_string() }
                })?;
                let time = read_calendar(state)?
                    .checked_add_minutes(minutes)
                    .ok_or_else(|| ExecutionError::calendar("year out of range"))?;
                state.set_game_time(time)?;
            }

            CommandAction::Add => {
                let Value::Number(delta) = &value else {
                    return Err(ExecutionError::NonNumericOperand { path: path.to_string() });
                };
                let current: Option<Number> = match state.get(path) {
                    None | Some(Value::Null) => None,
                    Some(Value::Number(n)) => Some(n.clone()),
                    Some(_) => return Err(ExecutionError::NotANumber { path: path.to_string() }),
                };
                let sum = add_numbers(current.as_ref(), delta, false)
                    .ok_or_else(|| ExecutionError::NonNumericOperand { path: path.to_string() })?;
                state.set(path, Value::Number(sum))?;
            }

            CommandAction::Push if keyed_item_push(command).is_some() => {
                state.set(diff_root, value)?;
            }

            CommandAction::Push => {
                let value = if path.ends_with_key(paths::MEMORY) {
                    match value {
                        Value::String(text) if text.trim().is_empty() => return Ok(false),
                        Value::String(text) => {
                            Value::String(format!("{} {}", state.game_time().stamp(), text))
                        }
                        other => other,
                    }
                } else {
                    value
                };

                match state.get_mut(path) {
                    Some(Value::Array(items)) => items.push(value),
                    None | Some(Value::Null) => state.set(path, Value::Array(vec![value]))?,
                    Some(_) => return Err(ExecutionError::NotASequence { path: path.to_string() }),
                }
            }

            CommandAction::Delete => {
                state.remove(path);
            }

            CommandAction::Pull => match state.get_mut(path) {
                Some(Value::Array(items)) => {
                    if let Some(index) = items.iter().position(|item| *item == value) {
                        items.remove(index);
                    }
                }
                None | Some(Value::Null) => return Ok(false),
                Some(_) => return Err(ExecutionError::NotASequence { path: path.to_string() }),
            },
        }
        Ok(true)
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(HookTable::standard())
    }
}

fn is_calendar_add(command: &ValidatedCommand) -> bool {
    command.action == CommandAction::Add && command.path.is(paths::GAME_TIME_MINUTE)
}

/// Any set or add inside the calendar record; the record is normalized after.
fn is_calendar_write(command: &ValidatedCommand) -> bool {
    matches!(command.action, CommandAction::Set | CommandAction::Add)
        && command.path.starts_with(paths::GAME_TIME)
}

/// An absent calendar reads as the default; an unreadable one is an error.
fn read_calendar(state: &SaveState) -> Result<GameTime, ExecutionError> {
    match state.get_at(paths::GAME_TIME) {
        None | Some(Value::Null) => Ok(GameTime::default()),
        Some(value) => GameTime::from_value(value).map_err(ExecutionError::calendar),
    }
}

/// Rewrite the calendar record with every field back in range.
fn normalize_calendar(state: &mut SaveState) -> Result<(), ExecutionError> {
    let time = read_calendar(state)?;
    state.set_game_time(time)?;
    Ok(())
}

/// An item pushed onto the `inventory.items` record is stored under its id.
fn keyed_item_push(command: &ValidatedCommand) -> Option<&tianji_domain::Item> {
    if command.action != CommandAction::Push || !command.path.is(paths::INVENTORY_ITEMS) {
        return None;
    }
    match &command.payload {
        CommandPayload::Item(item) => Some(item),
        _ => None,
    }
}

fn whole_minutes(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|m| m.is_finite()).map(|m| m.round() as i64))
}

/// The value at `path` inside a snapshot taken at `root`.
fn command_path_value(root: &Path, path: &Path, snapshot: Option<&Value>) -> Option<Value> {
    let relative = path.segments().get(root.len()..)?;
    if relative.is_empty() {
        return snapshot.cloned();
    }
    let relative = Path::from_segments(relative.to_vec()).ok()?;
    tianji_domain::path::get(snapshot?, &relative).cloned()
}

// =============================================================================
// Batch
// =============================================================================

/// What happened to one command of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied(ChangeLogEntry),
    /// Executed, but the path ended up as it was
    Unchanged,
    Rejected(ValidationRejected),
    Gated(GatingViolation),
    Failed(ExecutionError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandReport {
    pub command: String,
    pub outcome: CommandOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub changelog: Vec<ChangeLogEntry>,
    pub commands: Vec<CommandReport>,
}

impl ApplyReport {
    fn count(&self, pred: impl Fn(&CommandOutcome) -> bool) -> usize {
        self.commands.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, CommandOutcome::Applied(_)))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, CommandOutcome::Rejected(_)))
    }

    pub fn gated(&self) -> usize {
        self.count(|o| matches!(o, CommandOutcome::Gated(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CommandOutcome::Failed(_)))
    }
}

/// Validation, gating and execution for a batch of commands.
#[derive(Default)]
pub struct CommandEngine {
    validator: CommandValidator,
    gating: GatingLayer,
    executor: CommandExecutor,
}

impl CommandEngine {
    pub fn new(validator: CommandValidator, gating: GatingLayer, executor: CommandExecutor) -> Self {
        Self {
            validator,
            gating,
            executor,
        }
    }

    pub fn validate(&self, command: &Command) -> Result<ValidatedCommand, ValidationRejected> {
        self.validator.validate(command)
    }

    /// Validate every command without touching any state.
    pub fn validate_all(&self, commands: &[Command]) -> Vec<Result<ValidatedCommand, ValidationRejected>> {
        commands.iter().map(|c| self.validate(c)).collect()
    }

    pub fn apply(&self, commands: &[Command], state: &mut SaveState) -> ApplyReport {
        self.apply_validated(self.validate_all(commands), state)
    }

    /// Gate and execute already validated commands in order. Gates see the
    /// state as left by the commands before them.
    pub fn apply_validated(
        &self,
        validated: Vec<Result<ValidatedCommand, ValidationRejected>>,
        state: &mut SaveState,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        for result in validated {
            let (command, outcome) = match result {
                Err(rejected) => {
                    tracing::warn!(command = %rejected.command, errors = ?rejected.errors, "Command rejected");
                    (rejected.command.clone(), CommandOutcome::Rejected(rejected))
                }
                Ok(command) => {
                    let label = format!("{} {}", command.action, command.path);
                    (label, self.gate_and_execute(&command, state))
                }
            };
            if let CommandOutcome::Applied(entry) = &outcome {
                report.changelog.push(entry.clone());
            }
            report.commands.push(CommandReport { command, outcome });
        }

        tracing::debug!(
            applied = report.applied(),
            rejected = report.rejected(),
            gated = report.gated(),
            failed = report.failed(),
            "Command batch applied"
        );
        report
    }

    fn gate_and_execute(&self, command: &ValidatedCommand, state: &mut SaveState) -> CommandOutcome {
        if let Err(violation) = self.gating.check(state, command) {
            tracing::warn!(rule = violation.rule, path = %violation.path, reason = %violation.reason, "Command gated");
            return CommandOutcome::Gated(violation);
        }

        match self.executor.execute(state, command) {
            Ok(Some(entry)) => {
                tracing::debug!(action = %command.action, path = %command.path, "Command applied");
                CommandOutcome::Applied(entry)
            }
            Ok(None) => CommandOutcome::Unchanged,
            Err(e) => {
                tracing::warn!(action = %command.action, path = %command.path, error = %e, "Command failed");
                CommandOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tianji_domain::{GameTime, NewCharacter, SixAttributes};

    fn seeded() -> SaveState {
        SaveState::new_character(&NewCharacter::new(
            "Lin Feng",
            "male",
            16,
            SixAttributes::new(5, 5, 5, 5, 5, 5),
        ))
    }

    fn item(id: &str, bonus: Value) -> Value {
        json!({
            "id": id, "name": format!("Item {id}"), "category": "equipment",
            "quality": {"tier": "common", "grade": 3}, "quantity": 1,
            "description": "", "equipBonus": bonus
        })
    }

    #[test]
    fn schema_failures_leave_state_and_changelog_untouched() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        let before = state.clone();

        let report = engine.apply(
            &[Command::set("player.location", json!({"description": "Azure Peak"}))],
            &mut state,
        );

        assert_eq!(state, before);
        assert!(report.changelog.is_empty());
        assert_eq!(report.rejected(), 1);
    }

    #[test]
    fn calendar_addition_cascades_and_diffs_the_whole_clock() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        state.set_game_time(GameTime::new(1000, 1, 1, 23, 50)).unwrap();

        let report = engine.apply(&[Command::add("gameTime.minute", json!(75))], &mut state);

        assert_eq!(state.game_time(), GameTime::new(1000, 1, 2, 1, 5));
        assert_eq!(report.changelog.len(), 1);
        assert_eq!(report.changelog[0].path, "gameTime");
    }

    #[test]
    fn huge_calendar_additions_stay_normalized() {
        let engine = CommandEngine::default();
        let mut state = seeded();

        let report = engine.apply(&[Command::add("gameTime.minute", json!(i64::MAX))], &mut state);

        assert_eq!(report.applied(), 1);
        let time = state.game_time();
        assert!((0..60).contains(&time.minute) && (0..24).contains(&time.hour));
        assert!((1..=30).contains(&time.day) && (1..=12).contains(&time.month));
        assert!(time.year > 1_000_000_000);
    }

    #[test]
    fn calendar_overflow_fails_without_touching_the_clock() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        engine.apply(&[Command::set("gameTime.year", json!(i64::MAX))], &mut state);
        let before = state.clone();

        let report = engine.apply(&[Command::add("gameTime.minute", json!(60 * 24 * 30 * 12))], &mut state);

        assert!(matches!(
            report.commands[0].outcome,
            CommandOutcome::Failed(ExecutionError::Calendar { .. })
        ));
        assert!(report.changelog.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn direct_calendar_field_writes_are_normalized() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        state.set_game_time(GameTime::new(1000, 1, 1, 8, 0)).unwrap();

        let report = engine.apply(
            &[
                Command::add("gameTime.hour", json!(20)),
                Command::set("gameTime.minute", json!(90)),
            ],
            &mut state,
        );

        assert_eq!(report.applied(), 2);
        assert_eq!(
            state.get_at("gameTime"),
            Some(&json!({"year": 1000, "month": 1, "day": 2, "hour": 5, "minute": 30}))
        );
        assert!(report.changelog.iter().all(|entry| entry.path == "gameTime"));
    }

    #[test]
    fn unreadable_calendar_writes_are_rolled_back() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        let before = state.clone();

        let report = engine.apply(
            &[
                Command::set("gameTime.minute", json!("dusk")),
                Command::set("gameTime.year", json!(i64::MAX)),
                Command::set("gameTime.month", json!(13)),
            ],
            &mut state,
        );

        assert_eq!(report.failed(), 2);
        assert!(matches!(report.commands[0].outcome, CommandOutcome::Failed(_)));
        assert!(matches!(report.commands[2].outcome, CommandOutcome::Failed(_)));
        assert!(matches!(report.commands[1].outcome, CommandOutcome::Applied(_)));
        assert_eq!(state.get_at("gameTime.year"), Some(&json!(i64::MAX)));
        assert_eq!(state.get_at("gameTime.minute"), before.get_at("gameTime.minute"));
        assert_eq!(state.get_at("gameTime.month"), before.get_at("gameTime.month"));
    }

    #[test]
    fn empty_memory_push_is_a_no_op() {
        let engine = CommandEngine::default();
        let mut state = SaveState::from_value(json!({"relations": {"Su Mei": {"memory": []}}})).unwrap();
        let before = state.clone();

        let report = engine.apply(&[Command::push("relations.Su Mei.memory", json!("   "))], &mut state);

        assert_eq!(state, before);
        assert!(report.changelog.is_empty());
        assert_eq!(report.commands[0].outcome, CommandOutcome::Unchanged);
    }

    #[test]
    fn memory_push_is_time_stamped() {
        let engine = CommandEngine::default();
        let mut state = SaveState::from_value(json!({
            "gameTime": {"year": 1000, "month": 3, "day": 15, "hour": 8, "minute": 5},
            "relations": {"Su Mei": {"memory": []}}
        }))
        .unwrap();

        engine.apply(&[Command::push("relations.Su Mei.memory", json!("Shared tea"))], &mut state);

        assert_eq!(
            state.get_at("relations.Su Mei.memory"),
            Some(&json!(["[Year 1000, Month 3, Day 15 08:05] Shared tea"]))
        );
    }

    #[test]
    fn failures_are_local_to_one_command() {
        let engine = CommandEngine::default();
        let mut state = seeded();

        let report = engine.apply(
            &[
                Command::push("player.attributes", json!(1)),
                Command::add("player.name", json!(1)),
                Command::add("cultivation.proficiency", json!(5)),
            ],
            &mut state,
        );

        assert_eq!(report.failed(), 2);
        assert_eq!(report.applied(), 1);
        assert!(matches!(
            report.commands[0].outcome,
            CommandOutcome::Failed(ExecutionError::NotASequence { .. })
        ));
        assert!(matches!(
            report.commands[1].outcome,
            CommandOutcome::Failed(ExecutionError::NotANumber { .. })
        ));
    }

    #[test]
    fn add_treats_absent_as_zero() {
        let engine = CommandEngine::default();
        let mut state = SaveState::empty();

        engine.apply(&[Command::add("inventory.spiritStones.low", json!(12))], &mut state);
        engine.apply(&[Command::add("inventory.spiritStones.low", json!(-2))], &mut state);

        assert_eq!(state.get_at("inventory.spiritStones.low"), Some(&json!(10)));
    }

    #[test]
    fn set_batches_replay_idempotently() {
        let engine = CommandEngine::default();
        let batch = [
            Command::set("player.name", json!("Lin Feng the Bold")),
            Command::set("cultivation.proficiency", json!(40)),
        ];
        let mut state = seeded();

        engine.apply(&batch, &mut state);
        let once = state.clone();
        let replay = engine.apply(&batch, &mut state);

        assert_eq!(state, once);
        assert!(replay.changelog.is_empty());
    }

    #[test]
    fn add_and_push_batches_accumulate_on_replay() {
        let engine = CommandEngine::default();
        let batch = [
            Command::add("inventory.spiritStones.low", json!(5)),
            Command::push("journal", json!("Entered the sect")),
        ];
        let mut state = SaveState::empty();

        engine.apply(&batch, &mut state);
        let replay = engine.apply(&batch, &mut state);

        assert_eq!(replay.applied(), 2);
        assert_eq!(state.get_at("inventory.spiritStones.low"), Some(&json!(10)));
        assert_eq!(
            state.get_at("journal"),
            Some(&json!(["Entered the sect", "Entered the sect"]))
        );
    }

    #[test]
    fn gated_realm_advance_changes_nothing() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        let before = state.clone();

        let report = engine.apply(&[Command::set("player.realm.name", json!("Qi Refining"))], &mut state);

        assert_eq!(report.gated(), 1);
        assert!(report.changelog.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn same_tier_stage_change_is_applied() {
        let engine = CommandEngine::default();
        let mut state = seeded();

        let report = engine.apply(&[Command::set("player.realm.stage", json!("Middle"))], &mut state);

        assert_eq!(report.applied(), 1);
        assert_eq!(state.get_at("player.realm.stage"), Some(&json!("Middle")));
    }

    #[test]
    fn marker_set_earlier_in_the_batch_unlocks_the_advance() {
        let engine = CommandEngine::default();
        let mut state = seeded();

        let report = engine.apply(
            &[
                Command::set("player.tribulationPassed", json!(true)),
                Command::set("player.realm.name", json!("Qi Refining")),
            ],
            &mut state,
        );

        assert_eq!(report.applied(), 2);
        assert_eq!(state.realm_tier(), Some(tianji_domain::RealmTier::QiRefining));
        assert!(!state.tribulation_passed());
    }

    #[test]
    fn slot_writes_move_equipment_bonuses() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        let base_hp = state.get_at("player.attributes.hp.max").cloned();
        engine.apply(
            &[Command::push("inventory.items", item("sword", json!({"attributes": {"hp": {"max": 20}}})))],
            &mut state,
        );

        engine.apply(&[Command::set("equipment.slot1", json!("sword"))], &mut state);
        assert_eq!(
            state.get_at("player.attributes.hp.max").and_then(Value::as_i64),
            base_hp.as_ref().and_then(Value::as_i64).map(|hp| hp + 20)
        );
        assert_eq!(state.get_at("inventory.items.sword.equipped"), Some(&json!(true)));

        engine.apply(&[Command::delete("equipment.slot1")], &mut state);
        assert_eq!(state.get_at("player.attributes.hp.max").cloned(), base_hp);
        assert_eq!(state.get_at("inventory.items.sword.equipped"), Some(&json!(false)));
    }

    #[test]
    fn equipped_item_written_into_a_second_slot_moves_once() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        let base_hp = state.get_at("player.attributes.hp.max").and_then(Value::as_i64);
        engine.apply(
            &[Command::push("inventory.items", item("sword", json!({"attributes": {"hp": {"max": 20}}})))],
            &mut state,
        );

        engine.apply(
            &[
                Command::set("equipment.slot1", json!("sword")),
                Command::set("equipment.slot2", json!("sword")),
            ],
            &mut state,
        );
        assert_eq!(state.equipment_slot(1), None);
        assert_eq!(state.equipment_slot(2).as_deref(), Some("sword"));
        assert_eq!(
            state.get_at("player.attributes.hp.max").and_then(Value::as_i64),
            base_hp.map(|hp| hp + 20)
        );

        engine.apply(&[Command::delete("equipment.slot2")], &mut state);
        assert_eq!(state.get_at("player.attributes.hp.max").and_then(Value::as_i64), base_hp);
        assert_eq!(state.get_at("inventory.items.sword.equipped"), Some(&json!(false)));
    }

    #[test]
    fn item_push_onto_inventory_record_is_keyed_by_id() {
        let engine = CommandEngine::default();
        let mut state = seeded();

        let report = engine.apply(&[Command::push("inventory.items", item("pill", json!({})))], &mut state);

        assert_eq!(state.get_at("inventory.items.pill.name"), Some(&json!("Item pill")));
        assert_eq!(report.changelog[0].path, "inventory.items.pill");
    }

    #[test]
    fn dao_writes_force_unlock() {
        let engine = CommandEngine::default();
        let mut state = SaveState::from_value(json!({
            "dao": {"paths": {"Sword": {"name": "Sword", "unlocked": false, "experience": 0}}}
        }))
        .unwrap();

        let report = engine.apply(&[Command::set("dao.paths.Sword.experience", json!(10))], &mut state);

        assert_eq!(state.get_at("dao.paths.Sword.unlocked"), Some(&json!(true)));
        assert_eq!(report.changelog[0].new_value, Some(json!(10)));
    }

    #[test]
    fn pull_removes_the_first_equal_element() {
        let engine = CommandEngine::default();
        let mut state = SaveState::from_value(json!({"tags": ["a", "b", "a"]})).unwrap();

        engine.apply(&[Command::pull("tags", json!("a"))], &mut state);
        assert_eq!(state.get_at("tags"), Some(&json!(["b", "a"])));

        let report = engine.apply(&[Command::pull("missing", json!("a"))], &mut state);
        assert_eq!(report.commands[0].outcome, CommandOutcome::Unchanged);
    }

    #[test]
    fn longitude_and_latitude_drive_map_coordinates() {
        let engine = CommandEngine::default();
        let mut state = seeded();

        engine.apply(
            &[
                Command::set("player.location.longitude", json!(130.0)),
                Command::set("player.location.latitude", json!(45.0)),
            ],
            &mut state,
        );

        let x = state.get_at("player.location.x").and_then(Value::as_f64).unwrap();
        let y = state.get_at("player.location.y").and_then(Value::as_f64).unwrap();
        assert!((x - 3330.0).abs() < 1e-6);
        assert!((y - 180.0).abs() < 1e-6);
    }

    #[test]
    fn time_advance_sweeps_expired_effects() {
        let engine = CommandEngine::default();
        let mut state = seeded();
        let now = state.game_time();
        engine.apply(
            &[Command::push(
                "player.statusEffects",
                json!({
                    "name": "Qi Surge", "kind": "buff", "description": "",
                    "durationMinutes": 30, "createdAt": now.to_value()
                }),
            )],
            &mut state,
        );
        assert_eq!(state.get_at("player.statusEffects").and_then(Value::as_array).map(Vec::len), Some(1));

        engine.apply(&[Command::add("gameTime.minute", json!(30))], &mut state);
        assert_eq!(state.get_at("player.statusEffects"), Some(&json!([])));
    }
}
